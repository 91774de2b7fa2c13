//! Configuration loading and write-back
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments
//! 2. Environment variables (CARLOT_*)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! This module owns the TOML tier; the per-setting resolution lives with the
//! tool that consumes the setting.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Base URL of the image-understanding service
    #[serde(default)]
    pub inference_url: Option<String>,

    /// Base URL of the record-creation service
    #[serde(default)]
    pub records_url: Option<String>,

    /// Bearer token sent to both services
    #[serde(default)]
    pub api_token: Option<String>,

    /// Per-file upload limit in bytes
    #[serde(default)]
    pub max_image_bytes: Option<u64>,

    /// Maximum concurrent image decodes per batch
    #[serde(default)]
    pub decode_concurrency: Option<usize>,

    /// Where to navigate after a successful submission
    #[serde(default)]
    pub redirect_path: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Default TOML path for a tool: `<config_dir>/carlot/<tool_name>.toml`
pub fn default_config_path(tool_name: &str) -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join("carlot").join(format!("{}.toml", tool_name)))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
}

/// Load a TOML config file
///
/// A missing file yields the defaults; a present but unparsable file is an error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "Config file not found, using defaults");
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;

    toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Write a TOML config file atomically
///
/// Writes to a sibling temp file first, then renames over the target.
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;

    tracing::info!(path = %path.display(), "Config written");
    Ok(())
}
