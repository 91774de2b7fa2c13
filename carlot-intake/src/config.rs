//! Configuration resolution for carlot-intake
//!
//! Provides per-setting resolution with CLI → ENV → TOML → default priority.

use crate::workflow::{SessionSettings, DEFAULT_REDIRECT_PATH};
use crate::models::MAX_IMAGE_BYTES;
use crate::services::IngestPolicy;
use carlot_common::config::TomlConfig;
use carlot_common::{Error, Result};
use std::time::Duration;
use tracing::{debug, warn};

pub const ENV_INFERENCE_URL: &str = "CARLOT_INFERENCE_URL";
pub const ENV_RECORDS_URL: &str = "CARLOT_RECORDS_URL";
pub const ENV_API_TOKEN: &str = "CARLOT_API_TOKEN";
pub const ENV_LOG_LEVEL: &str = "RUST_LOG";

pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const DEFAULT_INFERENCE_URL: &str = "http://localhost:3000/api/analyze-car";
pub const DEFAULT_RECORDS_URL: &str = "http://localhost:3000/api/cars";

/// Request timeout for both HTTP collaborators
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub inference_url: Option<String>,
    pub records_url: Option<String>,
    pub api_token: Option<String>,
}

/// Fully resolved configuration
#[derive(Debug, Clone, PartialEq)]
pub struct IntakeConfig {
    pub inference_url: String,
    pub records_url: String,
    pub api_token: Option<String>,
    pub max_image_bytes: u64,
    pub decode_concurrency: usize,
    pub redirect_path: String,
    pub request_timeout: Duration,
}

impl IntakeConfig {
    /// Resolve against the process environment
    pub fn resolve(cli: &CliOverrides, toml_config: &TomlConfig) -> Result<Self> {
        Self::resolve_with_env(cli, toml_config, |key| std::env::var(key).ok())
    }

    /// Resolve with an explicit environment lookup
    pub fn resolve_with_env<F>(cli: &CliOverrides, toml_config: &TomlConfig, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let inference_url = resolve_setting(
            "inference URL",
            cli.inference_url.as_deref(),
            env(ENV_INFERENCE_URL).as_deref(),
            toml_config.inference_url.as_deref(),
        )
        .unwrap_or_else(|| DEFAULT_INFERENCE_URL.to_string());

        let records_url = resolve_setting(
            "records URL",
            cli.records_url.as_deref(),
            env(ENV_RECORDS_URL).as_deref(),
            toml_config.records_url.as_deref(),
        )
        .unwrap_or_else(|| DEFAULT_RECORDS_URL.to_string());

        let api_token = resolve_setting(
            "API token",
            cli.api_token.as_deref(),
            env(ENV_API_TOKEN).as_deref(),
            toml_config.api_token.as_deref(),
        );

        let config = Self {
            inference_url,
            records_url,
            api_token,
            max_image_bytes: toml_config.max_image_bytes.unwrap_or(MAX_IMAGE_BYTES),
            decode_concurrency: toml_config
                .decode_concurrency
                .unwrap_or(IngestPolicy::default().decode_concurrency),
            redirect_path: toml_config
                .redirect_path
                .clone()
                .filter(|p| is_valid_value(p))
                .unwrap_or_else(|| DEFAULT_REDIRECT_PATH.to_string()),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.max_image_bytes == 0 {
            return Err(Error::Config("max_image_bytes must be greater than 0".to_string()));
        }
        if self.decode_concurrency == 0 {
            return Err(Error::Config(
                "decode_concurrency must be greater than 0".to_string(),
            ));
        }
        for (name, url) in [("inference URL", &self.inference_url), ("records URL", &self.records_url)] {
            let parsed = reqwest::Url::parse(url)
                .map_err(|e| Error::Config(format!("Invalid {} '{}': {}", name, url, e)))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(Error::Config(format!(
                    "Invalid {} '{}': scheme must be http or https",
                    name, url
                )));
            }
        }
        Ok(())
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            max_image_bytes: self.max_image_bytes,
            decode_concurrency: self.decode_concurrency,
            redirect_path: self.redirect_path.clone(),
        }
    }
}

/// Tracing filter directive, resolved before the subscriber exists
///
/// Same CLI → ENV → TOML → default order as the other settings, but silent
/// since nothing is listening yet.
pub fn resolve_log_level(cli: Option<&str>, env: Option<&str>, toml_config: &TomlConfig) -> String {
    [cli, env, Some(toml_config.logging.level.as_str())]
        .into_iter()
        .flatten()
        .find(|level| is_valid_value(level))
        .map(|level| level.trim().to_string())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
}

/// Non-empty, non-whitespace
pub fn is_valid_value(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Pick the highest-priority valid value among CLI, ENV and TOML
fn resolve_setting(
    name: &str,
    cli: Option<&str>,
    env: Option<&str>,
    toml: Option<&str>,
) -> Option<String> {
    let tiers = [("command line", cli), ("environment", env), ("TOML", toml)];

    let sources: Vec<(&str, &str)> = tiers
        .iter()
        .filter_map(|(source, value)| value.filter(|v| is_valid_value(v)).map(|v| (*source, v)))
        .collect();

    if sources.len() > 1 {
        let names: Vec<&str> = sources.iter().map(|(source, _)| *source).collect();
        warn!(
            "{} found in multiple sources: {}. Using {} (highest priority).",
            name,
            names.join(", "),
            names[0]
        );
    }

    sources.first().map(|(source, value)| {
        debug!("{} loaded from {}", name, source);
        value.trim().to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let config =
            IntakeConfig::resolve_with_env(&CliOverrides::default(), &TomlConfig::default(), no_env)
                .unwrap();
        assert_eq!(config.inference_url, DEFAULT_INFERENCE_URL);
        assert_eq!(config.records_url, DEFAULT_RECORDS_URL);
        assert_eq!(config.api_token, None);
        assert_eq!(config.max_image_bytes, 5 * 1024 * 1024);
        assert_eq!(config.redirect_path, "/admin/cars");
        assert_eq!(resolve_log_level(None, None, &TomlConfig::default()), "info");
    }

    #[test]
    fn test_log_level_priority() {
        let mut toml_config = TomlConfig::default();
        toml_config.logging.level = "warn".to_string();

        assert_eq!(
            resolve_log_level(Some("trace"), Some("debug"), &toml_config),
            "trace"
        );
        assert_eq!(resolve_log_level(None, Some("debug"), &toml_config), "debug");
        assert_eq!(resolve_log_level(Some("  "), None, &toml_config), "warn");

        toml_config.logging.level = String::new();
        assert_eq!(resolve_log_level(None, None, &toml_config), DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_priority_cli_env_toml() {
        let toml_config = TomlConfig {
            inference_url: Some("http://toml/infer".to_string()),
            records_url: Some("http://toml/cars".to_string()),
            api_token: Some("toml-token".to_string()),
            ..TomlConfig::default()
        };
        let cli = CliOverrides {
            inference_url: Some("http://cli/infer".to_string()),
            ..CliOverrides::default()
        };
        let env = |key: &str| match key {
            ENV_INFERENCE_URL => Some("http://env/infer".to_string()),
            ENV_API_TOKEN => Some("env-token".to_string()),
            _ => None,
        };

        let config = IntakeConfig::resolve_with_env(&cli, &toml_config, env).unwrap();
        assert_eq!(config.inference_url, "http://cli/infer");
        assert_eq!(config.api_token.as_deref(), Some("env-token"));
        assert_eq!(config.records_url, "http://toml/cars");
    }

    #[test]
    fn test_whitespace_values_ignored() {
        let cli = CliOverrides {
            api_token: Some("   ".to_string()),
            ..CliOverrides::default()
        };
        let config = IntakeConfig::resolve_with_env(&cli, &TomlConfig::default(), no_env).unwrap();
        assert_eq!(config.api_token, None);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let zero = TomlConfig {
            decode_concurrency: Some(0),
            ..TomlConfig::default()
        };
        let err = IntakeConfig::resolve_with_env(&CliOverrides::default(), &zero, no_env).unwrap_err();
        assert!(err.to_string().contains("decode_concurrency"));

        let cli = CliOverrides {
            records_url: Some("ftp://example.com/cars".to_string()),
            ..CliOverrides::default()
        };
        let err = IntakeConfig::resolve_with_env(&cli, &TomlConfig::default(), no_env).unwrap_err();
        assert!(err.to_string().contains("records URL"));
    }

    #[test]
    fn test_session_settings() {
        let toml_config = TomlConfig {
            max_image_bytes: Some(1024),
            decode_concurrency: Some(2),
            ..TomlConfig::default()
        };
        let settings = IntakeConfig::resolve_with_env(&CliOverrides::default(), &toml_config, no_env)
            .unwrap()
            .session_settings();
        assert_eq!(settings.max_image_bytes, 1024);
        assert_eq!(settings.decode_concurrency, 2);
    }
}
