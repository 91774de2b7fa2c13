//! Intake workflow type definitions
//!
//! Supporting types for the vehicle intake workflow notifications.

use serde::{Deserialize, Serialize};

/// Severity of a user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

impl std::fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoticeLevel::Success => write!(f, "success"),
            NoticeLevel::Warning => write!(f, "warning"),
            NoticeLevel::Error => write!(f, "error"),
        }
    }
}

/// Active editing surface of the intake form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySurface {
    /// Photo upload + AI extraction
    #[default]
    AiAssisted,
    /// Field-by-field manual entry
    Manual,
}

impl std::fmt::Display for EntrySurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntrySurface::AiAssisted => write!(f, "ai"),
            EntrySurface::Manual => write!(f, "manual"),
        }
    }
}

/// Why the image gallery changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GalleryChangeTrigger {
    /// Batch of uploaded files committed
    BatchCommitted,
    /// Staged AI image promoted after a successful extraction
    Promoted,
    /// Entry removed by the user
    Removed,
}
