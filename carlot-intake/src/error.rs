//! Error types for carlot-intake
//!
//! Every failure in the intake workflow is one of:
//! - client-side validation failure (blocks submission, no network call)
//! - oversized file rejection (per file, never fatal)
//! - collaborator failure or malformed collaborator response
//! - missing precondition (nothing staged, empty gallery)
//! - per-file decode failure

use crate::models::VehicleField;
use crate::validators::ValidationErrors;
use thiserror::Error;

/// Preconditions checked before any collaborator call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// Extraction requested with no staged image
    NoStagedImage,
    /// Submission requested with an empty gallery
    NoGalleryImages,
}

impl std::fmt::Display for Precondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Precondition::NoStagedImage => write!(f, "Please upload an image first"),
            Precondition::NoGalleryImages => write!(f, "Please upload at least one image"),
        }
    }
}

/// Intake workflow error type
#[derive(Debug, Error)]
pub enum IntakeError {
    /// One or more form fields failed validation
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// File exceeds the per-image upload limit
    #[error("{name} is {size} bytes, limit is {limit} bytes")]
    FileTooLarge { name: String, size: u64, limit: u64 },

    /// Operation attempted before its precondition held
    #[error("{0}")]
    MissingPrecondition(Precondition),

    /// Collaborator call failed (transport, HTTP status, or explicit rejection)
    #[error("{message}")]
    Collaborator {
        service: &'static str,
        message: String,
    },

    /// Collaborator answered, but the payload did not match the expected shape
    #[error("Malformed {service} response: {message}")]
    MalformedResponse {
        service: &'static str,
        message: String,
    },

    /// File could not be turned into an image representation
    #[error("Failed to read {name}: {reason}")]
    Decode { name: String, reason: String },

    /// Value cannot be stored in a non-text field
    #[error("Invalid value for {field}: {value}")]
    InvalidFieldValue { field: VehicleField, value: String },

    /// carlot-common error
    #[error(transparent)]
    Common(#[from] carlot_common::Error),
}

impl IntakeError {
    /// What the operator can do about this failure
    pub fn next_step(&self) -> &'static str {
        match self {
            IntakeError::Validation(_) | IntakeError::InvalidFieldValue { .. } => {
                "Fix the highlighted fields and submit again"
            }
            IntakeError::FileTooLarge { .. } => "Choose a smaller file",
            IntakeError::MissingPrecondition(Precondition::NoStagedImage) => {
                "Upload a car image before extracting details"
            }
            IntakeError::MissingPrecondition(Precondition::NoGalleryImages) => {
                "Add at least one image to the gallery"
            }
            IntakeError::Collaborator { .. } | IntakeError::MalformedResponse { .. } => "Retry",
            IntakeError::Decode { .. } => "Choose a different image file",
            IntakeError::Common(_) => "Check the configuration and retry",
        }
    }

    /// True when the failure happened before any collaborator call was made
    pub fn is_client_side(&self) -> bool {
        !matches!(
            self,
            IntakeError::Collaborator { .. } | IntakeError::MalformedResponse { .. }
        )
    }
}

/// Result type for intake operations
pub type IntakeResult<T> = Result<T, IntakeError>;
