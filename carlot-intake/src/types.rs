//! Collaborator traits
//!
//! The intake core talks to everything outside itself through these seams:
//! - **InferenceService:** image → structured vehicle fields + confidence
//! - **RecordService:** normalized record + gallery → created listing
//! - **ImageDecoder:** candidate file → gallery representation
//! - **Notifier:** user-facing notices (fire-and-forget)
//! - **Navigator:** route change after a successful submission

use crate::error::IntakeError;
use crate::models::{
    CreateAck, CreateVehicleRequest, EncodedImage, FileCandidate, InferredVehicle,
};
use carlot_common::events::NoticeLevel;

/// Image-understanding service
///
/// # Example
/// ```rust,ignore
/// use carlot_intake::types::InferenceService;
///
/// pub struct FixedAnswer(InferredVehicle);
///
/// #[async_trait::async_trait]
/// impl InferenceService for FixedAnswer {
///     async fn infer(&self, _image: &FileCandidate) -> Result<InferredVehicle, IntakeError> {
///         Ok(self.0.clone())
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait InferenceService: Send + Sync {
    /// Extract vehicle details from one image
    ///
    /// # Errors
    /// - `IntakeError::Collaborator` for transport failures and service-side rejections
    /// - `IntakeError::MalformedResponse` when the answer does not decode
    async fn infer(&self, image: &FileCandidate) -> Result<InferredVehicle, IntakeError>;
}

/// Record-creation service
#[async_trait::async_trait]
pub trait RecordService: Send + Sync {
    async fn create(&self, request: &CreateVehicleRequest) -> Result<CreateAck, IntakeError>;
}

/// Turns a candidate file into its gallery representation
#[async_trait::async_trait]
pub trait ImageDecoder: Send + Sync {
    async fn decode(&self, file: &FileCandidate) -> Result<EncodedImage, IntakeError>;
}

/// Notification sink
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NoticeLevel, message: &str, detail: Option<&str>);

    fn success(&self, message: &str) {
        self.notify(NoticeLevel::Success, message, None);
    }

    fn warning(&self, message: &str) {
        self.notify(NoticeLevel::Warning, message, None);
    }

    fn error(&self, message: &str) {
        self.notify(NoticeLevel::Error, message, None);
    }
}

/// Routing collaborator
pub trait Navigator: Send + Sync {
    fn go_to(&self, path: &str);
}

// ============================================================================
// Mock collaborators for unit tests
// ============================================================================
