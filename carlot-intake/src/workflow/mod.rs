//! Intake workflow
//!
//! Two entry paths feed one record:
//! - **AI-assisted:** stage image → extract details → prefill form → review
//! - **Manual:** type fields directly
//!
//! Both end in the same gated submission. [`IntakeSession`] ties the parts
//! together for one workflow instance.

pub mod reconciler;
pub mod session;
pub mod submission;

pub use reconciler::{InferenceReconciler, ReconcileOutcome, SettledExtraction};
pub use session::{Collaborators, IntakeSession, SessionSettings};
pub use submission::{SubmissionController, DEFAULT_REDIRECT_PATH};
