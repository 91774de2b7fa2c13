//! Data models for carlot-intake
//!
//! - Vehicle form state and its normalized submission form
//! - Candidate files, encoded images and the gallery
//! - Structured inference results
//! - Record-creation request/response

pub mod image;
pub mod inference;
pub mod submission;
pub mod vehicle;

pub use image::{
    format_megabytes, Acceptance, CandidateImage, EncodedImage, FileCandidate, ImageGallery,
    MAX_IMAGE_BYTES,
};
pub use inference::{InferenceEnvelope, InferredVehicle};
pub use submission::{CreateAck, CreateVehicleRequest, SubmissionOutcome};
pub use vehicle::{
    FormState, NormalizedVehicle, VehicleField, VehicleStatus, BODY_TYPES, FUEL_TYPES,
    TRANSMISSIONS,
};
