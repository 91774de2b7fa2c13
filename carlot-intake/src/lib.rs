//! carlot-intake library interface
//!
//! Client-side orchestration for adding a vehicle to the marketplace
//! inventory: AI-assisted or manual entry, concurrent gallery ingestion and
//! gated submission.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use carlot_intake::models::{FileCandidate, VehicleField};
//! use carlot_intake::workflow::{Collaborators, IntakeSession, SessionSettings};
//!
//! async fn intake(
//!     collaborators: Collaborators,
//!     path: &Path,
//! ) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = IntakeSession::new(collaborators, SessionSettings::default());
//!     session.stage_ai_image(FileCandidate::from_path(path).await?).await?;
//!
//!     // Inference runs off the session so the form stays editable meanwhile
//!     let pending = tokio::spawn(session.prepare_extraction()?);
//!     session.set_field(VehicleField::Seats, "5")?;
//!     session.apply_extraction(pending.await?)?;
//!
//!     session.set_field(VehicleField::Price, "24999")?;
//!     let outcome = session.submit().await?;
//!     println!("submitted: {}", outcome.success);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod types;
pub mod utils;
pub mod validators;
pub mod workflow;

pub use crate::error::{IntakeError, IntakeResult, Precondition};
