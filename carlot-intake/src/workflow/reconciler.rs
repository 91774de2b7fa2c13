//! AI-assisted entry: staged image → inference → form prefill
//!
//! On success the inferred fields overwrite the form, the staged image is
//! promoted into the gallery and the active surface flips to manual review.
//! On failure nothing changes and the staged image stays for a retry.
//!
//! The call is split in two so the owner can keep editing while inference is
//! in flight: [`InferenceReconciler::prepare`] returns an owned future that
//! borrows nothing, and [`InferenceReconciler::apply`] folds its result into
//! the form once it settles. Prefill overwrites every mapped field, including
//! edits made while the call was pending.

use crate::error::{IntakeError, IntakeResult, Precondition};
use crate::models::{EncodedImage, FormState, InferredVehicle};
use crate::services::{BatchImageIngestor, SingleImageStager};
use crate::types::{InferenceService, Notifier};
use crate::utils::{AsyncTask, TaskOutcome};
use carlot_common::events::{EntrySurface, NoticeLevel};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How an extraction attempt ended
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// Result applied to form, gallery and surface
    Applied(InferredVehicle),
    /// A newer extraction was started; nothing applied
    Superseded,
    /// The session closed while the call was in flight; nothing applied
    Detached,
}

/// Inference result plus the gallery representation of the image it ran on
#[derive(Debug)]
pub struct SettledExtraction {
    generation: u64,
    outcome: TaskOutcome<InferredVehicle, IntakeError>,
    /// Only resolved when the inference call completed
    image: Option<Result<EncodedImage, IntakeError>>,
}

impl SettledExtraction {
    /// Stage generation the inference ran on
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

pub struct InferenceReconciler {
    service: Arc<dyn InferenceService>,
    task: AsyncTask<InferredVehicle>,
    notifier: Arc<dyn Notifier>,
}

impl InferenceReconciler {
    pub fn new(service: Arc<dyn InferenceService>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            service,
            task: AsyncTask::new("extract_details", Arc::clone(&notifier)),
            notifier,
        }
    }

    /// Observable extraction state
    pub fn task(&self) -> &AsyncTask<InferredVehicle> {
        &self.task
    }

    /// Check the precondition and return the inference work as an owned future
    ///
    /// # Errors
    /// `MissingPrecondition(NoStagedImage)` before any call when nothing is
    /// staged; the warning notice is sent here.
    pub fn prepare(
        &self,
        stager: &SingleImageStager,
    ) -> IntakeResult<impl Future<Output = SettledExtraction> + Send + 'static> {
        let Some(snapshot) = stager.snapshot() else {
            let precondition = Precondition::NoStagedImage;
            self.notifier.warning(&precondition.to_string());
            return Err(IntakeError::MissingPrecondition(precondition));
        };

        let service = Arc::clone(&self.service);
        let task = self.task.clone();
        debug!(
            file = %snapshot.file().name(),
            generation = snapshot.generation(),
            "Extraction prepared"
        );

        Ok(async move {
            let outcome = task.run(service.infer(snapshot.file())).await;
            let image = match &outcome {
                TaskOutcome::Completed(_) => Some(snapshot.representation().await),
                _ => None,
            };
            SettledExtraction {
                generation: snapshot.generation(),
                outcome,
                image,
            }
        })
    }

    /// Fold a settled extraction into form, gallery and surface
    ///
    /// # Errors
    /// The collaborator error when inference failed; its notice has already
    /// been sent by the task.
    pub fn apply(
        &self,
        settled: SettledExtraction,
        form: &mut FormState,
        ingestor: &mut BatchImageIngestor,
        surface: &mut EntrySurface,
    ) -> IntakeResult<ReconcileOutcome> {
        let vehicle = match settled.outcome {
            TaskOutcome::Completed(vehicle) => vehicle,
            TaskOutcome::Failed(e) => return Err(e),
            TaskOutcome::Superseded => return Ok(ReconcileOutcome::Superseded),
            TaskOutcome::Detached => return Ok(ReconcileOutcome::Detached),
        };

        form.prefill(&vehicle);

        match settled.image {
            Some(Ok(image)) => ingestor.promote(image),
            Some(Err(e)) => {
                // Fields are still useful without the image
                warn!(error = %e, "Staged image could not be promoted");
                self.notifier.warning(&e.to_string());
            }
            None => {}
        }

        info!(
            make = %vehicle.make,
            model = %vehicle.model,
            year = vehicle.year,
            confidence = vehicle.confidence_percent(),
            "Applied inferred vehicle details"
        );
        self.notifier.notify(
            NoticeLevel::Success,
            "Successfully extracted car details",
            Some(&vehicle.summary()),
        );

        *surface = EntrySurface::Manual;

        Ok(ReconcileOutcome::Applied(vehicle))
    }

    /// Prepare, await and apply in one step
    pub async fn run(
        &self,
        stager: &SingleImageStager,
        form: &mut FormState,
        ingestor: &mut BatchImageIngestor,
        surface: &mut EntrySurface,
    ) -> IntakeResult<ReconcileOutcome> {
        let settled = self.prepare(stager)?.await;
        self.apply(settled, form, ingestor, surface)
    }
}
