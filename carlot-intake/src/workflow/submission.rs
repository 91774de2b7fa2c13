//! Gated record submission
//!
//! Validation and the gallery check both run before the record service is
//! called; either failing means zero network calls.

use crate::error::{IntakeError, IntakeResult, Precondition};
use crate::models::{CreateAck, CreateVehicleRequest, FormState, SubmissionOutcome};
use crate::services::BatchImageIngestor;
use crate::types::{Navigator, Notifier, RecordService};
use crate::utils::{AsyncTask, TaskOutcome};
use crate::validators::FormValidator;
use std::sync::Arc;
use tracing::{debug, info};

/// Where the operator lands after a successful submission
pub const DEFAULT_REDIRECT_PATH: &str = "/admin/cars";

pub struct SubmissionController {
    service: Arc<dyn RecordService>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    task: AsyncTask<CreateAck>,
    validator: FormValidator,
    redirect_path: String,
}

impl SubmissionController {
    pub fn new(
        service: Arc<dyn RecordService>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
        validator: FormValidator,
        redirect_path: impl Into<String>,
    ) -> Self {
        Self {
            service,
            navigator,
            task: AsyncTask::new("create_record", Arc::clone(&notifier)),
            notifier,
            validator,
            redirect_path: redirect_path.into(),
        }
    }

    pub fn task(&self) -> &AsyncTask<CreateAck> {
        &self.task
    }

    pub fn validator(&self) -> &FormValidator {
        &self.validator
    }

    pub fn set_validator(&mut self, validator: FormValidator) {
        self.validator = validator;
    }

    /// Validate, check the gallery, then create the record
    ///
    /// Client-side failures come back as `Err` with no call made. Once the
    /// record service has been called the result is always `Ok`, with the
    /// failure (already surfaced as a notice) inside the outcome.
    pub async fn submit(
        &self,
        form: &FormState,
        ingestor: &mut BatchImageIngestor,
    ) -> IntakeResult<SubmissionOutcome> {
        let record = self.validator.validate(form).map_err(|errors| {
            debug!(errors = errors.len(), "Submission blocked by validation");
            IntakeError::Validation(errors)
        })?;

        if ingestor.gallery().is_empty() {
            let precondition = Precondition::NoGalleryImages;
            ingestor.set_error(precondition.to_string());
            debug!("Submission blocked: gallery is empty");
            return Err(IntakeError::MissingPrecondition(precondition));
        }

        let request = CreateVehicleRequest {
            car_data: record,
            images: ingestor.gallery().to_vec(),
        };

        let service = Arc::clone(&self.service);
        let outcome = self
            .task
            .run(async move {
                let ack = service.create(&request).await?;
                if !ack.success {
                    return Err(IntakeError::Collaborator {
                        service: "records",
                        message: ack
                            .error
                            .clone()
                            .unwrap_or_else(|| "Failed to add car".to_string()),
                    });
                }
                Ok::<_, IntakeError>(ack)
            })
            .await;

        match outcome {
            TaskOutcome::Completed(ack) => {
                info!(id = ?ack.id, "Vehicle record created");
                self.notifier.success("Car added successfully");
                self.navigator.go_to(&self.redirect_path);
                Ok(SubmissionOutcome::succeeded())
            }
            TaskOutcome::Failed(e) => Ok(SubmissionOutcome::failed(e.to_string())),
            TaskOutcome::Superseded => Ok(SubmissionOutcome::failed(
                "Superseded by a newer submission",
            )),
            TaskOutcome::Detached => Ok(SubmissionOutcome::failed(
                "Session closed before the submission settled",
            )),
        }
    }
}
