//! Intake session controller
//!
//! One `IntakeSession` owns everything a single "add vehicle" workflow
//! mutates: the form, the gallery, the staged AI image and the active entry
//! surface. Both entry surfaces edit the same `FormState`; switching surfaces
//! never copies or resets it.
//!
//! Gallery and surface changes are published as `CarlotEvent`s when an
//! `EventBus` is attached.

use crate::error::IntakeResult;
use crate::models::{
    CreateAck, EncodedImage, FileCandidate, FormState, ImageGallery, InferredVehicle,
    SubmissionOutcome, VehicleField, MAX_IMAGE_BYTES,
};
use crate::services::{
    BatchImageIngestor, BatchReport, IngestPolicy, PreparedBatch, PreviewJob, PreviewReady,
    SingleImageStager, StagedImage,
};
use crate::types::{ImageDecoder, InferenceService, Navigator, Notifier, RecordService};
use crate::utils::TaskState;
use crate::validators::FormValidator;
use crate::workflow::reconciler::{InferenceReconciler, ReconcileOutcome, SettledExtraction};
use crate::workflow::submission::{SubmissionController, DEFAULT_REDIRECT_PATH};
use carlot_common::events::{CarlotEvent, EntrySurface, EventBus, GalleryChangeTrigger};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// External collaborators of one session
#[derive(Clone)]
pub struct Collaborators {
    pub inference: Arc<dyn InferenceService>,
    pub records: Arc<dyn RecordService>,
    pub decoder: Arc<dyn ImageDecoder>,
    pub notifier: Arc<dyn Notifier>,
    pub navigator: Arc<dyn Navigator>,
}

/// Tunables of one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Inclusive per-file limit for both the gallery and the staged image
    pub max_image_bytes: u64,
    /// Concurrent decodes per gallery batch
    pub decode_concurrency: usize,
    /// Navigation target after a successful submission
    pub redirect_path: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_image_bytes: MAX_IMAGE_BYTES,
            decode_concurrency: IngestPolicy::default().decode_concurrency,
            redirect_path: DEFAULT_REDIRECT_PATH.to_string(),
        }
    }
}

pub struct IntakeSession {
    session_id: Uuid,
    form: FormState,
    surface: EntrySurface,
    ingestor: BatchImageIngestor,
    stager: SingleImageStager,
    reconciler: InferenceReconciler,
    submitter: SubmissionController,
    event_bus: Option<EventBus>,
}

impl IntakeSession {
    pub fn new(collaborators: Collaborators, settings: SessionSettings) -> Self {
        Self::with_id(Uuid::new_v4(), collaborators, settings)
    }

    pub fn with_id(
        session_id: Uuid,
        collaborators: Collaborators,
        settings: SessionSettings,
    ) -> Self {
        let Collaborators {
            inference,
            records,
            decoder,
            notifier,
            navigator,
        } = collaborators;

        let policy = IngestPolicy {
            max_image_bytes: settings.max_image_bytes,
            decode_concurrency: settings.decode_concurrency,
        };

        debug!(session_id = %session_id, ?policy, "Intake session created");

        Self {
            session_id,
            form: FormState::new(),
            surface: EntrySurface::default(),
            ingestor: BatchImageIngestor::new(Arc::clone(&decoder), Arc::clone(&notifier), policy),
            stager: SingleImageStager::with_limit(
                decoder,
                Arc::clone(&notifier),
                settings.max_image_bytes,
            ),
            reconciler: InferenceReconciler::new(inference, Arc::clone(&notifier)),
            submitter: SubmissionController::new(
                records,
                navigator,
                notifier,
                FormValidator::new(),
                settings.redirect_path,
            ),
            event_bus: None,
        }
    }

    /// Publish gallery and surface changes on `bus`
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Replace the validator (e.g. to pin the current year)
    pub fn with_validator(mut self, validator: FormValidator) -> Self {
        self.submitter.set_validator(validator);
        self
    }

    // ========================================================================
    // Observable state
    // ========================================================================

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn surface(&self) -> EntrySurface {
        self.surface
    }

    pub fn gallery(&self) -> &ImageGallery {
        self.ingestor.gallery()
    }

    /// Gallery-adjacent error ("Please upload at least one image")
    pub fn gallery_error(&self) -> Option<&str> {
        self.ingestor.error()
    }

    pub fn staged_image(&self) -> Option<&StagedImage> {
        self.stager.staged()
    }

    pub fn inference_state(&self) -> TaskState<InferredVehicle> {
        self.reconciler.task().snapshot()
    }

    pub fn submission_state(&self) -> TaskState<CreateAck> {
        self.submitter.task().snapshot()
    }

    pub fn watch_inference(&self) -> tokio::sync::watch::Receiver<TaskState<InferredVehicle>> {
        self.reconciler.task().subscribe()
    }

    pub fn watch_submission(&self) -> tokio::sync::watch::Receiver<TaskState<CreateAck>> {
        self.submitter.task().subscribe()
    }

    // ========================================================================
    // Form editing
    // ========================================================================

    /// Store an operator edit; later edits always win over a prefill
    pub fn set_field(&mut self, field: VehicleField, value: &str) -> IntakeResult<()> {
        self.form.set(field, value)
    }

    /// On-blur check of one field
    pub fn validate_field(&self, field: VehicleField) -> Option<String> {
        self.submitter.validator().validate_field(&self.form, field)
    }

    pub fn switch_surface(&mut self, surface: EntrySurface) {
        self.set_surface(surface);
    }

    // ========================================================================
    // AI-assisted path
    // ========================================================================

    /// Stage one image for inference and decode its preview
    pub async fn stage_ai_image(&mut self, file: FileCandidate) -> IntakeResult<()> {
        let job = self.prepare_ai_image(file)?;
        let ready = job.run().await;
        self.accept_preview(ready);
        Ok(())
    }

    /// Stage one image; the returned job decodes its preview off the session
    pub fn prepare_ai_image(&mut self, file: FileCandidate) -> IntakeResult<PreviewJob> {
        self.stager.stage(file)
    }

    /// Attach a decoded preview; false when its stage was replaced or cleared
    pub fn accept_preview(&mut self, ready: PreviewReady) -> bool {
        self.stager.accept_preview(ready)
    }

    pub fn clear_ai_image(&mut self) {
        self.stager.clear();
    }

    /// Run inference on the staged image and reconcile the result
    pub async fn extract_details(&mut self) -> IntakeResult<ReconcileOutcome> {
        let settled = self.prepare_extraction()?.await;
        self.apply_extraction(settled)
    }

    /// Start inference on the staged image without holding the session
    ///
    /// Fails before any call when nothing is staged.
    pub fn prepare_extraction(
        &self,
    ) -> IntakeResult<impl Future<Output = SettledExtraction> + Send + 'static> {
        self.reconciler.prepare(&self.stager)
    }

    /// Apply a settled extraction
    ///
    /// Mapped fields are overwritten, including edits made while the call was
    /// in flight; unmapped fields keep their values.
    pub fn apply_extraction(&mut self, settled: SettledExtraction) -> IntakeResult<ReconcileOutcome> {
        let gallery_before = self.ingestor.gallery().len();
        let mut surface = self.surface;

        let outcome =
            self.reconciler
                .apply(settled, &mut self.form, &mut self.ingestor, &mut surface)?;

        if self.ingestor.gallery().len() != gallery_before {
            self.emit_gallery_changed(GalleryChangeTrigger::Promoted);
        }
        self.set_surface(surface);

        Ok(outcome)
    }

    // ========================================================================
    // Gallery
    // ========================================================================

    /// Size-check, decode and commit a batch of gallery images
    pub async fn add_images(&mut self, files: Vec<FileCandidate>) -> BatchReport {
        let prepared = self.prepare_images(files);
        self.commit_images(prepared.await)
    }

    /// Start decoding a batch without holding the session
    pub fn prepare_images(
        &self,
        files: Vec<FileCandidate>,
    ) -> impl Future<Output = PreparedBatch> + Send + 'static {
        self.ingestor.prepare(files)
    }

    pub fn commit_images(&mut self, batch: PreparedBatch) -> BatchReport {
        let report = self.ingestor.commit(batch);
        if report.committed() {
            self.emit_gallery_changed(GalleryChangeTrigger::BatchCommitted);
        }
        report
    }

    /// Remove one gallery entry; `None` when out of range
    pub fn remove_image(&mut self, index: usize) -> Option<EncodedImage> {
        let removed = self.ingestor.remove(index);
        if removed.is_some() {
            self.emit_gallery_changed(GalleryChangeTrigger::Removed);
        }
        removed
    }

    // ========================================================================
    // Submission
    // ========================================================================

    /// Validate and create the record
    ///
    /// The form is never modified, whatever the outcome.
    pub async fn submit(&mut self) -> IntakeResult<SubmissionOutcome> {
        let outcome = self.submitter.submit(&self.form, &mut self.ingestor).await?;
        info!(
            session_id = %self.session_id,
            success = outcome.success,
            "Submission settled"
        );
        Ok(outcome)
    }

    /// Stop applying results of in-flight calls
    pub fn close(&self) {
        self.reconciler.task().detach();
        self.submitter.task().detach();
    }

    fn set_surface(&mut self, surface: EntrySurface) {
        if surface == self.surface {
            return;
        }
        let old_surface = self.surface;
        self.surface = surface;
        debug!(session_id = %self.session_id, %old_surface, new_surface = %surface, "Surface switched");

        if let Some(bus) = &self.event_bus {
            bus.emit_lossy(CarlotEvent::SurfaceChanged {
                session_id: self.session_id,
                old_surface,
                new_surface: surface,
                timestamp: chrono::Utc::now(),
            });
        }
    }

    fn emit_gallery_changed(&self, trigger: GalleryChangeTrigger) {
        if let Some(bus) = &self.event_bus {
            bus.emit_lossy(CarlotEvent::GalleryChanged {
                session_id: self.session_id,
                count: self.ingestor.gallery().len(),
                trigger,
                timestamp: chrono::Utc::now(),
            });
        }
    }
}

impl Drop for IntakeSession {
    fn drop(&mut self) {
        self.close();
    }
}
