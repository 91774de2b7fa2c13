//! Single image staging for AI-assisted entry
//!
//! Holds at most one candidate, independent of the gallery. Each stage bumps a
//! generation counter; a preview decoded for an older generation is dropped,
//! so a slow preview can never attach to a newer (or cleared) stage.

use crate::error::IntakeError;
use crate::models::{format_megabytes, EncodedImage, FileCandidate, MAX_IMAGE_BYTES};
use crate::types::{ImageDecoder, Notifier};
use std::sync::Arc;
use tracing::{debug, warn};

/// The staged candidate and its preview, once decoded
#[derive(Debug, Clone)]
pub struct StagedImage {
    pub file: FileCandidate,
    pub preview: Option<EncodedImage>,
}

/// Preview decode for one stage generation
pub struct PreviewJob {
    generation: u64,
    file: FileCandidate,
    decoder: Arc<dyn ImageDecoder>,
}

impl PreviewJob {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub async fn run(self) -> PreviewReady {
        PreviewReady {
            generation: self.generation,
            result: self.decoder.decode(&self.file).await,
        }
    }
}

/// Settled preview decode
#[derive(Debug)]
pub struct PreviewReady {
    generation: u64,
    result: Result<EncodedImage, IntakeError>,
}

pub struct SingleImageStager {
    staged: Option<StagedImage>,
    generation: u64,
    decoder: Arc<dyn ImageDecoder>,
    notifier: Arc<dyn Notifier>,
    max_image_bytes: u64,
}

impl SingleImageStager {
    pub fn new(decoder: Arc<dyn ImageDecoder>, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_limit(decoder, notifier, MAX_IMAGE_BYTES)
    }

    pub fn with_limit(
        decoder: Arc<dyn ImageDecoder>,
        notifier: Arc<dyn Notifier>,
        max_image_bytes: u64,
    ) -> Self {
        Self {
            staged: None,
            generation: 0,
            decoder,
            notifier,
            max_image_bytes,
        }
    }

    /// Make `file` the sole staged image
    ///
    /// Oversized files are refused with a warning and leave any current stage
    /// in place. The returned job decodes the preview; hand its output to
    /// [`accept_preview`](Self::accept_preview).
    pub fn stage(&mut self, file: FileCandidate) -> Result<PreviewJob, IntakeError> {
        if file.exceeds(self.max_image_bytes) {
            warn!(
                file = %file.name(),
                bytes = file.size_bytes(),
                limit = self.max_image_bytes,
                "Rejected oversized AI image"
            );
            self.notifier.warning(&format!(
                "Image size should be less than {}",
                format_megabytes(self.max_image_bytes)
            ));
            return Err(IntakeError::FileTooLarge {
                name: file.name().to_string(),
                size: file.size_bytes(),
                limit: self.max_image_bytes,
            });
        }

        self.generation += 1;
        debug!(file = %file.name(), generation = self.generation, "Staged AI image");
        self.staged = Some(StagedImage {
            file: file.clone(),
            preview: None,
        });

        Ok(PreviewJob {
            generation: self.generation,
            file,
            decoder: Arc::clone(&self.decoder),
        })
    }

    /// Attach a settled preview if its stage is still current
    ///
    /// Returns true when the preview was applied.
    pub fn accept_preview(&mut self, ready: PreviewReady) -> bool {
        if ready.generation != self.generation {
            debug!(
                preview_generation = ready.generation,
                current_generation = self.generation,
                "Dropped stale preview"
            );
            return false;
        }

        let Some(staged) = self.staged.as_mut() else {
            return false;
        };

        match ready.result {
            Ok(preview) => {
                staged.preview = Some(preview);
                true
            }
            Err(e) => {
                warn!(file = %staged.file.name(), error = %e, "Preview decode failed");
                self.notifier.warning(&e.to_string());
                false
            }
        }
    }

    /// Stage and decode the preview in one step
    pub async fn stage_and_preview(&mut self, file: FileCandidate) -> Result<(), IntakeError> {
        let job = self.stage(file)?;
        let ready = job.run().await;
        self.accept_preview(ready);
        Ok(())
    }

    /// Drop the staged image and its preview; a no-op when nothing is staged
    pub fn clear(&mut self) {
        if self.staged.take().is_some() {
            self.generation += 1;
            debug!(generation = self.generation, "Cleared AI image");
        }
    }

    pub fn staged(&self) -> Option<&StagedImage> {
        self.staged.as_ref()
    }

    pub fn staged_file(&self) -> Option<&FileCandidate> {
        self.staged.as_ref().map(|s| &s.file)
    }

    pub fn preview(&self) -> Option<&EncodedImage> {
        self.staged.as_ref().and_then(|s| s.preview.as_ref())
    }

    /// Owned copy of the current stage, usable after the stager moves on
    pub fn snapshot(&self) -> Option<StagedSnapshot> {
        let staged = self.staged.as_ref()?;
        Some(StagedSnapshot {
            generation: self.generation,
            staged: staged.clone(),
            decoder: Arc::clone(&self.decoder),
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Detached copy of one stage generation
pub struct StagedSnapshot {
    generation: u64,
    staged: StagedImage,
    decoder: Arc<dyn ImageDecoder>,
}

impl StagedSnapshot {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn file(&self) -> &FileCandidate {
        &self.staged.file
    }

    /// Gallery representation of the staged image
    ///
    /// Reuses the preview when it had already been decoded.
    pub async fn representation(&self) -> Result<EncodedImage, IntakeError> {
        match &self.staged.preview {
            Some(preview) => Ok(preview.clone()),
            None => self.decoder.decode(&self.staged.file).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::mock::{NameDecoder, RecordingNotifier};
    use carlot_common::events::NoticeLevel;

    fn stager(limit: u64) -> (SingleImageStager, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        (
            SingleImageStager::with_limit(Arc::new(NameDecoder::default()), notifier.clone(), limit),
            notifier,
        )
    }

    fn file(name: &str, size: usize) -> FileCandidate {
        FileCandidate::new(name, "image/png", vec![0u8; size])
    }

    #[tokio::test]
    async fn test_stage_decodes_preview() {
        let (mut stager, _) = stager(10);
        stager.stage_and_preview(file("car.png", 4)).await.unwrap();

        assert_eq!(stager.staged_file().map(|f| f.name()), Some("car.png"));
        assert_eq!(
            stager.preview().map(|p| p.as_str()),
            Some("data:image/png;base64,car.png")
        );
    }

    #[tokio::test]
    async fn test_oversized_keeps_previous_stage() {
        let (mut stager, notifier) = stager(10);
        stager.stage_and_preview(file("car.png", 4)).await.unwrap();

        let err = stager.stage(file("huge.png", 11)).err().unwrap();
        assert!(matches!(err, IntakeError::FileTooLarge { .. }));
        assert_eq!(stager.staged_file().map(|f| f.name()), Some("car.png"));
        assert_eq!(notifier.messages(NoticeLevel::Warning).len(), 1);
    }

    #[tokio::test]
    async fn test_stale_preview_dropped() {
        let (mut stager, _) = stager(10);
        let first = stager.stage(file("first.png", 1)).unwrap();
        let second = stager.stage(file("second.png", 1)).unwrap();

        let late_first = first.run().await;
        assert!(!stager.accept_preview(late_first));
        assert!(stager.preview().is_none());

        assert!(stager.accept_preview(second.run().await));
        assert_eq!(stager.staged_file().map(|f| f.name()), Some("second.png"));
    }

    #[tokio::test]
    async fn test_preview_after_clear_dropped() {
        let (mut stager, _) = stager(10);
        let job = stager.stage(file("car.png", 1)).unwrap();
        stager.clear();

        assert!(!stager.accept_preview(job.run().await));
        assert!(stager.staged().is_none());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (mut stager, _) = stager(10);
        let _job = stager.stage(file("car.png", 1)).unwrap();

        stager.clear();
        let generation = stager.generation;
        stager.clear();
        assert_eq!(stager.generation, generation);
        assert!(stager.staged().is_none());
    }

    #[tokio::test]
    async fn test_representation_falls_back_to_decode() {
        let (mut stager, _) = stager(10);
        assert!(stager.snapshot().is_none());

        let _job = stager.stage(file("car.png", 1)).unwrap();
        let snapshot = stager.snapshot().unwrap();
        let image = snapshot.representation().await.unwrap();
        assert_eq!(image.as_str(), "data:image/png;base64,car.png");
    }

    #[tokio::test]
    async fn test_snapshot_outlives_clear() {
        let (mut stager, _) = stager(10);
        stager.stage_and_preview(file("car.png", 1)).await.unwrap();
        let snapshot = stager.snapshot().unwrap();

        stager.clear();

        assert_ne!(snapshot.generation(), stager.generation());
        assert_eq!(snapshot.file().name(), "car.png");
        assert_eq!(
            snapshot.representation().await.unwrap().as_str(),
            "data:image/png;base64,car.png"
        );
    }
}
