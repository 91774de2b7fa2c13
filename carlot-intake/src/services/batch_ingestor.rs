//! Batch image ingestion
//!
//! **Pipeline:** Partition → Decode (bounded parallel) → Commit
//!
//! 1. Every candidate is size-checked on its own; oversized files get one
//!    warning each and drop out.
//! 2. Accepted files decode concurrently via `buffer_unordered`. Each result
//!    lands in a slot indexed by the file's original position, so completion
//!    order never leaks into the gallery.
//! 3. Once every slot has settled, successful slots are appended to the
//!    gallery in one step. Failed slots are reported per file; if nothing
//!    decoded, the gallery is untouched and the ingestor error is set.
//!
//! `prepare` returns an owned future, so the session can keep handling edits
//! while a batch decodes and `commit` it afterwards.

use crate::error::IntakeError;
use crate::models::{
    format_megabytes, Acceptance, CandidateImage, EncodedImage, FileCandidate, ImageGallery,
    MAX_IMAGE_BYTES,
};
use crate::types::{ImageDecoder, Notifier};
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Size limit and decode parallelism for one ingestor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestPolicy {
    /// Inclusive per-file limit
    pub max_image_bytes: u64,
    /// Concurrent decodes per batch
    pub decode_concurrency: usize,
}

impl Default for IngestPolicy {
    fn default() -> Self {
        Self {
            max_image_bytes: MAX_IMAGE_BYTES,
            decode_concurrency: 4,
        }
    }
}

/// Decoded batch waiting to be committed
#[derive(Debug)]
pub struct PreparedBatch {
    /// One slot per accepted file, in original order
    slots: Vec<(String, Result<EncodedImage, IntakeError>)>,
    /// Names of files rejected as oversized
    rejected: Vec<String>,
}

impl PreparedBatch {
    /// Number of files that passed the size check
    pub fn accepted_count(&self) -> usize {
        self.slots.len()
    }

    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }
}

/// What one batch did to the gallery
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Images appended to the gallery
    pub added: usize,
    /// Oversized files, in input order
    pub rejected: Vec<String>,
    /// Files that failed to decode, in input order
    pub failed: Vec<String>,
}

impl BatchReport {
    pub fn committed(&self) -> bool {
        self.added > 0
    }
}

/// Owns the gallery and its gallery-adjacent error message
pub struct BatchImageIngestor {
    gallery: ImageGallery,
    error: Option<String>,
    decoder: Arc<dyn ImageDecoder>,
    notifier: Arc<dyn Notifier>,
    policy: IngestPolicy,
}

impl BatchImageIngestor {
    pub fn new(
        decoder: Arc<dyn ImageDecoder>,
        notifier: Arc<dyn Notifier>,
        policy: IngestPolicy,
    ) -> Self {
        Self {
            gallery: ImageGallery::new(),
            error: None,
            decoder,
            notifier,
            policy,
        }
    }

    pub fn gallery(&self) -> &ImageGallery {
        &self.gallery
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn policy(&self) -> IngestPolicy {
        self.policy
    }

    /// Size-check and decode a batch, then commit it
    pub async fn submit(&mut self, files: Vec<FileCandidate>) -> BatchReport {
        let prepared = self.prepare(files).await;
        self.commit(prepared)
    }

    /// Size-check `files` now and return the decode work as an owned future
    ///
    /// Rejection warnings are emitted before this returns.
    pub fn prepare(
        &self,
        files: Vec<FileCandidate>,
    ) -> impl Future<Output = PreparedBatch> + Send + 'static {
        let limit = self.policy.max_image_bytes;
        let mut valid = Vec::with_capacity(files.len());
        let mut rejected = Vec::new();

        for file in files {
            let mut candidate = CandidateImage::new(file);
            match candidate.classify(limit) {
                Acceptance::RejectedTooLarge => {
                    warn!(
                        file = %candidate.file.name(),
                        bytes = candidate.file.size_bytes(),
                        limit,
                        "Rejected oversized image"
                    );
                    self.notifier.warning(&format!(
                        "{} exceeds {} limit and will be skipped",
                        candidate.file.name(),
                        format_megabytes(limit)
                    ));
                    rejected.push(candidate.file.name().to_string());
                }
                _ => valid.push(candidate.file),
            }
        }

        let decoder = Arc::clone(&self.decoder);
        let concurrency = self.policy.decode_concurrency.max(1);

        async move {
            let total = valid.len();
            let mut slots: Vec<Option<(String, Result<EncodedImage, IntakeError>)>> =
                (0..total).map(|_| None).collect();

            let results: Vec<(usize, String, Result<EncodedImage, IntakeError>)> =
                stream::iter(valid.into_iter().enumerate())
                    .map(move |(index, file)| {
                        let decoder = Arc::clone(&decoder);
                        async move {
                            let result = decoder.decode(&file).await;
                            debug!(file = %file.name(), index, ok = result.is_ok(), "Decode settled");
                            (index, file.name().to_string(), result)
                        }
                    })
                    .buffer_unordered(concurrency)
                    .collect()
                    .await;

            for (index, name, result) in results {
                slots[index] = Some((name, result));
            }

            PreparedBatch {
                slots: slots.into_iter().flatten().collect(),
                rejected,
            }
        }
    }

    /// Apply a prepared batch to the gallery as one append
    pub fn commit(&mut self, batch: PreparedBatch) -> BatchReport {
        let mut report = BatchReport {
            rejected: batch.rejected,
            ..BatchReport::default()
        };

        if batch.slots.is_empty() {
            debug!("No acceptable images in batch, nothing to commit");
            return report;
        }

        let mut decoded = Vec::with_capacity(batch.slots.len());
        for (name, result) in batch.slots {
            match result {
                Ok(image) => decoded.push(image),
                Err(e) => {
                    warn!(file = %name, error = %e, "Image decode failed");
                    self.notifier.warning(&e.to_string());
                    report.failed.push(name);
                }
            }
        }

        if decoded.is_empty() {
            self.error = Some("None of the selected images could be read".to_string());
            return report;
        }

        report.added = decoded.len();
        self.gallery.append_batch(decoded);
        self.error = None;

        info!(
            added = report.added,
            rejected = report.rejected.len(),
            failed = report.failed.len(),
            gallery_size = self.gallery.len(),
            "Committed image batch"
        );
        self.notifier
            .success(&format!("Successfully uploaded {} images", report.added));

        report
    }

    /// Append one image from the AI-assisted path
    pub fn promote(&mut self, image: EncodedImage) {
        self.gallery.promote(image);
        self.error = None;
        debug!(gallery_size = self.gallery.len(), "Promoted staged image");
    }

    /// Remove one gallery entry; `None` when `index` is out of range
    pub fn remove(&mut self, index: usize) -> Option<EncodedImage> {
        let removed = self.gallery.remove(index);
        if removed.is_none() {
            debug!(index, gallery_size = self.gallery.len(), "Remove index out of range");
        }
        removed
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::mock::{NameDecoder, RecordingNotifier};
    use carlot_common::events::NoticeLevel;

    fn ingestor(
        failing: &[&str],
        max_image_bytes: u64,
    ) -> (BatchImageIngestor, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let decoder = NameDecoder {
            failing: failing.iter().map(|s| s.to_string()).collect(),
        };
        let policy = IngestPolicy {
            max_image_bytes,
            decode_concurrency: 2,
        };
        (
            BatchImageIngestor::new(Arc::new(decoder), notifier.clone(), policy),
            notifier,
        )
    }

    fn file(name: &str, size: usize) -> FileCandidate {
        FileCandidate::new(name, "image/png", vec![0u8; size])
    }

    fn names(gallery: &ImageGallery) -> Vec<String> {
        gallery
            .iter()
            .map(|i| i.as_str().trim_start_matches("data:image/png;base64,").to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_oversized_file_skipped_with_warning() {
        let (mut ingestor, notifier) = ingestor(&[], 10);

        let report = ingestor
            .submit(vec![file("a.png", 5), file("big.png", 11), file("c.png", 10)])
            .await;

        assert_eq!(report.added, 2);
        assert_eq!(report.rejected, vec!["big.png".to_string()]);
        assert_eq!(names(ingestor.gallery()), vec!["a.png", "c.png"]);
        assert_eq!(notifier.messages(NoticeLevel::Warning).len(), 1);
        assert_eq!(
            notifier.messages(NoticeLevel::Success),
            vec!["Successfully uploaded 2 images".to_string()]
        );
    }

    #[tokio::test]
    async fn test_all_oversized_changes_nothing() {
        let (mut ingestor, notifier) = ingestor(&[], 1);
        ingestor.set_error("Please upload at least one image");

        let report = ingestor.submit(vec![file("x.png", 2)]).await;

        assert!(!report.committed());
        assert!(ingestor.gallery().is_empty());
        assert_eq!(ingestor.error(), Some("Please upload at least one image"));
        assert!(notifier.messages(NoticeLevel::Success).is_empty());
    }

    #[tokio::test]
    async fn test_decode_failure_commits_remaining_slots() {
        let (mut ingestor, notifier) = ingestor(&["b.png"], 100);

        let report = ingestor
            .submit(vec![file("a.png", 1), file("b.png", 1), file("c.png", 1)])
            .await;

        assert_eq!(report.failed, vec!["b.png".to_string()]);
        assert_eq!(names(ingestor.gallery()), vec!["a.png", "c.png"]);
        assert_eq!(
            notifier.messages(NoticeLevel::Warning),
            vec!["Failed to read b.png: Mock failure".to_string()]
        );
    }

    #[tokio::test]
    async fn test_all_decodes_failing_sets_error() {
        let (mut ingestor, _) = ingestor(&["a.png"], 100);

        let report = ingestor.submit(vec![file("a.png", 1)]).await;

        assert!(!report.committed());
        assert!(ingestor.gallery().is_empty());
        assert!(ingestor.error().is_some());
    }

    #[tokio::test]
    async fn test_commit_and_promote_clear_error() {
        let (mut ingestor, _) = ingestor(&[], 100);
        ingestor.set_error("Please upload at least one image");
        ingestor.submit(vec![file("a.png", 1)]).await;
        assert_eq!(ingestor.error(), None);

        ingestor.set_error("Please upload at least one image");
        ingestor.promote(EncodedImage::from_data_uri("data:image/png;base64,ai"));
        assert_eq!(ingestor.error(), None);
        assert_eq!(ingestor.gallery().len(), 2);
    }

    #[tokio::test]
    async fn test_prepared_batch_is_detached_from_ingestor() {
        let (mut ingestor, _) = ingestor(&[], 100);
        let pending = ingestor.prepare(vec![file("a.png", 1), file("b.png", 1)]);

        ingestor.promote(EncodedImage::from_data_uri("data:image/png;base64,ai"));
        let batch = pending.await;
        assert_eq!(batch.accepted_count(), 2);

        ingestor.commit(batch);
        assert_eq!(names(ingestor.gallery()), vec!["ai", "a.png", "b.png"]);
    }
}
