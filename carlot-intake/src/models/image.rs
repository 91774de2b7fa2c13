//! Candidate files, encoded images and the ordered gallery

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Default per-file upload limit (5 MiB)
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

const MIB: u64 = 1024 * 1024;

/// Render a byte limit the way notices show it ("5MB")
pub fn format_megabytes(bytes: u64) -> String {
    if bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{:.1}MB", bytes as f64 / MIB as f64)
    }
}

/// A file selected or dropped by the operator
///
/// The payload is shared, so cloning a candidate never copies image bytes.
#[derive(Debug, Clone)]
pub struct FileCandidate {
    name: String,
    mime_type: String,
    data: Arc<[u8]>,
}

impl FileCandidate {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Read a file from disk
    ///
    /// MIME type comes from content sniffing, falling back to the extension.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let data = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mime_type = infer::get(&data)
            .map(|kind| kind.mime_type().to_string())
            .unwrap_or_else(|| mime_from_extension(path).to_string());

        tracing::debug!(file = %name, mime = %mime_type, bytes = data.len(), "Loaded file candidate");

        Ok(Self::new(name, mime_type, data))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// MIME type declared by the source of the file
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Shared handle to the payload, for moving into blocking tasks
    pub fn shared_data(&self) -> Arc<[u8]> {
        Arc::clone(&self.data)
    }

    pub fn size_bytes(&self) -> u64 {
        self.data.len() as u64
    }

    /// Limit is inclusive: a file of exactly `limit` bytes fits
    pub fn exceeds(&self, limit: u64) -> bool {
        self.size_bytes() > limit
    }
}

fn mime_from_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Size-check state of a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    Pending,
    Accepted,
    RejectedTooLarge,
}

/// Candidate file plus its size-check state
#[derive(Debug, Clone)]
pub struct CandidateImage {
    pub file: FileCandidate,
    pub acceptance: Acceptance,
}

impl CandidateImage {
    pub fn new(file: FileCandidate) -> Self {
        Self {
            file,
            acceptance: Acceptance::Pending,
        }
    }

    /// Resolve Pending into Accepted or RejectedTooLarge
    pub fn classify(&mut self, limit: u64) -> Acceptance {
        self.acceptance = if self.file.exceeds(limit) {
            Acceptance::RejectedTooLarge
        } else {
            Acceptance::Accepted
        };
        self.acceptance
    }
}

/// Image representation handed to the gallery and the record service
///
/// Holds a `data:<mime>;base64,<payload>` URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedImage(String);

impl EncodedImage {
    pub fn from_data_uri(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// MIME type embedded in the data URI, if well formed
    pub fn mime_type(&self) -> Option<&str> {
        let rest = self.0.strip_prefix("data:")?;
        let end = rest.find(';')?;
        Some(&rest[..end])
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for EncodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Payloads run to megabytes; show the header only
        let header_end = self.0.find(',').unwrap_or(self.0.len());
        write!(f, "{}… ({} chars)", &self.0[..header_end], self.0.len())
    }
}

/// Ordered set of accepted images attached to the record
///
/// Only three mutations exist: batch append, single promote, remove by index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageGallery {
    images: Vec<EncodedImage>,
}

impl ImageGallery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&EncodedImage> {
        self.images.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EncodedImage> {
        self.images.iter()
    }

    pub fn as_slice(&self) -> &[EncodedImage] {
        &self.images
    }

    pub fn to_vec(&self) -> Vec<EncodedImage> {
        self.images.clone()
    }

    /// Append a whole batch in the given order
    pub fn append_batch(&mut self, batch: Vec<EncodedImage>) {
        self.images.extend(batch);
    }

    /// Append a single image (AI promotion path)
    pub fn promote(&mut self, image: EncodedImage) {
        self.images.push(image);
    }

    /// Remove one entry; later entries shift down by one
    pub fn remove(&mut self, index: usize) -> Option<EncodedImage> {
        if index < self.images.len() {
            Some(self.images.remove(index))
        } else {
            None
        }
    }
}
