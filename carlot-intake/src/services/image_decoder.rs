//! Data URI image decoder
//!
//! Turns a candidate file into the `data:<mime>;base64,<payload>` form the
//! gallery and record service carry. Encoding runs on the blocking pool since
//! a 5MB payload is several milliseconds of CPU.

use crate::error::IntakeError;
use crate::models::{EncodedImage, FileCandidate};
use crate::types::ImageDecoder;
use base64::{engine::general_purpose, Engine as _};
use tracing::debug;

/// Image formats the marketplace accepts
pub const ACCEPTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// Default decoder: sniff, check format, base64-encode
#[derive(Debug, Clone, Default)]
pub struct DataUriDecoder;

impl DataUriDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Content type of `file`
    ///
    /// Magic bytes win over the declared MIME type; the declared type is only
    /// used when sniffing finds nothing.
    pub fn detect_mime(file: &FileCandidate) -> String {
        infer::get(file.data())
            .map(|kind| kind.mime_type().to_string())
            .unwrap_or_else(|| file.mime_type().to_ascii_lowercase())
    }
}

#[async_trait::async_trait]
impl ImageDecoder for DataUriDecoder {
    async fn decode(&self, file: &FileCandidate) -> Result<EncodedImage, IntakeError> {
        let mime = Self::detect_mime(file);
        if !ACCEPTED_MIME_TYPES.contains(&mime.as_str()) {
            return Err(IntakeError::Decode {
                name: file.name().to_string(),
                reason: format!("unsupported image type {}", mime),
            });
        }

        let data = file.shared_data();
        let name = file.name().to_string();

        let payload = tokio::task::spawn_blocking(move || general_purpose::STANDARD.encode(&data))
            .await
            .map_err(|e| IntakeError::Decode {
                name: name.clone(),
                reason: format!("encoder task failed: {}", e),
            })?;

        debug!(file = %name, mime = %mime, bytes = file.size_bytes(), "Decoded image");

        Ok(EncodedImage::from_data_uri(format!(
            "data:{};base64,{}",
            mime, payload
        )))
    }
}
