//! Service modules for the intake workflow
//!
//! - Image handling: `image_decoder`, `batch_ingestor`, `image_stager`
//! - HTTP collaborators: `inference_client`, `record_client`
//! - Event plumbing: `notifier`

pub mod batch_ingestor;
pub mod image_decoder;
pub mod image_stager;
pub mod inference_client;
pub mod notifier;
pub mod record_client;

pub use batch_ingestor::{BatchImageIngestor, BatchReport, IngestPolicy, PreparedBatch};
pub use image_decoder::{DataUriDecoder, ACCEPTED_MIME_TYPES};
pub use image_stager::{PreviewJob, PreviewReady, SingleImageStager, StagedImage, StagedSnapshot};
pub use inference_client::{HttpInferenceClient, InferenceClientError};
pub use notifier::{run_event_logger, BusNotifier};
pub use record_client::{HttpRecordClient, RecordClientError};
