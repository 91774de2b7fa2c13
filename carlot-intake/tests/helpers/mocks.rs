//! Mock collaborators with controllable latency and call recording

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use carlot_common::events::{EventBus, NoticeLevel};
use carlot_intake::models::{
    CreateAck, CreateVehicleRequest, EncodedImage, FileCandidate, InferredVehicle,
};
use carlot_intake::types::{ImageDecoder, InferenceService, Navigator, Notifier, RecordService};
use carlot_intake::validators::FormValidator;
use carlot_intake::workflow::{Collaborators, IntakeSession, SessionSettings};
use carlot_intake::IntakeError;

use super::fixtures::{camry, TEST_YEAR};

// ============================================================================
// Notification and navigation
// ============================================================================

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<(NoticeLevel, String, Option<String>)>>,
}

impl RecordingNotifier {
    pub fn messages(&self, level: NoticeLevel) -> Vec<String> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _, _)| *l == level)
            .map(|(_, m, _)| m.clone())
            .collect()
    }

    pub fn details(&self, level: NoticeLevel) -> Vec<String> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _, _)| *l == level)
            .filter_map(|(_, _, d)| d.clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.notices.lock().unwrap().len()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str, detail: Option<&str>) {
        self.notices
            .lock()
            .unwrap()
            .push((level, message.to_string(), detail.map(str::to_string)));
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    paths: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn go_to(&self, path: &str) {
        self.paths.lock().unwrap().push(path.to_string());
    }
}

// ============================================================================
// Image decoding
// ============================================================================

/// Decoder with per-file latency and failure injection
///
/// Encodes the file name as the payload so gallery order is easy to read.
#[derive(Default)]
pub struct LatencyDecoder {
    delays: HashMap<String, Duration>,
    failing: HashSet<String>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl LatencyDecoder {
    pub fn with_delays(delays: &[(&str, u64)]) -> Self {
        Self {
            delays: delays
                .iter()
                .map(|(name, ms)| (name.to_string(), Duration::from_millis(*ms)))
                .collect(),
            ..Self::default()
        }
    }

    pub fn failing(mut self, names: &[&str]) -> Self {
        self.failing = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn payload(image: &EncodedImage) -> &str {
        image
            .as_str()
            .split_once(',')
            .map(|(_, payload)| payload)
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl ImageDecoder for LatencyDecoder {
    async fn decode(&self, file: &FileCandidate) -> Result<EncodedImage, IntakeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(file.name()) {
            tokio::time::sleep(*delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(file.name()) {
            return Err(IntakeError::Decode {
                name: file.name().to_string(),
                reason: "corrupt image data".to_string(),
            });
        }

        Ok(EncodedImage::from_data_uri(format!(
            "data:image/png;base64,{}",
            file.name()
        )))
    }
}

// ============================================================================
// Inference and records
// ============================================================================

pub struct MockInference {
    response: Mutex<Result<InferredVehicle, String>>,
    delay: Mutex<Duration>,
    calls: AtomicUsize,
}

impl MockInference {
    pub fn succeeding(vehicle: InferredVehicle) -> Self {
        Self {
            response: Mutex::new(Ok(vehicle)),
            delay: Mutex::new(Duration::ZERO),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        let mock = Self::succeeding(camry());
        *mock.response.lock().unwrap() = Err(message.to_string());
        mock
    }

    pub fn set_response(&self, response: Result<InferredVehicle, String>) {
        *self.response.lock().unwrap() = response;
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl InferenceService for MockInference {
    async fn infer(&self, _image: &FileCandidate) -> Result<InferredVehicle, IntakeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let response = self.response.lock().unwrap().clone();
        response.map_err(|message| IntakeError::Collaborator {
            service: "inference",
            message,
        })
    }
}

pub struct MockRecords {
    ack: Mutex<Result<CreateAck, String>>,
    requests: Mutex<Vec<CreateVehicleRequest>>,
}

impl MockRecords {
    pub fn accepting() -> Self {
        Self {
            ack: Mutex::new(Ok(CreateAck {
                success: true,
                id: Some("car-1".to_string()),
                error: None,
            })),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Service answers `{ success: false, error }`
    pub fn rejecting(error: &str) -> Self {
        let mock = Self::accepting();
        *mock.ack.lock().unwrap() = Ok(CreateAck {
            success: false,
            id: None,
            error: Some(error.to_string()),
        });
        mock
    }

    /// Call fails before any acknowledgement
    pub fn unreachable(message: &str) -> Self {
        let mock = Self::accepting();
        *mock.ack.lock().unwrap() = Err(message.to_string());
        mock
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<CreateVehicleRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait::async_trait]
impl RecordService for MockRecords {
    async fn create(&self, request: &CreateVehicleRequest) -> Result<CreateAck, IntakeError> {
        self.requests.lock().unwrap().push(request.clone());
        self.ack
            .lock()
            .unwrap()
            .clone()
            .map_err(|message| IntakeError::Collaborator {
                service: "records",
                message,
            })
    }
}

// ============================================================================
// Session harness
// ============================================================================

/// Mocks wired into an `IntakeSession`, kept for assertions
pub struct Harness {
    pub notifier: Arc<RecordingNotifier>,
    pub navigator: Arc<RecordingNavigator>,
    pub inference: Arc<MockInference>,
    pub records: Arc<MockRecords>,
    pub decoder: Arc<LatencyDecoder>,
    pub bus: EventBus,
    pub settings: SessionSettings,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(MockInference::succeeding(camry()), MockRecords::accepting())
    }

    pub fn with(inference: MockInference, records: MockRecords) -> Self {
        Self {
            notifier: Arc::new(RecordingNotifier::default()),
            navigator: Arc::new(RecordingNavigator::default()),
            inference: Arc::new(inference),
            records: Arc::new(records),
            decoder: Arc::new(LatencyDecoder::default()),
            bus: EventBus::new(64),
            settings: SessionSettings::default(),
        }
    }

    pub fn decoder(mut self, decoder: LatencyDecoder) -> Self {
        self.decoder = Arc::new(decoder);
        self
    }

    pub fn settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn session(&self) -> IntakeSession {
        let collaborators = Collaborators {
            inference: self.inference.clone(),
            records: self.records.clone(),
            decoder: self.decoder.clone(),
            notifier: self.notifier.clone(),
            navigator: self.navigator.clone(),
        };
        IntakeSession::new(collaborators, self.settings.clone())
            .with_event_bus(self.bus.clone())
            .with_validator(FormValidator::with_current_year(TEST_YEAR))
    }
}
