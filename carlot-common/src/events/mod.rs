//! Event types for the Carlot event system
//!
//! Provides shared event definitions and EventBus for all Carlot tools.

mod intake_types;

pub use intake_types::{EntrySurface, GalleryChangeTrigger, NoticeLevel};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Carlot event types
///
/// Events are broadcast via EventBus and can be serialized for transmission to
/// whatever surface renders the intake workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CarlotEvent {
    /// User-facing notice (toast)
    ///
    /// Fire-and-forget: nothing consumes a response.
    Notice {
        /// Intake session that raised the notice
        session_id: Uuid,
        /// Severity
        level: NoticeLevel,
        /// Headline message
        message: String,
        /// Optional secondary line
        detail: Option<String>,
        /// When the notice was raised
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Gallery contents changed
    GalleryChanged {
        session_id: Uuid,
        /// Number of images after the change
        count: usize,
        trigger: GalleryChangeTrigger,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Active editing surface switched
    SurfaceChanged {
        session_id: Uuid,
        old_surface: EntrySurface,
        new_surface: EntrySurface,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Navigation requested after a successful submission
    NavigationRequested {
        session_id: Uuid,
        /// Destination path (e.g. "/admin/cars")
        path: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl CarlotEvent {
    /// Session the event belongs to
    pub fn session_id(&self) -> Uuid {
        match self {
            CarlotEvent::Notice { session_id, .. }
            | CarlotEvent::GalleryChanged { session_id, .. }
            | CarlotEvent::SurfaceChanged { session_id, .. }
            | CarlotEvent::NavigationRequested { session_id, .. } => *session_id,
        }
    }

    /// Event type name, matching the serialized `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            CarlotEvent::Notice { .. } => "Notice",
            CarlotEvent::GalleryChanged { .. } => "GalleryChanged",
            CarlotEvent::SurfaceChanged { .. } => "SurfaceChanged",
            CarlotEvent::NavigationRequested { .. } => "NavigationRequested",
        }
    }
}

/// Broadcast bus for CarlotEvent
///
/// Cloning the bus yields another handle onto the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CarlotEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    ///
    /// # Examples
    ///
    /// ```
    /// use carlot_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<CarlotEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: CarlotEvent,
    ) -> Result<usize, broadcast::error::SendError<CarlotEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// # Examples
    ///
    /// ```
    /// use carlot_common::events::{CarlotEvent, EventBus, NoticeLevel};
    /// use uuid::Uuid;
    ///
    /// let event_bus = EventBus::new(100);
    ///
    /// event_bus.emit_lossy(CarlotEvent::Notice {
    ///     session_id: Uuid::new_v4(),
    ///     level: NoticeLevel::Success,
    ///     message: "Successfully uploaded 2 images".to_string(),
    ///     detail: None,
    ///     timestamp: chrono::Utc::now(),
    /// });
    /// ```
    pub fn emit_lossy(&self, event: CarlotEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
