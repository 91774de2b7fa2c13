//! EventBus-backed notifier and navigator
//!
//! Notices and navigation requests become `CarlotEvent`s on the shared bus.
//! Whatever renders the workflow subscribes; the headless driver runs
//! [`run_event_logger`] instead.

use crate::types::{Navigator, Notifier};
use carlot_common::events::{CarlotEvent, EventBus, NoticeLevel};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Publishes notices for one intake session
#[derive(Debug, Clone)]
pub struct BusNotifier {
    bus: EventBus,
    session_id: Uuid,
}

impl BusNotifier {
    pub fn new(bus: EventBus, session_id: Uuid) -> Self {
        Self { bus, session_id }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }
}

impl Notifier for BusNotifier {
    fn notify(&self, level: NoticeLevel, message: &str, detail: Option<&str>) {
        self.bus.emit_lossy(CarlotEvent::Notice {
            session_id: self.session_id,
            level,
            message: message.to_string(),
            detail: detail.map(str::to_string),
            timestamp: chrono::Utc::now(),
        });
    }
}

impl Navigator for BusNotifier {
    fn go_to(&self, path: &str) {
        debug!(session_id = %self.session_id, path, "Navigation requested");
        self.bus.emit_lossy(CarlotEvent::NavigationRequested {
            session_id: self.session_id,
            path: path.to_string(),
            timestamp: chrono::Utc::now(),
        });
    }
}

/// Log every event on the bus until all senders are gone
pub async fn run_event_logger(mut rx: broadcast::Receiver<CarlotEvent>) {
    debug!("Event logger started");

    loop {
        match rx.recv().await {
            Ok(CarlotEvent::Notice {
                level,
                message,
                detail,
                ..
            }) => {
                let detail = detail.unwrap_or_default();
                match level {
                    NoticeLevel::Success => info!(%detail, "{}", message),
                    NoticeLevel::Warning => warn!(%detail, "{}", message),
                    NoticeLevel::Error => error!(%detail, "{}", message),
                }
            }
            Ok(CarlotEvent::NavigationRequested { path, .. }) => {
                info!(path = %path, "Navigate");
            }
            Ok(event) => {
                debug!(event_type = event.event_type(), "Session event");
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Event logger lagged");
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("Event logger stopped (bus closed)");
                break;
            }
        }
    }
}
