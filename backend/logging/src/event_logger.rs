//! Loader Event Logger
//!
//! Structured loader lifecycle events written through the tracing system.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum LoaderEvent {
    LoadStarted {
        attempt: u32,
        url: String,
    },
    LoadSettled {
        status: String,
        waiters: usize,
        error: Option<String>,
    },
    Reset {
        previous: String,
    },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub timestamp: DateTime<Utc>,
    pub event: LoaderEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Logs a loader event after scrubbing credentials from its string fields.
    pub fn log_event(mut event: LoaderEvent) -> EventLogEntry {
        match &mut event {
            LoaderEvent::LoadStarted { url, .. } => {
                *url = redact_sensitive_data(url);
            }
            LoaderEvent::LoadSettled { error: Some(msg), .. } => {
                *msg = redact_sensitive_data(msg);
            }
            LoaderEvent::LoadSettled { error: None, .. } | LoaderEvent::Reset { .. } => {}
        }

        let entry = EventLogEntry {
            timestamp: Utc::now(),
            event,
        };

        info!(target: "gmaps_events", event = ?entry, "Loader event");
        entry
    }
}
