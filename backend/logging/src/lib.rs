//! Structured logging for the gmaps loader.
//!
//! Console and rolling NDJSON output, credential redaction, and loader lifecycle events.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{LoaderEvent, EventLogEntry, EventLogger};
pub use logger::{LoggerOptions, init_logger};
pub use redact::redact_sensitive_data;
