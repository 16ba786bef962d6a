//! Default values applied to options the host left unset.

use std::time::Duration;

/// Public Maps JavaScript API script endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/js";

/// Bounded wait for the SDK's readiness callback.
pub const DEFAULT_READY_TIMEOUT_MS: u64 = 10_000;

/// A single attempt: failed loads are terminal unless retry is configured.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1;

/// Base delay between retry attempts; grows linearly with the attempt number.
pub const DEFAULT_BACKOFF_MS: u64 = 500;

pub fn default_ready_timeout() -> Duration {
    Duration::from_millis(DEFAULT_READY_TIMEOUT_MS)
}

pub fn default_backoff() -> Duration {
    Duration::from_millis(DEFAULT_BACKOFF_MS)
}
