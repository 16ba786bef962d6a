//! Log Redaction Layer
//!
//! Scrubs provider API keys and `key=` query parameters from strings prior to logging.

use regex::Regex;
use std::sync::LazyLock;

static GOOGLE_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"AIza[0-9A-Za-z_\-]{8,}").unwrap());
static KEY_PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([?&](?:key|client)=)[^&#\s]+").unwrap());

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = KEY_PARAM_RE.replace_all(input, "${1}[REDACTED_KEY]");
    GOOGLE_KEY_RE
        .replace_all(&redacted, "[REDACTED_KEY]")
        .into_owned()
}
