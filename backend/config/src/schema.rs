//! Plugin options as supplied by the host at install time.
//!
//! Typed for serde YAML/JSON deserialization; every field except `apiKey`
//! is optional and filled from [`crate::defaults`].

use serde::{Deserialize, Serialize};

/// Raw install options (camelCase on the wire).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginOptions {
    /// Provider API key; may be a `${ENV_VAR}` reference before resolution.
    #[serde(default)]
    pub api_key: String,

    /// Optional SDK feature modules (`places`, `geometry`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub libraries: Option<Vec<String>>,

    /// Script endpoint; defaults to the public Maps JavaScript API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Version channel (`weekly`, `quarterly`, or a pinned version).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// How long to wait for the SDK's own readiness signal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_timeout_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryOptions>,

    /// What to do when a component name is already registered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_duplicate: Option<DuplicatePolicy>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_ms: Option<u64>,
}

/// Policy for component-name collisions in the host namespace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    #[default]
    Reject,
    Overwrite,
}

impl PluginOptions {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_libraries<I, S>(mut self, libraries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.libraries = Some(libraries.into_iter().map(Into::into).collect());
        self
    }
}
