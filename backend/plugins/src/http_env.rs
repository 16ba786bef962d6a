//! HTTP script environment backed by `reqwest`.
//!
//! Headless hosts cannot evaluate the fetched JavaScript, so a delivered,
//! non-empty script is taken as the SDK's readiness report.

use std::time::Duration;

use async_trait::async_trait;
use gmaps_core::LoadError;
use gmaps_logging::redact_sensitive_data;
use tracing::debug;
use url::Url;

use crate::injector::{ReadySignal, ScriptEnvironment};
use crate::request::ScriptRequest;

/// Version label reported when the request does not pin one.
const DEFAULT_VERSION_LABEL: &str = "weekly";

pub struct HttpEnvironment {
    client: reqwest::Client,
}

impl HttpEnvironment {
    pub fn new(fetch_timeout: Duration) -> Result<Self, LoadError> {
        let client = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .map_err(|e| LoadError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

fn network_error(err: reqwest::Error) -> LoadError {
    LoadError::Network(redact_sensitive_data(&err.without_url().to_string()))
}

#[async_trait]
impl ScriptEnvironment for HttpEnvironment {
    async fn fetch(&self, url: &Url) -> Result<String, LoadError> {
        let resp = self.client.get(url.clone()).send().await.map_err(network_error)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(LoadError::Network(format!("HTTP {status}")));
        }
        let body = resp.text().await.map_err(network_error)?;
        debug!(bytes = body.len(), "SDK script fetched");
        Ok(body)
    }

    fn execute(&self, request: &ScriptRequest, script: String, signal: ReadySignal) -> Result<(), LoadError> {
        if script.trim().is_empty() {
            return Err(LoadError::SdkInit("provider returned an empty script".into()));
        }
        signal.ready(request.version.as_deref().unwrap_or(DEFAULT_VERSION_LABEL));
        Ok(())
    }
}
