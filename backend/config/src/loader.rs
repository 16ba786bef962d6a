//! Typed, validated loader configuration.

use std::collections::BTreeSet;
use std::time::Duration;

use gmaps_core::{ConfigError, Credential, Library};
use serde::Serialize;
use tracing::warn;
use url::Url;

use crate::defaults::{
    default_backoff, default_ready_timeout, DEFAULT_ENDPOINT, DEFAULT_MAX_ATTEMPTS,
};
use crate::schema::{DuplicatePolicy, PluginOptions};
use crate::validation::validate;

/// How many times a transient load failure is re-attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; `1` makes failures terminal.
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn terminal() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: default_backoff(),
        }
    }

    /// Delay before attempt `attempt + 1`, growing linearly.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::terminal()
    }
}

/// Immutable configuration of one installed plugin.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub credential: Credential,
    pub libraries: BTreeSet<Library>,
    pub endpoint: Url,
    pub version: Option<String>,
    pub language: Option<String>,
    pub region: Option<String>,
    pub ready_timeout: Duration,
    pub retry: RetryPolicy,
    pub on_duplicate: DuplicatePolicy,
}

/// What consumers may see of the configuration; never carries the raw key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSummary {
    pub credential_hint: String,
    pub libraries: Vec<String>,
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// Parse library tokens into the closed set, rejecting the first unknown one.
pub fn parse_libraries<I, S>(tokens: I) -> Result<BTreeSet<Library>, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens.into_iter().map(|t| t.as_ref().parse()).collect()
}

fn parse_endpoint(endpoint: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(endpoint).map_err(|e| ConfigError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(url)
}

impl LoaderConfig {
    /// Configuration with defaults for everything but the key and libraries.
    pub fn new<I, S>(credential_key: impl Into<String>, libraries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            credential: Credential::new(credential_key)?,
            libraries: parse_libraries(libraries)?,
            endpoint: parse_endpoint(DEFAULT_ENDPOINT)?,
            version: None,
            language: None,
            region: None,
            ready_timeout: default_ready_timeout(),
            retry: RetryPolicy::default(),
            on_duplicate: DuplicatePolicy::default(),
        })
    }

    /// Validate raw options and build the typed configuration.
    ///
    /// Warnings are logged; the first error aborts.
    pub fn from_options(options: &PluginOptions) -> Result<Self, ConfigError> {
        let report = validate(options);
        for warning in &report.warnings {
            warn!(path = %warning.path, message = %warning.message, "Option warning");
        }

        let mut config = Self::new(
            options.api_key.as_str(),
            options.libraries.iter().flatten(),
        )?;
        if let Some(endpoint) = &options.endpoint {
            config.endpoint = parse_endpoint(endpoint)?;
        }
        if let Some(first) = report.errors.into_iter().next() {
            return Err(ConfigError::Invalid {
                path: first.path,
                message: first.message,
            });
        }

        config.version = options.version.clone();
        config.language = options.language.clone();
        config.region = options.region.clone();
        if let Some(ms) = options.ready_timeout_ms {
            config.ready_timeout = Duration::from_millis(ms);
        }
        if let Some(retry) = &options.retry {
            config.retry = RetryPolicy {
                max_attempts: retry.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
                backoff: retry
                    .backoff_ms
                    .map(Duration::from_millis)
                    .unwrap_or_else(default_backoff),
            };
        }
        config.on_duplicate = options.on_duplicate.unwrap_or_default();
        Ok(config)
    }

    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.on_duplicate = policy;
        self
    }

    pub fn summary(&self) -> ConfigSummary {
        ConfigSummary {
            credential_hint: self.credential.hint(),
            libraries: self.libraries.iter().map(|l| l.as_str().to_string()).collect(),
            endpoint: self.endpoint.to_string(),
            version: self.version.clone(),
            language: self.language.clone(),
            region: self.region.clone(),
        }
    }
}
