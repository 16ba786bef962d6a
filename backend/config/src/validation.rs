//! Option validation: collects every problem in one pass with a field path.

use gmaps_core::Library;
use thiserror::Error;
use url::Url;

use crate::schema::PluginOptions;

/// A validation finding with field path and message.
#[derive(Debug, Error)]
#[error("Option validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// Errors and warnings found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate install options and return a report of all errors and warnings.
pub fn validate(options: &PluginOptions) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_credential(options, &mut report);
    validate_libraries(options, &mut report);
    validate_endpoint(options, &mut report);
    validate_timing(options, &mut report);
    report
}

fn validate_credential(options: &PluginOptions, report: &mut ValidationReport) {
    if options.api_key.trim().is_empty() {
        report.error("apiKey", "API key is required");
    } else if crate::env::contains_env_var_reference(&options.api_key) {
        report.error("apiKey", "API key still contains an unresolved ${VAR} reference");
    }
}

fn validate_libraries(options: &PluginOptions, report: &mut ValidationReport) {
    let Some(libraries) = &options.libraries else { return };
    let mut seen = Vec::new();
    for (i, token) in libraries.iter().enumerate() {
        match token.parse::<Library>() {
            Ok(lib) if seen.contains(&lib) => {
                report.warn(format!("libraries[{i}]"), format!("'{token}' is listed more than once"));
            }
            Ok(lib) => seen.push(lib),
            Err(_) => {
                let known: Vec<&str> = Library::ALL.iter().map(|l| l.as_str()).collect();
                report.error(
                    format!("libraries[{i}]"),
                    format!("Unknown library '{token}'. Use one of: {}", known.join(", ")),
                );
            }
        }
    }
}

fn validate_endpoint(options: &PluginOptions, report: &mut ValidationReport) {
    let Some(endpoint) = &options.endpoint else { return };
    match Url::parse(endpoint) {
        Ok(url) => match url.scheme() {
            "https" => {}
            "http" => report.warn("endpoint", "Endpoint is not HTTPS; the API key will travel in clear text"),
            other => report.error("endpoint", format!("Unsupported scheme '{other}'")),
        },
        Err(e) => report.error("endpoint", format!("Not a valid URL: {e}")),
    }
}

fn validate_timing(options: &PluginOptions, report: &mut ValidationReport) {
    if options.ready_timeout_ms == Some(0) {
        report.error("readyTimeoutMs", "readyTimeoutMs must be > 0");
    }
    let Some(retry) = &options.retry else { return };
    if retry.max_attempts == Some(0) {
        report.error("retry.maxAttempts", "maxAttempts must be >= 1");
    }
    if retry.max_attempts.unwrap_or(1) > 1 && retry.backoff_ms == Some(0) {
        report.warn("retry.backoffMs", "Retrying without backoff hammers the provider");
    }
}
