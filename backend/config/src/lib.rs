//! `gmaps-config`: install options for the gmaps SDK loader.
//!
//! Provides:
//! - Typed options schema (key, libraries, endpoint, timing, retry, duplicate policy)
//! - `${ENV_VAR}` substitution
//! - Validation into an immutable [`LoaderConfig`]
//! - Redaction for safe logging/display

pub mod defaults;
pub mod env;
pub mod io;
pub mod loader;
pub mod redact;
pub mod schema;
pub mod validation;

pub use env::{contains_env_var_reference, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_options_value};
pub use loader::{parse_libraries, ConfigSummary, LoaderConfig, RetryPolicy};
pub use redact::{mask_secret, redact};
pub use schema::{DuplicatePolicy, PluginOptions, RetryOptions};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

/// Substitute env vars in a raw options value and deserialize it.
pub fn prepare_options(value: &Value) -> Result<PluginOptions> {
    let value = resolve_env_vars(value).context("Failed to resolve env vars in options")?;
    serde_json::from_value(value).context("Failed to deserialize options")
}

/// Load, substitute, validate and type an options file.
///
/// This is the main entry point for hosts configuring the plugin from disk.
pub async fn load_and_prepare(path: &Path) -> Result<LoaderConfig> {
    let raw = load_options_value(path).await?;
    let options = prepare_options(&raw)?;
    let config = LoaderConfig::from_options(&options)
        .with_context(|| format!("Invalid options in {}", path.display()))?;
    tracing::debug!(summary = ?config.summary(), "Options prepared");
    Ok(config)
}
