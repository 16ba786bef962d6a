//! Structured Logger
//!
//! Wraps `tracing` to provide console output, optional JSON file rotation (NDJSON),
//! and environment-based level control.

use std::path::PathBuf;

use anyhow::Result;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Where and how to log.
#[derive(Debug, Clone)]
pub struct LoggerOptions {
    /// Fallback filter when `RUST_LOG` is unset.
    pub level: String,
    /// Emit console lines as JSON instead of human-readable text.
    pub json: bool,
    /// Directory for daily-rolling `gmaps.log.YYYY-MM-DD` files; none disables file output.
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            log_dir: None,
        }
    }
}

/// Initialize the global structured logger.
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logger(options: &LoggerOptions) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&options.level));

    let console_layer = if options.json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(true)
            .boxed()
    };

    let file_layer = options.log_dir.as_ref().map(|dir| {
        let appender = RollingFileAppender::new(Rotation::DAILY, dir, "gmaps.log");
        fmt::layer().json().with_writer(appender).with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;
    Ok(())
}
