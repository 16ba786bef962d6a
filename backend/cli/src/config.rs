use std::path::PathBuf;

/// CLI runtime settings read from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Fallback log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Directory for rolling JSON log files
    pub log_dir: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            log_level: std::env::var("GMAPS_LOG").unwrap_or_else(|_| "warn".to_string()),
            log_dir: std::env::var("GMAPS_LOG_DIR").ok().map(PathBuf::from),
        }
    }
}
