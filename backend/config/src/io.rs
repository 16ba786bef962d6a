//! Options file reading.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// Default options file name within the config directory.
const CONFIG_FILE_NAME: &str = "gmaps.yaml";

/// Resolve the gmaps config directory.
/// Priority: `GMAPS_CONFIG_DIR` env > `~/.gmaps/` > `./.gmaps`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("GMAPS_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".gmaps"),
        None => PathBuf::from(".gmaps"),
    }
}

/// Resolve the full path to the options file.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Read an options file (YAML, or JSON which is a YAML subset) as a raw value.
///
/// A missing file is an error: the API key has no default.
pub async fn load_options_value(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read options file: {}", path.display()))?;

    let value: Value = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse options YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded options");
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_yaml_into_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());
        std::fs::write(&path, "apiKey: AIzaTest\nlibraries: [places]\n").unwrap();

        let value = load_options_value(&path).await.unwrap();
        assert_eq!(value["apiKey"], "AIzaTest");
        assert_eq!(value["libraries"][0], "places");
    }

    #[tokio::test]
    async fn missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_options_value(&dir.path().join("absent.yaml")).await.unwrap_err();
        assert!(err.to_string().contains("Failed to read options file"));
    }
}
