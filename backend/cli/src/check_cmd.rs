//! `gmaps check`: validate an options file and print a redacted snapshot.

use std::path::Path;

use anyhow::{bail, Result};
use gmaps_config::{load_options_value, prepare_options, redact, validate};

use crate::terminal_output::{fail, heading, ok, warn};

pub async fn run(path: &Path) -> Result<()> {
    let raw = load_options_value(path).await?;
    let options = prepare_options(&raw)?;
    let report = validate(&options);

    println!("{}", heading(&format!("Options: {}", path.display())));
    println!("{}", serde_json::to_string_pretty(&redact(&serde_json::to_value(&options)?))?);
    println!();

    for warning in &report.warnings {
        println!("  {} {}: {}", warn("warn "), warning.path, warning.message);
    }
    for error in &report.errors {
        println!("  {} {}: {}", fail("error"), error.path, error.message);
    }

    if !report.is_valid() {
        bail!("{} error(s) in {}", report.errors.len(), path.display());
    }
    println!("{}", ok("Options are valid."));
    Ok(())
}
