//! `gmaps url`: print the canonical SDK request URL.

use std::path::Path;

use anyhow::Result;
use gmaps_config::load_and_prepare;
use gmaps_logging::redact_sensitive_data;
use gmaps_plugins::ScriptRequest;

pub async fn run(path: &Path, reveal: bool) -> Result<()> {
    let config = load_and_prepare(path).await?;
    let url = ScriptRequest::from_config(&config).url();
    if reveal {
        println!("{url}");
    } else {
        println!("{}", redact_sensitive_data(url.as_str()));
    }
    Ok(())
}
