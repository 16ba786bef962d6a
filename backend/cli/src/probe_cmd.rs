//! `gmaps probe`: install the plugin and drive concurrent consumers through one load.

use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use futures::future::join_all;
use gmaps_config::load_and_prepare;
use gmaps_logging::redact_sensitive_data;
use gmaps_plugins::{CONTEXT_KEY, GMapsPlugin, HostApp, MapsContext};

use crate::terminal_output::{fail, heading, ok};

pub async fn run(path: &Path, consumers: usize, timeout_ms: Option<u64>) -> Result<()> {
    if consumers == 0 {
        bail!("--consumers must be at least 1");
    }

    let mut config = load_and_prepare(path).await?;
    if let Some(ms) = timeout_ms {
        config = config.with_ready_timeout(Duration::from_millis(ms));
    }
    let mut host = HostApp::new();
    let broker = GMapsPlugin::install(&mut host, config)?;
    let maps = host
        .context
        .get::<MapsContext>(CONTEXT_KEY)
        .ok_or_else(|| anyhow!("maps context was not published"))?;

    println!(
        "{}",
        heading(&format!(
            "Probing {} with {consumers} consumer(s)",
            redact_sensitive_data(broker.request().url().as_str())
        ))
    );

    let outcomes = join_all((0..consumers).map(|_| maps.acquire())).await;

    let mut failed = 0;
    for (i, outcome) in outcomes.iter().enumerate() {
        match outcome {
            Ok(handle) => println!("  #{i:<3} {} version {}", ok("ready "), handle.version()),
            Err(e) => {
                failed += 1;
                println!("  #{i:<3} {} {e}", fail("failed"));
            }
        }
    }

    let status = maps.current_status();
    println!();
    println!("  status:        {status}");
    println!("  load attempts: {}", broker.load_attempts());

    if !status.is_settled() {
        bail!("loader is still {status} after every consumer returned");
    }
    if failed > 0 {
        bail!("{failed} of {consumers} consumer(s) saw a failed load");
    }
    Ok(())
}
