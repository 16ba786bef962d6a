//! `gmaps`: validate loader options and exercise the SDK loader.

mod check_cmd;
mod config;
mod probe_cmd;
mod terminal_output;
mod url_cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use gmaps_config::{config_dir, config_file_path};
use gmaps_logging::{init_logger, LoggerOptions};

#[derive(Parser)]
#[command(name = "gmaps")]
#[command(about = "Validate and probe the Google Maps SDK loader", long_about = None)]
#[command(version)]
struct Cli {
    /// Options file (defaults to ~/.gmaps/gmaps.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Emit console logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an options file
    Check,
    /// Print the SDK request URL
    Url {
        /// Print the API key unmasked
        #[arg(long)]
        reveal: bool,
    },
    /// Load the SDK once for several concurrent consumers
    Probe {
        /// Number of concurrent consumers
        #[arg(short = 'n', long, default_value_t = 3)]
        consumers: usize,

        /// Override readyTimeoutMs for this run
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = config::Settings::from_env();

    init_logger(&LoggerOptions {
        level: settings.log_level,
        json: cli.json_logs,
        log_dir: settings.log_dir,
    })?;

    let path = match cli.config {
        Some(path) => path,
        None => config_file_path(&config_dir()),
    };
    tracing::debug!(path = %path.display(), "Using options file");

    match cli.command {
        Commands::Check => check_cmd::run(&path).await,
        Commands::Url { reveal } => url_cmd::run(&path, reveal).await,
        Commands::Probe { consumers, timeout_ms } => probe_cmd::run(&path, consumers, timeout_ms).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_probe_with_consumers() {
        let cli = Cli::try_parse_from(["gmaps", "probe", "-n", "5"]).unwrap();
        assert!(matches!(cli.command, Commands::Probe { consumers: 5, timeout_ms: None }));
        assert!(cli.config.is_none());
    }

    #[test]
    fn parses_probe_timeout_override() {
        let cli = Cli::try_parse_from(["gmaps", "probe", "--timeout-ms", "2500"]).unwrap();
        assert!(matches!(cli.command, Commands::Probe { consumers: 3, timeout_ms: Some(2500) }));
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["gmaps", "url", "--reveal", "--config", "maps.yaml"]).unwrap();
        assert!(matches!(cli.command, Commands::Url { reveal: true }));
        assert_eq!(cli.config, Some(PathBuf::from("maps.yaml")));
    }

    #[test]
    fn rejects_unknown_command() {
        assert!(Cli::try_parse_from(["gmaps", "serve"]).is_err());
    }
}
