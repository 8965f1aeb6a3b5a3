//! Simlab CLI
//!
//! Command-line interface for driving graph, simulation and report jobs on
//! the simulation platform.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use simlab_client::ClientConfig;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "simlab")]
#[command(about = "Simulation platform CLI", long_about = None)]
struct Cli {
    /// API base URL
    #[arg(long, env = "SIMLAB_API_URL", default_value = ClientConfig::DEFAULT_BASE_URL)]
    api_url: String,

    /// Total attempts for submissions (overrides SIMLAB_RETRY_ATTEMPTS)
    #[arg(long)]
    retry_attempts: Option<u32>,

    /// Status poll interval in milliseconds (overrides SIMLAB_POLL_INTERVAL_MS)
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "simlab=warn,simlab_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling");
            on_interrupt.cancel();
        }
    });

    let config = Config::from_env(cli.api_url, cli.retry_attempts, cli.poll_interval_ms, cancel);

    handle_command(cli.command, &config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "simlab",
            "--api-url",
            "http://sim:9000",
            "--retry-attempts",
            "5",
            "graph",
            "task",
            "task-1",
        ])
        .unwrap();

        assert_eq!(cli.api_url, "http://sim:9000");
        assert_eq!(cli.retry_attempts, Some(5));
        assert_eq!(cli.poll_interval_ms, None);
    }
}
