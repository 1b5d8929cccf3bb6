//! OpsConductor-Pulse CLI
//!
//! A command-line interface for inspecting a running pulse deployment:
//! ingest server health, quarantined telemetry, open alerts, and stuck
//! delivery jobs.

mod client;
mod commands;
mod error;

use clap::{Parser, Subcommand};
use client::PulseClient;
use tracing_subscriber::{fmt, EnvFilter};

/// OpsConductor-Pulse CLI — inspect a running pulse deployment.
#[derive(Parser, Debug)]
#[command(name = "opspulse", version, about)]
struct Cli {
    /// Pulse ingest server endpoint URL.
    #[arg(
        long,
        env = "PULSE_ENDPOINT",
        default_value = "http://localhost:8080",
        global = true
    )]
    endpoint: String,

    /// Admin API key for authentication.
    #[arg(long, env = "PULSE_ADMIN_API_KEY", global = true)]
    api_key: Option<String>,

    /// Output format.
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: commands::Command,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut builder = PulseClient::builder(&cli.endpoint);
    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key);
    }
    let client = builder.build()?;

    match cli.command {
        commands::Command::Health => commands::health(&client).await,
        commands::Command::Quarantine(args) => {
            commands::quarantine(&client, &args, &cli.format).await
        }
        commands::Command::Alerts(args) => commands::alerts(&client, &args, &cli.format).await,
        commands::Command::Jobs(args) => commands::jobs(&client, &args, &cli.format).await,
    }
}
