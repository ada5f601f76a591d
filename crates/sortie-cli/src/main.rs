//! Sortie - command line front end for the authorization engine

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;

use commands::Cli;
use config::Settings;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let settings = Settings::load().context("Failed to load configuration")?;

    init_tracing(&settings);

    debug!("Sortie v{} configuration loaded", env!("CARGO_PKG_VERSION"));

    let outcome = cli.command.run(&settings).await?;
    info!(?outcome, "Command finished");

    Ok(outcome.exit_code())
}

fn init_tracing(settings: &Settings) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.filter));

    // stdout carries command output
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}
