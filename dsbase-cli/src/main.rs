//! dsadmin: terminal admin tool for the ds administration API
//!
//! Plays the host-page role for dsbase-core:
//! - loads config and opens the session store
//! - runs the login form on the terminal when no session exists
//! - exposes every API call as a subcommand

mod commands;
mod prompt;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use dsbase_core::client::ClientBuilder;
use dsbase_core::config::StoreKind;
use dsbase_core::{ApiError, Config, UsageError};

use crate::commands::Command;

#[derive(Debug, Parser)]
#[command(name = "dsadmin", version, about = "Administer a ds device")]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, env = "DSADMIN_CONFIG")]
    config: Option<PathBuf>,

    /// API origin, e.g. http://device.local
    #[arg(long, env = "DSADMIN_ORIGIN")]
    origin: Option<String>,

    /// API port
    #[arg(long)]
    api_port: Option<u16>,

    /// Repository owner
    #[arg(long)]
    user: Option<String>,

    /// Repository name
    #[arg(long)]
    repo: Option<String>,

    /// Keep the session in memory only
    #[arg(long)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dsbase_cli=info,dsbase_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = error_code(&e);
            eprintln!("Error {}: {:#}", code, e);
            if code == dsbase_core::error::USAGE_CODE {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::default()
        }),
    };

    if let Some(origin) = cli.origin {
        config.endpoint.origin = Some(origin);
    }
    if let Some(port) = cli.api_port {
        config.endpoint.api_port = port;
    }
    if let Some(user) = cli.user {
        config.endpoint.user = Some(user);
    }
    if let Some(repo) = cli.repo {
        config.endpoint.repo = Some(repo);
    }
    if cli.ephemeral {
        config.session.store = StoreKind::Memory;
    }

    let client = ClientBuilder::from_config(&config)?
        .on_reset(|| tracing::info!("Session reset"))
        .build()?;

    commands::run(&client, cli.command).await
}

/// Numeric code of a failed run, as the API reports it
fn error_code(error: &anyhow::Error) -> u16 {
    if let Some(e) = error.downcast_ref::<ApiError>() {
        e.code()
    } else if let Some(e) = error.downcast_ref::<UsageError>() {
        e.code()
    } else {
        dsbase_core::error::FALLBACK_CODE
    }
}
