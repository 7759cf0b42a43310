//! Relay agent entry point
//!
//! Run with:
//! ```bash
//! cargo run -p relay-bot -- config.json messages.db
//! ```
//!
//! Environment variables prefixed `RELAY__` override the config file; a
//! `.env` file is read first when present.

use anyhow::Context;
use clap::Parser;
use relay_common::{try_init_tracing, AppError, RelayConfig, TracingConfig};
use std::path::PathBuf;
use std::process::ExitCode;

/// Relay Twitch and Discord chat into a local log and console
#[derive(Debug, Parser)]
#[command(name = "relay-bot", version, about)]
struct Args {
    /// JSON configuration file
    config: PathBuf,

    /// SQLite message database (created if missing)
    database: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    match start(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Relay failed");
            eprintln!("relay-bot: {e:#}");
            let code = e.downcast_ref::<AppError>().map_or(1, AppError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

async fn start(args: Args) -> anyhow::Result<()> {
    let config = RelayConfig::load(&args.config)
        .map_err(AppError::from)
        .with_context(|| format!("loading {}", args.config.display()))?;

    if let Err(e) = try_init_tracing(&TracingConfig::from_settings(&config.log)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    tracing::info!(
        config = %args.config.display(),
        database = %args.database.display(),
        twitch = config.twitch.enabled,
        discord = config.discord.enabled,
        console = config.console.enabled,
        "Configuration loaded"
    );

    relay_bot::run(config, &args.database).await?;
    Ok(())
}
