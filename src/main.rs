//! assay - mining report crawler and resource estimate miner.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use assayer::cli::{self, Cli};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let settings = cli.load_settings().await;

    init_logging(cli.verbose, settings.log_file.as_deref())?;

    // First Ctrl-C stops new batches from starting
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight companies");
            signal_token.cancel();
        }
    });

    cli::run(cli, settings, cancel).await
}

/// Install the stderr subscriber, plus a file sink when configured.
///
/// The file writer sits behind a mutex so records from concurrent company
/// tasks are written whole.
fn init_logging(verbose: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let default_filter = if verbose || cli::is_verbose() {
        "assayer=info"
    } else {
        "assayer=warn"
    };
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(filter()),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter()),
        )
        .with(file_layer)
        .init();

    Ok(())
}
