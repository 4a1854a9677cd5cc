//! Idokep uploader entry point.
//!
//! Stands in for the host engine: reads observation records as JSON lines
//! on stdin and hands each one to the Idokep upload worker, which posts
//! them in the background.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `$IDOKEP_CONFIG` (default `idokep.toml`) and
//!    `IDOKEP_*` environment variables
//! 3. Build the service and start the worker
//! 4. Forward stdin records until end of input or Ctrl-C
//! 5. Wait for the worker to drain its backlog

mod error;
mod intake;

use std::io::BufReader;
use std::path::PathBuf;

use anyhow::Context;
use idokep_uploader::{IdokepService, UploaderConfig};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Environment variable naming the configuration file.
const CONFIG_PATH_VAR: &str = "IDOKEP_CONFIG";

/// Configuration file used when `IDOKEP_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "idokep.toml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is missing or invalid, stdin cannot be
/// read, or the worker task panics.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("idokep-runner starting");

    let config_path = std::env::var_os(CONFIG_PATH_VAR)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = match UploaderConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!(
                config_path = %config_path.display(),
                error = %e,
                "data will not be posted"
            );
            return Err(e).context("configuration error");
        }
    };
    info!(
        config_path = %config_path.display(),
        server_url = %config.server_url,
        station_type = config.station_type,
        timeout_secs = config.timeout.as_secs(),
        "configuration loaded"
    );

    let service = IdokepService::new(config)?;
    let (bridge, worker) = service.start();

    let lines = intake::spawn_line_reader(BufReader::new(std::io::stdin()))
        .context("failed to start stdin reader")?;
    tokio::select! {
        result = intake::forward_records(lines, &bridge) => {
            match result {
                Ok(stats) => info!(
                    forwarded = stats.forwarded,
                    skipped = stats.skipped,
                    "end of input, waiting for pending uploads"
                ),
                Err(e) => warn!(error = %e, "record intake stopped"),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted, abandoning pending uploads");
            worker.abort();
            return Ok(());
        }
    }

    drop(bridge);
    let mut worker = worker;
    tokio::select! {
        result = &mut worker => {
            result.context("upload worker panicked")?;
            info!("idokep-runner finished");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted, abandoning pending uploads");
            worker.abort();
        }
    }
    Ok(())
}
