//! HTTP server for the relay-driven channel remote.
//!
//! Loads the configuration, restores the channel counter from the state
//! file and serves the API until Ctrl+C. All outputs are released on the
//! way out.
//!
//! Built with the `gpio` feature on Linux, the relays are driven through
//! the configured GPIO chip. When the pins cannot be claimed (or with
//! `--simulate`) relay changes only go to the log.
//!
//! # Usage
//!
//! ```sh
//! cargo run --bin remote_server -- --port 4000
//! cargo run --features gpio --bin remote_server -- --config remote.json
//! cargo run --bin remote_server -- --config remote.json --state-file /var/lib/aluprof/state.json
//! RUST_LOG=rs_aluprof=debug cargo run --bin remote_server
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use rs_aluprof::hal::{SimulatedRelays, SystemClock};
use rs_aluprof::services::{run_server, WebServerConfig};
use rs_aluprof::{ButtonDriver, Config, JsonFileStore, RemoteController};

#[derive(Parser)]
#[command(
    name = "remote_server",
    about = "HTTP API for a relay-driven multi-channel remote",
    version
)]
struct Cli {
    /// JSON config file (defaults apply to every missing field)
    #[arg(long, short, env = "ALUPROF_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(long, short, env = "ALUPROF_PORT")]
    port: Option<u16>,

    /// Channel state file (overrides the config file)
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Keep the channel counter in memory only
    #[arg(long)]
    no_persist: bool,

    /// Log relay changes instead of driving GPIO pins
    #[arg(long)]
    simulate: bool,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(port) = self.port {
            config.web.port = port;
        }
        if let Some(path) = &self.state_file {
            config.storage.state_file = path.clone();
        }
        if self.no_persist {
            config.storage.enabled = false;
        }

        config.validate()?;
        Ok(config)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "could not listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

/// Claim the GPIO relay pins, or `None` to fall back to simulation.
#[cfg(all(feature = "gpio", target_os = "linux"))]
fn open_gpio(config: &Config) -> Option<rs_aluprof::hal::GpioRelays> {
    match rs_aluprof::hal::open_relays(&config.remote) {
        Ok(relays) => {
            tracing::info!(
                chip = %config.remote.gpio_chip.display(),
                active_high = config.remote.active_high,
                "driving relays on GPIO"
            );
            Some(relays)
        }
        Err(e) => {
            tracing::warn!(error = %e, "GPIO unavailable, falling back to simulation");
            None
        }
    }
}

#[cfg(not(all(feature = "gpio", target_os = "linux")))]
fn open_gpio(_config: &Config) -> Option<SimulatedRelays> {
    tracing::warn!("built without GPIO support, falling back to simulation");
    None
}

async fn serve<D>(config: Config, driver: D) -> anyhow::Result<()>
where
    D: ButtonDriver + Send + 'static,
{
    let clock = SystemClock::new();

    let remote = if config.storage.enabled {
        let store = JsonFileStore::open(&config.storage.state_file);
        tracing::info!(path = %store.path().display(), "channel state file");
        RemoteController::with_persistence(config.remote.clone(), store, driver, clock)
    } else {
        tracing::info!("channel persistence disabled");
        RemoteController::new(config.remote.clone(), driver, clock)
    };
    let remote = Arc::new(remote);

    tracing::info!(
        channel = remote.channels().get(),
        max_channel = config.remote.max_channel,
        "remote ready"
    );

    run_server(
        Arc::clone(&remote),
        WebServerConfig::from_config(&config.web),
        shutdown_signal(),
    )
    .await
    .context("web server failed")?;

    let releaser = Arc::clone(&remote);
    tokio::task::spawn_blocking(move || releaser.release_all())
        .await
        .context("release task panicked")??;
    tracing::info!("outputs released");

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = cli.load_config()?;

    if !cli.simulate {
        if let Some(relays) = open_gpio(&config) {
            return serve(config, relays).await;
        }
    }

    tracing::info!("simulating relays");
    let driver = SimulatedRelays::new(config.remote.buttons.clone(), config.remote.active_high);
    serve(config, driver).await
}
