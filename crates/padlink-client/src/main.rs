//! Padlink client entry point.
//!
//! Loads the configuration, starts the event feed, and runs the connection
//! event loop until Ctrl+C or the connection is given up on. The connection
//! stays up after the feed ends. Giving up is an error: the process exits non-zero so whatever launched
//! it can decide whether to start it again.
//!
//! # Usage
//!
//! ```text
//! padlink-client [OPTIONS]
//!
//! Options:
//!   --config <PATH>         Config file [default: platform config dir]
//!   --endpoint <URL>        Trackpad server WebSocket URL
//!   --max-retries <N>       Reconnects tolerated over the process lifetime
//!   --input-mode <MODE>     touch | pointer (remembered in the config file)
//!   --events <PATH|->       JSON-lines event feed [default: - (stdin)]
//!   --log-level <LEVEL>     Used when RUST_LOG is unset
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable              | Description                   |
//! |-----------------------|-------------------------------|
//! | `PADLINK_ENDPOINT`    | Trackpad server WebSocket URL |
//! | `PADLINK_MAX_RETRIES` | Lifetime reconnect budget     |
//! | `PADLINK_INPUT_MODE`  | `touch` or `pointer`          |
//!
//! Precedence is command line, then environment, then config file, then
//! built-in defaults.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use padlink_client::application::forward_input::ForwardInputUseCase;
use padlink_client::infrastructure::{
    input_capture::{
        jsonl::{EventFeed, JsonLinesSource},
        InputMode, InputSource,
    },
    network::ConnectionDriver,
    storage::config::{config_file_path, load_config_from, save_config_to, ClientConfig},
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Padlink client: use this device as a remote trackpad.
#[derive(Debug, Parser)]
#[command(name = "padlink-client", version)]
struct Cli {
    /// Path of the TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// WebSocket URL of the trackpad server, e.g. `ws://192.168.1.20:8080/api/socket`.
    #[arg(long, env = "PADLINK_ENDPOINT")]
    endpoint: Option<String>,

    /// Reconnects tolerated over the lifetime of the process.
    #[arg(long, env = "PADLINK_MAX_RETRIES")]
    max_retries: Option<u32>,

    /// Input API to capture: `touch` or `pointer`.
    ///
    /// An explicit value is saved to the config file for later runs.
    #[arg(long, env = "PADLINK_INPUT_MODE")]
    input_mode: Option<InputMode>,

    /// JSON-lines file of capture events, or `-` for standard input.
    #[arg(long, default_value = "-")]
    events: String,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Overlays explicit arguments onto `config`. Returns `true` when the
    /// input mode was given and should be persisted.
    fn apply_to(&self, config: &mut ClientConfig) -> bool {
        if let Some(endpoint) = &self.endpoint {
            config.connection.endpoint = endpoint.clone();
        }
        if let Some(max_retries) = self.max_retries {
            config.connection.max_retries = max_retries;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        match self.input_mode {
            Some(mode) if mode != config.input.mode => {
                config.input.mode = mode;
                true
            }
            _ => false,
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config_file_path().context("failed to locate config directory")?,
    };
    let mut config = load_config_from(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    let remember_mode = cli.apply_to(&mut config);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!("Padlink client starting");
    if remember_mode {
        match save_config_to(&config_path, &config) {
            Ok(()) => info!(mode = %config.input.mode, "input mode saved to {}", config_path.display()),
            Err(e) => warn!("could not remember input mode: {e}"),
        }
    }
    info!(mode = %config.input.mode, "using {} events", config.input.mode);

    // ── Event feed ────────────────────────────────────────────────────────────
    let mut source = JsonLinesSource::new(EventFeed::from_arg(&cli.events));
    let input = source.start().context("failed to start event feed")?;

    // ── Connection ────────────────────────────────────────────────────────────
    let forward = Arc::new(ForwardInputUseCase::new(config.input.mode, config.viewport()));
    let driver = ConnectionDriver::start(config.connection_config(), forward)
        .context("failed to start connection")?;

    let mut status = driver.subscribe_status();
    tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let snapshot = status.borrow_and_update().clone();
            debug!(
                state = %snapshot.state,
                retries = snapshot.retries,
                max_retries = snapshot.max_retries,
                "status updated"
            );
        }
    });

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl+C signal: {e}");
            std::future::pending::<()>().await;
        }
    };

    driver
        .run(input, shutdown)
        .await
        .context("lost connection to the trackpad server")?;

    info!("Padlink client stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
