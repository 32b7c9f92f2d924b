//! Multi-table holdem server.
//!
//! Each table runs as its own actor task behind the registry; this binary
//! loads configuration, creates the initial tables and serves the HTTP and
//! WebSocket API until interrupted.

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Error};
use holdem_engine::{table::NotificationHub, wallet::WalletManager};
use holdem_server::{api, config::ServerConfig, logging, metrics};
use log::info;
use pico_args::Arguments;

const HELP: &str = "\
Run a multi-table holdem server

USAGE:
  holdem_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --tables     N           Number of tables to create  [default: env MAX_TABLES or 1]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  METRICS_BIND             Prometheus exporter address (disabled when unset)
  DEFAULT_WALLET_BALANCE   Balance a new wallet opens with
  EVENT_QUEUE_CAPACITY     Events buffered per subscriber before it is dropped
  TABLE_SMALL_BLIND, TABLE_BIG_BLIND, TABLE_MAX_PLAYERS, TABLE_MIN_BUY_IN,
  TABLE_STARTING_CHIPS, TABLE_MIN_BALANCE, TABLE_SPEED (normal|turbo|hyper),
  TABLE_AUTO_START_DELAY_MS
                           Defaults for new tables
  RUST_LOG                 Log filter (e.g., info,holdem_engine=debug)
  (A .env file in the working directory is loaded first)
";

struct Args {
    bind: Option<SocketAddr>,
    num_tables: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        num_tables: pargs.opt_value_from_str("--tables")?,
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.num_tables)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(Error::msg)?;
        info!("Prometheus metrics exported at http://{addr}/metrics");
    }

    let hub = NotificationHub::new(config.hub_capacity);
    metrics::spawn_event_recorder(hub.clone());

    let wallet = Arc::new(WalletManager::new(config.opening_balance));
    let state = api::AppState::new(wallet, hub, config.table_defaults.clone());

    info!("Creating {} initial table(s)...", config.num_tables);
    for i in 0..config.num_tables {
        let table_config = config.table_defaults.table_config(format!("Table {}", i + 1));
        let table_id = state
            .registry
            .create_table(table_config)
            .await
            .with_context(|| format!("Failed to create table {}", i + 1))?;
        info!("Created table {} with ID {}", i + 1, table_id);
    }

    for table in state.registry.list_tables().await {
        info!(
            "  - {} (ID: {}) - {}/{} players, blinds: {}/{}",
            table.name,
            table.table_id,
            table.player_count,
            table.max_players,
            table.small_blind,
            table.big_blind
        );
    }

    let app = api::create_router(state);

    info!("Starting HTTP/WebSocket server on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");

    Ok(())
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
