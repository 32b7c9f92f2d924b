//! HTTP/WebSocket API for the table engine.
//!
//! A thin adapter: every handler forwards to the [`TableRegistry`] or the
//! wallet and maps engine errors onto status codes (see [`error`]).
//!
//! # Modules
//!
//! - [`tables`]: Table management and player actions
//! - [`wallet`]: Balances, journal entries, deposits and tips
//! - [`websocket`]: Live event stream for one player at one table
//! - [`middleware`]: Player identification for player-scoped endpoints
//! - [`request_id`]: Request correlation and request metrics
//!
//! # Endpoints Overview
//!
//! ```text
//! GET    /health                              - Health check
//! GET    /api/v1/tables                       - List tables
//! POST   /api/v1/tables                       - Create table
//! GET    /api/v1/tables/{table_id}            - Table snapshot
//! DELETE /api/v1/tables/{table_id}            - Remove empty table
//! POST   /api/v1/tables/{table_id}/join       - Sit down (player)
//! POST   /api/v1/tables/{table_id}/leave      - Stand up (player)
//! POST   /api/v1/tables/{table_id}/ready      - Ready for next hand (player)
//! POST   /api/v1/tables/{table_id}/unready    - Sit out (player)
//! POST   /api/v1/tables/{table_id}/action     - Take action (player)
//! GET    /api/v1/tables/{table_id}/cards      - Own hole cards (player)
//! GET    /api/v1/wallet                       - Balance (player)
//! GET    /api/v1/wallet/entries               - Journal (player)
//! POST   /api/v1/wallet/deposit               - Deposit (player)
//! POST   /api/v1/tips                         - Tip another player (player)
//! GET    /ws/{table_id}?player_id=<id>        - WebSocket
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod error;
pub mod middleware;
pub mod request_id;
pub mod tables;
pub mod wallet;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    response::Json,
    routing::{get, post},
};
use holdem_engine::{
    table::{NotificationHub, TableRegistry},
    wallet::WalletManager,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::config::TableDefaultsConfig;

/// Application state shared across all HTTP handlers and WebSocket connections.
///
/// Cloned for each request; every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<TableRegistry>,
    /// The same ledger the registry moves buy-ins and cash-outs through
    pub wallet: Arc<WalletManager>,
    pub table_defaults: Arc<TableDefaultsConfig>,
}

impl AppState {
    /// State whose registry uses `wallet` as its ledger and publishes to `hub`.
    pub fn new(
        wallet: Arc<WalletManager>,
        hub: NotificationHub,
        table_defaults: TableDefaultsConfig,
    ) -> Self {
        Self {
            registry: Arc::new(TableRegistry::with_hub(wallet.clone(), hub)),
            wallet,
            table_defaults: Arc::new(table_defaults),
        }
    }
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Example
///
/// ```rust,no_run
/// # use holdem_server::{api::{AppState, create_router}, config::TableDefaultsConfig};
/// # use holdem_engine::{table::NotificationHub, wallet::WalletManager};
/// # use std::sync::Arc;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let state = AppState::new(
///     Arc::new(WalletManager::new(10_000)),
///     NotificationHub::default(),
///     TableDefaultsConfig::default(),
/// );
/// let app = create_router(state);
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:6969").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route(
            "/tables",
            get(tables::list_tables).post(tables::create_table),
        )
        .route(
            "/tables/{table_id}",
            get(tables::get_table).delete(tables::remove_table),
        );

    let player_routes = Router::new()
        .route("/tables/{table_id}/join", post(tables::join_table))
        .route("/tables/{table_id}/leave", post(tables::leave_table))
        .route("/tables/{table_id}/ready", post(tables::set_ready))
        .route("/tables/{table_id}/unready", post(tables::set_unready))
        .route("/tables/{table_id}/action", post(tables::take_action))
        .route("/tables/{table_id}/cards", get(tables::hole_cards))
        .route("/wallet", get(wallet::get_balance))
        .route("/wallet/entries", get(wallet::get_entries))
        .route("/wallet/deposit", post(wallet::deposit))
        .route("/tips", post(wallet::tip))
        .route_layer(axum::middleware::from_fn(middleware::player_middleware));

    Router::new()
        .route("/health", get(health_check))
        .route("/ws/{table_id}", get(websocket::websocket_handler))
        .nest("/api/v1", public_routes.merge(player_routes))
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","version":"3.0.1","tables":{"active_count":1},"subscribers":1,...}
/// ```
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let table_count = state.registry.active_table_count().await;
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "tables": {
            "active_count": table_count
        },
        "subscribers": state.registry.hub().subscriber_count(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
