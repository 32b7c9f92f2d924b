//! WebSocket endpoint tests.
//!
//! `oneshot` cannot perform a real upgrade, so these cover the HTTP side of
//! the handshake: requests the endpoint must refuse before upgrading.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use holdem_engine::{game::entities::TableId, table::NotificationHub, wallet::WalletManager};
use holdem_server::{
    api::{self, AppState},
    config::TableDefaultsConfig,
};
use std::sync::Arc;
use tower::ServiceExt;

async fn create_test_app() -> (Router, TableId) {
    let state = AppState::new(
        Arc::new(WalletManager::new(10_000)),
        NotificationHub::default(),
        TableDefaultsConfig::default(),
    );
    let table_id = state
        .registry
        .create_table(state.table_defaults.table_config("ws".to_string()))
        .await
        .unwrap();
    (api::create_router(state), table_id)
}

fn upgrade_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("connection", "upgrade")
        .header("upgrade", "websocket")
        .header("sec-websocket-version", "13")
        .header("sec-websocket-key", "dGhlIHNhbXBsZSBub25jZQ==")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_plain_get_is_not_upgraded() {
    let (app, table_id) = create_test_app().await;
    let request = Request::builder()
        .uri(format!("/ws/{table_id}?player_id=1"))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());
    assert_ne!(response.status(), StatusCode::SWITCHING_PROTOCOLS);
}

#[tokio::test]
async fn test_missing_player_id_is_rejected() {
    let (app, table_id) = create_test_app().await;
    let response = app
        .oneshot(upgrade_request(&format!("/ws/{table_id}")))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_non_numeric_table_is_rejected() {
    let (app, _) = create_test_app().await;
    let response = app
        .oneshot(upgrade_request("/ws/lobby?player_id=1"))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}
