//! Prometheus metrics for monitoring table activity and server health.
//!
//! Game metrics are not recorded at the call sites: a background task holds
//! an "all events" subscription on the hub and turns every event into
//! counters and gauges (see [`spawn_event_recorder`]). Metrics are exposed
//! in Prometheus text format when an exporter address is configured.
//!
//! # Metrics Categories
//!
//! - **HTTP Metrics**: Request counts by method, route and status
//! - **WebSocket Metrics**: Active connections, messages sent
//! - **Game Metrics**: Active tables, seated players, hands, actions, pots
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use holdem_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::http_requests_total("POST", "/api/v1/tables/{table_id}/action", 200);
//! ```

use holdem_engine::{
    game::betting::BetKind,
    table::{GameEvent, NotificationHub, SubscriptionFilter},
};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tokio::task::JoinHandle;

use crate::logging;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Increments the total HTTP request counter with method, path, and status labels.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// WebSocket Metrics
// ============================================================================

/// A WebSocket connection opened.
pub fn websocket_connected() {
    metrics::counter!("websocket_connections_total").increment(1);
    metrics::gauge!("websocket_connections_active").increment(1.0);
}

/// A WebSocket connection closed.
pub fn websocket_disconnected() {
    metrics::gauge!("websocket_connections_active").decrement(1.0);
}

pub fn websocket_messages_sent() {
    metrics::counter!("websocket_messages_sent").increment(1);
}

// ============================================================================
// Game Metrics
// ============================================================================

fn bet_kind_label(kind: BetKind) -> &'static str {
    match kind {
        BetKind::Check => "check",
        BetKind::Call => "call",
        BetKind::Bet => "bet",
        BetKind::Raise => "raise",
        BetKind::AllIn => "all_in",
        BetKind::Fold => "fold",
    }
}

/// Update game metrics for one event.
pub fn record_event(event: &GameEvent) {
    match event {
        GameEvent::TableCreated { .. } => metrics::gauge!("active_tables").increment(1.0),
        GameEvent::TableRemoved => metrics::gauge!("active_tables").decrement(1.0),
        GameEvent::PlayerJoined { .. } => metrics::gauge!("seated_players").increment(1.0),
        GameEvent::PlayerLeft { .. } => metrics::gauge!("seated_players").decrement(1.0),
        GameEvent::HandStarted { .. } => metrics::counter!("hands_started_total").increment(1),
        GameEvent::BetMade { kind, auto, .. } => {
            metrics::counter!("actions_total",
                "kind" => bet_kind_label(*kind),
                "auto" => auto.to_string()
            )
            .increment(1);
        }
        GameEvent::PlayerFolded { auto, .. } => {
            metrics::counter!("actions_total",
                "kind" => "fold",
                "auto" => auto.to_string()
            )
            .increment(1);
        }
        GameEvent::ShowdownResult(summary) => {
            for pot in &summary.pots {
                metrics::counter!("pots_awarded_total").increment(1);
                metrics::histogram!("pot_size_chips").record(pot.amount as f64);
            }
        }
        _ => {}
    }
}

/// Log and record every event the hub publishes.
///
/// If the recorder falls far enough behind to be disconnected it
/// subscribes again; events published in between are not counted.
pub fn spawn_event_recorder(hub: NotificationHub) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let mut subscription = hub.subscribe(SubscriptionFilter::all());
            while let Some(envelope) = subscription.recv().await {
                logging::log_event(&envelope);
                record_event(&envelope.event);
            }
            metrics::counter!("event_recorder_resubscribes_total").increment(1);
            log::warn!("Event recorder was disconnected, subscribing again");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use holdem_engine::table::{Audience, EventEnvelope};
    use std::time::Duration;

    #[test]
    fn test_record_event_without_recorder() {
        // Metrics macros are no-ops until an exporter is installed
        record_event(&GameEvent::TableRemoved);
        record_event(&GameEvent::HandStarted {
            hand_number: 1,
            button: 0,
            players: vec![1, 2],
        });
        http_requests_total("GET", "/health", 200);
    }

    #[tokio::test]
    async fn test_event_recorder_drains_the_hub() {
        let hub = NotificationHub::new(4);
        let recorder = spawn_event_recorder(hub.clone());

        // Wait until the recorder has subscribed.
        while hub.subscriber_count() == 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        for seq in 1..=20 {
            hub.publish(EventEnvelope::new(
                Some(1),
                seq,
                Audience::Everyone,
                GameEvent::TableRemoved,
            ));
            tokio::task::yield_now().await;
        }
        assert_eq!(hub.subscriber_count(), 1);
        recorder.abort();
    }
}
