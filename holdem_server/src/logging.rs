//! Structured logging configuration.
//!
//! The engine logs through the `log` facade; the subscriber installed here
//! also captures those records so everything ends up in one stream.

use holdem_engine::table::{EventEnvelope, GameEvent};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging.
///
/// Log levels are configurable via the `RUST_LOG` env var.
///
/// # Example
///
/// ```no_run
/// use holdem_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,tower_http=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a table event with table, hand and player fields.
///
/// Private events are logged without their payload.
pub fn log_event(envelope: &EventEnvelope) {
    let table_id = envelope.table_id;
    let seq = envelope.seq;
    let event = envelope.event.name();
    match &envelope.event {
        GameEvent::HoleCardsDealt { player_id, .. } => {
            tracing::trace!(table_id, seq, event, player_id, "Hole cards dealt");
        }
        GameEvent::BalanceUpdated {
            player_id, delta, ..
        } => {
            tracing::debug!(seq, event, player_id, delta, "Balance updated");
        }
        GameEvent::HandStarted {
            hand_number,
            players,
            ..
        } => {
            tracing::info!(
                table_id,
                seq,
                event,
                hand_number,
                players = players.len(),
                "Hand started"
            );
        }
        GameEvent::ShowdownResult(summary) => {
            let paid: u64 = summary.pots.iter().map(|pot| pot.amount).sum();
            tracing::info!(
                table_id,
                seq,
                event,
                hand_number = summary.hand_number,
                uncontested = summary.uncontested,
                paid,
                "Hand finished"
            );
        }
        GameEvent::BetMade {
            player_id,
            amount,
            auto,
            ..
        } => {
            tracing::debug!(table_id, seq, event, player_id, amount, auto, "Bet made");
        }
        GameEvent::PlayerFolded {
            player_id, auto, ..
        } => {
            tracing::debug!(table_id, seq, event, player_id, auto, "Player folded");
        }
        _ => {
            tracing::debug!(table_id, seq, event, "Table event");
        }
    }
}
