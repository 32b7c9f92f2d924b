//! WebSocket handler for real-time table updates.
//!
//! A connection follows one table as one player. The server pushes every
//! event that player may see (public events plus their own private ones)
//! and accepts commands on the same socket.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws/{table_id}?player_id=<id>`
//! 2. Server sends the current snapshot (and the player's hole cards when
//!    they are in a hand)
//! 3. Server forwards table events as they are published
//! 4. If the connection falls too far behind, the event subscription is
//!    dropped by the hub; the server subscribes again and sends a fresh
//!    snapshot so the client can resynchronize
//!
//! Disconnecting does not stand the player up: an absent player's time bank
//! runs out and the table checks or folds for them.
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:6969/ws/1?player_id=7');
//!
//! ws.onmessage = (event) => {
//!   const data = JSON.parse(event.data);
//!   if (data.type === 'event') handleEvent(data.event);
//! };
//!
//! ws.send(JSON.stringify({ type: 'action', action: { type: 'bet', amount: 100 } }));
//! ```

use axum::{
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use holdem_engine::{
    game::entities::{Action, Card, Chips, PlayerId, TableId},
    table::{EventEnvelope, GameEvent, TableHandle, TableSnapshot},
};
use serde::{Deserialize, Serialize};

use super::{
    AppState,
    error::{ApiError, ApiResult},
    tables::ActionPayload,
};
use crate::metrics;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    player_id: PlayerId,
}

/// Client messages received via WebSocket
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Join { buy_in: Option<Chips> },
    Leave,
    Ready,
    Unready,
    Action {
        action: ActionPayload,
        version: Option<u64>,
    },
}

/// Messages sent to the client
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage<'a> {
    Snapshot { state: &'a TableSnapshot },
    HoleCards { cards: Vec<Card> },
    Event { event: &'a EventEnvelope },
    Success { message: String },
    Error { message: String },
}

type Sender = SplitSink<WebSocket, Message>;

/// Upgrade HTTP connection to WebSocket for one table and one player.
///
/// # Errors
///
/// - `404 Not Found`: Table doesn't exist (checked before upgrading)
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(table_id): Path<TableId>,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> ApiResult<Response> {
    let handle = state.registry.get_table(table_id).await?;
    let player_id = query.player_id;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, handle, player_id)))
}

async fn handle_socket(socket: WebSocket, handle: TableHandle, player_id: PlayerId) {
    let table_id = handle.table_id();
    let (mut sender, mut receiver) = socket.split();
    metrics::websocket_connected();
    tracing::info!(table_id, player_id, "WebSocket connected");

    let mut subscription = handle.subscribe(player_id);
    if send_sync(&mut sender, &handle, player_id).await.is_err() {
        metrics::websocket_disconnected();
        return;
    }

    loop {
        tokio::select! {
            event = subscription.recv() => {
                let Some(envelope) = event else {
                    // Dropped by the hub for falling behind.
                    tracing::warn!(table_id, player_id, "WebSocket lagged, resynchronizing");
                    subscription = handle.subscribe(player_id);
                    if send_sync(&mut sender, &handle, player_id).await.is_err() {
                        break;
                    }
                    continue;
                };
                if send(&mut sender, &ServerMessage::Event { event: &envelope }).await.is_err() {
                    break;
                }
                if matches!(envelope.event, GameEvent::TableRemoved) {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            }
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(command) => handle_client_message(command, &handle, player_id).await,
                            Err(e) => {
                                tracing::debug!(table_id, player_id, error = %e, "Unparseable client message");
                                ServerMessage::Error {
                                    message: "Invalid message format".to_string(),
                                }
                            }
                        };
                        if send(&mut sender, &response).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(table_id, player_id, error = %e, "WebSocket error");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    metrics::websocket_disconnected();
    tracing::info!(table_id, player_id, "WebSocket disconnected");
}

async fn send(sender: &mut Sender, message: &ServerMessage<'_>) -> Result<(), axum::Error> {
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize WebSocket message");
            return Ok(());
        }
    };
    sender.send(Message::Text(json.into())).await?;
    metrics::websocket_messages_sent();
    Ok(())
}

/// Current snapshot, then the player's hole cards if they hold any.
async fn send_sync(
    sender: &mut Sender,
    handle: &TableHandle,
    player_id: PlayerId,
) -> Result<(), axum::Error> {
    let state = handle.state();
    send(sender, &ServerMessage::Snapshot { state: &state }).await?;
    if let Ok(cards) = handle.hole_cards(player_id).await
        && !cards.is_empty()
    {
        send(sender, &ServerMessage::HoleCards { cards }).await?;
    }
    Ok(())
}

async fn handle_client_message(
    command: ClientMessage,
    handle: &TableHandle,
    player_id: PlayerId,
) -> ServerMessage<'static> {
    let result = match command {
        ClientMessage::Join { buy_in } => handle
            .add_player(player_id, buy_in)
            .await
            .map(|seat| format!("Seated at {seat}")),
        ClientMessage::Leave => handle
            .remove_player(player_id)
            .await
            .map(|cashed_out| format!("Cashed out {cashed_out}")),
        ClientMessage::Ready => handle
            .set_ready(player_id)
            .await
            .map(|()| "Ready".to_string()),
        ClientMessage::Unready => handle
            .set_unready(player_id)
            .await
            .map(|()| "Not ready".to_string()),
        ClientMessage::Action { action, version } => {
            let action = Action::from(action);
            handle
                .act(player_id, action, version)
                .await
                .map(|()| format!("Player {player_id} {action}"))
        }
    };

    match result {
        Ok(message) => ServerMessage::Success { message },
        Err(err) => ServerMessage::Error {
            message: ApiError::from(err).message,
        },
    }
}
