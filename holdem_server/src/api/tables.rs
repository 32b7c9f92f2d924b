//! Table management API handlers.
//!
//! This module provides HTTP REST endpoints for table operations including:
//! - Listing and creating tables
//! - Reading the public snapshot of a table
//! - Joining (buy-in) and leaving (cash-out)
//! - Readiness and player actions
//!
//! Listing, reading and creating tables are public; everything a player does
//! needs the `x-player-id` header (see [`super::middleware`]).
//!
//! # Examples
//!
//! Join a table:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/tables/1/join \
//!   -H "x-player-id: 7" \
//!   -H "Content-Type: application/json" \
//!   -d '{"buy_in": 1000}'
//! ```
//!
//! Raise to 120:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/tables/1/action \
//!   -H "x-player-id: 7" \
//!   -H "Content-Type: application/json" \
//!   -d '{"action": {"type": "bet", "amount": 120}}'
//! ```

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
};
use holdem_engine::{
    game::entities::{Action, Card, Chips, PlayerId, SeatIndex, TableId},
    table::{TableMetadata, TableSnapshot, TableSpeed},
};
use serde::{Deserialize, Serialize};

use super::{
    AppState,
    error::{ApiError, ApiResult},
    request_id::RequestId,
};

/// Optional overrides of the server's table defaults.
#[derive(Debug, Default, Deserialize)]
pub struct CreateTableRequest {
    /// Look up or create the table under this id instead of a generated one
    pub table_id: Option<TableId>,
    pub name: Option<String>,
    pub small_blind: Option<Chips>,
    pub big_blind: Option<Chips>,
    pub max_players: Option<usize>,
    pub min_buy_in: Option<Chips>,
    pub starting_chips: Option<Chips>,
    pub speed: Option<TableSpeed>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTableResponse {
    pub table_id: TableId,
}

#[derive(Debug, Default, Deserialize)]
pub struct JoinTableRequest {
    /// Table default when omitted
    pub buy_in: Option<Chips>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinTableResponse {
    pub seat: SeatIndex,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LeaveTableResponse {
    pub cashed_out: Chips,
}

#[derive(Debug, Deserialize)]
pub struct TakeActionRequest {
    pub action: ActionPayload,
    /// Snapshot version the action was decided on
    pub version: Option<u64>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionPayload {
    Fold,
    Check,
    Call,
    /// Raise (or open) to a total of `amount` for the street
    Bet { amount: Chips },
    AllIn,
}

impl From<ActionPayload> for Action {
    fn from(payload: ActionPayload) -> Self {
        match payload {
            ActionPayload::Fold => Action::Fold,
            ActionPayload::Check => Action::Check,
            ActionPayload::Call => Action::Call,
            ActionPayload::Bet { amount } => Action::Bet(amount),
            ActionPayload::AllIn => Action::AllIn,
        }
    }
}

/// List all tables, ordered by id.
pub async fn list_tables(State(state): State<AppState>) -> Json<Vec<TableMetadata>> {
    Json(state.registry.list_tables().await)
}

/// Create a table from the server defaults plus any overrides.
///
/// With a `table_id` the call is idempotent: an existing table under that
/// id is returned unchanged.
///
/// # Errors
///
/// - `400 Bad Request`: The resulting configuration is invalid
pub async fn create_table(
    State(state): State<AppState>,
    body: Option<Json<CreateTableRequest>>,
) -> ApiResult<(StatusCode, Json<CreateTableResponse>)> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let name = match request.name {
        Some(name) => name,
        None => format!("Table {}", state.registry.active_table_count().await + 1),
    };

    let mut config = state.table_defaults.table_config(name);
    config.small_blind = request.small_blind.unwrap_or(config.small_blind);
    config.big_blind = request.big_blind.unwrap_or(config.big_blind);
    config.max_players = request.max_players.unwrap_or(config.max_players);
    config.min_buy_in = request.min_buy_in.unwrap_or(config.min_buy_in);
    config.starting_chips = request.starting_chips.unwrap_or(config.starting_chips);
    if let Some(speed) = request.speed {
        config.time_bank = speed.time_bank();
    }

    let table_id = match request.table_id {
        Some(table_id) => {
            state.registry.get_or_create(table_id, config).await?;
            table_id
        }
        None => state.registry.create_table(config).await?,
    };
    Ok((StatusCode::CREATED, Json(CreateTableResponse { table_id })))
}

/// Public snapshot of a table. Hole cards are never included.
///
/// # Errors
///
/// - `404 Not Found`: Table doesn't exist
pub async fn get_table(
    State(state): State<AppState>,
    Path(table_id): Path<TableId>,
) -> ApiResult<Json<TableSnapshot>> {
    let snapshot = state.registry.get_state(table_id).await?;
    Ok(Json(snapshot.as_ref().clone()))
}

/// Remove an empty table.
///
/// # Errors
///
/// - `404 Not Found`: Table doesn't exist
/// - `409 Conflict`: Players are still seated or a hand is running
pub async fn remove_table(
    State(state): State<AppState>,
    Path(table_id): Path<TableId>,
) -> ApiResult<StatusCode> {
    state.registry.remove_table(table_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Sit down, moving the buy-in from the player's balance to the table.
///
/// # Errors
///
/// - `400 Bad Request`: Buy-in below the table minimum, or a hand is running
/// - `402 Payment Required`: Balance too low
/// - `409 Conflict`: Table full or already seated
pub async fn join_table(
    State(state): State<AppState>,
    Extension(player_id): Extension<PlayerId>,
    Path(table_id): Path<TableId>,
    body: Option<Json<JoinTableRequest>>,
) -> ApiResult<Json<JoinTableResponse>> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let seat = state
        .registry
        .add_player(table_id, player_id, request.buy_in)
        .await?;
    Ok(Json(JoinTableResponse { seat }))
}

/// Stand up and cash out. Folds first when the player is in a hand.
pub async fn leave_table(
    State(state): State<AppState>,
    Extension(player_id): Extension<PlayerId>,
    Path(table_id): Path<TableId>,
) -> ApiResult<Json<LeaveTableResponse>> {
    let cashed_out = state.registry.remove_player(table_id, player_id).await?;
    Ok(Json(LeaveTableResponse { cashed_out }))
}

pub async fn set_ready(
    State(state): State<AppState>,
    Extension(player_id): Extension<PlayerId>,
    Path(table_id): Path<TableId>,
) -> ApiResult<StatusCode> {
    state.registry.set_ready(table_id, player_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_unready(
    State(state): State<AppState>,
    Extension(player_id): Extension<PlayerId>,
    Path(table_id): Path<TableId>,
) -> ApiResult<StatusCode> {
    state.registry.set_unready(table_id, player_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Take an action for the current betting round.
///
/// # Errors
///
/// - `400 Bad Request`: Not your turn, wrong phase, or illegal amount
/// - `404 Not Found`: Table doesn't exist or player not seated
/// - `409 Conflict`: `version` is stale
pub async fn take_action(
    State(state): State<AppState>,
    Extension(player_id): Extension<PlayerId>,
    request_id: RequestId,
    Path(table_id): Path<TableId>,
    Json(request): Json<TakeActionRequest>,
) -> ApiResult<StatusCode> {
    let action: Action = request.action.into();
    state
        .registry
        .act(table_id, player_id, action, request.version)
        .await
        .map_err(|err| {
            tracing::debug!(
                request_id = request_id.as_str(),
                table_id,
                player_id,
                %action,
                error = %err,
                "Action rejected"
            );
            ApiError::from(err)
        })?;
    Ok(StatusCode::NO_CONTENT)
}

/// The calling player's own hole cards.
pub async fn hole_cards(
    State(state): State<AppState>,
    Extension(player_id): Extension<PlayerId>,
    Path(table_id): Path<TableId>,
) -> ApiResult<Json<Vec<Card>>> {
    let handle = state.registry.get_table(table_id).await?;
    Ok(Json(handle.hole_cards(player_id).await?))
}
