//! Wallet and tip handlers.
//!
//! All endpoints act on the player named by the `x-player-id` header.

use axum::{
    Json,
    extract::{Extension, Query, State},
};
use holdem_engine::{
    game::entities::{Chips, PlayerId},
    table::TipReceipt,
    wallet::{Ledger, WalletEntry},
};
use serde::{Deserialize, Serialize};

use super::{AppState, error::ApiResult};

const DEFAULT_ENTRY_LIMIT: usize = 50;
const MAX_ENTRY_LIMIT: usize = 500;

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub player_id: PlayerId,
    pub balance: Chips,
}

#[derive(Debug, Deserialize)]
pub struct EntriesQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    pub amount: Chips,
}

#[derive(Debug, Deserialize)]
pub struct TipRequest {
    pub to: PlayerId,
    pub amount: Chips,
}

pub async fn get_balance(
    State(state): State<AppState>,
    Extension(player_id): Extension<PlayerId>,
) -> ApiResult<Json<BalanceResponse>> {
    let balance = state.wallet.balance(player_id).await?;
    Ok(Json(BalanceResponse { player_id, balance }))
}

/// Journal entries, most recent first.
pub async fn get_entries(
    State(state): State<AppState>,
    Extension(player_id): Extension<PlayerId>,
    Query(query): Query<EntriesQuery>,
) -> Json<Vec<WalletEntry>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_ENTRY_LIMIT)
        .min(MAX_ENTRY_LIMIT);
    Json(state.wallet.get_entries(player_id, limit).await)
}

/// Fund a wallet from outside the game.
pub async fn deposit(
    State(state): State<AppState>,
    Extension(player_id): Extension<PlayerId>,
    Json(request): Json<DepositRequest>,
) -> ApiResult<Json<BalanceResponse>> {
    let balance = state.wallet.deposit(player_id, request.amount).await?;
    Ok(Json(BalanceResponse { player_id, balance }))
}

/// Move chips between two players' balances.
///
/// # Errors
///
/// - `400 Bad Request`: Zero amount or tipping yourself
/// - `402 Payment Required`: Balance too low
pub async fn tip(
    State(state): State<AppState>,
    Extension(player_id): Extension<PlayerId>,
    Json(request): Json<TipRequest>,
) -> ApiResult<Json<TipReceipt>> {
    let receipt = state
        .registry
        .tip(player_id, request.to, request.amount)
        .await?;
    Ok(Json(receipt))
}
