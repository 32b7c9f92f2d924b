//! The seam between tables and whatever holds players' money.

use async_trait::async_trait;

use super::{errors::WalletResult, models::TransferRequest};
use crate::game::entities::{Chips, PlayerId};

/// External balance store.
///
/// Tables only move chips through this trait: a debit when a player sits
/// down, a credit when they leave. Implementations must reject a debit that
/// would take a balance below zero and must treat a reused idempotency key
/// as a duplicate.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Current balance of a player.
    async fn balance(&self, player_id: PlayerId) -> WalletResult<Chips>;

    /// Take chips out of a player's wallet. Returns the new balance.
    async fn debit(&self, request: TransferRequest) -> WalletResult<Chips>;

    /// Put chips into a player's wallet. Returns the new balance.
    async fn credit(&self, request: TransferRequest) -> WalletResult<Chips>;
}
