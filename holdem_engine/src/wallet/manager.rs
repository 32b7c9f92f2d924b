//! In-memory wallet manager with an append-only journal.

use super::{
    errors::{WalletError, WalletResult},
    ledger::Ledger,
    models::{EntryDirection, TransferRequest, Wallet, WalletEntry},
};
use crate::game::entities::{Chips, PlayerId};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Default balance handed to a wallet the first time it is touched.
pub const DEFAULT_WALLET_BALANCE: Chips = 10_000;

#[derive(Default)]
struct LedgerState {
    wallets: HashMap<PlayerId, Wallet>,
    entries: Vec<WalletEntry>,
    idempotency_keys: HashSet<String>,
}

impl LedgerState {
    fn wallet_mut(&mut self, player_id: PlayerId, default_balance: Chips) -> &mut Wallet {
        self.wallets.entry(player_id).or_insert_with(|| {
            let now = Utc::now();
            Wallet {
                player_id,
                balance: default_balance,
                created_at: now,
                updated_at: now,
            }
        })
    }

    fn record(&mut self, request: TransferRequest, direction: EntryDirection, balance_after: Chips) {
        self.idempotency_keys.insert(request.idempotency_key.clone());
        self.entries.push(WalletEntry {
            id: Uuid::new_v4(),
            player_id: request.player_id,
            table_id: request.table_id,
            amount: request.amount,
            balance_after,
            direction,
            entry_type: request.entry_type,
            idempotency_key: request.idempotency_key,
            description: request.description,
            created_at: Utc::now(),
        });
    }
}

/// Wallet manager
///
/// Every player gets a wallet holding `default_balance` chips on first use.
/// All operations take one lock, so a debit's balance check and update are
/// atomic.
pub struct WalletManager {
    default_balance: Chips,
    state: Mutex<LedgerState>,
}

impl WalletManager {
    /// Create a new wallet manager
    ///
    /// # Arguments
    ///
    /// * `default_balance` - Balance given to wallets on first use
    ///
    /// # Returns
    ///
    /// * `WalletManager` - New wallet manager instance
    pub fn new(default_balance: Chips) -> Self {
        Self {
            default_balance,
            state: Mutex::new(LedgerState::default()),
        }
    }

    /// Create a wallet manager using `DEFAULT_WALLET_BALANCE` from the
    /// environment, falling back to [`DEFAULT_WALLET_BALANCE`].
    pub fn from_env() -> Self {
        let default_balance = std::env::var("DEFAULT_WALLET_BALANCE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_WALLET_BALANCE);
        Self::new(default_balance)
    }

    /// Get wallet for a player, creating it with the default balance if needed
    pub async fn get_wallet(&self, player_id: PlayerId) -> Wallet {
        let mut state = self.state.lock().await;
        state.wallet_mut(player_id, self.default_balance).clone()
    }

    /// Add chips to a wallet from outside the game
    ///
    /// # Returns
    ///
    /// * `WalletResult<Chips>` - New wallet balance or error
    pub async fn deposit(&self, player_id: PlayerId, amount: Chips) -> WalletResult<Chips> {
        self.credit(TransferRequest::new(
            player_id,
            None,
            amount,
            super::models::EntryType::Deposit,
        ))
        .await
    }

    /// Get journal entries for a player, most recent first
    ///
    /// # Arguments
    ///
    /// * `player_id` - Player ID
    /// * `limit` - Maximum number of entries to return
    pub async fn get_entries(&self, player_id: PlayerId, limit: usize) -> Vec<WalletEntry> {
        let state = self.state.lock().await;
        state
            .entries
            .iter()
            .rev()
            .filter(|entry| entry.player_id == player_id)
            .take(limit)
            .cloned()
            .collect()
    }

    fn check_request(state: &LedgerState, request: &TransferRequest) -> WalletResult<()> {
        if request.amount == 0 {
            return Err(WalletError::InvalidAmount(request.amount));
        }
        if state.idempotency_keys.contains(&request.idempotency_key) {
            return Err(WalletError::DuplicateTransaction(
                request.idempotency_key.clone(),
            ));
        }
        Ok(())
    }
}

impl Default for WalletManager {
    fn default() -> Self {
        Self::new(DEFAULT_WALLET_BALANCE)
    }
}

#[async_trait]
impl Ledger for WalletManager {
    async fn balance(&self, player_id: PlayerId) -> WalletResult<Chips> {
        Ok(self.get_wallet(player_id).await.balance)
    }

    async fn debit(&self, request: TransferRequest) -> WalletResult<Chips> {
        let mut state = self.state.lock().await;
        Self::check_request(&state, &request)?;

        let wallet = state.wallet_mut(request.player_id, self.default_balance);
        if wallet.balance < request.amount {
            return Err(WalletError::InsufficientBalance {
                available: wallet.balance,
                required: request.amount,
            });
        }
        wallet.balance -= request.amount;
        wallet.updated_at = Utc::now();
        let new_balance = wallet.balance;

        log::debug!(
            "Debited {} chips from player {} ({}), balance {}",
            request.amount,
            request.player_id,
            request.entry_type,
            new_balance
        );
        state.record(request, EntryDirection::Debit, new_balance);
        Ok(new_balance)
    }

    async fn credit(&self, request: TransferRequest) -> WalletResult<Chips> {
        let mut state = self.state.lock().await;
        Self::check_request(&state, &request)?;

        let wallet = state.wallet_mut(request.player_id, self.default_balance);
        let new_balance = wallet
            .balance
            .checked_add(request.amount)
            .ok_or(WalletError::BalanceOverflow)?;
        wallet.balance = new_balance;
        wallet.updated_at = Utc::now();

        log::debug!(
            "Credited {} chips to player {} ({}), balance {}",
            request.amount,
            request.player_id,
            request.entry_type,
            new_balance
        );
        state.record(request, EntryDirection::Credit, new_balance);
        Ok(new_balance)
    }
}
