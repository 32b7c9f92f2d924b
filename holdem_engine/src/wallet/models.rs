//! Wallet data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::entities::{Chips, PlayerId};

pub use crate::game::entities::TableId;

/// Wallet model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub player_id: PlayerId,
    pub balance: Chips,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Wallet entry model (one line of the journal)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletEntry {
    pub id: Uuid,
    pub player_id: PlayerId,
    pub table_id: Option<TableId>,
    pub amount: Chips,
    pub balance_after: Chips,
    pub direction: EntryDirection,
    pub entry_type: EntryType,
    pub idempotency_key: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Entry direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryDirection {
    Debit,
    Credit,
}

impl std::fmt::Display for EntryDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryDirection::Debit => write!(f, "debit"),
            EntryDirection::Credit => write!(f, "credit"),
        }
    }
}

/// Entry type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    BuyIn,
    CashOut,
    Tip,
    Deposit,
    /// Compensating entry written when a table operation is rolled back
    Reversal,
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryType::BuyIn => write!(f, "buy_in"),
            EntryType::CashOut => write!(f, "cash_out"),
            EntryType::Tip => write!(f, "tip"),
            EntryType::Deposit => write!(f, "deposit"),
            EntryType::Reversal => write!(f, "reversal"),
        }
    }
}

/// A request to move chips in or out of a player's wallet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub player_id: PlayerId,
    pub table_id: Option<TableId>,
    pub amount: Chips,
    pub entry_type: EntryType,
    pub idempotency_key: String,
    pub description: Option<String>,
}

impl TransferRequest {
    /// Build a request with a fresh idempotency key derived from the entry
    /// type and participants.
    pub fn new(
        player_id: PlayerId,
        table_id: Option<TableId>,
        amount: Chips,
        entry_type: EntryType,
    ) -> Self {
        let idempotency_key = match table_id {
            Some(table_id) => format!("{entry_type}_{table_id}_{player_id}_{}", Uuid::new_v4()),
            None => format!("{entry_type}_{player_id}_{}", Uuid::new_v4()),
        };
        Self {
            player_id,
            table_id,
            amount,
            entry_type,
            idempotency_key,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
