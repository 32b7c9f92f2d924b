//! Table error types.

use thiserror::Error;

use super::config::ConfigError;
use crate::{
    game::entities::{Chips, Phase, PlayerId, TableId},
    wallet::WalletError,
};

/// A request that is well-formed but not allowed in the current state.
/// Nothing changes when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("it is not your turn")]
    NotYourTurn,

    #[error("cannot {action} during {phase}")]
    WrongPhase { action: &'static str, phase: Phase },

    #[error("the table is full")]
    TableFull,

    #[error("player {0} is already seated")]
    AlreadySeated(PlayerId),

    #[error("buy-in of {offered} is below the table minimum of {minimum}")]
    BuyInTooSmall { minimum: Chips, offered: Chips },

    #[error("balance of {available} is below the {required} required to sit")]
    InsufficientBalance { available: Chips, required: Chips },

    #[error("cannot check facing {owed} to call")]
    CannotCheck { owed: Chips },

    #[error("bet must be at least {minimum} (got {offered})")]
    BetTooSmall { minimum: Chips, offered: Chips },

    #[error("bet of {offered} exceeds your maximum of {maximum}")]
    BetExceedsStack { maximum: Chips, offered: Chips },

    #[error("betting was not reopened; you may only call or fold")]
    RaiseNotReopened,

    #[error("a player with no chips cannot be ready")]
    NoChips,

    #[error("the table still has seated players")]
    TableNotEmpty,

    #[error("amount must be positive")]
    InvalidAmount,

    #[error("cannot tip yourself")]
    SelfTip,
}

/// Something referenced by id does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFoundError {
    #[error("table {0} not found")]
    Table(TableId),

    #[error("player {0} is not seated at this table")]
    Player(PlayerId),
}

/// Table errors
#[derive(Debug, Error)]
pub enum TableError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// The caller acted on a stale snapshot.
    #[error("stale state: expected version {expected}, table is at {actual}")]
    Concurrency { expected: u64, actual: u64 },

    /// A mutation would have broken an engine invariant. The table halts.
    #[error("invariant violated: {0}")]
    Invariant(String),

    /// The table stopped accepting mutations after an invariant violation.
    #[error("table is halted")]
    Halted,

    #[error("ledger error: {0}")]
    Ledger(#[from] WalletError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The table actor is gone.
    #[error("table is closed")]
    Closed,
}

impl TableError {
    /// Get a client-safe error message that doesn't leak internal details.
    pub fn client_message(&self) -> String {
        match self {
            TableError::Invariant(_) | TableError::Halted => {
                "Table is unavailable".to_string()
            }
            TableError::Ledger(err) => err.client_message(),
            _ => self.to_string(),
        }
    }
}

/// Result type for table operations
pub type TableResult<T> = Result<T, TableError>;
