//! Wallet error types.

use super::models::TableId;
use crate::game::entities::{Chips, PlayerId};
use thiserror::Error;

/// Wallet errors
#[derive(Debug, Error)]
pub enum WalletError {
    /// Insufficient balance
    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: Chips, required: Chips },

    /// Wallet not found
    #[error("Wallet not found for player {0}")]
    WalletNotFound(PlayerId),

    /// Duplicate transaction (idempotency key already used)
    #[error("Duplicate transaction: {0}")]
    DuplicateTransaction(String),

    /// Invalid amount (must be positive)
    #[error("Invalid amount: {0}")]
    InvalidAmount(Chips),

    /// Balance would overflow
    #[error("Balance overflow")]
    BalanceOverflow,

    /// A player tried to move chips to themselves
    #[error("Cannot transfer chips to yourself")]
    SelfTransfer,

    /// The backing store rejected or lost the transaction
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Chips were moved for a table that does not exist
    #[error("Unknown table {0}")]
    UnknownTable(TableId),
}

impl WalletError {
    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Player and table IDs are redacted, and backend failures are reported
    /// generically.
    pub fn client_message(&self) -> String {
        match self {
            WalletError::TransactionFailed(_) => "Internal server error".to_string(),
            WalletError::WalletNotFound(_) => "Wallet not found".to_string(),
            WalletError::UnknownTable(_) => "Table not found".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for wallet operations
pub type WalletResult<T> = Result<T, WalletError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_message_redacts_ids() {
        assert_eq!(WalletError::WalletNotFound(42).client_message(), "Wallet not found");
        assert_eq!(
            WalletError::TransactionFailed("lock poisoned".into()).client_message(),
            "Internal server error"
        );
        assert_eq!(
            WalletError::InsufficientBalance { available: 5, required: 10 }.client_message(),
            "Insufficient balance: available 5, required 10"
        );
    }
}
