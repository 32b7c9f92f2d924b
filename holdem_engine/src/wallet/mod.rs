//! Wallet module providing the ledger seam used by tables.
//!
//! This module implements:
//! - The [`Ledger`] trait tables use for buy-ins and cash-outs
//! - An in-memory [`WalletManager`] with a journal of every entry
//! - Idempotency keys to prevent duplicate transactions
//!
//! ## Example
//!
//! ```
//! use holdem_engine::wallet::{EntryType, Ledger, TransferRequest, WalletManager};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let wallet = WalletManager::new(1_000);
//!
//! let balance = wallet
//!     .debit(TransferRequest::new(7, Some(1), 400, EntryType::BuyIn))
//!     .await?;
//! assert_eq!(balance, 600);
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod ledger;
pub mod manager;
pub mod models;

pub use errors::{WalletError, WalletResult};
pub use ledger::Ledger;
pub use manager::WalletManager;
pub use models::{EntryDirection, EntryType, TableId, TransferRequest, Wallet, WalletEntry};
