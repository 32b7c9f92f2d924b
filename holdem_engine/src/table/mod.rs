//! Table module providing multi-table support with async actor model.
//!
//! This module implements:
//! - TableActor: Async actor that owns one [`Table`](crate::game::Table)
//! - TableRegistry: Owner of every table actor, with lookup-or-create
//! - NotificationHub: Typed events fanned out to per-subscriber queues
//! - Timebank: Per-turn decision timer with stale-timeout protection
//!
//! ## Architecture
//!
//! Each table runs in a separate Tokio task with an mpsc message inbox, so
//! every mutation of one table is applied in arrival order and no two
//! requests can both act for the same seat. Snapshots are published on a
//! watch channel and read without entering the inbox. Tables share nothing
//! but the ledger and the hub.
//!
//! ## Example
//!
//! ```
//! use holdem_engine::table::{TableConfig, TableRegistry};
//! use holdem_engine::wallet::WalletManager;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = TableRegistry::new(Arc::new(WalletManager::new(10_000)));
//! let table_id = registry.create_table(TableConfig::default()).await?;
//!
//! registry.add_player(table_id, 1, Some(500)).await?;
//! registry.add_player(table_id, 2, Some(500)).await?;
//! registry.set_ready(table_id, 1).await?;
//! registry.set_ready(table_id, 2).await?;
//!
//! let state = registry.get_state(table_id).await?;
//! assert_eq!(state.hand_number, 1);
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod config;
pub mod errors;
pub mod messages;
pub mod notifications;
pub mod registry;
pub mod timebank;

pub use actor::{TableActor, TableHandle};
pub use config::{ConfigError, MAX_PLAYERS, TableConfig, TableSpeed};
pub use errors::{NotFoundError, TableError, TableResult, ValidationError};
pub use messages::{SeatView, TableMessage, TableSnapshot};
pub use notifications::{
    Audience, EventEnvelope, GameEvent, NotificationHub, Subscriber, Subscription,
    SubscriptionFilter,
};
pub use registry::{TableMetadata, TableRegistry, TipReceipt};
pub use timebank::{Timebank, TurnToken};
