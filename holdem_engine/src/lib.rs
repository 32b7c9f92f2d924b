//! # Hold'em Engine
//!
//! A multiplayer Texas Hold'em table engine.
//!
//! The engine keeps authoritative per-table state, runs betting rounds,
//! deals, evaluates hands and settles pots and side pots. Every table is
//! owned by a single async actor, so concurrent requests for one table are
//! applied one at a time while separate tables never contend.
//!
//! ## Core Modules
//!
//! - [`game`]: Cards, hand evaluation, pots, betting rounds and the
//!   synchronous hand state machine
//! - [`table`]: Table actors, the registry, time banks and event fan-out
//! - [`wallet`]: The balance ledger tables buy in from and cash out to
//!
//! ## Example
//!
//! ```
//! use holdem_engine::game::entities::{Card, Suit};
//! use holdem_engine::game::functional::eval;
//!
//! let hand = eval(&[
//!     Card(14, Suit::Spade),
//!     Card(13, Suit::Spade),
//!     Card(12, Suit::Spade),
//!     Card(11, Suit::Spade),
//!     Card(10, Suit::Spade),
//! ]);
//! assert_eq!(hand.rank.to_string(), "straight flush");
//! ```

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    Table,
    entities::{self, Action, Card, Chips, Phase, PlayerId, SeatIndex, Suit, TableId},
    functional,
};

/// Table actors, registry and notifications.
pub mod table;
pub use table::{TableConfig, TableError, TableHandle, TableRegistry, TableResult};

/// Balance ledger used for buy-ins, cash-outs and tips.
pub mod wallet;
pub use wallet::{Ledger, WalletManager};
