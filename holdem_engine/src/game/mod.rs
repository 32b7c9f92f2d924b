//! Poker game engine - cards, hand evaluation, betting and the table FSM.
//!
//! This module provides the synchronous core of a table:
//! - Cards, decks and player seats
//! - A deterministic hand evaluator for any number of cards
//! - Betting rounds with minimum-raise and reopening rules
//! - Main and side pot partitioning with odd-chip distribution
//! - The [`Table`] state machine that drives a hand to showdown

pub mod betting;
pub mod entities;
pub mod functional;
pub mod pots;
pub mod state_machine;

pub use state_machine::Table;
