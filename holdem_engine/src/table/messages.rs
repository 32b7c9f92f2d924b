//! Table actor message types and the public table snapshot.

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use super::{errors::TableResult, notifications::ShowdownSummary};
use crate::game::{
    entities::{Action, Card, Chips, Phase, PlayerId, SeatIndex, TableId},
    pots::Pot,
};

/// Reply channel for a table request
pub type Reply<T> = oneshot::Sender<TableResult<T>>;

/// Messages that can be sent to a TableActor
#[derive(Debug)]
pub enum TableMessage {
    /// Sit down, buying in for `stack` (table default when `None`)
    AddPlayer {
        player_id: PlayerId,
        stack: Option<Chips>,
        response: Reply<SeatIndex>,
    },

    /// Stand up and cash out; folds first if mid-hand
    RemovePlayer {
        player_id: PlayerId,
        response: Reply<Chips>,
    },

    /// Mark ready or not ready for the next hand
    SetReady {
        player_id: PlayerId,
        ready: bool,
        response: Reply<()>,
    },

    /// Player action (check, call, bet, fold, all-in)
    TakeAction {
        player_id: PlayerId,
        action: Action,
        /// Reject with a concurrency error unless the table is at this version
        expected_version: Option<u64>,
        response: Reply<()>,
    },

    /// A player's own hole cards
    GetHoleCards {
        player_id: PlayerId,
        response: Reply<Vec<Card>>,
    },

    /// Close table; only allowed while nobody is seated
    Close { response: Reply<()> },
}

/// One seat as everyone sees it. Hole cards are never included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatView {
    pub player_id: PlayerId,
    pub seat: SeatIndex,
    pub stack: Chips,
    /// Chips in front of the player this street
    pub bet: Chips,
    /// Everything the player has put in this hand, current street included
    pub committed: Chips,
    pub in_hand: bool,
    pub folded: bool,
    pub all_in: bool,
    pub ready: bool,
    pub time_bank_ms: u64,
}

/// Read-only view of a table at one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    /// Table ID
    pub table_id: TableId,

    /// Table name
    pub name: String,

    /// Bumped by every successful mutation
    pub version: u64,

    pub phase: Phase,

    pub hand_number: u64,

    pub button: Option<SeatIndex>,

    pub board: Vec<Card>,

    /// Settled pots from earlier streets
    pub pots: Vec<Pot>,

    /// All chips committed this hand, current street included
    pub pot_total: Chips,

    pub current_bet: Chips,

    pub min_raise: Chips,

    /// Player whose turn it is
    pub to_act: Option<PlayerId>,

    pub small_blind: Chips,

    pub big_blind: Chips,

    pub max_players: usize,

    /// Occupied seats in seat order
    pub players: Vec<SeatView>,

    /// Result of the most recent hand
    pub last_showdown: Option<ShowdownSummary>,

    /// The table stopped after an invariant violation
    pub halted: bool,
}

impl TableSnapshot {
    pub fn player(&self, player_id: PlayerId) -> Option<&SeatView> {
        self.players.iter().find(|view| view.player_id == player_id)
    }

    /// Sum of every stack plus everything committed this hand
    pub fn total_chips(&self) -> Chips {
        self.players.iter().map(|view| view.stack).sum::<Chips>() + self.pot_total
    }
}
