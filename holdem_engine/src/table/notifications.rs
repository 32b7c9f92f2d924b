//! Typed game events and the hub that fans them out to subscribers.
//!
//! Every subscriber gets its own bounded queue. Publishing never blocks:
//! a subscriber whose queue is full is disconnected (its receiver drains
//! what is buffered and then ends), and one whose receiver was dropped is
//! removed. Events reach each live subscriber in publish order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::{
    game::{
        betting::{BetKind, LegalActions},
        entities::{Card, Chips, Phase, PlayerId, Rank, SeatIndex, TableId},
    },
    wallet::EntryType,
};

/// Default per-subscriber queue length.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlindKind {
    Small,
    Big,
}

/// A player's share of a pot.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Payout {
    pub player_id: PlayerId,
    pub seat: SeatIndex,
    pub amount: Chips,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PotAward {
    pub amount: Chips,
    pub eligible: Vec<SeatIndex>,
    pub winners: Vec<Payout>,
}

/// Hole cards shown at showdown with the hand they made.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RevealedHand {
    pub player_id: PlayerId,
    pub seat: SeatIndex,
    pub cards: Vec<Card>,
    pub rank: Rank,
    pub best: Vec<Card>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ShowdownSummary {
    pub hand_number: u64,
    /// Everyone else folded; no cards were shown.
    pub uncontested: bool,
    pub board: Vec<Card>,
    pub pots: Vec<PotAward>,
    pub hands: Vec<RevealedHand>,
}

/// Everything a table (or the registry) tells the outside world.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    TableCreated {
        name: String,
    },
    TableRemoved,
    PlayerJoined {
        player_id: PlayerId,
        seat: SeatIndex,
        stack: Chips,
    },
    PlayerLeft {
        player_id: PlayerId,
        seat: SeatIndex,
        cashed_out: Chips,
    },
    ReadyChanged {
        player_id: PlayerId,
        ready: bool,
    },
    HandStarted {
        hand_number: u64,
        button: SeatIndex,
        players: Vec<PlayerId>,
    },
    BlindPosted {
        player_id: PlayerId,
        seat: SeatIndex,
        kind: BlindKind,
        amount: Chips,
    },
    /// Private to the player the cards were dealt to.
    HoleCardsDealt {
        player_id: PlayerId,
        cards: Vec<Card>,
    },
    TurnStarted {
        player_id: PlayerId,
        seat: SeatIndex,
        legal: LegalActions,
        time_bank_ms: u64,
    },
    BetMade {
        player_id: PlayerId,
        seat: SeatIndex,
        kind: BetKind,
        /// Chips added by this action.
        amount: Chips,
        /// Seat's total commitment for the street.
        total: Chips,
        /// Taken by the engine when the time bank ran out.
        auto: bool,
    },
    PlayerFolded {
        player_id: PlayerId,
        seat: SeatIndex,
        auto: bool,
    },
    PhaseChanged {
        phase: Phase,
        hand_number: u64,
        board: Vec<Card>,
    },
    ShowdownResult(ShowdownSummary),
    /// Private to the player whose balance changed.
    BalanceUpdated {
        player_id: PlayerId,
        balance: Chips,
        delta: i64,
        entry_type: EntryType,
    },
}

impl GameEvent {
    /// Short stable name, used for logs and metric labels.
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::TableCreated { .. } => "table_created",
            GameEvent::TableRemoved => "table_removed",
            GameEvent::PlayerJoined { .. } => "player_joined",
            GameEvent::PlayerLeft { .. } => "player_left",
            GameEvent::ReadyChanged { .. } => "ready_changed",
            GameEvent::HandStarted { .. } => "hand_started",
            GameEvent::BlindPosted { .. } => "blind_posted",
            GameEvent::HoleCardsDealt { .. } => "hole_cards_dealt",
            GameEvent::TurnStarted { .. } => "turn_started",
            GameEvent::BetMade { .. } => "bet_made",
            GameEvent::PlayerFolded { .. } => "player_folded",
            GameEvent::PhaseChanged { .. } => "phase_changed",
            GameEvent::ShowdownResult(_) => "showdown_result",
            GameEvent::BalanceUpdated { .. } => "balance_updated",
        }
    }
}

/// Who an event is meant for.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    Everyone,
    Player(PlayerId),
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventEnvelope {
    /// `None` for events not tied to a table.
    pub table_id: Option<TableId>,
    /// Strictly increasing per table.
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub audience: Audience,
    pub event: GameEvent,
}

impl EventEnvelope {
    pub fn new(table_id: Option<TableId>, seq: u64, audience: Audience, event: GameEvent) -> Self {
        Self {
            table_id,
            seq,
            timestamp: Utc::now(),
            audience,
            event,
        }
    }
}

/// Who is listening.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Subscriber {
    /// Public events plus that player's private ones.
    Player(PlayerId),
    /// Every event, private ones included (logging, metrics).
    All,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SubscriptionFilter {
    pub subscriber: Subscriber,
    /// Restrict to one table.
    pub table_id: Option<TableId>,
}

impl SubscriptionFilter {
    pub fn all() -> Self {
        Self {
            subscriber: Subscriber::All,
            table_id: None,
        }
    }

    pub fn player(player_id: PlayerId) -> Self {
        Self {
            subscriber: Subscriber::Player(player_id),
            table_id: None,
        }
    }

    pub fn at_table(mut self, table_id: TableId) -> Self {
        self.table_id = Some(table_id);
        self
    }

    fn matches(&self, envelope: &EventEnvelope) -> bool {
        if self.table_id.is_some() && envelope.table_id != self.table_id {
            return false;
        }
        match (self.subscriber, envelope.audience) {
            (Subscriber::All, _) | (_, Audience::Everyone) => true,
            (Subscriber::Player(id), Audience::Player(target)) => id == target,
        }
    }
}

struct SubscriberEntry {
    filter: SubscriptionFilter,
    sender: mpsc::Sender<Arc<EventEnvelope>>,
}

struct HubInner {
    capacity: usize,
    subscribers: Mutex<HashMap<Uuid, SubscriberEntry>>,
}

/// Fan-out of events to subscribers. Cheap to clone.
#[derive(Clone)]
pub struct NotificationHub {
    inner: Arc<HubInner>,
}

impl NotificationHub {
    /// Create a hub whose subscribers each buffer up to `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                capacity: capacity.max(1),
                subscribers: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn subscribe(&self, filter: SubscriptionFilter) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.inner.capacity);
        let id = Uuid::new_v4();
        self.lock().insert(id, SubscriberEntry { filter, sender });
        log::debug!("Subscriber {id} registered ({filter:?})");
        Subscription {
            id,
            receiver,
            hub: self.clone(),
        }
    }

    /// Returns whether the subscription was still registered.
    pub fn unsubscribe(&self, id: Uuid) -> bool {
        self.lock().remove(&id).is_some()
    }

    /// Deliver to every matching subscriber. Returns how many received it.
    pub fn publish(&self, envelope: EventEnvelope) -> usize {
        let envelope = Arc::new(envelope);
        let mut subscribers = self.lock();
        let mut delivered = 0;
        subscribers.retain(|id, entry| {
            if !entry.filter.matches(&envelope) {
                return true;
            }
            match entry.sender.try_send(Arc::clone(&envelope)) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(TrySendError::Full(_)) => {
                    log::warn!(
                        "Subscriber {id} fell {} events behind, disconnecting",
                        self.inner.capacity
                    );
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    log::debug!("Subscriber {id} went away, removing");
                    false
                }
            }
        });
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, SubscriberEntry>> {
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

/// A live subscription. Dropping it unsubscribes.
pub struct Subscription {
    id: Uuid,
    receiver: mpsc::Receiver<Arc<EventEnvelope>>,
    hub: NotificationHub,
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Next event, or `None` once the hub has disconnected this subscriber
    /// and the buffer is drained.
    pub async fn recv(&mut self) -> Option<Arc<EventEnvelope>> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Arc<EventEnvelope>> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.unsubscribe(self.id);
    }
}
