use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};

/// Chip amounts. Stacks, bets, pots and ledger balances all use this unit.
pub type Chips = u64;

/// Stable identifier of a player, assigned by whatever sits upstream
/// (chat platform, account service, ...).
pub type PlayerId = i64;

/// Identifier of a table within a registry.
pub type TableId = i64;

/// Type alias for seat positions at a table.
pub type SeatIndex = usize;

/// Placeholder for card values, 2 through 14 (ace high).
pub type Value = u8;

/// Lowest card value. Aces are always stored as 14.
pub const MIN_VALUE: Value = 2;

/// Highest card value.
pub const ACE: Value = 14;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Club,
    Diamond,
    Heart,
    Spade,
}

pub const SUITS: [Suit; 4] = [Suit::Club, Suit::Diamond, Suit::Heart, Suit::Spade];

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Club => "♣",
            Self::Diamond => "♦",
            Self::Heart => "♥",
            Self::Spade => "♠",
        };
        write!(f, "{repr}")
    }
}

/// A card is a tuple of a value (2u8 ... ace=14u8) and a suit.
///
/// Ordering is by value first and suit second, which gives the canonical
/// order used to break ties when picking a best five-card hand.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Value, pub Suit);

impl Card {
    pub fn value(&self) -> Value {
        self.0
    }

    pub fn suit(&self) -> Suit {
        self.1
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            14 => write!(f, "A{}", self.1),
            13 => write!(f, "K{}", self.1),
            12 => write!(f, "Q{}", self.1),
            11 => write!(f, "J{}", self.1),
            10 => write!(f, "T{}", self.1),
            v => write!(f, "{v}{}", self.1),
        }
    }
}

/// Hand categories from weakest to strongest.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Rank {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::HighCard => "high card",
            Self::OnePair => "one pair",
            Self::TwoPair => "two pair",
            Self::ThreeOfAKind => "three of a kind",
            Self::Straight => "straight",
            Self::Flush => "flush",
            Self::FullHouse => "full house",
            Self::FourOfAKind => "four of a kind",
            Self::StraightFlush => "straight flush",
        };
        write!(f, "{repr}")
    }
}

/// An ordered deck of cards. Cards are dealt from the front; nothing is
/// ever put back until a new deck replaces this one.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Deck {
    cards: Vec<Card>,
    deck_idx: usize,
}

impl Deck {
    /// The 52 standard cards in canonical (unshuffled) order.
    pub fn standard() -> Self {
        let cards = (MIN_VALUE..=ACE)
            .flat_map(|value| SUITS.into_iter().map(move |suit| Card(value, suit)))
            .collect();
        Self { cards, deck_idx: 0 }
    }

    /// A full deck shuffled with the given random source.
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::standard();
        deck.cards.shuffle(rng);
        deck
    }

    /// A deck that deals the given cards in order. Used to replay or rig
    /// hands; the cards are dealt as-is without any validation.
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards, deck_idx: 0 }
    }

    /// A full deck that deals `top` first, then every other card in
    /// canonical order.
    pub fn stacked(top: &[Card]) -> Self {
        let mut cards = top.to_vec();
        cards.extend(Self::standard().cards.into_iter().filter(|card| !top.contains(card)));
        Self { cards, deck_idx: 0 }
    }

    pub fn deal_card(&mut self) -> Option<Card> {
        let card = self.cards.get(self.deck_idx).copied()?;
        self.deck_idx += 1;
        Some(card)
    }

    pub fn remaining(&self) -> usize {
        self.cards.len() - self.deck_idx
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::standard()
    }
}

/// Phases of a table. A hand only ever moves forward through these; the
/// only way back to [`Phase::Waiting`] or [`Phase::NewHandDealing`] is
/// through [`Phase::Showdown`] (or an uncontested finish).
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Phase {
    Waiting,
    NewHandDealing,
    PreFlop,
    Flop,
    Turn,
    River,
    Showdown,
}

impl Phase {
    /// Whether players can act in this phase.
    pub fn is_betting(&self) -> bool {
        matches!(self, Self::PreFlop | Self::Flop | Self::Turn | Self::River)
    }

    /// Number of community cards on the board during this phase.
    pub fn board_len(&self) -> Option<usize> {
        match self {
            Self::Waiting | Self::NewHandDealing | Self::PreFlop => Some(0),
            Self::Flop => Some(3),
            Self::Turn => Some(4),
            Self::River => Some(5),
            // The board at showdown depends on whether the hand was run out.
            Self::Showdown => None,
        }
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_advance_to(&self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Self::Waiting, Self::NewHandDealing)
                | (Self::NewHandDealing, Self::PreFlop)
                | (Self::PreFlop, Self::Flop)
                | (Self::Flop, Self::Turn)
                | (Self::Turn, Self::River)
                | (
                    Self::PreFlop | Self::Flop | Self::Turn | Self::River,
                    Self::Showdown
                )
                | (Self::Showdown, Self::Waiting | Self::NewHandDealing)
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Waiting => "waiting",
            Self::NewHandDealing => "dealing",
            Self::PreFlop => "pre-flop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
            Self::Showdown => "showdown",
        };
        write!(f, "{repr}")
    }
}

/// Player actions. `Bet` carries the total the player wants committed for
/// the round ("raise to"), so it doubles as an opening bet and a raise.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(tag = "type", content = "amount", rename_all = "snake_case")]
pub enum Action {
    Check,
    Call,
    Bet(Chips),
    Fold,
    AllIn,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Check => write!(f, "checks"),
            Self::Call => write!(f, "calls"),
            Self::Bet(amount) => write!(f, "bets to ${amount}"),
            Self::Fold => write!(f, "folds"),
            Self::AllIn => write!(f, "goes all-in"),
        }
    }
}

/// A player occupying a seat.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub seat_idx: SeatIndex,
    pub stack: Chips,
    /// Dealt into the current hand.
    pub in_hand: bool,
    pub folded: bool,
    pub all_in: bool,
    pub ready: bool,
    pub cards: Vec<Card>,
    /// Remaining time bank for the current hand.
    pub time_bank: Duration,
}

impl Player {
    pub fn new(id: PlayerId, seat_idx: SeatIndex, stack: Chips, time_bank: Duration) -> Self {
        Self {
            id,
            seat_idx,
            stack,
            in_hand: false,
            folded: false,
            all_in: false,
            ready: false,
            cards: Vec::with_capacity(2),
            time_bank,
        }
    }

    /// Still contesting the pot (all-in players included).
    pub fn is_live(&self) -> bool {
        self.in_hand && !self.folded
    }

    /// Still able to make decisions this hand.
    pub fn can_act(&self) -> bool {
        self.is_live() && !self.all_in
    }

    /// Eligible to be dealt into the next hand.
    pub fn can_play(&self) -> bool {
        self.ready && self.stack > 0
    }

    pub fn reset_for_hand(&mut self, time_bank: Duration) {
        self.in_hand = false;
        self.folded = false;
        self.all_in = false;
        self.cards.clear();
        self.time_bank = time_bank;
    }
}

/// Seats of a table, indexed by [`SeatIndex`]. Empty seats are `None`.
pub type Seats = Vec<Option<Player>>;

/// Seats after `from` in clockwise order, wrapping around and ending with
/// `from` itself.
pub fn clockwise_from(from: SeatIndex, num_seats: usize) -> impl Iterator<Item = SeatIndex> {
    (1..=num_seats).map(move |offset| (from + offset) % num_seats)
}
