//! Synchronous table state machine.
//!
//! [`Table`] owns seats, the deck, the board, pots and the betting round of
//! one table, and moves a hand from the deal to the showdown. It is a plain
//! value with no I/O: the table actor serializes access to it, talks to the
//! ledger and timers, and forwards the events it produces.
//!
//! Every public mutation is transactional. The operation runs against a
//! copy of the table, the copy is checked against the engine invariants,
//! and only then replaces the original. A rejected request leaves the table
//! (and its event queue) untouched. An invariant violation panics in debug
//! builds and halts the table in release builds.

use log::{debug, error, info};
use rand::{SeedableRng, rngs::StdRng};
use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use super::{
    betting::{BetKind, BettingRound},
    entities::{
        Action, Card, Chips, Deck, Phase, Player, PlayerId, SeatIndex, Seats, TableId,
        clockwise_from,
    },
    functional::{self, HandValue},
    pots::{self, Pot},
};
use crate::table::{
    config::TableConfig,
    errors::{NotFoundError, TableError, TableResult, ValidationError},
    messages::{SeatView, TableSnapshot},
    notifications::{
        Audience, BlindKind, EventEnvelope, GameEvent, Payout, PotAward, RevealedHand,
        ShowdownSummary,
    },
    timebank::TurnToken,
};

#[derive(Clone, Debug)]
pub struct Table {
    id: TableId,
    config: TableConfig,
    seats: Seats,
    button: Option<SeatIndex>,
    phase: Phase,
    board: Vec<Card>,
    /// Chips committed on finished streets, per seat.
    contributions: BTreeMap<SeatIndex, Chips>,
    pots: Vec<Pot>,
    round: Option<BettingRound>,
    deck: Deck,
    queued_deck: Option<Deck>,
    rng: StdRng,
    hand_number: u64,
    action_seq: u64,
    version: u64,
    /// Every chip currently on the table: stacks, bets and pots.
    chips_in_play: Chips,
    event_seq: u64,
    events: Vec<EventEnvelope>,
    last_showdown: Option<ShowdownSummary>,
    halted: bool,
}

impl Table {
    pub fn new(id: TableId, config: TableConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            id,
            seats: vec![None; config.max_players],
            config,
            button: None,
            phase: Phase::Waiting,
            board: Vec::with_capacity(5),
            contributions: BTreeMap::new(),
            pots: Vec::new(),
            round: None,
            deck: Deck::standard(),
            queued_deck: None,
            rng,
            hand_number: 0,
            action_seq: 0,
            version: 0,
            chips_in_play: 0,
            event_seq: 0,
            events: Vec::new(),
            last_showdown: None,
            halted: false,
        }
    }

    // ===  Queries  ===

    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn hand_number(&self) -> u64 {
        self.hand_number
    }

    pub fn button(&self) -> Option<SeatIndex> {
        self.button
    }

    pub fn board(&self) -> &[Card] {
        &self.board
    }

    pub fn chips_in_play(&self) -> Chips {
        self.chips_in_play
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn seated_count(&self) -> usize {
        self.seats.iter().flatten().count()
    }

    pub fn seat_of(&self, player_id: PlayerId) -> Option<SeatIndex> {
        self.seats
            .iter()
            .flatten()
            .find(|player| player.id == player_id)
            .map(|player| player.seat_idx)
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.seats.iter().flatten().find(|player| player.id == player_id)
    }

    /// Player whose turn it is.
    pub fn to_act(&self) -> Option<PlayerId> {
        let seat = self.turn_token()?.seat;
        self.seat_player(seat).map(|player| player.id)
    }

    /// Token of the current turn, if anyone is on the clock.
    pub fn turn_token(&self) -> Option<TurnToken> {
        if !self.phase.is_betting() {
            return None;
        }
        let seat = self.round.as_ref()?.to_act()?;
        Some(TurnToken {
            hand_number: self.hand_number,
            action_seq: self.action_seq,
            seat,
        })
    }

    /// Remaining time bank of the player in `seat`.
    pub fn time_bank(&self, seat: SeatIndex) -> Duration {
        self.seat_player(seat)
            .map(|player| player.time_bank)
            .unwrap_or(Duration::ZERO)
    }

    /// Whether a new hand may be dealt right now.
    pub fn can_start(&self) -> bool {
        let ready = self.seats.iter().flatten().filter(|p| p.can_play()).count();
        !self.halted && self.phase == Phase::Waiting && ready >= self.config.min_players.max(2)
    }

    /// A player's own hole cards (empty between hands).
    pub fn hole_cards(&self, player_id: PlayerId) -> TableResult<Vec<Card>> {
        self.player(player_id)
            .map(|player| player.cards.clone())
            .ok_or_else(|| NotFoundError::Player(player_id).into())
    }

    /// Stack a player would cash out with if they left now.
    pub fn stack_of(&self, player_id: PlayerId) -> TableResult<Chips> {
        self.player(player_id)
            .map(|player| player.stack)
            .ok_or_else(|| NotFoundError::Player(player_id).into())
    }

    pub fn last_showdown(&self) -> Option<&ShowdownSummary> {
        self.last_showdown.as_ref()
    }

    pub fn snapshot(&self) -> TableSnapshot {
        let players = self
            .seats
            .iter()
            .flatten()
            .map(|player| {
                let bet = self.street_bet(player.seat_idx);
                SeatView {
                    player_id: player.id,
                    seat: player.seat_idx,
                    stack: player.stack,
                    bet,
                    committed: self.contributions.get(&player.seat_idx).copied().unwrap_or(0)
                        + bet,
                    in_hand: player.in_hand,
                    folded: player.folded,
                    all_in: player.all_in,
                    ready: player.ready,
                    time_bank_ms: u64::try_from(player.time_bank.as_millis()).unwrap_or(u64::MAX),
                }
            })
            .collect();

        TableSnapshot {
            table_id: self.id,
            name: self.config.name.clone(),
            version: self.version,
            phase: self.phase,
            hand_number: self.hand_number,
            button: self.button,
            board: self.board.clone(),
            pots: self.pots.clone(),
            pot_total: self.committed_total(),
            current_bet: self.round.as_ref().map_or(0, BettingRound::current_bet),
            min_raise: self
                .round
                .as_ref()
                .map_or(self.config.big_blind, BettingRound::min_raise),
            to_act: self.to_act(),
            small_blind: self.config.small_blind,
            big_blind: self.config.big_blind,
            max_players: self.config.max_players,
            players,
            last_showdown: self.last_showdown.clone(),
            halted: self.halted,
        }
    }

    /// Queue an event produced outside the table (a ledger update, say) so
    /// it is sequenced with the table's own events.
    pub fn push_event(&mut self, audience: Audience, event: GameEvent) {
        self.emit(audience, event);
    }

    /// Take the events produced since the last drain, in order.
    pub fn drain_events(&mut self) -> Vec<EventEnvelope> {
        std::mem::take(&mut self.events)
    }

    // ===  Mutations  ===

    /// Check whether `player_id` could sit down with `stack` chips.
    pub fn validate_join(&self, player_id: PlayerId, stack: Chips) -> TableResult<()> {
        if self.halted {
            return Err(TableError::Halted);
        }
        if self.seat_of(player_id).is_some() {
            return Err(ValidationError::AlreadySeated(player_id).into());
        }
        if self.phase != Phase::Waiting {
            return Err(ValidationError::WrongPhase {
                action: "join",
                phase: self.phase,
            }
            .into());
        }
        if stack < self.config.min_buy_in {
            return Err(ValidationError::BuyInTooSmall {
                minimum: self.config.min_buy_in,
                offered: stack,
            }
            .into());
        }
        if self.seats.iter().all(Option::is_some) {
            return Err(ValidationError::TableFull.into());
        }
        Ok(())
    }

    /// Seat a player in the lowest free seat. Only between hands.
    pub fn add_player(&mut self, player_id: PlayerId, stack: Chips) -> TableResult<SeatIndex> {
        self.validate_join(player_id, stack)?;
        self.transact(|table| {
            let seat = table
                .seats
                .iter()
                .position(Option::is_none)
                .ok_or(ValidationError::TableFull)?;
            table.seats[seat] = Some(Player::new(player_id, seat, stack, table.config.time_bank));
            table.chips_in_play += stack;
            info!("Player {player_id} sat down at table {} seat {seat}", table.id);
            table.emit(
                Audience::Everyone,
                GameEvent::PlayerJoined {
                    player_id,
                    seat,
                    stack,
                },
            );
            Ok(seat)
        })
    }

    /// Free a player's seat and return the stack they leave with. A player
    /// still contesting a hand folds first; chips already committed stay in
    /// the pot.
    pub fn remove_player(&mut self, player_id: PlayerId) -> TableResult<Chips> {
        self.transact(|table| {
            let seat = table
                .seat_of(player_id)
                .ok_or(NotFoundError::Player(player_id))?;
            let contesting = table.phase.is_betting()
                && table.seat_player(seat).is_some_and(Player::is_live);

            if contesting {
                if let Some(round) = table.round.as_mut() {
                    round.force_fold(&mut table.seats, seat);
                }
                table.refresh_pots();
                table.emit(
                    Audience::Everyone,
                    GameEvent::PlayerFolded {
                        player_id,
                        seat,
                        auto: true,
                    },
                );
            }

            let stack = table.seats[seat].take().map_or(0, |player| player.stack);
            table.chips_in_play -= stack;
            info!(
                "Player {player_id} left table {} with {stack} chips",
                table.id
            );
            table.emit(
                Audience::Everyone,
                GameEvent::PlayerLeft {
                    player_id,
                    seat,
                    cashed_out: stack,
                },
            );

            if contesting {
                table.progress()?;
            }
            Ok(stack)
        })
    }

    /// Set a player's readiness for future hands. Readiness sticks across
    /// hands until cleared or the player busts.
    pub fn set_ready(&mut self, player_id: PlayerId, ready: bool) -> TableResult<()> {
        self.transact(|table| {
            let seat = table
                .seat_of(player_id)
                .ok_or(NotFoundError::Player(player_id))?;
            let Some(player) = table.seats[seat].as_mut() else {
                return Err(NotFoundError::Player(player_id).into());
            };
            if ready && player.stack == 0 {
                return Err(ValidationError::NoChips.into());
            }
            if player.ready != ready {
                player.ready = ready;
                table.emit(Audience::Everyone, GameEvent::ReadyChanged { player_id, ready });
            }
            Ok(())
        })
    }

    /// Apply a player's action. With `expected_version` set, the action is
    /// rejected if the table changed since the caller's snapshot.
    pub fn act(
        &mut self,
        player_id: PlayerId,
        action: Action,
        expected_version: Option<u64>,
    ) -> TableResult<()> {
        if let Some(expected) = expected_version
            && expected != self.version
        {
            return Err(TableError::Concurrency {
                expected,
                actual: self.version,
            });
        }
        self.transact(|table| table.apply_action(player_id, action, false))
    }

    /// Act for the player on the clock when their time bank ran out: check
    /// when nothing is owed, fold otherwise. A token that no longer names
    /// the current turn is ignored.
    pub fn resolve_timeout(&mut self, token: TurnToken) -> TableResult<Option<Action>> {
        if self.turn_token() != Some(token) {
            debug!("Table {}: ignoring stale timeout {token:?}", self.id);
            return Ok(None);
        }
        self.transact(|table| {
            let owed = table.round.as_ref().map_or(0, |round| round.owed(token.seat));
            let action = if owed == 0 { Action::Check } else { Action::Fold };
            let player_id = table
                .seat_player(token.seat)
                .map(|player| player.id)
                .ok_or_else(|| TableError::Invariant(format!("no player in seat {}", token.seat)))?;
            info!(
                "Table {}: player {player_id} timed out and {action}",
                table.id
            );
            table.apply_action(player_id, action, true)?;
            Ok(Some(action))
        })
    }

    /// Deal a hand if the start condition holds. Returns whether one started.
    pub fn start_hand(&mut self) -> TableResult<bool> {
        if !self.can_start() {
            return Ok(false);
        }
        self.transact(Table::deal_hand)
    }

    /// Use `deck` for the next hand instead of a fresh shuffle.
    pub fn queue_deck(&mut self, deck: Deck) {
        self.queued_deck = Some(deck);
    }

    /// Charge time used on a turn to that seat's bank. Time from an earlier
    /// hand is dropped since banks refill every hand.
    pub fn charge_time_bank(&mut self, token: TurnToken, used: Duration) {
        if token.hand_number != self.hand_number {
            return;
        }
        if let Some(Some(player)) = self.seats.get_mut(token.seat) {
            player.time_bank = player.time_bank.saturating_sub(used);
        }
    }

    /// Check the engine invariants.
    pub fn check_invariants(&self) -> Result<(), String> {
        let stacks: Chips = self.seats.iter().flatten().map(|p| p.stack).sum();
        let settled: Chips = self.contributions.values().sum();
        let street = self.round.as_ref().map_or(0, BettingRound::total);
        if stacks + settled + street != self.chips_in_play {
            return Err(format!(
                "chips not conserved: stacks {stacks} + pots {settled} + bets {street} != {}",
                self.chips_in_play
            ));
        }

        let pot_sum: Chips = self.pots.iter().map(|pot| pot.amount).sum();
        if pot_sum != settled {
            return Err(format!("pots hold {pot_sum} but {settled} was committed"));
        }

        if self.phase.is_betting() != self.round.is_some() {
            return Err(format!("phase {} with round {:?}", self.phase, self.round.is_some()));
        }

        if let Some(expected) = self.phase.board_len()
            && self.board.len() != expected
        {
            return Err(format!(
                "{} cards on the board during {}",
                self.board.len(),
                self.phase
            ));
        }

        for pot in &self.pots {
            for seat in &pot.eligible {
                if !self.seat_player(*seat).is_some_and(Player::is_live) {
                    return Err(format!("seat {seat} is eligible for a pot but not in the hand"));
                }
            }
        }

        for (idx, player) in self.seats.iter().enumerate() {
            if let Some(player) = player
                && player.seat_idx != idx
            {
                return Err(format!(
                    "player {} in seat {idx} thinks it is in seat {}",
                    player.id, player.seat_idx
                ));
            }
        }

        Ok(())
    }

    // ===  Internals  ===

    /// Run `op` on a copy, verify it, then commit. See the module docs.
    fn transact<T>(&mut self, op: impl FnOnce(&mut Self) -> TableResult<T>) -> TableResult<T> {
        if self.halted {
            return Err(TableError::Halted);
        }
        let before = self.turn_token();
        let mut next = self.clone();

        let result = op(&mut next).and_then(|out| {
            next.auto_start()?;
            next.announce_turn(before);
            Ok(out)
        });
        let result = match result {
            Ok(out) => next.check_invariants().map(|()| out).map_err(TableError::Invariant),
            Err(err) => Err(err),
        };

        match result {
            Ok(out) => {
                next.version += 1;
                *self = next;
                Ok(out)
            }
            Err(TableError::Invariant(violation)) => {
                error!("Table {} halted: {violation}", self.id);
                if cfg!(debug_assertions) {
                    panic!("table {} invariant violated: {violation}", self.id);
                }
                self.halted = true;
                Err(TableError::Invariant(violation))
            }
            Err(err) => Err(err),
        }
    }

    /// Deal back-to-back hands while the table starts immediately and no
    /// player input is needed.
    fn auto_start(&mut self) -> TableResult<()> {
        while self.config.auto_start_delay.is_zero() && self.can_start() {
            self.deal_hand()?;
        }
        Ok(())
    }

    fn announce_turn(&mut self, before: Option<TurnToken>) {
        let Some(token) = self.turn_token() else {
            return;
        };
        if before == Some(token) {
            return;
        }
        let Some(round) = self.round.as_ref() else {
            return;
        };
        let legal = round.legal_actions(&self.seats, token.seat);
        if let Some(player) = self.seat_player(token.seat) {
            let event = GameEvent::TurnStarted {
                player_id: player.id,
                seat: token.seat,
                legal,
                time_bank_ms: u64::try_from(player.time_bank.as_millis()).unwrap_or(u64::MAX),
            };
            self.emit(Audience::Everyone, event);
        }
    }

    fn emit(&mut self, audience: Audience, event: GameEvent) {
        self.event_seq += 1;
        self.events
            .push(EventEnvelope::new(Some(self.id), self.event_seq, audience, event));
    }

    fn seat_player(&self, seat: SeatIndex) -> Option<&Player> {
        self.seats.get(seat).and_then(Option::as_ref)
    }

    fn live_seats(&self) -> BTreeSet<SeatIndex> {
        self.seats
            .iter()
            .flatten()
            .filter(|p| p.is_live())
            .map(|p| p.seat_idx)
            .collect()
    }

    fn street_bet(&self, seat: SeatIndex) -> Chips {
        self.round.as_ref().map_or(0, |round| round.bet(seat))
    }

    fn committed_total(&self) -> Chips {
        self.contributions.values().sum::<Chips>() + self.round.as_ref().map_or(0, BettingRound::total)
    }

    fn next_in_hand(&self, from: SeatIndex) -> TableResult<SeatIndex> {
        clockwise_from(from, self.seats.len())
            .find(|seat| self.seat_player(*seat).is_some_and(|p| p.in_hand))
            .ok_or_else(|| TableError::Invariant(format!("no player in hand after seat {from}")))
    }

    fn set_phase(&mut self, next: Phase) -> TableResult<()> {
        if !self.phase.can_advance_to(next) {
            return Err(TableError::Invariant(format!(
                "illegal phase change {} -> {next}",
                self.phase
            )));
        }
        debug!("Table {}: {} -> {next}", self.id, self.phase);
        self.phase = next;
        self.emit(
            Audience::Everyone,
            GameEvent::PhaseChanged {
                phase: next,
                hand_number: self.hand_number,
                board: self.board.clone(),
            },
        );
        Ok(())
    }

    fn draw(&mut self) -> TableResult<Card> {
        self.deck
            .deal_card()
            .ok_or_else(|| TableError::Invariant("deck exhausted".to_string()))
    }

    fn refresh_pots(&mut self) {
        self.pots = pots::partition(&self.contributions, &self.live_seats());
    }

    /// Move the street's bets into the settled contributions.
    fn collect_round(&mut self) {
        if let Some(round) = self.round.take() {
            for (seat, bet) in round.bets() {
                *self.contributions.entry(*seat).or_insert(0) += *bet;
            }
        }
        self.refresh_pots();
    }

    fn deal_hand(&mut self) -> TableResult<bool> {
        self.hand_number += 1;
        self.action_seq += 1;
        self.board.clear();
        self.contributions.clear();
        self.pots.clear();
        self.round = None;

        let time_bank = self.config.time_bank;
        for player in self.seats.iter_mut().flatten() {
            player.reset_for_hand(time_bank);
            player.in_hand = player.can_play();
        }
        self.deck = match self.queued_deck.take() {
            Some(deck) => deck,
            None => Deck::shuffled(&mut self.rng),
        };
        self.set_phase(Phase::NewHandDealing)?;

        let dealt: Vec<PlayerId> = self
            .seats
            .iter()
            .flatten()
            .filter(|p| p.in_hand)
            .map(|p| p.id)
            .collect();
        let heads_up = dealt.len() == 2;
        let button = match self.button {
            Some(previous) => self.next_in_hand(previous)?,
            None => self.next_in_hand(self.seats.len() - 1)?,
        };
        self.button = Some(button);
        info!(
            "Table {}: hand #{} with {} players, button seat {button}",
            self.id,
            self.hand_number,
            dealt.len()
        );
        self.emit(
            Audience::Everyone,
            GameEvent::HandStarted {
                hand_number: self.hand_number,
                button,
                players: dealt,
            },
        );

        // Heads-up the button posts the small blind.
        let small_blind = if heads_up { button } else { self.next_in_hand(button)? };
        let big_blind = self.next_in_hand(small_blind)?;
        let mut round = BettingRound::new(self.config.big_blind);
        for (seat, kind, amount) in [
            (small_blind, BlindKind::Small, self.config.small_blind),
            (big_blind, BlindKind::Big, self.config.big_blind),
        ] {
            let posted = round.post_blind(&mut self.seats, seat, amount);
            if let Some(player) = self.seat_player(seat) {
                let event = GameEvent::BlindPosted {
                    player_id: player.id,
                    seat,
                    kind,
                    amount: posted,
                };
                self.emit(Audience::Everyone, event);
            }
        }

        let order: Vec<SeatIndex> = clockwise_from(button, self.seats.len())
            .filter(|seat| self.seat_player(*seat).is_some_and(|p| p.in_hand))
            .collect();
        for _ in 0..2 {
            for seat in &order {
                let card = self.draw()?;
                if let Some(Some(player)) = self.seats.get_mut(*seat) {
                    player.cards.push(card);
                }
            }
        }
        for seat in &order {
            if let Some(player) = self.seat_player(*seat) {
                let event = GameEvent::HoleCardsDealt {
                    player_id: player.id,
                    cards: player.cards.clone(),
                };
                self.emit(Audience::Player(player.id), event);
            }
        }

        self.set_phase(Phase::PreFlop)?;
        let first = if heads_up { small_blind } else { self.next_in_hand(big_blind)? };
        round.open(&self.seats, first);
        self.round = Some(round);
        self.progress()?;
        Ok(true)
    }

    fn apply_action(&mut self, player_id: PlayerId, action: Action, auto: bool) -> TableResult<()> {
        let seat = self
            .seat_of(player_id)
            .ok_or(NotFoundError::Player(player_id))?;
        if !self.phase.is_betting() {
            return Err(ValidationError::WrongPhase {
                action: "act",
                phase: self.phase,
            }
            .into());
        }
        let Some(round) = self.round.as_mut() else {
            return Err(TableError::Invariant(format!(
                "no betting round during {}",
                self.phase
            )));
        };
        let applied = round.apply(&mut self.seats, seat, action)?;
        self.action_seq += 1;
        debug!(
            "Table {}: player {player_id} {action} ({:?}, +{})",
            self.id, applied.kind, applied.added
        );

        let event = if applied.kind == BetKind::Fold {
            self.refresh_pots();
            GameEvent::PlayerFolded {
                player_id,
                seat,
                auto,
            }
        } else {
            GameEvent::BetMade {
                player_id,
                seat,
                kind: applied.kind,
                amount: applied.added,
                total: applied.total,
                auto,
            }
        };
        self.emit(Audience::Everyone, event);
        self.progress()
    }

    /// Advance through streets until a player has to act or the hand ends.
    fn progress(&mut self) -> TableResult<()> {
        loop {
            if !self.phase.is_betting() {
                return Ok(());
            }
            if self.live_seats().len() <= 1 {
                return self.finish_uncontested();
            }
            if !self.round.as_ref().is_some_and(BettingRound::is_closed) {
                return Ok(());
            }

            self.collect_round();
            if self.phase == Phase::River {
                return self.showdown();
            }

            let active = self.seats.iter().flatten().filter(|p| p.can_act()).count();
            if active <= 1 {
                // Nobody can bet any more: run the board out.
                while self.phase != Phase::River {
                    self.deal_street()?;
                }
                return self.showdown();
            }

            self.deal_street()?;
            let mut round = BettingRound::new(self.config.big_blind);
            if let Some(button) = self.button {
                round.open(&self.seats, (button + 1) % self.seats.len());
            }
            self.round = Some(round);
        }
    }

    fn deal_street(&mut self) -> TableResult<()> {
        let (next, count) = match self.phase {
            Phase::PreFlop => (Phase::Flop, 3),
            Phase::Flop => (Phase::Turn, 1),
            Phase::Turn => (Phase::River, 1),
            phase => {
                return Err(TableError::Invariant(format!(
                    "no street follows {phase}"
                )));
            }
        };
        for _ in 0..count {
            let card = self.draw()?;
            self.board.push(card);
        }
        self.set_phase(next)
    }

    /// Award every pot to the one player left.
    fn finish_uncontested(&mut self) -> TableResult<()> {
        self.collect_round();
        self.set_phase(Phase::Showdown)?;
        let winner = *self
            .live_seats()
            .first()
            .ok_or_else(|| TableError::Invariant("hand ended with nobody in it".to_string()))?;
        let amount: Chips = self.contributions.values().sum();
        let player_id = self.credit(winner, amount)?;

        let summary = ShowdownSummary {
            hand_number: self.hand_number,
            uncontested: true,
            board: self.board.clone(),
            pots: vec![PotAward {
                amount,
                eligible: vec![winner],
                winners: vec![Payout {
                    player_id,
                    seat: winner,
                    amount,
                }],
            }],
            hands: Vec::new(),
        };
        self.finish_hand(summary)
    }

    fn showdown(&mut self) -> TableResult<()> {
        self.set_phase(Phase::Showdown)?;
        let live = self.live_seats();
        self.pots = pots::partition(&self.contributions, &live);

        let mut values: BTreeMap<SeatIndex, HandValue> = BTreeMap::new();
        let mut hands = Vec::with_capacity(live.len());
        // Payout order: clockwise starting left of the button.
        let order: Vec<SeatIndex> = clockwise_from(self.button.unwrap_or(0), self.seats.len())
            .filter(|seat| live.contains(seat))
            .collect();
        for seat in &order {
            let Some(player) = self.seat_player(*seat) else {
                continue;
            };
            let mut cards = player.cards.clone();
            cards.extend_from_slice(&self.board);
            let value = functional::eval(&cards);
            hands.push(RevealedHand {
                player_id: player.id,
                seat: *seat,
                cards: player.cards.clone(),
                rank: value.rank,
                best: value.cards.clone(),
            });
            values.insert(*seat, value);
        }

        let mut awards = Vec::with_capacity(self.pots.len());
        for pot in std::mem::take(&mut self.pots) {
            let contenders: Vec<SeatIndex> = order
                .iter()
                .copied()
                .filter(|seat| pot.eligible.contains(seat))
                .collect();
            let candidates: Vec<HandValue> = contenders
                .iter()
                .filter_map(|seat| values.get(seat).cloned())
                .collect();
            let mut winners: Vec<SeatIndex> = functional::argmax(&candidates)
                .into_iter()
                .map(|idx| contenders[idx])
                .collect();
            if winners.is_empty() {
                winners = order.clone();
            }

            let mut payouts = Vec::with_capacity(winners.len());
            for (seat, amount) in pots::split(pot.amount, &winners) {
                let player_id = self.credit(seat, amount)?;
                payouts.push(Payout {
                    player_id,
                    seat,
                    amount,
                });
            }
            awards.push(PotAward {
                amount: pot.amount,
                eligible: pot.eligible.into_iter().collect(),
                winners: payouts,
            });
        }

        let summary = ShowdownSummary {
            hand_number: self.hand_number,
            uncontested: false,
            board: self.board.clone(),
            pots: awards,
            hands,
        };
        self.finish_hand(summary)
    }

    /// Pay `amount` out of the pots into a seat's stack.
    fn credit(&mut self, seat: SeatIndex, amount: Chips) -> TableResult<PlayerId> {
        let Some(Some(player)) = self.seats.get_mut(seat) else {
            return Err(TableError::Invariant(format!("paying empty seat {seat}")));
        };
        player.stack += amount;
        Ok(player.id)
    }

    fn finish_hand(&mut self, summary: ShowdownSummary) -> TableResult<()> {
        let paid: Chips = summary.pots.iter().map(|pot| pot.amount).sum();
        let committed: Chips = self.contributions.values().sum();
        if paid != committed {
            return Err(TableError::Invariant(format!(
                "paid out {paid} of {committed} committed"
            )));
        }
        info!(
            "Table {}: hand #{} finished, {paid} chips awarded",
            self.id, self.hand_number
        );
        self.emit(Audience::Everyone, GameEvent::ShowdownResult(summary.clone()));
        self.last_showdown = Some(summary);

        self.round = None;
        self.contributions.clear();
        self.pots.clear();
        self.board.clear();

        let time_bank = self.config.time_bank;
        let mut busted = Vec::new();
        for player in self.seats.iter_mut().flatten() {
            player.reset_for_hand(time_bank);
            if player.stack == 0 && player.ready {
                player.ready = false;
                busted.push(player.id);
            }
        }
        for player_id in busted {
            self.emit(
                Audience::Everyone,
                GameEvent::ReadyChanged {
                    player_id,
                    ready: false,
                },
            );
        }
        self.set_phase(Phase::Waiting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::{Suit, Value};

    fn config() -> TableConfig {
        TableConfig {
            small_blind: 10,
            big_blind: 20,
            min_buy_in: 20,
            seed: Some(42),
            ..TableConfig::default()
        }
    }

    fn table_with(stacks: &[Chips]) -> Table {
        let mut table = Table::new(1, config());
        for (idx, stack) in stacks.iter().enumerate() {
            table.add_player(idx as PlayerId + 1, *stack).unwrap();
        }
        table
    }

    fn ready_all(table: &mut Table, players: &[PlayerId]) {
        for player in players {
            table.set_ready(*player, true).unwrap();
        }
    }

    fn cards(values: &[(Value, Suit)]) -> Vec<Card> {
        values.iter().map(|(v, s)| Card(*v, *s)).collect()
    }

    #[test]
    fn hand_starts_once_enough_players_are_ready() {
        let mut table = table_with(&[500, 500, 500]);
        table.set_ready(1, true).unwrap();
        assert_eq!(table.phase(), Phase::Waiting);
        table.set_ready(2, true).unwrap();
        assert_eq!(table.phase(), Phase::PreFlop);
        assert_eq!(table.hand_number(), 1);
        // Player 3 was not ready and is not dealt in.
        assert!(table.hole_cards(3).unwrap().is_empty());
        assert_eq!(table.hole_cards(1).unwrap().len(), 2);
    }

    #[test]
    fn rejected_action_leaves_table_unchanged() {
        let mut table = table_with(&[500, 500, 500]);
        ready_all(&mut table, &[1, 2, 3]);
        table.drain_events();
        let before = table.snapshot();

        let not_on_turn = before
            .players
            .iter()
            .map(|p| p.player_id)
            .find(|id| Some(*id) != before.to_act)
            .unwrap();
        let err = table.act(not_on_turn, Action::Check, None).unwrap_err();
        assert!(matches!(err, TableError::Validation(ValidationError::NotYourTurn)));
        assert_eq!(table.snapshot(), before);
        assert!(table.drain_events().is_empty());
    }

    #[test]
    fn stale_version_is_a_concurrency_error() {
        let mut table = table_with(&[500, 500]);
        ready_all(&mut table, &[1, 2]);
        let version = table.version();
        let actor = table.to_act().unwrap();
        table.act(actor, Action::Call, Some(version)).unwrap();

        let next = table.to_act().unwrap();
        let err = table.act(next, Action::Check, Some(version)).unwrap_err();
        assert!(matches!(
            err,
            TableError::Concurrency { expected, actual } if expected == version && actual == version + 1
        ));
    }

    #[test]
    fn every_mutation_bumps_the_version() {
        let mut table = Table::new(1, config());
        assert_eq!(table.version(), 0);
        table.add_player(1, 100).unwrap();
        table.set_ready(1, true).unwrap();
        assert_eq!(table.version(), 2);
        assert!(table.set_ready(9, true).is_err());
        assert_eq!(table.version(), 2);
    }

    #[test]
    fn join_validation() {
        let mut table = Table::new(
            1,
            TableConfig {
                max_players: 2,
                min_buy_in: 50,
                ..config()
            },
        );
        assert!(matches!(
            table.add_player(1, 10),
            Err(TableError::Validation(ValidationError::BuyInTooSmall { minimum: 50, offered: 10 }))
        ));
        table.add_player(1, 100).unwrap();
        assert!(matches!(
            table.add_player(1, 100),
            Err(TableError::Validation(ValidationError::AlreadySeated(1)))
        ));
        table.add_player(2, 100).unwrap();
        assert!(matches!(
            table.add_player(3, 100),
            Err(TableError::Validation(ValidationError::TableFull))
        ));
    }

    #[test]
    fn leaving_mid_hand_folds_and_cashes_out_the_stack() {
        let mut table = table_with(&[500, 500, 500]);
        ready_all(&mut table, &[1, 2, 3]);
        let total = table.chips_in_play();

        let leaver = table.to_act().unwrap();
        let stack = table.stack_of(leaver).unwrap();
        assert_eq!(table.remove_player(leaver).unwrap(), stack);
        assert_eq!(table.chips_in_play(), total - stack);
        assert!(table.seat_of(leaver).is_none());
        assert!(table.check_invariants().is_ok());
    }

    #[test]
    fn heads_up_button_posts_small_blind_and_acts_first() {
        let mut table = table_with(&[500, 500]);
        ready_all(&mut table, &[1, 2]);
        let button = table.button().unwrap();
        let snapshot = table.snapshot();
        let button_view = snapshot.players.iter().find(|p| p.seat == button).unwrap();
        assert_eq!(button_view.bet, 10);
        assert_eq!(snapshot.to_act, Some(button_view.player_id));
    }

    #[test]
    fn timeout_checks_when_free_and_folds_when_facing_a_bet() {
        let mut table = table_with(&[500, 500]);
        ready_all(&mut table, &[1, 2]);
        // Small blind owes 10 and is on the clock.
        let token = table.turn_token().unwrap();
        assert_eq!(table.resolve_timeout(token).unwrap(), Some(Action::Fold));
        // Stale token is ignored.
        assert_eq!(table.resolve_timeout(token).unwrap(), None);
        assert_eq!(table.hand_number(), 2);

        // Next hand: small blind calls, big blind times out with nothing owed.
        let sb = table.to_act().unwrap();
        table.act(sb, Action::Call, None).unwrap();
        let token = table.turn_token().unwrap();
        assert_eq!(table.resolve_timeout(token).unwrap(), Some(Action::Check));
        assert_eq!(table.phase(), Phase::Flop);
    }

    #[test]
    fn rigged_deck_decides_showdown() {
        let mut table = table_with(&[200, 200]);
        // Seat 0 gets the button. Deal order starts left of the button:
        // seat 1, seat 0, seat 1, seat 0, then the board.
        let deck = cards(&[
            (14, Suit::Spade),
            (2, Suit::Club),
            (14, Suit::Heart),
            (7, Suit::Diamond),
            (9, Suit::Club),
            (10, Suit::Heart),
            (4, Suit::Spade),
            (12, Suit::Diamond),
            (3, Suit::Heart),
        ]);
        table.queue_deck(Deck::stacked(&deck));
        ready_all(&mut table, &[1, 2]);
        assert_eq!(table.button(), Some(0));

        table.act(1, Action::AllIn, None).unwrap();
        table.act(2, Action::Call, None).unwrap();

        let result = table.last_showdown().unwrap();
        assert!(!result.uncontested);
        assert_eq!(result.pots[0].winners[0].player_id, 2);
        assert_eq!(table.stack_of(2).unwrap(), 400);
        assert_eq!(table.stack_of(1).unwrap(), 0);
        assert!(!table.player(1).unwrap().ready);
        assert_eq!(table.phase(), Phase::Waiting);
    }

    #[test]
    fn events_are_sequenced() {
        let mut table = table_with(&[500, 500]);
        ready_all(&mut table, &[1, 2]);
        let events = table.drain_events();
        assert!(events.windows(2).all(|w| w[0].seq < w[1].seq));
        assert!(events.iter().any(|e| matches!(e.event, GameEvent::TurnStarted { .. })));
        let private: Vec<_> = events
            .iter()
            .filter(|e| matches!(e.event, GameEvent::HoleCardsDealt { .. }))
            .collect();
        assert_eq!(private.len(), 2);
        assert!(private.iter().all(|e| matches!(e.audience, Audience::Player(_))));
    }
}
