//! A single betting round (one street).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::entities::{Action, Chips, Player, SeatIndex, Seats, clockwise_from};
use crate::table::errors::ValidationError;

/// What an accepted action turned into.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BetKind {
    Check,
    Call,
    Bet,
    Raise,
    AllIn,
    Fold,
}

/// Result of applying an action.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Applied {
    pub kind: BetKind,
    /// Chips moved from the stack this action.
    pub added: Chips,
    /// Seat's total commitment for the round afterwards.
    pub total: Chips,
}

/// What the seat to act may do.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct LegalActions {
    pub can_check: bool,
    /// Chips needed to call, capped at the stack.
    pub to_call: Chips,
    /// Smallest legal "bet to" total, if raising is allowed at all.
    pub min_bet: Option<Chips>,
    /// Largest possible "bet to" total (all-in).
    pub max_bet: Chips,
}

/// Betting state for one street.
///
/// Commitments are tracked per seat in `bets`. A seat needs to act while it
/// can still act (in the hand, not folded, not all-in) and either has not
/// acted since the last full raise or is below the current bet. The round
/// is closed once no seat needs to act.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BettingRound {
    current_bet: Chips,
    min_raise: Chips,
    last_aggressor: Option<SeatIndex>,
    bets: BTreeMap<SeatIndex, Chips>,
    /// Seats that have acted since the last full raise.
    acted: BTreeSet<SeatIndex>,
    /// Seats that may only call or fold because a short all-in did not
    /// reopen the betting for them.
    raise_locked: BTreeSet<SeatIndex>,
    to_act: Option<SeatIndex>,
}

impl BettingRound {
    pub fn new(big_blind: Chips) -> Self {
        Self {
            current_bet: 0,
            min_raise: big_blind,
            last_aggressor: None,
            bets: BTreeMap::new(),
            acted: BTreeSet::new(),
            raise_locked: BTreeSet::new(),
            to_act: None,
        }
    }

    pub fn current_bet(&self) -> Chips {
        self.current_bet
    }

    pub fn min_raise(&self) -> Chips {
        self.min_raise
    }

    pub fn last_aggressor(&self) -> Option<SeatIndex> {
        self.last_aggressor
    }

    pub fn to_act(&self) -> Option<SeatIndex> {
        self.to_act
    }

    pub fn is_closed(&self) -> bool {
        self.to_act.is_none()
    }

    pub fn bet(&self, seat: SeatIndex) -> Chips {
        self.bets.get(&seat).copied().unwrap_or(0)
    }

    pub fn bets(&self) -> &BTreeMap<SeatIndex, Chips> {
        &self.bets
    }

    pub fn total(&self) -> Chips {
        self.bets.values().sum()
    }

    /// Chips `seat` must add to match the current bet.
    pub fn owed(&self, seat: SeatIndex) -> Chips {
        self.current_bet.saturating_sub(self.bet(seat))
    }

    /// Post a forced bet. The nominal `amount` becomes the bet to match even
    /// when the seat is short and goes all-in for less. Returns the chips
    /// actually taken from the stack.
    pub fn post_blind(&mut self, seats: &mut Seats, seat: SeatIndex, amount: Chips) -> Chips {
        let added = self.commit(seats, seat, amount);
        self.current_bet = self.current_bet.max(amount);
        added
    }

    /// Hand the turn to the first seat at or after `first` that needs to act.
    pub fn open(&mut self, seats: &Seats, first: SeatIndex) {
        self.to_act = self.find_next(seats, first, true);
    }

    /// Apply an action by the seat to act. On error nothing changes.
    pub fn apply(
        &mut self,
        seats: &mut Seats,
        seat: SeatIndex,
        action: Action,
    ) -> Result<Applied, ValidationError> {
        if self.to_act != Some(seat) {
            return Err(ValidationError::NotYourTurn);
        }
        let Some(Some(player)) = seats.get(seat) else {
            return Err(ValidationError::NotYourTurn);
        };
        let bet = self.bet(seat);
        let all_in_total = bet + player.stack;
        let owed = self.owed(seat);

        let applied = match action {
            Action::Fold => {
                if let Some(Some(player)) = seats.get_mut(seat) {
                    player.folded = true;
                }
                Applied {
                    kind: BetKind::Fold,
                    added: 0,
                    total: bet,
                }
            }
            Action::Check if owed > 0 => return Err(ValidationError::CannotCheck { owed }),
            Action::Check => Applied {
                kind: BetKind::Check,
                added: 0,
                total: bet,
            },
            Action::Call if owed == 0 => Applied {
                kind: BetKind::Check,
                added: 0,
                total: bet,
            },
            Action::Call => self.call(seats, seat, owed),
            Action::AllIn if all_in_total <= self.current_bet => self.call(seats, seat, owed),
            Action::AllIn => self.raise_to(seats, seat, all_in_total, all_in_total)?,
            Action::Bet(amount) if amount == all_in_total && amount <= self.current_bet => {
                self.call(seats, seat, owed)
            }
            Action::Bet(amount) => self.raise_to(seats, seat, amount, all_in_total)?,
        };

        self.acted.insert(seat);
        self.to_act = self.find_next(seats, seat, false);
        Ok(applied)
    }

    /// Fold a seat regardless of whose turn it is (the player left).
    pub fn force_fold(&mut self, seats: &mut Seats, seat: SeatIndex) {
        if let Some(Some(player)) = seats.get_mut(seat) {
            player.folded = true;
        }
        self.acted.insert(seat);
        self.to_act = match self.to_act {
            Some(current) if current == seat => self.find_next(seats, seat, false),
            Some(current) => self.find_next(seats, current, true),
            None => None,
        };
    }

    /// Options for `seat`, assuming it is its turn.
    pub fn legal_actions(&self, seats: &Seats, seat: SeatIndex) -> LegalActions {
        let stack = match seats.get(seat) {
            Some(Some(player)) => player.stack,
            _ => 0,
        };
        let bet = self.bet(seat);
        let owed = self.owed(seat);
        let max_bet = bet + stack;
        let min_bet = if self.raise_locked.contains(&seat) || max_bet <= self.current_bet {
            None
        } else {
            Some((self.current_bet + self.min_raise).min(max_bet))
        };
        LegalActions {
            can_check: owed == 0,
            to_call: owed.min(stack),
            min_bet,
            max_bet,
        }
    }

    fn call(&mut self, seats: &mut Seats, seat: SeatIndex, owed: Chips) -> Applied {
        let added = self.commit(seats, seat, owed);
        let kind = match seats.get(seat) {
            Some(Some(player)) if player.all_in => BetKind::AllIn,
            _ => BetKind::Call,
        };
        Applied {
            kind,
            added,
            total: self.bet(seat),
        }
    }

    fn raise_to(
        &mut self,
        seats: &mut Seats,
        seat: SeatIndex,
        amount: Chips,
        all_in_total: Chips,
    ) -> Result<Applied, ValidationError> {
        if amount > all_in_total {
            return Err(ValidationError::BetExceedsStack {
                maximum: all_in_total,
                offered: amount,
            });
        }
        let minimum = self.current_bet + self.min_raise;
        if amount <= self.current_bet {
            return Err(ValidationError::BetTooSmall {
                minimum: minimum.min(all_in_total),
                offered: amount,
            });
        }
        if self.raise_locked.contains(&seat) {
            return Err(ValidationError::RaiseNotReopened);
        }
        let is_all_in = amount == all_in_total;
        let raise = amount - self.current_bet;
        if raise < self.min_raise && !is_all_in {
            return Err(ValidationError::BetTooSmall {
                minimum,
                offered: amount,
            });
        }

        let kind = if is_all_in {
            BetKind::AllIn
        } else if self.current_bet == 0 {
            BetKind::Bet
        } else {
            BetKind::Raise
        };
        let added = self.commit(seats, seat, amount - self.bet(seat));

        if raise >= self.min_raise {
            self.min_raise = raise;
            self.acted.clear();
            self.raise_locked.clear();
        } else {
            // Short all-in: whoever already acted may call or fold only.
            self.raise_locked.extend(self.acted.iter().copied());
        }
        self.current_bet = amount;
        self.last_aggressor = Some(seat);

        Ok(Applied {
            kind,
            added,
            total: amount,
        })
    }

    /// Move up to `amount` chips from the seat's stack into its bet.
    fn commit(&mut self, seats: &mut Seats, seat: SeatIndex, amount: Chips) -> Chips {
        let Some(Some(player)) = seats.get_mut(seat) else {
            return 0;
        };
        let added = amount.min(player.stack);
        player.stack -= added;
        if player.stack == 0 {
            player.all_in = true;
        }
        *self.bets.entry(seat).or_insert(0) += added;
        added
    }

    fn needs_to_act(&self, player: &Player) -> bool {
        player.can_act()
            && (!self.acted.contains(&player.seat_idx) || self.bet(player.seat_idx) < self.current_bet)
    }

    fn find_next(&self, seats: &Seats, from: SeatIndex, inclusive: bool) -> Option<SeatIndex> {
        let live = seats.iter().flatten().filter(|p| p.is_live()).count();
        if live <= 1 {
            return None;
        }
        let mut active = seats.iter().flatten().filter(|p| p.can_act());
        match (active.next(), active.next()) {
            (None, _) => return None,
            // Nobody left to bet against.
            (Some(only), None) if self.bet(only.seat_idx) >= self.current_bet => return None,
            _ => {}
        }

        let n = seats.len();
        let start = if inclusive { n + from - 1 } else { from };
        clockwise_from(start % n, n).find(|seat| {
            seats
                .get(*seat)
                .and_then(Option::as_ref)
                .is_some_and(|player| self.needs_to_act(player))
        })
    }
}
