//! Main and side pot bookkeeping.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::entities::{Chips, SeatIndex};

/// A pot and the seats that can win it.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Pot {
    pub amount: Chips,
    pub eligible: BTreeSet<SeatIndex>,
}

/// Split the chips committed this hand into a main pot and side pots.
///
/// `contributions` covers every seat that put chips in, folded or not.
/// `contenders` are the seats still in the hand. Each pot is capped at a
/// distinct contender contribution level, so eligibility shrinks strictly
/// from one pot to the next. Folded chips above the highest contender level
/// land in the last pot. There is always at least one pot.
pub fn partition(
    contributions: &BTreeMap<SeatIndex, Chips>,
    contenders: &BTreeSet<SeatIndex>,
) -> Vec<Pot> {
    let levels: BTreeSet<Chips> = contenders
        .iter()
        .filter_map(|seat| contributions.get(seat).copied())
        .filter(|amount| *amount > 0)
        .collect();

    let mut pots: Vec<Pot> = Vec::with_capacity(levels.len().max(1));
    let mut previous = 0;
    for level in levels {
        let amount = contributions
            .values()
            .map(|c| (*c).min(level) - (*c).min(previous))
            .sum();
        let eligible = contenders
            .iter()
            .copied()
            .filter(|seat| contributions.get(seat).is_some_and(|c| *c >= level))
            .collect();
        pots.push(Pot { amount, eligible });
        previous = level;
    }

    let total: Chips = contributions.values().sum();
    let assigned: Chips = pots.iter().map(|pot| pot.amount).sum();
    match pots.last_mut() {
        Some(last) => last.amount += total - assigned,
        None => pots.push(Pot {
            amount: total,
            eligible: contenders.clone(),
        }),
    }
    pots
}

/// Divide `amount` evenly between `winners`, which must already be in
/// clockwise order starting left of the button. Odd chips go one at a time
/// to the earliest winners in that order.
pub fn split(amount: Chips, winners: &[SeatIndex]) -> Vec<(SeatIndex, Chips)> {
    if winners.is_empty() {
        return Vec::new();
    }
    let n = winners.len() as Chips;
    let share = amount / n;
    let odd = (amount % n) as usize;
    winners
        .iter()
        .enumerate()
        .map(|(i, seat)| (*seat, share + Chips::from(i < odd)))
        .collect()
}
