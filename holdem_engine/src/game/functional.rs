//! Hand evaluation.
//!
//! Any number of cards can be evaluated. With five or more cards every
//! five-card combination is scored and the best one wins; with fewer only
//! pairs, trips and quads are recognized.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::entities::{ACE, Card, Rank, Value};

/// The value of a hand: its category plus tiebreak values, highest first.
///
/// Two hands compare equal exactly when their category and tiebreak values
/// match; suits never matter. `cards` holds the best five cards (or all
/// cards for short hands) ordered by significance.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct HandValue {
    pub rank: Rank,
    pub values: Vec<Value>,
    pub cards: Vec<Card>,
}

impl HandValue {
    /// Total-ordered integer encoding: category in the top bits, then up to
    /// five tiebreak values in four bits each.
    pub fn score(&self) -> u32 {
        let mut score = (self.rank as u32) << 20;
        for (i, value) in self.values.iter().take(5).enumerate() {
            score |= u32::from(*value) << (16 - 4 * i);
        }
        score
    }
}

impl PartialEq for HandValue {
    fn eq(&self, other: &Self) -> bool {
        self.score() == other.score()
    }
}

impl Eq for HandValue {}

impl PartialOrd for HandValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HandValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score().cmp(&other.score())
    }
}

/// Evaluate a hand made of any number of cards.
///
/// Results are deterministic: among equally valued five-card combinations
/// the first one in canonical order (cards sorted high to low, suit as the
/// secondary key) is reported.
pub fn eval(cards: &[Card]) -> HandValue {
    let mut sorted = cards.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));

    if sorted.len() < 5 {
        return eval_groups(&sorted);
    }

    let n = sorted.len();
    let mut best: Option<HandValue> = None;
    for a in 0..n {
        for b in a + 1..n {
            for c in b + 1..n {
                for d in c + 1..n {
                    for e in d + 1..n {
                        let five = [sorted[a], sorted[b], sorted[c], sorted[d], sorted[e]];
                        let value = eval_five(&five);
                        if best.as_ref().is_none_or(|best| value > *best) {
                            best = Some(value);
                        }
                    }
                }
            }
        }
    }
    best.unwrap_or_else(|| eval_groups(&sorted))
}

/// Indices of the strongest hands. More than one index means a tie.
pub fn argmax(hands: &[HandValue]) -> Vec<usize> {
    let Some(max) = hands.iter().max() else {
        return Vec::new();
    };
    hands
        .iter()
        .enumerate()
        .filter(|(_, hand)| *hand == max)
        .map(|(idx, _)| idx)
        .collect()
}

/// Cards grouped by value, biggest group first, higher value first within
/// groups of the same size. Input must be sorted high to low.
fn group(cards: &[Card]) -> Vec<Vec<Card>> {
    let mut groups: Vec<Vec<Card>> = Vec::new();
    for card in cards {
        match groups.last_mut() {
            Some(last) if last[0].0 == card.0 => last.push(*card),
            _ => groups.push(vec![*card]),
        }
    }
    // Stable sort keeps the high-to-low value order within equal sizes.
    groups.sort_by(|a, b| b.len().cmp(&a.len()));
    groups
}

fn eval_groups(cards: &[Card]) -> HandValue {
    let groups = group(cards);
    let sizes: Vec<usize> = groups.iter().map(Vec::len).collect();
    let rank = match sizes.as_slice() {
        [4, ..] => Rank::FourOfAKind,
        [3, 2, ..] => Rank::FullHouse,
        [3, ..] => Rank::ThreeOfAKind,
        [2, 2, ..] => Rank::TwoPair,
        [2, ..] => Rank::OnePair,
        _ => Rank::HighCard,
    };
    HandValue {
        rank,
        values: groups.iter().map(|g| g[0].0).collect(),
        cards: groups.into_iter().flatten().collect(),
    }
}

/// Input must be sorted high to low.
fn eval_five(cards: &[Card; 5]) -> HandValue {
    let is_flush = cards.iter().all(|card| card.1 == cards[0].1);
    let distinct = cards.windows(2).all(|w| w[0].0 != w[1].0);
    let is_wheel = distinct && cards[0].0 == ACE && cards[1].0 == 5 && cards[4].0 == 2;
    let is_straight = distinct && (cards[0].0 - cards[4].0 == 4 || is_wheel);

    if is_straight {
        let mut ordered = cards.to_vec();
        let high = if is_wheel {
            // The ace plays low.
            ordered.rotate_left(1);
            5
        } else {
            cards[0].0
        };
        let rank = if is_flush {
            Rank::StraightFlush
        } else {
            Rank::Straight
        };
        return HandValue {
            rank,
            values: vec![high],
            cards: ordered,
        };
    }

    let grouped = eval_groups(cards);
    if is_flush && grouped.rank < Rank::Flush {
        return HandValue {
            rank: Rank::Flush,
            values: cards.iter().map(|card| card.0).collect(),
            cards: cards.to_vec(),
        };
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::Suit::{self, *};

    fn hand(cards: &[(Value, Suit)]) -> Vec<Card> {
        cards.iter().map(|(v, s)| Card(*v, *s)).collect()
    }

    #[test]
    fn detects_every_category() {
        let cases = [
            (hand(&[(14, Heart), (13, Heart), (12, Heart), (11, Heart), (10, Heart)]), Rank::StraightFlush),
            (hand(&[(9, Club), (9, Heart), (9, Spade), (9, Diamond), (2, Heart)]), Rank::FourOfAKind),
            (hand(&[(8, Club), (8, Heart), (8, Spade), (4, Diamond), (4, Heart)]), Rank::FullHouse),
            (hand(&[(2, Club), (7, Club), (9, Club), (11, Club), (13, Club)]), Rank::Flush),
            (hand(&[(6, Club), (7, Heart), (8, Spade), (9, Diamond), (10, Heart)]), Rank::Straight),
            (hand(&[(5, Club), (5, Heart), (5, Spade), (9, Diamond), (10, Heart)]), Rank::ThreeOfAKind),
            (hand(&[(5, Club), (5, Heart), (9, Spade), (9, Diamond), (10, Heart)]), Rank::TwoPair),
            (hand(&[(5, Club), (5, Heart), (8, Spade), (9, Diamond), (12, Heart)]), Rank::OnePair),
            (hand(&[(2, Club), (5, Heart), (8, Spade), (9, Diamond), (12, Heart)]), Rank::HighCard),
        ];
        for (cards, rank) in cases {
            assert_eq!(eval(&cards).rank, rank, "{cards:?}");
        }
    }

    #[test]
    fn wheel_is_the_lowest_straight() {
        let wheel = eval(&hand(&[(14, Club), (2, Heart), (3, Spade), (4, Diamond), (5, Heart)]));
        let six_high = eval(&hand(&[(6, Club), (2, Heart), (3, Spade), (4, Diamond), (5, Heart)]));
        assert_eq!(wheel.rank, Rank::Straight);
        assert_eq!(wheel.values, vec![5]);
        assert_eq!(wheel.cards.last(), Some(&Card(14, Club)));
        assert!(six_high > wheel);
    }

    #[test]
    fn picks_best_five_of_seven() {
        let cards = hand(&[
            (14, Spade),
            (14, Heart),
            (10, Spade),
            (9, Spade),
            (3, Spade),
            (2, Spade),
            (14, Diamond),
        ]);
        let value = eval(&cards);
        assert_eq!(value.rank, Rank::Flush);
        assert_eq!(value.values, vec![14, 10, 9, 3, 2]);
        assert_eq!(value.cards.len(), 5);
    }

    #[test]
    fn kickers_break_ties() {
        let a = eval(&hand(&[(13, Club), (13, Heart), (14, Spade), (7, Diamond), (3, Heart)]));
        let b = eval(&hand(&[(13, Spade), (13, Diamond), (12, Spade), (7, Club), (3, Club)]));
        assert_eq!(a.rank, Rank::OnePair);
        assert!(a > b);
    }

    #[test]
    fn suits_do_not_break_ties() {
        let a = eval(&hand(&[(13, Club), (12, Heart), (9, Spade), (7, Diamond), (3, Heart)]));
        let b = eval(&hand(&[(13, Spade), (12, Diamond), (9, Heart), (7, Club), (3, Club)]));
        assert_eq!(a, b);
        assert_eq!(argmax(&[a, b]), vec![0, 1]);
    }

    #[test]
    fn short_hands_only_count_groups() {
        let pair = eval(&hand(&[(4, Club), (4, Heart)]));
        assert_eq!(pair.rank, Rank::OnePair);
        let high = eval(&hand(&[(14, Club), (13, Club), (12, Club), (11, Club)]));
        assert_eq!(high.rank, Rank::HighCard);
        assert_eq!(eval(&[]).rank, Rank::HighCard);
    }

    #[test]
    fn full_house_prefers_higher_trips() {
        // Two sets of trips: the higher one forms the full house.
        let cards = hand(&[
            (6, Club),
            (6, Heart),
            (6, Spade),
            (11, Club),
            (11, Heart),
            (11, Diamond),
            (2, Club),
        ]);
        let value = eval(&cards);
        assert_eq!(value.rank, Rank::FullHouse);
        assert_eq!(value.values, vec![11, 6]);
    }
}
