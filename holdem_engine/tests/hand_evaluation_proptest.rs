/// Property-based tests for hand evaluation using proptest
///
/// These tests verify that the hand evaluation logic is correct
/// across a wide range of randomly generated card combinations.
use holdem_engine::game::{
    entities::{Card, Rank, SUITS, Suit},
    functional::{argmax, eval},
};
use proptest::prelude::*;
use std::collections::BTreeSet;

// Strategy to generate a valid card (values 2-14, aces are 14)
fn card_strategy() -> impl Strategy<Value = Card> {
    (2u8..=14, 0usize..4).prop_map(|(value, suit_idx)| Card(value, SUITS[suit_idx]))
}

// Strategy to generate a vec of unique cards (no duplicates)
fn unique_cards_strategy(min: usize, max: usize) -> impl Strategy<Value = Vec<Card>> {
    prop::collection::btree_set(card_strategy(), min..=max)
        .prop_map(|cards| cards.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

fn five_card_hand_strategy() -> impl Strategy<Value = Vec<Card>> {
    unique_cards_strategy(5, 5)
}

// 2 hole cards + 5 board cards
fn seven_card_hand_strategy() -> impl Strategy<Value = Vec<Card>> {
    unique_cards_strategy(7, 7)
}

fn suit_strategy() -> impl Strategy<Value = Suit> {
    (0usize..4).prop_map(|idx| SUITS[idx])
}

proptest! {
    #[test]
    fn test_best_hand_is_five_of_the_input(cards in seven_card_hand_strategy()) {
        let hand = eval(&cards);
        prop_assert_eq!(hand.cards.len(), 5);
        let distinct: BTreeSet<_> = hand.cards.iter().collect();
        prop_assert_eq!(distinct.len(), 5);
        for card in &hand.cards {
            prop_assert!(cards.contains(card), "{} is not in the input", card);
        }
    }

    #[test]
    fn test_best_five_score_the_same_as_seven(cards in seven_card_hand_strategy()) {
        let hand = eval(&cards);
        let best = eval(&hand.cards);
        prop_assert_eq!(hand.score(), best.score());
        prop_assert_eq!(hand.rank, best.rank);
    }

    #[test]
    fn test_short_hands_keep_every_card(cards in unique_cards_strategy(0, 4)) {
        let hand = eval(&cards);
        prop_assert_eq!(hand.cards.len(), cards.len());
        prop_assert!(hand.rank <= Rank::FourOfAKind);
    }

    #[test]
    fn test_eval_deterministic(cards in seven_card_hand_strategy()) {
        let hand1 = eval(&cards);
        let hand2 = eval(&cards);
        prop_assert_eq!(hand1.cards, hand2.cards);
        prop_assert_eq!(hand1.values, hand2.values);
    }

    #[test]
    fn test_eval_ignores_input_order(
        (cards, shuffled) in seven_card_hand_strategy()
            .prop_flat_map(|cards| (Just(cards.clone()), Just(cards).prop_shuffle()))
    ) {
        prop_assert_eq!(eval(&cards).cards, eval(&shuffled).cards);
    }

    #[test]
    fn test_more_cards_never_hurt(cards in seven_card_hand_strategy()) {
        let seven = eval(&cards);
        for n in 5..7 {
            prop_assert!(seven >= eval(&cards[..n]));
        }
    }

    #[test]
    fn test_argmax_single_hand_returns_zero(cards in five_card_hand_strategy()) {
        let winners = argmax(&[eval(&cards)]);
        prop_assert_eq!(winners, vec![0]);
    }

    #[test]
    fn test_argmax_identical_hands_all_win(cards in five_card_hand_strategy()) {
        let hand = eval(&cards);
        let winners = argmax(&[hand.clone(), hand.clone(), hand]);
        prop_assert_eq!(winners, vec![0, 1, 2]);
    }

    #[test]
    fn test_argmax_returns_valid_indices(
        hands in prop::collection::vec(five_card_hand_strategy(), 2..=10)
    ) {
        let evaluated: Vec<_> = hands.iter().map(|h| eval(h)).collect();
        let winners = argmax(&evaluated);

        prop_assert!(!winners.is_empty());
        let best = evaluated.iter().max().unwrap();
        for (idx, hand) in evaluated.iter().enumerate() {
            prop_assert_eq!(winners.contains(&idx), hand == best);
        }

        // Indices should be sorted and unique
        let mut sorted_winners = winners.clone();
        sorted_winners.sort();
        sorted_winners.dedup();
        prop_assert_eq!(winners, sorted_winners);
    }

    #[test]
    fn test_argmax_ties_only_on_equal_values(a in five_card_hand_strategy(), b in five_card_hand_strategy()) {
        let (a, b) = (eval(&a), eval(&b));
        let winners = argmax(&[a.clone(), b.clone()]);
        if winners.len() == 2 {
            prop_assert_eq!(a.rank, b.rank);
            prop_assert_eq!(a.values, b.values);
        }
    }
}

// Additional specific property tests for hand rankings

proptest! {
    /// A royal flush beats four of a kind
    #[test]
    fn test_royal_flush_beats_four_kind(suit in suit_strategy()) {
        let other_suits: Vec<Suit> = SUITS.into_iter().filter(|&s| s != suit).collect();

        let royal_flush = vec![
            Card(14, suit),
            Card(10, suit),
            Card(11, suit),
            Card(12, suit),
            Card(13, suit),
        ];
        let four_kind = vec![
            Card(9, other_suits[0]),
            Card(9, other_suits[1]),
            Card(9, other_suits[2]),
            Card(9, suit),
            Card(8, suit),
        ];

        let royal = eval(&royal_flush);
        prop_assert_eq!(royal.rank, Rank::StraightFlush);
        prop_assert_eq!(argmax(&[royal, eval(&four_kind)]), vec![0]);
    }

    /// Any straight flush is still a straight flush with two more cards
    #[test]
    fn test_straight_flush_survives_extra_cards(
        suit in suit_strategy(),
        low in 2u8..=10,
        extra in unique_cards_strategy(2, 2),
    ) {
        let mut cards: Vec<Card> = (low..low + 5).map(|v| Card(v, suit)).collect();
        prop_assume!(extra.iter().all(|card| !cards.contains(card)));
        cards.extend(extra);

        let hand = eval(&cards);
        prop_assert_eq!(hand.rank, Rank::StraightFlush);
        prop_assert!(hand.values[0] >= low + 4);
    }

    /// Four of a kind beats a full house
    #[test]
    fn test_four_kind_beats_full_house(quad_value in 2u8..=14, trip_value in 2u8..=14) {
        prop_assume!(quad_value != trip_value);

        let four_kind = vec![
            Card(quad_value, Suit::Club),
            Card(quad_value, Suit::Diamond),
            Card(quad_value, Suit::Heart),
            Card(quad_value, Suit::Spade),
            Card(trip_value, Suit::Club),
        ];
        let full_house = vec![
            Card(trip_value, Suit::Club),
            Card(trip_value, Suit::Diamond),
            Card(trip_value, Suit::Heart),
            Card(quad_value, Suit::Club),
            Card(quad_value, Suit::Diamond),
        ];

        prop_assert_eq!(argmax(&[eval(&four_kind), eval(&full_house)]), vec![0]);
    }

    /// A flush beats a straight
    #[test]
    fn test_flush_beats_straight(suit in suit_strategy(), high in 6u8..=14) {
        let flush = vec![
            Card(2, suit),
            Card(5, suit),
            Card(8, suit),
            Card(10, suit),
            Card(13, suit),
        ];
        let straight: Vec<Card> = (0..5)
            .map(|i| Card(high - i, SUITS[usize::from(i) % 2]))
            .collect();

        let st = eval(&straight);
        prop_assert_eq!(st.rank, Rank::Straight);
        prop_assert_eq!(argmax(&[eval(&flush), st]), vec![0]);
    }

    /// Three of a kind beats two pair
    #[test]
    fn test_three_kind_beats_two_pair(trip_value in 2u8..=14, pair1 in 2u8..=14, pair2 in 2u8..=14) {
        prop_assume!(trip_value != pair1 && trip_value != pair2 && pair1 != pair2);

        let three_kind = vec![
            Card(trip_value, Suit::Club),
            Card(trip_value, Suit::Diamond),
            Card(trip_value, Suit::Heart),
            Card(pair1, Suit::Club),
            Card(pair2, Suit::Diamond),
        ];
        let two_pair = vec![
            Card(pair1, Suit::Club),
            Card(pair1, Suit::Diamond),
            Card(pair2, Suit::Heart),
            Card(pair2, Suit::Spade),
            Card(trip_value, Suit::Club),
        ];

        prop_assert_eq!(argmax(&[eval(&three_kind), eval(&two_pair)]), vec![0]);
    }

    /// A higher pair beats a lower pair whatever the kickers
    #[test]
    fn test_higher_pair_wins(low in 2u8..=13, gap in 1u8..=12) {
        let high = low.saturating_add(gap).min(14);
        prop_assume!(high > low);

        // Best possible kickers for the low pair, worst for the high one.
        let low_pair: Vec<Card> = [Card(low, Suit::Club), Card(low, Suit::Diamond)]
            .into_iter()
            .chain(kickers(&[low, high], true).map(|v| Card(v, Suit::Heart)))
            .collect();
        let high_pair: Vec<Card> = [Card(high, Suit::Heart), Card(high, Suit::Spade)]
            .into_iter()
            .chain(kickers(&[low, high], false).map(|v| Card(v, Suit::Club)))
            .collect();

        let (a, b) = (eval(&low_pair), eval(&high_pair));
        prop_assume!(a.rank == Rank::OnePair && b.rank == Rank::OnePair);
        prop_assert_eq!(argmax(&[a, b]), vec![1]);
    }
}

/// Three values avoiding `exclude`, highest or lowest first.
fn kickers(exclude: &[u8], highest: bool) -> impl Iterator<Item = u8> {
    let mut values: Vec<u8> = (2u8..=14).filter(|v| !exclude.contains(v)).collect();
    if highest {
        values.reverse();
    }
    values.into_iter().take(3)
}
