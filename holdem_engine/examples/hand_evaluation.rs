//! Hand Evaluation Example
//!
//! Demonstrates how to use the hand evaluation functions to compare poker hands.

use holdem_engine::game::{
    entities::{Card, Suit},
    functional::{argmax, eval},
};

fn show(cards: &[Card]) -> String {
    cards.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ")
}

fn main() {
    println!("=== Poker Hand Evaluation Example ===\n");

    // Example 1: Evaluate a single hand
    println!("Example 1: Evaluating a 7-card hand");
    let hand = vec![
        Card(14, Suit::Heart),
        Card(13, Suit::Heart),
        Card(12, Suit::Heart),
        Card(11, Suit::Heart),
        Card(10, Suit::Heart),
        Card(9, Suit::Spade),
        Card(2, Suit::Club),
    ];
    let value = eval(&hand);
    println!("Hand: {}", show(&hand));
    println!("Best five: {}", show(&value.cards));
    println!("Rank: {}\n", value.rank);

    // Example 2: Compare two hands
    println!("Example 2: Comparing two hands");
    let hand_a = vec![
        Card(14, Suit::Spade),
        Card(14, Suit::Heart),
        Card(10, Suit::Club),
        Card(9, Suit::Diamond),
        Card(2, Suit::Spade),
    ];
    let hand_b = vec![
        Card(13, Suit::Spade),
        Card(13, Suit::Heart),
        Card(10, Suit::Club),
        Card(9, Suit::Diamond),
        Card(2, Suit::Spade),
    ];
    let (eval_a, eval_b) = (eval(&hand_a), eval(&hand_b));
    println!("Hand A: {} ({})", show(&hand_a), eval_a.rank);
    println!("Hand B: {} ({})", show(&hand_b), eval_b.rank);
    match argmax(&[eval_a, eval_b]).as_slice() {
        [0] => println!("Winner: Hand A"),
        [1] => println!("Winner: Hand B"),
        _ => println!("Tie!"),
    }

    // Example 3: Split pot between identical values in different suits
    println!("\nExample 3: Three-way comparison with a tie");
    let hands = [
        [(10, Suit::Heart), (10, Suit::Diamond), (5, Suit::Club), (3, Suit::Spade), (2, Suit::Heart)],
        [(10, Suit::Spade), (10, Suit::Club), (5, Suit::Heart), (3, Suit::Diamond), (2, Suit::Club)],
        [(9, Suit::Heart), (9, Suit::Diamond), (5, Suit::Club), (3, Suit::Spade), (2, Suit::Heart)],
    ]
    .map(|cards| cards.map(|(value, suit)| Card(value, suit)));
    let values: Vec<_> = hands.iter().map(|h| eval(h)).collect();
    for (i, (hand, value)) in hands.iter().zip(&values).enumerate() {
        println!("Hand {}: {} ({})", i + 1, show(hand), value.rank);
    }
    let winners: Vec<usize> = argmax(&values).iter().map(|i| i + 1).collect();
    println!("Winner(s): {winners:?}");

    println!("\n=== End of Hand Evaluation Example ===");
}
