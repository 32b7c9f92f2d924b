//! Integration tests for hand flow on the synchronous table state machine.
//!
//! These drive a `Table` directly: blinds, turn order, street transitions
//! and pot arithmetic, with closed-form expected values.

use holdem_engine::{
    Table, TableConfig,
    game::entities::{Action, Card, Chips, Deck, Phase, PlayerId, Suit},
    table::{GameEvent, NotFoundError, TableError, ValidationError},
};

fn config(min_players: usize) -> TableConfig {
    TableConfig {
        small_blind: 10,
        big_blind: 20,
        min_players,
        min_buy_in: 20,
        seed: Some(7),
        ..TableConfig::default()
    }
}

/// Seats players 1..=n in seats 0..n and readies them all. The hand starts
/// once the last one is ready.
fn start(stacks: &[Chips]) -> Table {
    let mut table = Table::new(1, config(stacks.len()));
    for (idx, stack) in stacks.iter().enumerate() {
        table.add_player(idx as PlayerId + 1, *stack).unwrap();
    }
    for idx in 0..stacks.len() {
        table.set_ready(idx as PlayerId + 1, true).unwrap();
    }
    table
}

fn live_players(table: &Table) -> usize {
    table
        .snapshot()
        .players
        .iter()
        .filter(|p| p.in_hand && !p.folded)
        .count()
}

#[test]
fn test_three_player_preflop_round() {
    let mut table = start(&[1_000, 1_000, 1_000]);
    assert_eq!(table.phase(), Phase::PreFlop);
    assert_eq!(table.button(), Some(0));
    assert_eq!(table.snapshot().pot_total, 30);

    // Seat 0 is under the gun three-handed.
    assert_eq!(table.to_act(), Some(1));
    table.act(1, Action::Bet(100), None).unwrap();
    assert_eq!(table.snapshot().pot_total, 130);

    // Small blind completes to 100, adding 90.
    table.act(2, Action::Call, None).unwrap();
    assert_eq!(table.snapshot().pot_total, 220);

    table.act(3, Action::Fold, None).unwrap();
    let snapshot = table.snapshot();
    assert_eq!(snapshot.pot_total, 220);
    assert_eq!(snapshot.phase, Phase::Flop);
    assert_eq!(snapshot.board.len(), 3);
    assert_eq!(live_players(&table), 2);
    assert_eq!(snapshot.pots.len(), 1);
    assert_eq!(snapshot.pots[0].amount, 220);
    assert_eq!(snapshot.total_chips(), 3_000);
}

#[test]
fn test_heads_up_raise_and_call() {
    let mut table = start(&[1_000, 1_000]);
    // The button posts the small blind and opens the action.
    assert_eq!(table.to_act(), Some(1));
    let snapshot = table.snapshot();
    assert_eq!(snapshot.player(1).unwrap().bet, 10);
    assert_eq!(snapshot.player(2).unwrap().bet, 20);

    table.act(1, Action::Bet(40), None).unwrap();
    let snapshot = table.snapshot();
    assert_eq!(snapshot.current_bet, 40);
    assert_eq!(snapshot.min_raise, 20);

    table.act(2, Action::Call, None).unwrap();
    let snapshot = table.snapshot();
    assert_eq!(snapshot.pot_total, 40 + 40);
    assert_eq!(snapshot.player(2).unwrap().stack, 1_000 - 40);
    assert_eq!(snapshot.phase, Phase::Flop);

    // Big blind acts first after the flop.
    assert_eq!(table.to_act(), Some(2));
}

#[test]
fn test_short_all_in_creates_side_pot() {
    let mut table = start(&[50, 200, 200]);
    assert_eq!(table.to_act(), Some(1));

    table.act(1, Action::AllIn, None).unwrap();
    table.act(2, Action::Call, None).unwrap();
    table.act(3, Action::Bet(120), None).unwrap();
    table.act(2, Action::Call, None).unwrap();

    let snapshot = table.snapshot();
    assert_eq!(snapshot.phase, Phase::Flop);
    assert_eq!(snapshot.pots.len(), 2);

    let main = &snapshot.pots[0];
    assert_eq!(main.amount, 150);
    assert_eq!(main.eligible.iter().copied().collect::<Vec<_>>(), vec![0, 1, 2]);

    let side = &snapshot.pots[1];
    assert_eq!(side.amount, 140);
    assert_eq!(side.eligible.iter().copied().collect::<Vec<_>>(), vec![1, 2]);

    // Check it down; every pot is paid out and nothing is created or lost.
    for _ in 0..3 {
        table.act(2, Action::Check, None).unwrap();
        table.act(3, Action::Check, None).unwrap();
    }
    let result = table.last_showdown().unwrap();
    assert_eq!(result.hand_number, 1);
    assert!(!result.uncontested);
    assert_eq!(result.pots.len(), 2);
    assert!(!result.pots[1].eligible.contains(&0));
    for award in &result.pots {
        let paid: Chips = award.winners.iter().map(|w| w.amount).sum();
        assert_eq!(paid, award.amount);
    }
    assert_eq!(table.chips_in_play(), 450);
    assert_eq!(table.snapshot().total_chips(), 450);
}

#[test]
fn test_turn_order_across_streets() {
    let mut table = start(&[500, 500, 500]);

    // Preflop: UTG (button), small blind, big blind.
    let mut order = Vec::new();
    while table.phase() == Phase::PreFlop {
        let player = table.to_act().unwrap();
        order.push(player);
        table.act(player, Action::Call, None).unwrap();
    }
    assert_eq!(order, vec![1, 2, 3]);

    // Postflop: first live seat left of the button.
    order.clear();
    while table.phase() == Phase::Flop {
        let player = table.to_act().unwrap();
        order.push(player);
        table.act(player, Action::Check, None).unwrap();
    }
    assert_eq!(order, vec![2, 3, 1]);
    assert_eq!(table.phase(), Phase::Turn);
    assert_eq!(table.board().len(), 4);
}

#[test]
fn test_raise_reopens_action() {
    let mut table = start(&[1_000, 1_000, 1_000]);
    table.act(1, Action::Call, None).unwrap();
    table.act(2, Action::Call, None).unwrap();
    // Big blind raises; both limpers must act again.
    table.act(3, Action::Bet(60), None).unwrap();
    assert_eq!(table.to_act(), Some(1));
    table.act(1, Action::Call, None).unwrap();
    assert_eq!(table.to_act(), Some(2));
    table.act(2, Action::Call, None).unwrap();
    assert_eq!(table.phase(), Phase::Flop);
    assert_eq!(table.snapshot().pot_total, 180);
}

#[test]
fn test_undersized_raise_is_rejected() {
    let mut table = start(&[1_000, 1_000, 1_000]);
    let err = table.act(1, Action::Bet(30), None).unwrap_err();
    assert!(matches!(
        err,
        TableError::Validation(ValidationError::BetTooSmall { minimum: 40, offered: 30 })
    ));
    let err = table.act(1, Action::Check, None).unwrap_err();
    assert!(matches!(
        err,
        TableError::Validation(ValidationError::CannotCheck { owed: 20 })
    ));
    let err = table.act(1, Action::Bet(5_000), None).unwrap_err();
    assert!(matches!(
        err,
        TableError::Validation(ValidationError::BetExceedsStack { maximum: 1_000, .. })
    ));
}

#[test]
fn test_everyone_folds_to_big_blind() {
    let mut table = start(&[500, 500, 500]);
    table.act(1, Action::Fold, None).unwrap();
    table.act(2, Action::Fold, None).unwrap();

    let result = table.last_showdown().unwrap();
    assert!(result.uncontested);
    assert!(result.hands.is_empty());
    assert_eq!(result.pots[0].winners[0].player_id, 3);
    assert_eq!(result.pots[0].amount, 30);

    // Everyone is still ready, so the next hand is already under way with
    // the button moved one seat.
    assert_eq!(table.hand_number(), 2);
    assert_eq!(table.button(), Some(1));
    // Won 30 after posting 20, then posted the next small blind.
    assert_eq!(table.stack_of(3).unwrap(), 510 - 10);
}

#[test]
fn test_join_is_rejected_during_a_hand() {
    let mut table = start(&[500, 500]);
    assert_eq!(table.phase(), Phase::PreFlop);
    let before = table.snapshot();

    let err = table.add_player(3, 500).unwrap_err();
    assert!(matches!(
        err,
        TableError::Validation(ValidationError::WrongPhase { phase: Phase::PreFlop, .. })
    ));
    assert_eq!(table.snapshot(), before);
    assert!(table.snapshot().player(3).is_none());
}

#[test]
fn test_odd_chip_goes_first_left_of_the_button() {
    let mut table = Table::new(
        1,
        TableConfig {
            small_blind: 5,
            big_blind: 10,
            min_players: 3,
            min_buy_in: 20,
            ..TableConfig::default()
        },
    );
    // Hole cards go seat 1, 2, 0 twice; the board is a royal flush that
    // plays for everyone.
    table.queue_deck(Deck::stacked(&[
        Card(2, Suit::Club),
        Card(3, Suit::Club),
        Card(4, Suit::Club),
        Card(2, Suit::Diamond),
        Card(3, Suit::Diamond),
        Card(4, Suit::Diamond),
        Card(14, Suit::Spade),
        Card(13, Suit::Spade),
        Card(12, Suit::Spade),
        Card(11, Suit::Spade),
        Card(10, Suit::Spade),
    ]));
    for player in 1..=3 {
        table.add_player(player, 500).unwrap();
    }
    for player in 1..=3 {
        table.set_ready(player, true).unwrap();
    }
    assert_eq!(table.button(), Some(0));

    // Button calls, small blind folds its 5, big blind checks: 25 chopped.
    table.act(1, Action::Call, None).unwrap();
    table.act(2, Action::Fold, None).unwrap();
    table.act(3, Action::Check, None).unwrap();
    while table.hand_number() == 1 {
        let player = table.to_act().unwrap();
        table.act(player, Action::Check, None).unwrap();
    }

    let result = table.last_showdown().unwrap();
    assert!(!result.uncontested);
    let paid_to = |player_id: PlayerId| -> Chips {
        result
            .pots
            .iter()
            .flat_map(|pot| pot.winners.iter())
            .filter(|payout| payout.player_id == player_id)
            .map(|payout| payout.amount)
            .sum()
    };
    // Seat 2 is the first winner clockwise from the button, ahead of seat 0.
    assert_eq!(paid_to(3), 13);
    assert_eq!(paid_to(1), 12);
    assert_eq!(paid_to(2), 0);
}

#[test]
fn test_unready_player_sits_out() {
    let mut table = start(&[500, 500, 500]);
    table.set_ready(3, false).unwrap();
    // Still dealt into the current hand.
    assert!(table.snapshot().player(3).unwrap().in_hand);

    while table.phase().is_betting() {
        let player = table.to_act().unwrap();
        table.act(player, Action::Fold, None).unwrap();
    }
    // Two ready players are not enough for a three-player table.
    assert_eq!(table.phase(), Phase::Waiting);
    assert!(!table.can_start());
}

#[test]
fn test_unknown_player_is_not_found_between_hands() {
    let mut table = Table::new(1, config(2));
    table.add_player(1, 100).unwrap();
    let err = table.act(9, Action::Check, None).unwrap_err();
    assert!(matches!(err, TableError::NotFound(NotFoundError::Player(9))));
}

#[test]
fn test_actions_outside_a_hand_are_rejected() {
    let mut table = Table::new(1, config(2));
    table.add_player(1, 100).unwrap();
    let err = table.act(1, Action::Check, None).unwrap_err();
    assert!(matches!(
        err,
        TableError::Validation(ValidationError::WrongPhase { phase: Phase::Waiting, .. })
    ));
}

#[test]
fn test_showdown_event_reports_every_pot() {
    let mut table = start(&[300, 300]);
    table.drain_events();
    table.act(1, Action::AllIn, None).unwrap();
    table.act(2, Action::Call, None).unwrap();

    let events = table.drain_events();
    let phases: Vec<Phase> = events
        .iter()
        .filter_map(|e| match &e.event {
            GameEvent::PhaseChanged { phase, .. } => Some(*phase),
            _ => None,
        })
        .collect();
    assert_eq!(
        &phases[..5],
        &[Phase::Flop, Phase::Turn, Phase::River, Phase::Showdown, Phase::Waiting]
    );

    let summary = events
        .iter()
        .find_map(|e| match &e.event {
            GameEvent::ShowdownResult(summary) => Some(summary.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(summary.board.len(), 5);
    assert_eq!(summary.hands.len(), 2);
    let paid: Chips = summary.pots.iter().map(|p| p.amount).sum();
    assert_eq!(paid, 600);
}
