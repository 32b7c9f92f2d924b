//! Integration tests for the ledger seam between tables and wallets.
//!
//! Tests concurrent debits, tips, and that money is neither created nor
//! destroyed as it moves between ledger balances and table stacks, even when
//! the ledger fails.

use async_trait::async_trait;
use holdem_engine::{
    game::entities::{Chips, PlayerId},
    table::{TableConfig, TableError, TableRegistry},
    wallet::{
        EntryType, Ledger, TransferRequest, WalletError, WalletManager, WalletResult,
    },
};
use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

fn config() -> TableConfig {
    TableConfig {
        small_blind: 5,
        big_blind: 10,
        min_buy_in: 20,
        starting_chips: 100,
        seed: Some(3),
        ..TableConfig::default()
    }
}

/// A ledger that refuses credits to one player.
struct FlakyLedger {
    inner: WalletManager,
    /// Zero means every credit goes through.
    refuse_credits_to: AtomicI64,
}

impl FlakyLedger {
    fn new(refuse_credits_to: PlayerId) -> Self {
        Self {
            inner: WalletManager::new(1_000),
            refuse_credits_to: AtomicI64::new(refuse_credits_to),
        }
    }
}

#[async_trait]
impl Ledger for FlakyLedger {
    async fn balance(&self, player_id: PlayerId) -> WalletResult<Chips> {
        self.inner.balance(player_id).await
    }

    async fn debit(&self, request: TransferRequest) -> WalletResult<Chips> {
        self.inner.debit(request).await
    }

    async fn credit(&self, request: TransferRequest) -> WalletResult<Chips> {
        if self.refuse_credits_to.load(Ordering::SeqCst) == request.player_id {
            return Err(WalletError::TransactionFailed("ledger offline".to_string()));
        }
        self.inner.credit(request).await
    }
}

#[tokio::test]
async fn test_concurrent_debits_never_overdraw() {
    let wallet = Arc::new(WalletManager::new(1_000));

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let wallet = wallet.clone();
        tasks.push(tokio::spawn(async move {
            wallet
                .debit(TransferRequest::new(1, Some(1), 200, EntryType::BuyIn))
                .await
        }));
    }

    let mut succeeded = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(WalletError::InsufficientBalance { .. }) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(succeeded, 5);
    assert_eq!(wallet.balance(1).await.unwrap(), 0);
    assert_eq!(wallet.get_entries(1, 100).await.len(), 5);
}

#[tokio::test]
async fn test_money_is_conserved_across_tables() {
    let wallet = Arc::new(WalletManager::new(1_000));
    let registry = TableRegistry::new(wallet.clone());
    let a = registry.create_table(config()).await.unwrap();
    let b = registry.create_table(config()).await.unwrap();

    let players: Vec<PlayerId> = (1..=4).collect();
    for player in &players {
        let table = if player % 2 == 0 { a } else { b };
        registry.add_player(table, *player, Some(250)).await.unwrap();
    }
    for player in &players {
        let table = if player % 2 == 0 { a } else { b };
        registry.set_ready(table, *player).await.unwrap();
    }

    // Play a little on both tables.
    for table in [a, b] {
        let state = registry.get_state(table).await.unwrap();
        let first = state.to_act.unwrap();
        registry
            .act(table, first, holdem_engine::Action::Fold, None)
            .await
            .unwrap();
    }

    let mut total: Chips = 0;
    for player in &players {
        total += wallet.balance(*player).await.unwrap();
    }
    for table in [a, b] {
        total += registry.get_state(table).await.unwrap().total_chips();
    }
    assert_eq!(total, 4_000);

    // Everyone leaves; the ledger holds everything again.
    for player in &players {
        let table = if player % 2 == 0 { a } else { b };
        registry.remove_player(table, *player).await.unwrap();
    }
    let mut total: Chips = 0;
    for player in &players {
        total += wallet.balance(*player).await.unwrap();
    }
    assert_eq!(total, 4_000);
}

#[tokio::test]
async fn test_failed_cash_out_keeps_player_seated() {
    let ledger = Arc::new(FlakyLedger::new(0));
    let registry = TableRegistry::new(ledger.clone());
    let table = registry.create_table(config()).await.unwrap();
    registry.add_player(table, 1, None).await.unwrap();

    ledger.refuse_credits_to.store(1, Ordering::SeqCst);
    let err = registry.remove_player(table, 1).await.unwrap_err();
    assert!(matches!(
        err,
        TableError::Ledger(WalletError::TransactionFailed(_))
    ));
    let state = registry.get_state(table).await.unwrap();
    assert_eq!(state.player(1).unwrap().stack, 100);
    assert_eq!(ledger.balance(1).await.unwrap(), 900);

    ledger.refuse_credits_to.store(0, Ordering::SeqCst);
    assert_eq!(registry.remove_player(table, 1).await.unwrap(), 100);
    assert_eq!(ledger.balance(1).await.unwrap(), 1_000);
}

#[tokio::test]
async fn test_failed_tip_credit_is_reversed() {
    let ledger = Arc::new(FlakyLedger::new(2));
    let registry = TableRegistry::new(ledger.clone());

    assert!(matches!(
        registry.tip(1, 2, 100).await,
        Err(TableError::Ledger(WalletError::TransactionFailed(_)))
    ));
    assert_eq!(ledger.balance(1).await.unwrap(), 1_000);
    assert_eq!(ledger.balance(2).await.unwrap(), 1_000);

    ledger.refuse_credits_to.store(0, Ordering::SeqCst);
    let receipt = registry.tip(1, 2, 100).await.unwrap();
    assert_eq!(receipt.from_balance, 900);
    assert_eq!(receipt.to_balance, 1_100);
}

#[tokio::test]
async fn test_tips_are_journaled_on_both_sides() {
    let wallet = Arc::new(WalletManager::new(500));
    let registry = TableRegistry::new(wallet.clone());
    registry.tip(7, 8, 120).await.unwrap();

    let payer = wallet.get_entries(7, 10).await;
    let payee = wallet.get_entries(8, 10).await;
    assert_eq!(payer.len(), 1);
    assert_eq!(payee.len(), 1);
    assert_eq!(payer[0].entry_type, EntryType::Tip);
    assert_eq!(payer[0].balance_after, 380);
    assert_eq!(payee[0].balance_after, 620);
    assert_eq!(payer[0].table_id, None);
}
