//! Table registry for managing the set of live table actors.

use super::{
    actor::{TableActor, TableHandle},
    config::TableConfig,
    errors::{NotFoundError, TableError, TableResult, ValidationError},
    messages::TableSnapshot,
    notifications::{
        Audience, EventEnvelope, GameEvent, NotificationHub, Subscription, SubscriptionFilter,
    },
};
use crate::{
    game::entities::{Action, Chips, Phase, PlayerId, SeatIndex, TableId},
    wallet::{EntryType, Ledger, TransferRequest},
};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio::sync::RwLock;

/// Table metadata for listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub table_id: TableId,
    pub name: String,
    pub player_count: usize,
    pub max_players: usize,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub phase: Phase,
    pub hand_number: u64,
}

impl From<&TableSnapshot> for TableMetadata {
    fn from(snapshot: &TableSnapshot) -> Self {
        Self {
            table_id: snapshot.table_id,
            name: snapshot.name.clone(),
            player_count: snapshot.players.len(),
            max_players: snapshot.max_players,
            small_blind: snapshot.small_blind,
            big_blind: snapshot.big_blind,
            phase: snapshot.phase,
            hand_number: snapshot.hand_number,
        }
    }
}

/// Balances after a tip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipReceipt {
    pub from_balance: Chips,
    pub to_balance: Chips,
}

/// Owns every table actor in the process.
///
/// Registries are independent of each other, so tests can build as many as
/// they like. Each table runs on its own task; the registry only holds
/// handles, so a busy table never blocks lookups or other tables.
pub struct TableRegistry {
    /// Balance store shared by every table
    ledger: Arc<dyn Ledger>,

    /// Event fan-out shared by every table
    hub: NotificationHub,

    /// Active table handles
    tables: Arc<RwLock<HashMap<TableId, TableHandle>>>,

    /// Next table ID to assign
    next_table_id: Arc<RwLock<TableId>>,

    /// Sequence for events not tied to a table
    event_seq: AtomicU64,
}

impl TableRegistry {
    /// Create a new registry with its own notification hub
    ///
    /// # Arguments
    ///
    /// * `ledger` - Balance store for buy-ins, cash-outs and tips
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self::with_hub(ledger, NotificationHub::default())
    }

    /// Create a new registry publishing into `hub`
    pub fn with_hub(ledger: Arc<dyn Ledger>, hub: NotificationHub) -> Self {
        Self {
            ledger,
            hub,
            tables: Arc::new(RwLock::new(HashMap::new())),
            next_table_id: Arc::new(RwLock::new(1)),
            event_seq: AtomicU64::new(0),
        }
    }

    pub fn hub(&self) -> &NotificationHub {
        &self.hub
    }

    /// Create a new table and spawn its actor
    ///
    /// # Arguments
    ///
    /// * `config` - Table configuration
    ///
    /// # Returns
    ///
    /// * `TableResult<TableId>` - Generated table ID
    pub async fn create_table(&self, config: TableConfig) -> TableResult<TableId> {
        config.validate()?;

        let mut tables = self.tables.write().await;
        let table_id = {
            let mut next_id = self.next_table_id.write().await;
            while tables.contains_key(&next_id) {
                *next_id += 1;
            }
            let id = *next_id;
            *next_id += 1;
            id
        };

        self.spawn(&mut tables, table_id, config);
        Ok(table_id)
    }

    /// Look up a table by ID, creating it with `config` if it does not exist
    ///
    /// # Arguments
    ///
    /// * `table_id` - Caller-chosen table ID
    /// * `config` - Configuration used only when the table is created
    ///
    /// # Returns
    ///
    /// * `TableResult<TableHandle>` - Existing or new table handle
    pub async fn get_or_create(&self, table_id: TableId, config: TableConfig) -> TableResult<TableHandle> {
        if let Some(handle) = self.tables.read().await.get(&table_id) {
            return Ok(handle.clone());
        }

        config.validate()?;
        let mut tables = self.tables.write().await;
        // Someone may have created it between the two locks.
        if let Some(handle) = tables.get(&table_id) {
            return Ok(handle.clone());
        }
        Ok(self.spawn(&mut tables, table_id, config))
    }

    fn spawn(
        &self,
        tables: &mut HashMap<TableId, TableHandle>,
        table_id: TableId,
        config: TableConfig,
    ) -> TableHandle {
        let name = config.name.clone();
        let (actor, handle) = TableActor::new(table_id, config, self.ledger.clone(), self.hub.clone());
        tables.insert(table_id, handle.clone());

        tokio::spawn(async move {
            actor.run().await;
        });

        log::info!("Created and spawned table {} '{}'", table_id, name);
        handle
    }

    /// Get a table handle
    ///
    /// # Arguments
    ///
    /// * `table_id` - Table ID
    ///
    /// # Returns
    ///
    /// * `TableResult<TableHandle>` - Table handle, or `NotFound` if unknown
    pub async fn get_table(&self, table_id: TableId) -> TableResult<TableHandle> {
        let tables = self.tables.read().await;
        tables
            .get(&table_id)
            .cloned()
            .ok_or_else(|| NotFoundError::Table(table_id).into())
    }

    /// List all active tables, ordered by ID
    pub async fn list_tables(&self) -> Vec<TableMetadata> {
        let tables = self.tables.read().await;
        let mut metadata: Vec<_> = tables
            .values()
            .map(|handle| TableMetadata::from(handle.state().as_ref()))
            .collect();
        metadata.sort_by_key(|table| table.table_id);
        metadata
    }

    /// Close and forget a table
    ///
    /// The close request goes through the table's inbox, so it is ordered
    /// after any action already queued. Refused while anyone is seated.
    ///
    /// # Arguments
    ///
    /// * `table_id` - Table ID
    pub async fn remove_table(&self, table_id: TableId) -> TableResult<()> {
        // Waiting on the inbox must not hold the map lock other tables need.
        let handle = self.get_table(table_id).await?;

        match handle.close().await {
            // An actor that already stopped has nothing left to protect.
            Ok(()) | Err(TableError::Closed) => {}
            Err(e) => return Err(e),
        }

        let mut tables = self.tables.write().await;
        if tables
            .get(&table_id)
            .is_some_and(|current| current.same_table(&handle))
        {
            tables.remove(&table_id);
        }
        drop(tables);

        log::info!("Closed table {}", table_id);
        Ok(())
    }

    /// Get active table count
    pub async fn active_table_count(&self) -> usize {
        let tables = self.tables.read().await;
        tables.len()
    }

    /// Move chips between two players' ledger balances. Table stacks are
    /// not touched.
    ///
    /// # Arguments
    ///
    /// * `from` - Player paying the tip
    /// * `to` - Player receiving it
    /// * `amount` - Chips to move
    ///
    /// # Returns
    ///
    /// * `TableResult<TipReceipt>` - Both balances after the transfer
    pub async fn tip(&self, from: PlayerId, to: PlayerId, amount: Chips) -> TableResult<TipReceipt> {
        if from == to {
            return Err(ValidationError::SelfTip.into());
        }
        if amount == 0 {
            return Err(ValidationError::InvalidAmount.into());
        }

        let debit = TransferRequest::new(from, None, amount, EntryType::Tip)
            .with_description(format!("Tip to player {to}"));
        let from_balance = self.ledger.debit(debit).await?;

        let credit = TransferRequest::new(to, None, amount, EntryType::Tip)
            .with_description(format!("Tip from player {from}"));
        let to_balance = match self.ledger.credit(credit).await {
            Ok(balance) => balance,
            Err(e) => {
                let rollback = TransferRequest::new(from, None, amount, EntryType::Reversal)
                    .with_description(format!("Rollback of tip to player {to}"));
                if let Err(rollback_err) = self.ledger.credit(rollback).await {
                    log::error!(
                        "CRITICAL: Failed to roll back tip of {} from player {}: {}",
                        amount,
                        from,
                        rollback_err
                    );
                }
                return Err(e.into());
            }
        };

        let delta = i64::try_from(amount).unwrap_or(i64::MAX);
        self.publish_balance(from, from_balance, -delta);
        self.publish_balance(to, to_balance, delta);
        log::info!("Player {} tipped player {} {} chips", from, to, amount);

        Ok(TipReceipt {
            from_balance,
            to_balance,
        })
    }

    fn publish_balance(&self, player_id: PlayerId, balance: Chips, delta: i64) {
        let seq = self.event_seq.fetch_add(1, Ordering::Relaxed) + 1;
        self.hub.publish(EventEnvelope::new(
            None,
            seq,
            Audience::Player(player_id),
            GameEvent::BalanceUpdated {
                player_id,
                balance,
                delta,
                entry_type: EntryType::Tip,
            },
        ));
    }

    /// Subscribe to events across every table
    pub fn subscribe(&self, filter: SubscriptionFilter) -> Subscription {
        self.hub.subscribe(filter)
    }

    /// Seat a player at a table
    pub async fn add_player(
        &self,
        table_id: TableId,
        player_id: PlayerId,
        stack: Option<Chips>,
    ) -> TableResult<SeatIndex> {
        self.get_table(table_id)
            .await?
            .add_player(player_id, stack)
            .await
    }

    /// Remove a player from a table, returning the chips cashed out
    pub async fn remove_player(&self, table_id: TableId, player_id: PlayerId) -> TableResult<Chips> {
        self.get_table(table_id).await?.remove_player(player_id).await
    }

    pub async fn set_ready(&self, table_id: TableId, player_id: PlayerId) -> TableResult<()> {
        self.get_table(table_id).await?.set_ready(player_id).await
    }

    pub async fn set_unready(&self, table_id: TableId, player_id: PlayerId) -> TableResult<()> {
        self.get_table(table_id).await?.set_unready(player_id).await
    }

    pub async fn act(
        &self,
        table_id: TableId,
        player_id: PlayerId,
        action: Action,
        expected_version: Option<u64>,
    ) -> TableResult<()> {
        self.get_table(table_id)
            .await?
            .act(player_id, action, expected_version)
            .await
    }

    /// Latest snapshot of a table
    pub async fn get_state(&self, table_id: TableId) -> TableResult<Arc<TableSnapshot>> {
        Ok(self.get_table(table_id).await?.state())
    }
}
