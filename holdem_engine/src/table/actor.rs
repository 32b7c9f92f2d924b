//! Table actor implementation with async message handling.

use super::{
    config::TableConfig,
    errors::{TableError, TableResult, ValidationError},
    messages::{Reply, TableMessage, TableSnapshot},
    notifications::{Audience, GameEvent, NotificationHub, Subscription, SubscriptionFilter},
    timebank::Timebank,
};
use crate::{
    game::{
        Table,
        entities::{Action, Card, Chips, Phase, PlayerId, SeatIndex, TableId},
    },
    wallet::{EntryType, Ledger, TransferRequest},
};
use std::sync::Arc;
use tokio::{
    sync::{mpsc, oneshot, watch},
    time::{Instant, sleep_until},
};

/// Inbox length per table
const INBOX_CAPACITY: usize = 100;

/// Table actor handle for sending messages
#[derive(Clone)]
pub struct TableHandle {
    sender: mpsc::Sender<TableMessage>,
    table_id: TableId,
    state: watch::Receiver<Arc<TableSnapshot>>,
    hub: NotificationHub,
}

impl TableHandle {
    /// Get table ID
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    /// Send a message to the table
    pub async fn send(&self, message: TableMessage) -> TableResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| TableError::Closed)
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> TableMessage) -> TableResult<T> {
        let (response, receiver) = oneshot::channel();
        self.send(build(response)).await?;
        receiver.await.map_err(|_| TableError::Closed)?
    }

    /// Sit down with `stack` chips, or the table's starting stack when `None`.
    /// The buy-in is debited from the player's ledger balance.
    pub async fn add_player(&self, player_id: PlayerId, stack: Option<Chips>) -> TableResult<SeatIndex> {
        self.request(|response| TableMessage::AddPlayer {
            player_id,
            stack,
            response,
        })
        .await
    }

    /// Stand up, folding first if mid-hand. Returns the chips credited back.
    pub async fn remove_player(&self, player_id: PlayerId) -> TableResult<Chips> {
        self.request(|response| TableMessage::RemovePlayer {
            player_id,
            response,
        })
        .await
    }

    pub async fn set_ready(&self, player_id: PlayerId) -> TableResult<()> {
        self.set_readiness(player_id, true).await
    }

    pub async fn set_unready(&self, player_id: PlayerId) -> TableResult<()> {
        self.set_readiness(player_id, false).await
    }

    async fn set_readiness(&self, player_id: PlayerId, ready: bool) -> TableResult<()> {
        self.request(|response| TableMessage::SetReady {
            player_id,
            ready,
            response,
        })
        .await
    }

    /// Take an action. With `expected_version` set the action only applies
    /// if the table has not changed since that snapshot version.
    pub async fn act(
        &self,
        player_id: PlayerId,
        action: Action,
        expected_version: Option<u64>,
    ) -> TableResult<()> {
        self.request(|response| TableMessage::TakeAction {
            player_id,
            action,
            expected_version,
            response,
        })
        .await
    }

    pub async fn check(&self, player_id: PlayerId) -> TableResult<()> {
        self.act(player_id, Action::Check, None).await
    }

    pub async fn call(&self, player_id: PlayerId) -> TableResult<()> {
        self.act(player_id, Action::Call, None).await
    }

    /// Bet or raise so the player's total for the street is `amount`.
    pub async fn bet(&self, player_id: PlayerId, amount: Chips) -> TableResult<()> {
        self.act(player_id, Action::Bet(amount), None).await
    }

    pub async fn fold(&self, player_id: PlayerId) -> TableResult<()> {
        self.act(player_id, Action::Fold, None).await
    }

    pub async fn all_in(&self, player_id: PlayerId) -> TableResult<()> {
        self.act(player_id, Action::AllIn, None).await
    }

    /// A player's own hole cards.
    pub async fn hole_cards(&self, player_id: PlayerId) -> TableResult<Vec<Card>> {
        self.request(|response| TableMessage::GetHoleCards {
            player_id,
            response,
        })
        .await
    }

    /// Latest published snapshot. Never blocks on the actor.
    pub fn state(&self) -> Arc<TableSnapshot> {
        self.state.borrow().clone()
    }

    /// Wait until a published snapshot satisfies `predicate`.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&Arc<TableSnapshot>) -> bool,
    ) -> TableResult<Arc<TableSnapshot>> {
        let mut state = self.state.clone();
        let snapshot = state
            .wait_for(predicate)
            .await
            .map_err(|_| TableError::Closed)?;
        Ok(snapshot.clone())
    }

    /// Events from this table visible to `player_id`.
    pub fn subscribe(&self, player_id: PlayerId) -> Subscription {
        self.hub
            .subscribe(SubscriptionFilter::player(player_id).at_table(self.table_id))
    }

    /// Whether the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Whether both handles talk to the same actor.
    pub fn same_table(&self, other: &TableHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }

    pub(crate) async fn close(&self) -> TableResult<()> {
        self.request(|response| TableMessage::Close { response }).await
    }
}

/// Table actor managing a single poker table
pub struct TableActor {
    /// Table ID
    id: TableId,

    /// Table state machine
    table: Table,

    /// Message inbox
    inbox: mpsc::Receiver<TableMessage>,

    /// Where buy-ins come from and cash-outs go
    ledger: Arc<dyn Ledger>,

    /// Event fan-out
    hub: NotificationHub,

    /// Latest snapshot for lock-free reads
    state: watch::Sender<Arc<TableSnapshot>>,

    /// Clock for the player to act
    timebank: Timebank,

    /// When the next hand is dealt, if a start is pending
    auto_start_at: Option<Instant>,

    /// Is table closed
    is_closed: bool,
}

impl TableActor {
    /// Create a new table actor
    ///
    /// # Arguments
    ///
    /// * `id` - Table ID
    /// * `config` - Table configuration
    /// * `ledger` - Balance store for buy-ins and cash-outs
    /// * `hub` - Where table events are published
    ///
    /// # Returns
    ///
    /// * `(TableActor, TableHandle)` - Actor and handle for sending messages
    pub fn new(
        id: TableId,
        config: TableConfig,
        ledger: Arc<dyn Ledger>,
        hub: NotificationHub,
    ) -> (Self, TableHandle) {
        let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);
        let table = Table::new(id, config);
        let (state, state_receiver) = watch::channel(Arc::new(table.snapshot()));

        let handle = TableHandle {
            sender,
            table_id: id,
            state: state_receiver,
            hub: hub.clone(),
        };
        let mut actor = Self {
            id,
            table,
            inbox,
            ledger,
            hub,
            state,
            timebank: Timebank::new(),
            auto_start_at: None,
            is_closed: false,
        };
        let name = actor.table.config().name.clone();
        actor
            .table
            .push_event(Audience::Everyone, GameEvent::TableCreated { name });
        actor.publish_changes();

        (actor, handle)
    }

    /// Run the table actor event loop
    pub async fn run(mut self) {
        log::info!("Table {} '{}' starting", self.id, self.table.config().name);

        loop {
            let turn_deadline = self.timebank.deadline();
            let start_at = self.auto_start_at;

            tokio::select! {
                message = self.inbox.recv() => match message {
                    Some(message) => self.handle_message(message).await,
                    // Every handle is gone.
                    None => break,
                },

                () = sleep_until(turn_deadline.unwrap_or_else(Instant::now)), if turn_deadline.is_some() => {
                    self.on_turn_deadline();
                }

                () = sleep_until(start_at.unwrap_or_else(Instant::now)), if start_at.is_some() => {
                    self.on_auto_start();
                }
            }

            if self.is_closed {
                break;
            }
        }

        log::info!("Table {} '{}' closed", self.id, self.table.config().name);
    }

    /// Handle a table message
    async fn handle_message(&mut self, message: TableMessage) {
        match message {
            TableMessage::AddPlayer {
                player_id,
                stack,
                response,
            } => {
                let result = self.handle_join(player_id, stack).await;
                self.reply(response, result);
            }

            TableMessage::RemovePlayer {
                player_id,
                response,
            } => {
                let result = self.handle_leave(player_id).await;
                self.reply(response, result);
            }

            TableMessage::SetReady {
                player_id,
                ready,
                response,
            } => {
                let result = self.table.set_ready(player_id, ready);
                self.reply(response, result);
            }

            TableMessage::TakeAction {
                player_id,
                action,
                expected_version,
                response,
            } => {
                let result = self.table.act(player_id, action, expected_version);
                if let Err(e) = &result {
                    log::debug!(
                        "Table {}: rejected {action:?} from player {player_id}: {e}",
                        self.id
                    );
                }
                self.reply(response, result);
            }

            TableMessage::GetHoleCards {
                player_id,
                response,
            } => {
                let _ = response.send(self.table.hole_cards(player_id));
            }

            TableMessage::Close { response } => {
                let result = if self.table.seated_count() == 0 && self.table.phase() == Phase::Waiting {
                    self.is_closed = true;
                    self.table
                        .push_event(Audience::Everyone, GameEvent::TableRemoved);
                    Ok(())
                } else {
                    Err(ValidationError::TableNotEmpty.into())
                };
                self.reply(response, result);
            }
        }
    }

    /// Publish what changed, then answer the caller, so a caller that gets
    /// a reply can already see its effects.
    fn reply<T>(&mut self, response: Reply<T>, result: TableResult<T>) {
        self.publish_changes();
        let _ = response.send(result);
    }

    /// Handle join table request
    async fn handle_join(&mut self, player_id: PlayerId, stack: Option<Chips>) -> TableResult<SeatIndex> {
        let stack = stack.unwrap_or(self.table.config().starting_chips);
        self.table.validate_join(player_id, stack)?;

        let available = self.ledger.balance(player_id).await?;
        let required = stack.max(self.table.config().min_balance);
        if available < required {
            return Err(ValidationError::InsufficientBalance {
                available,
                required,
            }
            .into());
        }

        let request = TransferRequest::new(player_id, Some(self.id), stack, EntryType::BuyIn)
            .with_description(format!("Buy-in to table {}", self.id));
        let balance = self.ledger.debit(request).await?;

        match self.table.add_player(player_id, stack) {
            Ok(seat) => {
                self.push_balance(player_id, balance, -signed(stack), EntryType::BuyIn);
                Ok(seat)
            }
            Err(e) => {
                let rollback = TransferRequest::new(player_id, Some(self.id), stack, EntryType::Reversal)
                    .with_description(format!("Rollback of buy-in to table {}", self.id));
                match self.ledger.credit(rollback).await {
                    Ok(_) => log::info!(
                        "Rolled back buy-in for player {} on table {}",
                        player_id,
                        self.id
                    ),
                    Err(rollback_err) => log::error!(
                        "CRITICAL: Failed to roll back buy-in for player {} on table {}: {}",
                        player_id,
                        self.id,
                        rollback_err
                    ),
                }
                Err(e)
            }
        }
    }

    /// Handle leave table request
    async fn handle_leave(&mut self, player_id: PlayerId) -> TableResult<Chips> {
        let stack = self.table.stack_of(player_id)?;

        let balance = if stack > 0 {
            let request = TransferRequest::new(player_id, Some(self.id), stack, EntryType::CashOut)
                .with_description(format!("Cash-out from table {}", self.id));
            Some(self.ledger.credit(request).await?)
        } else {
            None
        };

        match self.table.remove_player(player_id) {
            Ok(cashed_out) => {
                if let Some(balance) = balance {
                    self.push_balance(player_id, balance, signed(cashed_out), EntryType::CashOut);
                }
                Ok(cashed_out)
            }
            Err(e) => {
                if stack > 0 {
                    let rollback =
                        TransferRequest::new(player_id, Some(self.id), stack, EntryType::Reversal)
                            .with_description(format!("Rollback of cash-out from table {}", self.id));
                    if let Err(rollback_err) = self.ledger.debit(rollback).await {
                        log::error!(
                            "CRITICAL: Failed to roll back cash-out for player {} on table {}: {}",
                            player_id,
                            self.id,
                            rollback_err
                        );
                    }
                }
                Err(e)
            }
        }
    }

    fn push_balance(&mut self, player_id: PlayerId, balance: Chips, delta: i64, entry_type: EntryType) {
        self.table.push_event(
            Audience::Player(player_id),
            GameEvent::BalanceUpdated {
                player_id,
                balance,
                delta,
                entry_type,
            },
        );
    }

    fn on_turn_deadline(&mut self) {
        if let Some(token) = self.timebank.expired(Instant::now()) {
            match self.table.resolve_timeout(token) {
                Ok(Some(action)) => log::debug!(
                    "Table {}: auto-{action:?} for seat {}",
                    self.id,
                    token.seat
                ),
                Ok(None) => {}
                Err(e) => log::error!("Table {}: timeout failed: {e}", self.id),
            }
        }
        self.publish_changes();
    }

    fn on_auto_start(&mut self) {
        self.auto_start_at = None;
        match self.table.start_hand() {
            Ok(true) => {}
            Ok(false) => log::debug!("Table {}: start condition lapsed", self.id),
            Err(e) => log::error!("Table {}: failed to start hand: {e}", self.id),
        }
        self.publish_changes();
    }

    /// Re-arm timers for the current state, forward queued events and
    /// publish a fresh snapshot.
    fn publish_changes(&mut self) {
        let now = Instant::now();

        let current = if self.table.is_halted() {
            None
        } else {
            self.table.turn_token()
        };
        if self.timebank.token() != current {
            if let Some((token, used)) = self.timebank.disarm(now) {
                self.table.charge_time_bank(token, used);
            }
            if let Some(token) = current {
                let remaining = self.table.time_bank(token.seat);
                self.timebank.arm(token, remaining, now);
            }
        }

        let delay = self.table.config().auto_start_delay;
        if self.table.can_start() && !delay.is_zero() {
            if self.auto_start_at.is_none() {
                log::debug!("Table {}: dealing in {delay:?}", self.id);
                self.auto_start_at = Some(now + delay);
            }
        } else {
            self.auto_start_at = None;
        }

        for envelope in self.table.drain_events() {
            self.hub.publish(envelope);
        }
        self.state.send_replace(Arc::new(self.table.snapshot()));
    }
}

fn signed(amount: Chips) -> i64 {
    i64::try_from(amount).unwrap_or(i64::MAX)
}
