//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use holdem_engine::{
    game::entities::Chips,
    table::{TableConfig, TableSpeed},
};
use std::{net::SocketAddr, time::Duration};

const DEFAULT_BIND: &str = "127.0.0.1:6969";

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Prometheus scrape address; metrics are not exported when unset
    pub metrics_bind: Option<SocketAddr>,
    /// Balance a wallet opens with on first use
    pub opening_balance: Chips,
    /// Queue depth of each event subscription
    pub hub_capacity: usize,
    /// Table defaults configuration
    pub table_defaults: TableDefaultsConfig,
    /// Number of tables to create on startup
    pub num_tables: usize,
}

/// Default table configuration
#[derive(Debug, Clone)]
pub struct TableDefaultsConfig {
    pub max_players: usize,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub min_buy_in: Chips,
    /// Buy-in used when a player does not name one
    pub starting_chips: Chips,
    /// Ledger balance a player needs before they may sit down
    pub min_balance: Chips,
    pub speed: TableSpeed,
    pub auto_start_delay: Duration,
}

impl Default for TableDefaultsConfig {
    fn default() -> Self {
        let table = TableConfig::default();
        Self {
            max_players: table.max_players,
            small_blind: table.small_blind,
            big_blind: table.big_blind,
            min_buy_in: table.min_buy_in,
            starting_chips: table.starting_chips,
            min_balance: table.min_balance,
            speed: TableSpeed::Normal,
            auto_start_delay: Duration::from_secs(3),
        }
    }
}

impl TableDefaultsConfig {
    /// Engine configuration for a new table called `name`.
    pub fn table_config(&self, name: impl Into<String>) -> TableConfig {
        TableConfig {
            name: name.into(),
            small_blind: self.small_blind,
            big_blind: self.big_blind,
            max_players: self.max_players,
            min_buy_in: self.min_buy_in,
            starting_chips: self.starting_chips,
            min_balance: self.min_balance,
            auto_start_delay: self.auto_start_delay,
            ..TableConfig::with_speed(self.speed)
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `num_tables_override` - Optional number of tables override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if an address variable is set but cannot be parsed
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        num_tables_override: Option<usize>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_addr("SERVER_BIND")?
                .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 6969))),
        };
        let metrics_bind = parse_addr("METRICS_BIND")?;

        let defaults = TableDefaultsConfig::default();
        let table_defaults = TableDefaultsConfig {
            max_players: parse_env_or("TABLE_MAX_PLAYERS", defaults.max_players),
            small_blind: parse_env_or("TABLE_SMALL_BLIND", defaults.small_blind),
            big_blind: parse_env_or("TABLE_BIG_BLIND", defaults.big_blind),
            min_buy_in: parse_env_or("TABLE_MIN_BUY_IN", defaults.min_buy_in),
            starting_chips: parse_env_or("TABLE_STARTING_CHIPS", defaults.starting_chips),
            min_balance: parse_env_or("TABLE_MIN_BALANCE", defaults.min_balance),
            speed: parse_env_or("TABLE_SPEED", defaults.speed),
            auto_start_delay: Duration::from_millis(parse_env_or(
                "TABLE_AUTO_START_DELAY_MS",
                defaults.auto_start_delay.as_millis() as u64,
            )),
        };

        let num_tables = num_tables_override.unwrap_or_else(|| parse_env_or("MAX_TABLES", 1));

        Ok(ServerConfig {
            bind,
            metrics_bind,
            opening_balance: parse_env_or(
                "DEFAULT_WALLET_BALANCE",
                holdem_engine::wallet::manager::DEFAULT_WALLET_BALANCE,
            ),
            hub_capacity: parse_env_or(
                "EVENT_QUEUE_CAPACITY",
                holdem_engine::table::notifications::DEFAULT_QUEUE_CAPACITY,
            ),
            table_defaults,
            num_tables,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hub_capacity == 0 {
            return Err(ConfigError::Invalid {
                var: "EVENT_QUEUE_CAPACITY".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        self.table_defaults
            .table_config("validation")
            .validate()
            .map_err(|e| ConfigError::Invalid {
                var: "TABLE_*".to_string(),
                reason: e.to_string(),
            })
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_addr(key: &str) -> Result<Option<SocketAddr>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value.parse().map(Some).map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("'{value}' is not an IP:PORT address (e.g. {DEFAULT_BIND})"),
        }),
        Err(_) => Ok(None),
    }
}
