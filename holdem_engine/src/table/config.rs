//! Table configuration models.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::game::entities::Chips;

/// Most players a single 52-card deck can deal a full board to.
pub const MAX_PLAYERS: usize = 23;

/// Table speed variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableSpeed {
    Normal,
    Turbo,
    Hyper,
}

impl TableSpeed {
    /// Per-hand time bank for this speed
    pub fn time_bank(&self) -> Duration {
        match self {
            TableSpeed::Normal => Duration::from_secs(30),
            TableSpeed::Turbo => Duration::from_secs(15),
            TableSpeed::Hyper => Duration::from_secs(5),
        }
    }
}

impl std::fmt::Display for TableSpeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableSpeed::Normal => write!(f, "normal"),
            TableSpeed::Turbo => write!(f, "turbo"),
            TableSpeed::Hyper => write!(f, "hyper"),
        }
    }
}

impl std::str::FromStr for TableSpeed {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(TableSpeed::Normal),
            "turbo" => Ok(TableSpeed::Turbo),
            "hyper" => Ok(TableSpeed::Hyper),
            other => Err(ConfigError::Invalid(format!("unknown table speed '{other}'"))),
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid table configuration: {0}")]
    Invalid(String),
}

/// Table configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Table name
    pub name: String,

    /// Small blind amount
    pub small_blind: Chips,

    /// Big blind amount
    pub big_blind: Chips,

    /// Ready players needed before a hand starts (at least 2)
    pub min_players: usize,

    /// Number of seats (default: 9)
    pub max_players: usize,

    /// Smallest stack a player may sit down with
    pub min_buy_in: Chips,

    /// Stack a player sits down with when they don't ask for one
    pub starting_chips: Chips,

    /// Ledger balance a player must hold to sit down
    pub min_balance: Chips,

    /// Time each player may spend deciding, in total, per hand
    pub time_bank: Duration,

    /// Pause between the start condition becoming true and the deal
    pub auto_start_delay: Duration,

    /// Seed for the table's deck shuffles; random when unset
    pub seed: Option<u64>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: "Default Table".to_string(),
            small_blind: 10,
            big_blind: 20,
            min_players: 2,
            max_players: 9,
            min_buy_in: 200,
            starting_chips: 1_000,
            min_balance: 0,
            time_bank: TableSpeed::Normal.time_bank(),
            auto_start_delay: Duration::ZERO,
            seed: None,
        }
    }
}

impl TableConfig {
    /// Default configuration with the time bank of a speed preset
    pub fn with_speed(speed: TableSpeed) -> Self {
        Self {
            time_bank: speed.time_bank(),
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.small_blind == 0 {
            return Err(ConfigError::Invalid(
                "Small blind must be positive".to_string(),
            ));
        }

        if self.big_blind < self.small_blind {
            return Err(ConfigError::Invalid(
                "Big blind must be at least the small blind".to_string(),
            ));
        }

        if self.min_players < 2 {
            return Err(ConfigError::Invalid(
                "At least two players are needed to start a hand".to_string(),
            ));
        }

        if self.max_players < self.min_players || self.max_players > MAX_PLAYERS {
            return Err(ConfigError::Invalid(format!(
                "Max players must be between {} and {MAX_PLAYERS}",
                self.min_players
            )));
        }

        if self.min_buy_in == 0 || self.starting_chips < self.min_buy_in {
            return Err(ConfigError::Invalid(
                "Starting chips must cover a positive minimum buy-in".to_string(),
            ));
        }

        if self.time_bank.is_zero() {
            return Err(ConfigError::Invalid(
                "Time bank must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(TableConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_inverted_blinds() {
        let config = TableConfig {
            small_blind: 50,
            big_blind: 20,
            ..TableConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_too_many_seats() {
        let config = TableConfig {
            max_players: MAX_PLAYERS + 1,
            ..TableConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_single_player_tables() {
        let config = TableConfig {
            min_players: 1,
            ..TableConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn speed_sets_time_bank() {
        assert_eq!(
            TableConfig::with_speed(TableSpeed::Hyper).time_bank,
            Duration::from_secs(5)
        );
        assert_eq!("Turbo".parse::<TableSpeed>(), Ok(TableSpeed::Turbo));
        assert!("glacial".parse::<TableSpeed>().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: TableConfig =
            serde_json::from_str(r#"{"name":"Friday","small_blind":25,"big_blind":50}"#).unwrap();
        assert_eq!(config.name, "Friday");
        assert_eq!(config.big_blind, 50);
        assert_eq!(config.max_players, 9);
    }
}
