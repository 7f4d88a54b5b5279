//! Game configuration.
//!
//! Timing constants for the shuffle and clock controllers plus the storage
//! key for persisted state. Every field has a default, so a partial JSON
//! document only overrides what it names.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default wait before shuffling starts (5 seconds).
pub const DEFAULT_RAND_DELAY: Duration = Duration::from_millis(5000);

/// Default interval between shuffle moves (1/8 second).
pub const DEFAULT_MOVE_SPEED: Duration = Duration::from_millis(1000 / 8);

/// Default clock resolution (100 milliseconds per tick).
pub const DEFAULT_CLOCK_RESOLUTION: Duration = Duration::from_millis(100);

/// Default number of moves in a shuffle.
pub const DEFAULT_COUNTER_LIMIT: u32 = 150;

/// Default storage key for the persisted state.
pub const DEFAULT_STORAGE_KEY: &str = "magic-quare-store-state";

/// Controller timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Timing {
    /// Wait before the shuffle starts moving tiles
    #[serde(with = "millis")]
    pub rand_delay: Duration,

    /// Interval between shuffle moves
    #[serde(with = "millis")]
    pub move_speed: Duration,

    /// Duration of one clock tick
    #[serde(with = "millis")]
    pub clock_resolution: Duration,

    /// Moves per shuffle
    pub counter_limit: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            rand_delay: DEFAULT_RAND_DELAY,
            move_speed: DEFAULT_MOVE_SPEED,
            clock_resolution: DEFAULT_CLOCK_RESOLUTION,
            counter_limit: DEFAULT_COUNTER_LIMIT,
        }
    }
}

impl Timing {
    /// Total time spent moving tiles in one shuffle.
    pub fn shuffle_duration(&self) -> Duration {
        self.move_speed * self.counter_limit
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    pub timing: Timing,
    pub storage_key: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            timing: Timing::default(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl GameConfig {
    /// Parse a JSON configuration, filling gaps with defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the controllers cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let timing = &self.timing;
        if timing.move_speed.is_zero() {
            return Err(ConfigError::ZeroDuration("moveSpeed"));
        }
        if timing.clock_resolution.is_zero() {
            return Err(ConfigError::ZeroDuration("clockResolution"));
        }
        if timing.counter_limit == 0 {
            return Err(ConfigError::ZeroCounterLimit);
        }
        if self.storage_key.is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
    #[error("counterLimit must be greater than zero")]
    ZeroCounterLimit,
    #[error("storageKey must not be empty")]
    EmptyStorageKey,
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
