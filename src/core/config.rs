//! Engine and synchronization configuration.
//!
//! - `BoardConfig`: starting distribution
//! - `SyncConfig`: reorder buffer and subscription channel sizing
//! - `KalahaConfig`: combines both
//!
//! All configs are serde-serializable so hosts can load them from JSON.

use serde::{Deserialize, Serialize};

use super::board::{Board, DEFAULT_SEEDS_PER_HOUSE};

/// Starting position parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Seeds placed in each of the twelve houses at game start (default: 4).
    pub seeds_per_house: u32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            seeds_per_house: DEFAULT_SEEDS_PER_HOUSE,
        }
    }
}

impl BoardConfig {
    /// The board a new game starts from.
    #[must_use]
    pub fn initial_board(&self) -> Board {
        Board::new(self.seeds_per_house)
    }
}

/// Move-log synchronization parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Maximum records held in the reorder buffer before new ones are
    /// rejected (default: 256).
    pub max_pending_records: usize,

    /// Capacity of the channel between a log subscription and the session
    /// runner, in batches (default: 64).
    pub subscription_buffer: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_pending_records: 256,
            subscription_buffer: 64,
        }
    }
}

/// Complete configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KalahaConfig {
    /// Starting position.
    pub board: BoardConfig,

    /// Log replay.
    pub sync: SyncConfig,
}

impl KalahaConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set seeds per house.
    #[must_use]
    pub fn with_seeds_per_house(mut self, seeds: u32) -> Self {
        self.board.seeds_per_house = seeds;
        self
    }

    /// Set the reorder buffer cap.
    #[must_use]
    pub fn with_max_pending_records(mut self, max: usize) -> Self {
        self.sync.max_pending_records = max;
        self
    }

    /// Set the subscription channel capacity.
    #[must_use]
    pub fn with_subscription_buffer(mut self, batches: usize) -> Self {
        self.sync.subscription_buffer = batches;
        self
    }
}
