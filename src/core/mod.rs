//! Core value types: players, the board, moves, RNG, configuration.
//!
//! Everything here is plain data. The rules live in `rules`, the log
//! replay in `sync`.

pub mod player;
pub mod board;
pub mod moves;
pub mod rng;
pub mod config;

pub use player::{InvalidPlayer, PlayerId, PlayerMap, PLAYER_COUNT};
pub use board::{Board, BoardError, DEFAULT_SEEDS_PER_HOUSE, HOUSES_PER_SIDE, SLOT_COUNT};
pub use moves::Move;
pub use rng::{GameRng, RngCheckpoint};
pub use config::{BoardConfig, KalahaConfig, SyncConfig};
