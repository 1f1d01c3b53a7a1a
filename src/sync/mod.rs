//! Move-log replay.
//!
//! The move log is the single source of truth for a game. Every client
//! folds the same records in timestamp order and so reaches the same
//! board (mirrored for each perspective). This module holds:
//! - `record`: identities, timestamps and the wire records
//! - `error`: records that cannot be applied
//! - `reducer`: the reorder buffer and fold step

pub mod record;
pub mod error;
pub mod reducer;

pub use record::{GameId, LogicalTimestamp, MoveRecord, NewMove, Uid};
pub use error::ProtocolViolation;
pub use reducer::{Fold, IngestDecision, MoveLogReducer};
