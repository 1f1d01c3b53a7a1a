//! Protocol violations: log records that cannot be applied.
//!
//! A violation never aborts replay. The record is dropped, the board stays
//! as it was, and the timestamp is still marked as seen.

use crate::core::{Move, PlayerId};
use crate::rules::IllegalMove;

use super::record::LogicalTimestamp;

/// A log record that was dropped instead of applied.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolViolation {
    /// The record names a house outside 0-5.
    #[error("record {timestamp} names house {house}, outside 0-5")]
    HouseOutOfRange {
        /// Record position.
        timestamp: LogicalTimestamp,
        /// Relative house as delivered.
        house: u8,
    },

    /// The record's mover is not the player on turn.
    #[error("record {timestamp} moves for {mover} but it is {turn}'s turn")]
    OutOfTurn {
        /// Record position.
        timestamp: LogicalTimestamp,
        /// Side that issued the record.
        mover: PlayerId,
        /// Side on turn.
        turn: PlayerId,
    },

    /// The move is illegal against the current board.
    #[error("record {timestamp} is illegal ({mv}): {source}")]
    IllegalMove {
        /// Record position.
        timestamp: LogicalTimestamp,
        /// Translated move.
        mv: Move,
        /// Why the rules engine refused it.
        #[source]
        source: IllegalMove,
    },

    /// The game already ended.
    #[error("record {timestamp} arrived after the game ended")]
    AfterGameOver {
        /// Record position.
        timestamp: LogicalTimestamp,
    },
}

impl ProtocolViolation {
    /// Position of the offending record.
    #[must_use]
    pub fn timestamp(&self) -> LogicalTimestamp {
        match self {
            Self::HouseOutOfRange { timestamp, .. }
            | Self::OutOfTurn { timestamp, .. }
            | Self::IllegalMove { timestamp, .. }
            | Self::AfterGameOver { timestamp } => *timestamp,
        }
    }
}
