//! Illegal-move errors returned by the rules engine.

use crate::core::PlayerId;

/// Why a requested sowing move cannot be played.
///
/// The board the move was requested against is never modified.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum IllegalMove {
    /// The index is past the end of the board.
    #[error("slot {house} does not exist")]
    NoSuchSlot {
        /// Requested index.
        house: usize,
    },

    /// The slot is a store or belongs to the other player.
    #[error("slot {house} is not one of {player}'s houses")]
    NotOwnHouse {
        /// Requested index.
        house: usize,
        /// Player who asked to sow.
        player: PlayerId,
    },

    /// The house holds no seeds.
    #[error("house {house} is empty")]
    EmptyHouse {
        /// Requested index.
        house: usize,
    },

    /// The board holds more seeds than a slot can count.
    #[error("board total does not fit in a slot")]
    TooManySeeds,
}
