//! A single transition request: who sows, and from which house.
//!
//! Houses are stored as absolute board indices (0-5 for side 0, 7-12 for
//! side 1). Log records carry houses relative to the sower's own side;
//! `Move::from_relative` normalizes them.

use serde::{Deserialize, Serialize};

use super::board::Board;
use super::player::PlayerId;

/// A sowing move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// The player sowing.
    pub player: PlayerId,

    /// Absolute index of the house being emptied.
    pub house: usize,
}

impl Move {
    /// Create a move from an absolute house index.
    ///
    /// The index is not validated here; the rules engine rejects houses the
    /// player does not own.
    #[must_use]
    pub const fn new(player: PlayerId, house: usize) -> Self {
        Self { player, house }
    }

    /// Create a move from a house index relative to the player's side.
    ///
    /// ```
    /// use kalaha_sync::core::{Move, PlayerId};
    ///
    /// assert_eq!(Move::from_relative(PlayerId::ONE, 0).map(|m| m.house), Some(7));
    /// assert_eq!(Move::from_relative(PlayerId::ZERO, 6), None);
    /// ```
    #[must_use]
    pub fn from_relative(player: PlayerId, relative: usize) -> Option<Self> {
        Board::house(player, relative).map(|house| Self { player, house })
    }

    /// The house relative to the player's side, if it is one of theirs.
    #[must_use]
    pub fn relative_house(&self) -> Option<usize> {
        let houses = Board::houses(self.player);
        houses
            .contains(&self.house)
            .then(|| self.house - houses.start)
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} sows house {}", self.player, self.house)
    }
}
