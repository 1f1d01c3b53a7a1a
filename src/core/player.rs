//! The two sides of a Kalaha board.
//!
//! `PlayerId` only admits 0 and 1. On a client's board the local player
//! always sits on side 0, so "player 0" means "me" and the opponent's
//! view is obtained by swapping.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Number of players in a game.
pub const PLAYER_COUNT: usize = 2;

/// Side identifier: 0 or 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PlayerId(u8);

/// A raw side index outside 0..=1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("no such player: {0}")]
pub struct InvalidPlayer(pub u8);

impl PlayerId {
    /// Side 0: houses 0-5, store 6.
    pub const ZERO: PlayerId = PlayerId(0);

    /// Side 1: houses 7-12, store 13.
    pub const ONE: PlayerId = PlayerId(1);

    /// `None` for anything but 0 or 1.
    #[must_use]
    pub const fn new(side: u8) -> Option<Self> {
        match side {
            0 => Some(Self::ZERO),
            1 => Some(Self::ONE),
            _ => None,
        }
    }

    /// Raw side index, for array access.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The other side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        Self(1 - self.0)
    }

    /// Both sides, 0 first.
    ///
    /// ```
    /// use kalaha_sync::core::PlayerId;
    ///
    /// let sides: Vec<_> = PlayerId::all().collect();
    /// assert_eq!(sides, vec![PlayerId::ZERO, PlayerId::ONE]);
    /// ```
    pub fn all() -> impl Iterator<Item = PlayerId> {
        [Self::ZERO, Self::ONE].into_iter()
    }
}

impl TryFrom<u8> for PlayerId {
    type Error = InvalidPlayer;

    fn try_from(side: u8) -> Result<Self, Self::Error> {
        Self::new(side).ok_or(InvalidPlayer(side))
    }
}

impl From<PlayerId> for u8 {
    fn from(player: PlayerId) -> u8 {
        player.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "side {}", self.0)
    }
}

/// One value per side, indexed by `PlayerId`.
///
/// ```
/// use kalaha_sync::core::{PlayerId, PlayerMap};
///
/// let stores = PlayerMap::new(|p| if p == PlayerId::ZERO { 30 } else { 18 });
/// assert_eq!(stores.swapped()[PlayerId::ZERO], 18);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerMap<T> {
    sides: [T; PLAYER_COUNT],
}

impl<T> PlayerMap<T> {
    /// Build both entries from `side`.
    pub fn new(side: impl Fn(PlayerId) -> T) -> Self {
        Self {
            sides: [side(PlayerId::ZERO), side(PlayerId::ONE)],
        }
    }

    /// Exchange the two entries: the same data from the other side.
    #[must_use]
    pub fn swapped(self) -> Self {
        let [zero, one] = self.sides;
        Self { sides: [one, zero] }
    }
}

impl<T> Index<PlayerId> for PlayerMap<T> {
    type Output = T;

    fn index(&self, player: PlayerId) -> &T {
        &self.sides[player.index()]
    }
}

impl<T> IndexMut<PlayerId> for PlayerMap<T> {
    fn index_mut(&mut self, player: PlayerId) -> &mut T {
        &mut self.sides[player.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_two_sides() {
        assert_eq!(PlayerId::new(0), Some(PlayerId::ZERO));
        assert_eq!(PlayerId::new(1), Some(PlayerId::ONE));
        assert_eq!(PlayerId::new(2), None);
        assert_eq!(PlayerId::try_from(7), Err(InvalidPlayer(7)));
        assert_eq!(PlayerId::ONE.to_string(), "side 1");
    }

    #[test]
    fn test_side_rejects_out_of_range_json() {
        assert_eq!(serde_json::to_string(&PlayerId::ONE).unwrap(), "1");
        assert!(serde_json::from_str::<PlayerId>("2").is_err());
    }

    #[test]
    fn test_opponent_is_an_involution() {
        for p in PlayerId::all() {
            assert_ne!(p.opponent(), p);
            assert_eq!(p.opponent().opponent(), p);
        }
    }

    #[test]
    fn test_map_index_and_swap() {
        let mut stores: PlayerMap<u32> = PlayerMap::default();
        stores[PlayerId::ZERO] += 5;
        stores[PlayerId::ONE] += 9;

        let theirs = stores.swapped();
        assert_eq!(theirs[PlayerId::ZERO], 9);
        assert_eq!(theirs[PlayerId::ONE], 5);
        assert_eq!(theirs.swapped(), stores);
    }

    #[test]
    fn test_map_json_shape() {
        let stores = PlayerMap::new(|p| p.index() as u32 + 24);
        let json = serde_json::to_string(&stores).unwrap();
        assert_eq!(json, r#"{"sides":[24,25]}"#);
        assert_eq!(serde_json::from_str::<PlayerMap<u32>>(&json).unwrap(), stores);
    }
}
