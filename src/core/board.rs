//! The 14-slot Kalaha board.
//!
//! ## Layout
//!
//! ```text
//!  index:  0  1  2  3  4  5 | 6 | 7  8  9 10 11 12 | 13
//!          side 0 houses    |S0 | side 1 houses     | S1
//! ```
//!
//! Sowing runs in increasing index order and wraps from 13 to 0, so house
//! `i` faces house `12 - i` across the board.
//!
//! `Board` is a `Copy` value: every rules operation returns a new board and
//! nothing mutates a board in place once it is handed out.

use serde::{Deserialize, Serialize};

use super::player::PlayerId;

/// Total number of slots (12 houses + 2 stores).
pub const SLOT_COUNT: usize = 14;

/// Houses per side.
pub const HOUSES_PER_SIDE: usize = 6;

/// Default seeds in each house at game start.
pub const DEFAULT_SEEDS_PER_HOUSE: u32 = 4;

/// Errors building a board from caller-supplied slots.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// The slot list did not have exactly 14 entries.
    #[error("board needs {SLOT_COUNT} slots, got {0}")]
    WrongSlotCount(usize),

    /// The seeds on the board do not add up to a `u32`.
    #[error("too many seeds for one board")]
    TooManySeeds,
}

/// Immutable board state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    slots: [u32; SLOT_COUNT],
}

impl Board {
    /// Create the starting board with `seeds_per_house` in every house and
    /// empty stores.
    #[must_use]
    pub fn new(seeds_per_house: u32) -> Self {
        let mut slots = [seeds_per_house; SLOT_COUNT];
        slots[Self::store(PlayerId::ZERO)] = 0;
        slots[Self::store(PlayerId::ONE)] = 0;
        Self { slots }
    }

    /// Create a board from an explicit distribution (resuming, testing).
    #[must_use]
    pub const fn from_slots(slots: [u32; SLOT_COUNT]) -> Self {
        Self { slots }
    }

    /// All fourteen slot counts in index order.
    #[must_use]
    pub const fn slots(&self) -> &[u32; SLOT_COUNT] {
        &self.slots
    }

    /// Seed count at `slot`, or `None` past the end of the board.
    #[must_use]
    pub fn seeds(&self, slot: usize) -> Option<u32> {
        self.slots.get(slot).copied()
    }

    /// Sum of every slot. Constant for the whole game.
    #[must_use]
    pub fn total_seeds(&self) -> u64 {
        self.slots.iter().map(|&seeds| u64::from(seeds)).sum()
    }

    /// Sum of every slot, `None` if it does not fit a `u32`. The rules
    /// engine only plays boards where it does, so no slot can overflow.
    #[must_use]
    pub fn checked_total(&self) -> Option<u32> {
        self.slots.iter().try_fold(0u32, |sum, &seeds| sum.checked_add(seeds))
    }

    /// Store index for `player`: 6 or 13.
    #[must_use]
    pub const fn store(player: PlayerId) -> usize {
        player.index() * (HOUSES_PER_SIDE + 1) + HOUSES_PER_SIDE
    }

    /// Absolute indices of `player`'s six houses.
    pub fn houses(player: PlayerId) -> std::ops::Range<usize> {
        let first = player.index() * (HOUSES_PER_SIDE + 1);
        first..first + HOUSES_PER_SIDE
    }

    /// Absolute index of `player`'s house number `relative` (0-5).
    #[must_use]
    pub fn house(player: PlayerId, relative: usize) -> Option<usize> {
        (relative < HOUSES_PER_SIDE).then(|| Self::houses(player).start + relative)
    }

    /// Which side owns `slot` (house or store).
    #[must_use]
    pub fn owner(slot: usize) -> Option<PlayerId> {
        match slot {
            0..=6 => Some(PlayerId::ZERO),
            7..=13 => Some(PlayerId::ONE),
            _ => None,
        }
    }

    /// Whether `slot` is a store.
    #[must_use]
    pub fn is_store(slot: usize) -> bool {
        PlayerId::all().any(|p| Self::store(p) == slot)
    }

    /// The house facing `house` across the board.
    #[must_use]
    pub fn opposite(house: usize) -> Option<usize> {
        (house < SLOT_COUNT && !Self::is_store(house)).then(|| 2 * HOUSES_PER_SIDE - house)
    }

    /// Seeds in `player`'s store.
    #[must_use]
    pub fn store_seeds(&self, player: PlayerId) -> u32 {
        self.slots[Self::store(player)]
    }

    /// Seeds still in `player`'s houses.
    #[must_use]
    pub fn house_seeds(&self, player: PlayerId) -> u64 {
        self.slots[Self::houses(player)].iter().map(|&seeds| u64::from(seeds)).sum()
    }

    /// The same position seen from the other side: side 0 and side 1 swap.
    ///
    /// Two clients replaying the same log hold mirrored boards, since each
    /// puts itself on side 0.
    #[must_use]
    pub fn mirrored(&self) -> Self {
        let mut slots = [0; SLOT_COUNT];
        let half = HOUSES_PER_SIDE + 1;
        slots[..half].copy_from_slice(&self.slots[half..]);
        slots[half..].copy_from_slice(&self.slots[..half]);
        Self { slots }
    }

    /// Copy of this board with `f` applied to the slot array.
    pub(crate) fn with_slots(&self, f: impl FnOnce(&mut [u32; SLOT_COUNT])) -> Self {
        let mut slots = self.slots;
        f(&mut slots);
        Self { slots }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(DEFAULT_SEEDS_PER_HOUSE)
    }
}

impl TryFrom<&[u32]> for Board {
    type Error = BoardError;

    fn try_from(slots: &[u32]) -> Result<Self, Self::Error> {
        let slots: [u32; SLOT_COUNT] = slots
            .try_into()
            .map_err(|_| BoardError::WrongSlotCount(slots.len()))?;
        let board = Self { slots };
        board.checked_total().ok_or(BoardError::TooManySeeds)?;
        Ok(board)
    }
}

impl std::fmt::Display for Board {
    /// Side 1 on top (right to left), side 0 underneath, stores at the ends.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let top: Vec<String> = Self::houses(PlayerId::ONE)
            .rev()
            .map(|i| format!("{:>2}", self.slots[i]))
            .collect();
        let bottom: Vec<String> = Self::houses(PlayerId::ZERO)
            .map(|i| format!("{:>2}", self.slots[i]))
            .collect();
        writeln!(f, "     {}", top.join(" "))?;
        writeln!(
            f,
            "{:>2} {} {:>2}",
            self.store_seeds(PlayerId::ONE),
            " ".repeat(top.join(" ").len() + 2),
            self.store_seeds(PlayerId::ZERO)
        )?;
        write!(f, "     {}", bottom.join(" "))
    }
}
