//! The Kalaha rules engine.
//!
//! Pure functions over [`Board`]: legality, sowing with capture, the
//! end-of-game sweep and scoring. Nothing here knows whose turn it is;
//! callers derive that from [`MoveOutcome::extra_turn`].

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{Board, Move, PlayerId, PlayerMap, HOUSES_PER_SIDE, SLOT_COUNT};

use super::error::IllegalMove;

/// Houses a player may sow from. Never more than six.
pub type LegalMoves = SmallVec<[usize; HOUSES_PER_SIDE]>;

/// Result of a completed game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameResult {
    /// Single winner.
    Winner(PlayerId),
    /// Equal stores.
    Draw,
}

impl GameResult {
    /// Check if a player won.
    #[must_use]
    pub fn is_winner(&self, player: PlayerId) -> bool {
        matches!(self, GameResult::Winner(p) if *p == player)
    }

    /// The same result seen from the other side of the board.
    #[must_use]
    pub fn mirrored(self) -> Self {
        match self {
            GameResult::Winner(p) => GameResult::Winner(p.opponent()),
            GameResult::Draw => GameResult::Draw,
        }
    }
}

/// Both stores after the sweep, plus who won.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FinalScores {
    /// Store totals per player.
    pub scores: PlayerMap<u32>,
    /// Winner or draw.
    pub result: GameResult,
}

impl FinalScores {
    /// The opponent client's view of the same scores.
    #[must_use]
    pub fn mirrored(self) -> Self {
        Self {
            scores: self.scores.swapped(),
            result: self.result.mirrored(),
        }
    }
}

/// Everything one sowing move produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    /// The move that was played.
    pub mv: Move,

    /// Board after the seeds were distributed, before any capture.
    /// Presentation layers show it as the intermediate frame.
    pub distributed: Board,

    /// Board after capture. This is the new canonical board.
    pub board: Board,

    /// Slot the last seed landed in.
    pub last_slot: usize,

    /// The last seed landed in the mover's own store: they move again.
    pub extra_turn: bool,

    /// Seeds moved to the mover's store by a capture (0 if none).
    pub captured: u32,
}

/// Houses of `player` that hold at least one seed, in index order.
///
/// An empty result means the player cannot move, which ends the game.
pub fn legal_moves(board: &Board, player: PlayerId) -> LegalMoves {
    Board::houses(player)
        .filter(|&house| board.slots()[house] > 0)
        .collect()
}

/// Whether `player` has any legal move.
#[must_use]
pub fn can_move(board: &Board, player: PlayerId) -> bool {
    Board::houses(player).any(|house| board.slots()[house] > 0)
}

/// Sow the seeds of `house` for `player`.
///
/// The house is emptied and its seeds are dropped one per slot in
/// increasing index order, wrapping at the end of the board and passing
/// over the opponent's store without spending a seed on it. If the last
/// seed lands in one of the mover's own houses and leaves it holding
/// exactly two or three seeds, that house and the one facing it are
/// emptied into the mover's store.
///
/// ```
/// use kalaha_sync::core::{Board, PlayerId};
/// use kalaha_sync::rules::sow;
///
/// let outcome = sow(&Board::default(), 2, PlayerId::ZERO).unwrap();
/// assert_eq!(outcome.board.slots()[..7], [4, 4, 0, 5, 5, 5, 1]);
/// assert!(outcome.extra_turn);
/// ```
pub fn sow(board: &Board, house: usize, player: PlayerId) -> Result<MoveOutcome, IllegalMove> {
    let seeds = board.seeds(house).ok_or(IllegalMove::NoSuchSlot { house })?;
    if !Board::houses(player).contains(&house) {
        return Err(IllegalMove::NotOwnHouse { house, player });
    }
    if seeds == 0 {
        return Err(IllegalMove::EmptyHouse { house });
    }
    // Every slot stays at or below the total, so the additions below
    // cannot overflow.
    board.checked_total().ok_or(IllegalMove::TooManySeeds)?;

    let skipped_store = Board::store(player.opponent());
    let own_store = Board::store(player);

    let mut last_slot = house;
    let distributed = board.with_slots(|slots| {
        slots[house] = 0;
        let mut remaining = seeds;
        while remaining > 0 {
            last_slot = (last_slot + 1) % SLOT_COUNT;
            if last_slot == skipped_store {
                continue;
            }
            slots[last_slot] += 1;
            remaining -= 1;
        }
    });

    let landed = distributed.slots()[last_slot];
    let captures = Board::houses(player).contains(&last_slot) && matches!(landed, 2 | 3);

    let (final_board, captured) = match Board::opposite(last_slot) {
        Some(opposite) if captures => {
            let captured = landed + distributed.slots()[opposite];
            let board = distributed.with_slots(|slots| {
                slots[last_slot] = 0;
                slots[opposite] = 0;
                slots[own_store] += captured;
            });
            (board, captured)
        }
        _ => (distributed, 0),
    };

    Ok(MoveOutcome {
        mv: Move::new(player, house),
        distributed,
        board: final_board,
        last_slot,
        extra_turn: last_slot == own_store,
        captured,
    })
}

/// [`sow`] taking a [`Move`].
pub fn apply(board: &Board, mv: Move) -> Result<MoveOutcome, IllegalMove> {
    sow(board, mv.house, mv.player)
}

/// Sweep every seed still in a house into its owner's store.
///
/// Called when the player to move has no legal move; scores are only
/// comparable after the sweep. A store that cannot hold its sweep stays at
/// `u32::MAX`.
#[must_use]
pub fn finalize_scores(board: &Board) -> Board {
    board.with_slots(|slots| {
        for player in PlayerId::all() {
            let swept = Board::houses(player)
                .map(|house| std::mem::take(&mut slots[house]))
                .fold(0u32, u32::saturating_add);
            let store = Board::store(player);
            slots[store] = slots[store].saturating_add(swept);
        }
    })
}

/// Seeds in `player`'s store.
///
/// A running score mid-game; the final score once the board is swept.
#[must_use]
pub fn player_score(board: &Board, player: PlayerId) -> u32 {
    board.store_seeds(player)
}

/// Compare the two stores.
#[must_use]
pub fn outcome(board: &Board) -> GameResult {
    let zero = player_score(board, PlayerId::ZERO);
    let one = player_score(board, PlayerId::ONE);
    match zero.cmp(&one) {
        std::cmp::Ordering::Greater => GameResult::Winner(PlayerId::ZERO),
        std::cmp::Ordering::Less => GameResult::Winner(PlayerId::ONE),
        std::cmp::Ordering::Equal => GameResult::Draw,
    }
}

/// Sweep `board` and read off both scores and the result.
#[must_use]
pub fn final_scores(board: &Board) -> (Board, FinalScores) {
    let swept = finalize_scores(board);
    let scores = PlayerMap::new(|p| player_score(&swept, p));
    (
        swept,
        FinalScores {
            scores,
            result: outcome(&swept),
        },
    )
}
