//! Role resolution and turn derivation.

use serde::{Deserialize, Serialize};

use crate::core::PlayerId;
use crate::rules::MoveOutcome;
use crate::sync::Uid;

/// Which seat of the game record this client holds.
///
/// Player 0 created the game and moves first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameRole {
    /// The game record's `player0`.
    Player0,
    /// The game record's `player1`.
    Player1,
}

impl GameRole {
    /// Compare the local identity with the game record's `player0`.
    #[must_use]
    pub fn resolve(local: &Uid, player0: &Uid) -> Self {
        if local == player0 {
            GameRole::Player0
        } else {
            GameRole::Player1
        }
    }

    /// Raw role index: 0 or 1.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            GameRole::Player0 => 0,
            GameRole::Player1 => 1,
        }
    }

    /// Side that moves first on this client's board.
    ///
    /// The local player sits on side 0, so player 0 of the game record is
    /// side 0 here exactly when we are player 0.
    #[must_use]
    pub const fn first_mover(self) -> PlayerId {
        match self {
            GameRole::Player0 => PlayerId::ZERO,
            GameRole::Player1 => PlayerId::ONE,
        }
    }
}

/// Who moves after `outcome`: the mover again on an extra turn, otherwise
/// the opponent.
#[must_use]
pub fn next_turn(outcome: &MoveOutcome) -> PlayerId {
    if outcome.extra_turn {
        outcome.mv.player
    } else {
        outcome.mv.player.opponent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Board;
    use crate::rules::sow;

    #[test]
    fn test_resolve_role() {
        let alice = Uid::new("alice");
        let bob = Uid::new("bob");

        assert_eq!(GameRole::resolve(&alice, &alice), GameRole::Player0);
        assert_eq!(GameRole::resolve(&bob, &alice), GameRole::Player1);
        assert_eq!(GameRole::Player1.index(), 1);
    }

    #[test]
    fn test_first_mover() {
        assert_eq!(GameRole::Player0.first_mover(), PlayerId::ZERO);
        assert_eq!(GameRole::Player1.first_mover(), PlayerId::ONE);
    }

    #[test]
    fn test_extra_turn_keeps_mover() {
        let outcome = sow(&Board::default(), 1, PlayerId::ZERO).unwrap();
        assert!(!outcome.extra_turn);
        assert_eq!(next_turn(&outcome), PlayerId::ONE);

        let outcome = sow(&Board::default(), 9, PlayerId::ONE).unwrap();
        assert!(outcome.extra_turn);
        assert_eq!(next_turn(&outcome), PlayerId::ONE);
    }
}
