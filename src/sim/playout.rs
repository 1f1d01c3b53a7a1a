//! Random-move playouts.

use tracing::warn;

use crate::core::{Board, GameRng, Move, PlayerId};
use crate::rules::{self, FinalScores};
use crate::session::next_turn;
use crate::sync::{NewMove, Uid};

/// A played-out game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Playout {
    /// Every move, in order.
    pub moves: Vec<Move>,
    /// Final board; swept when the game ended.
    pub board: Board,
    /// Side on turn at the end.
    pub turn: PlayerId,
    /// Set when the game ended before the move cap.
    pub scores: Option<FinalScores>,
}

impl Playout {
    /// Whether the game ran to completion.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.scores.is_some()
    }

    /// The moves as log payloads, side 0 issued by `zero` and side 1 by
    /// `one`.
    ///
    /// Replaying these from `zero`'s point of view reproduces this game
    /// when `zero` is player 0 of the record and the playout started with
    /// side 0.
    #[must_use]
    pub fn to_records(&self, zero: &Uid, one: &Uid) -> Vec<NewMove> {
        self.moves
            .iter()
            .filter_map(|mv| {
                let uid = if mv.player == PlayerId::ZERO { zero } else { one };
                let house = u8::try_from(mv.relative_house()?).ok()?;
                Some(NewMove {
                    uid: uid.clone(),
                    house,
                })
            })
            .collect()
    }
}

/// Play random legal moves from `board` with `first` to move.
///
/// Stops when the side on turn cannot move (the board is then swept) or
/// after `max_moves` moves; `0` means no cap.
pub fn random_playout(
    board: &Board,
    first: PlayerId,
    rng: &mut GameRng,
    max_moves: usize,
) -> Playout {
    let mut board = *board;
    let mut turn = first;
    let mut moves = Vec::new();

    loop {
        if !rules::can_move(&board, turn) {
            let (swept, scores) = rules::final_scores(&board);
            return Playout {
                moves,
                board: swept,
                turn,
                scores: Some(scores),
            };
        }

        if max_moves > 0 && moves.len() >= max_moves {
            break;
        }

        let legal = rules::legal_moves(&board, turn);
        let Some(&house) = rng.choose(&legal) else {
            break;
        };
        match rules::sow(&board, house, turn) {
            Ok(outcome) => {
                moves.push(outcome.mv);
                board = outcome.board;
                turn = next_turn(&outcome);
            }
            Err(err) => {
                warn!(house, error = %err, "Legal move refused, stopping playout");
                break;
            }
        }
    }

    Playout {
        moves,
        board,
        turn,
        scores: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::HOUSES_PER_SIDE;

    #[test]
    fn test_playout_finishes_and_conserves_seeds() {
        let mut rng = GameRng::new(7);
        let playout = random_playout(&Board::default(), PlayerId::ZERO, &mut rng, 0);

        assert!(playout.is_finished());
        assert!(!playout.moves.is_empty());
        assert_eq!(playout.board.total_seeds(), 48);
        let scores = playout.scores.unwrap();
        assert_eq!(scores.scores[PlayerId::ZERO] + scores.scores[PlayerId::ONE], 48);
    }

    #[test]
    fn test_playout_is_deterministic() {
        let a = random_playout(&Board::default(), PlayerId::ZERO, &mut GameRng::new(3), 0);
        let b = random_playout(&Board::default(), PlayerId::ZERO, &mut GameRng::new(3), 0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_move_cap() {
        let playout = random_playout(&Board::default(), PlayerId::ONE, &mut GameRng::new(1), 3);
        assert_eq!(playout.moves.len(), 3);
        assert!(!playout.is_finished());
        assert_eq!(playout.moves[0].player, PlayerId::ONE);
    }

    #[test]
    fn test_records_are_relative() {
        let playout = random_playout(&Board::default(), PlayerId::ZERO, &mut GameRng::new(9), 10);
        let zero = Uid::new("a");
        let one = Uid::new("b");
        let records = playout.to_records(&zero, &one);

        assert_eq!(records.len(), playout.moves.len());
        for (record, mv) in records.iter().zip(&playout.moves) {
            assert!(usize::from(record.house) < HOUSES_PER_SIDE);
            let expected = if mv.player == PlayerId::ZERO { &zero } else { &one };
            assert_eq!(&record.uid, expected);
        }
    }
}
