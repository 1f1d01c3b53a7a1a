//! Kalaha rules.
//!
//! Pure functions on [`Board`](crate::core::Board):
//! - `legal_moves` / `can_move`: what a player may sow
//! - `sow` / `apply`: one move, with the intermediate and final boards
//! - `finalize_scores` / `final_scores`: the end-of-game sweep
//! - `player_score` / `outcome`: scoring
//!
//! Illegal requests return [`IllegalMove`] and leave the board untouched.

mod engine;
mod error;

pub use engine::{
    apply, can_move, final_scores, finalize_scores, legal_moves, outcome, player_score, sow,
    FinalScores, GameResult, LegalMoves, MoveOutcome,
};
pub use error::IllegalMove;
