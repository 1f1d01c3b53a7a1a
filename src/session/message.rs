//! User-facing status line.

use std::fmt;

use crate::core::PlayerId;
use crate::rules::GameResult;

use super::state::Session;

/// Display names for the two sides.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlayerNames {
    /// Local player's profile name.
    pub local: String,
    /// Name the local player challenged.
    pub opponent: String,
}

impl PlayerNames {
    /// Build from the two names.
    pub fn new(local: impl Into<String>, opponent: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            opponent: opponent.into(),
        }
    }

    /// Name of `player` in local perspective.
    #[must_use]
    pub fn name(&self, player: PlayerId) -> &str {
        if player == PlayerId::ZERO {
            &self.local
        } else {
            &self.opponent
        }
    }
}

/// Status line shown above the board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatusMessage {
    /// The local player may move.
    YourTurn {
        /// Local name.
        name: String,
    },
    /// The opponent is on turn.
    Waiting {
        /// Opponent name.
        opponent: String,
    },
    /// The game ended with a winner.
    Won {
        /// Winner name.
        winner: String,
        /// Winner's score.
        winner_score: u32,
        /// Loser's score.
        loser_score: u32,
    },
    /// The game ended level.
    Draw {
        /// Each side's score.
        score: u32,
    },
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusMessage::YourTurn { name } => write!(f, "{name}, your turn."),
            StatusMessage::Waiting { opponent } => write!(f, "Waiting for {opponent}."),
            StatusMessage::Won {
                winner,
                winner_score,
                loser_score,
            } => write!(f, "{winner} wins with {winner_score} to {loser_score}."),
            StatusMessage::Draw { score } => {
                write!(f, "The game is drawn at {score} each! Another one?")
            }
        }
    }
}

impl Session {
    /// Current status line.
    #[must_use]
    pub fn status_message(&self, names: &PlayerNames) -> StatusMessage {
        match self.final_scores() {
            Some(finals) => match finals.result {
                GameResult::Winner(winner) => StatusMessage::Won {
                    winner: names.name(winner).to_owned(),
                    winner_score: finals.scores[winner],
                    loser_score: finals.scores[winner.opponent()],
                },
                GameResult::Draw => StatusMessage::Draw {
                    score: finals.scores[PlayerId::ZERO],
                },
            },
            None if self.is_local_turn() => StatusMessage::YourTurn {
                name: names.local.clone(),
            },
            None => StatusMessage::Waiting {
                opponent: names.opponent.clone(),
            },
        }
    }
}
