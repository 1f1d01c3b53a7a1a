//! The session record: one game, seen from one client.
//!
//! A `Session` owns the canonical board, whose turn it is, the game phase
//! and the replay watermark. It is built when a game starts, replaced
//! wholesale when the client switches games, and dropped when the client
//! leaves. The applied-move history is an `im::Vector`, so cloning a
//! session to publish it is O(1).
//!
//! The watermark alone cannot tell a re-delivered record from one that
//! arrived late, so the session also remembers every timestamp folded
//! since its base position (the opening, or a restored snapshot). A late
//! record is replayed by rewinding to that base.

use im::{OrdSet, Vector};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::{Board, BoardConfig, Move, PlayerId};
use crate::rules::{self, FinalScores, IllegalMove, MoveOutcome};
use crate::sync::{GameId, LogicalTimestamp, NewMove, ProtocolViolation, Uid};

use super::turn::{next_turn, GameRole};

/// Where the game stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Moves are accepted.
    InProgress,
    /// The player on turn could not move; the board has been swept.
    Finished(FinalScores),
}

/// One record folded into the session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedMove {
    /// Log position of the record.
    pub timestamp: LogicalTimestamp,

    /// What the rules engine produced.
    pub outcome: MoveOutcome,

    /// Side on turn after this move.
    pub turn: PlayerId,

    /// Final scores, when this move ended the game.
    pub finished: Option<FinalScores>,

    /// Canonical board after this move. Equals `outcome.board` unless the
    /// game ended, in which case it is the swept board.
    pub board: Board,
}

/// Why the local player may not submit a move right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    /// The game is over.
    #[error("the game is over")]
    GameOver,

    /// The opponent is on turn.
    #[error("it is not your turn")]
    NotYourTurn,

    /// The house index is outside 0-5.
    #[error("house {0} does not exist")]
    NoSuchHouse(u8),

    /// The house is empty.
    #[error(transparent)]
    Illegal(#[from] IllegalMove),
}

/// Position a session was built from. Nothing at or below `last_applied`
/// is ever folded again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Base {
    board: Board,
    turn: PlayerId,
    phase: Phase,
    last_applied: Option<LogicalTimestamp>,
}

/// Game state for one client.
#[derive(Clone, Debug)]
pub struct Session {
    game_id: GameId,
    local_uid: Uid,
    role: GameRole,
    base: Base,
    board: Board,
    turn: PlayerId,
    phase: Phase,
    last_applied: Option<LogicalTimestamp>,
    seen: OrdSet<LogicalTimestamp>,
    history: Vector<AppliedMove>,
}

impl Session {
    /// Start a game from the configured opening position.
    pub fn new(game_id: GameId, local_uid: Uid, role: GameRole, config: &BoardConfig) -> Self {
        Self::with_board(game_id, local_uid, role, config.initial_board(), role.first_mover())
    }

    /// Start from an explicit board and side to move.
    ///
    /// If the side to move already has no seeds the session starts
    /// finished.
    pub fn with_board(
        game_id: GameId,
        local_uid: Uid,
        role: GameRole,
        board: Board,
        turn: PlayerId,
    ) -> Self {
        let mut session = Self::restore(
            game_id,
            local_uid,
            role,
            board,
            turn,
            Phase::InProgress,
            None,
        );
        if session.check_game_over().is_some() {
            session.base.board = session.board;
            session.base.phase = session.phase;
        }
        session
    }

    /// Rebuild from snapshot parts. No game-over check: the phase is
    /// restored as saved.
    pub(crate) fn restore(
        game_id: GameId,
        local_uid: Uid,
        role: GameRole,
        board: Board,
        turn: PlayerId,
        phase: Phase,
        last_applied: Option<LogicalTimestamp>,
    ) -> Self {
        Self {
            game_id,
            local_uid,
            role,
            base: Base {
                board,
                turn,
                phase,
                last_applied,
            },
            board,
            turn,
            phase,
            last_applied,
            seen: OrdSet::new(),
            history: Vector::new(),
        }
    }

    // === Accessors ===

    /// Game this session replays.
    #[must_use]
    pub fn game_id(&self) -> &GameId {
        &self.game_id
    }

    /// Local identity.
    #[must_use]
    pub fn local_uid(&self) -> &Uid {
        &self.local_uid
    }

    /// Local seat in the game record.
    #[must_use]
    pub fn role(&self) -> GameRole {
        self.role
    }

    /// Canonical board, local player on side 0.
    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Side on turn. After the game ends this is the side that could not
    /// move.
    #[must_use]
    pub fn turn(&self) -> PlayerId {
        self.turn
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Final scores once the game is over.
    #[must_use]
    pub fn final_scores(&self) -> Option<FinalScores> {
        match self.phase {
            Phase::Finished(scores) => Some(scores),
            Phase::InProgress => None,
        }
    }

    /// Whether the game has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished(_))
    }

    /// Side the presentation layer should activate, `None` after the end.
    #[must_use]
    pub fn active_player(&self) -> Option<PlayerId> {
        (!self.is_finished()).then_some(self.turn)
    }

    /// Whether the local player may move now.
    #[must_use]
    pub fn is_local_turn(&self) -> bool {
        self.active_player() == Some(PlayerId::ZERO)
    }

    /// Highest record timestamp folded so far.
    #[must_use]
    pub fn last_applied(&self) -> Option<LogicalTimestamp> {
        self.last_applied
    }

    /// Whether a record at `timestamp` has already been folded, either
    /// into the base position or since.
    #[must_use]
    pub fn has_seen(&self, timestamp: LogicalTimestamp) -> bool {
        self.base.last_applied.is_some_and(|base| timestamp <= base)
            || self.seen.contains(&timestamp)
    }

    /// Whether a record at `timestamp` is new but older than something
    /// already folded. Folding it needs a [`rewind`](Self::rewind).
    #[must_use]
    pub fn is_late(&self, timestamp: LogicalTimestamp) -> bool {
        !self.has_seen(timestamp) && self.last_applied.is_some_and(|last| timestamp < last)
    }

    /// Every move applied in this session, oldest first.
    #[must_use]
    pub fn history(&self) -> &Vector<AppliedMove> {
        &self.history
    }

    // === Local moves ===

    /// Check that the local player may sow `house` (relative, 0-5) and
    /// build the record to append.
    ///
    /// Nothing changes here: the move takes effect when it comes back
    /// through the log.
    pub fn request_move(&self, house: u8) -> Result<NewMove, SubmitError> {
        if self.is_finished() {
            return Err(SubmitError::GameOver);
        }
        if self.turn != PlayerId::ZERO {
            return Err(SubmitError::NotYourTurn);
        }
        let mv = Move::from_relative(PlayerId::ZERO, usize::from(house))
            .ok_or(SubmitError::NoSuchHouse(house))?;
        rules::apply(&self.board, mv)?;

        Ok(NewMove {
            uid: self.local_uid.clone(),
            house,
        })
    }

    // === Replay ===

    /// Record `timestamp` as folded without applying anything.
    pub(crate) fn mark_seen(&mut self, timestamp: LogicalTimestamp) {
        self.seen.insert(timestamp);
        self.last_applied = Some(self.last_applied.map_or(timestamp, |last| last.max(timestamp)));
    }

    /// Drop everything folded since the base position.
    ///
    /// The caller refolds the dropped records, plus the late one, in
    /// timestamp order.
    pub(crate) fn rewind(&mut self) {
        debug!(
            game = %self.game_id,
            folded = self.seen.len(),
            base = ?self.base.last_applied,
            "Rewinding to base position"
        );
        self.board = self.base.board;
        self.turn = self.base.turn;
        self.phase = self.base.phase;
        self.last_applied = self.base.last_applied;
        self.seen = OrdSet::new();
        self.history = Vector::new();
    }

    /// Fold one translated log record.
    ///
    /// The timestamp is marked seen whether or not the move applies, so a
    /// bad record is never retried. On error the board, turn and phase are
    /// unchanged.
    pub(crate) fn apply_record(
        &mut self,
        timestamp: LogicalTimestamp,
        mv: Move,
    ) -> Result<AppliedMove, ProtocolViolation> {
        self.mark_seen(timestamp);

        if self.is_finished() {
            return Err(ProtocolViolation::AfterGameOver { timestamp });
        }
        if mv.player != self.turn {
            return Err(ProtocolViolation::OutOfTurn {
                timestamp,
                mover: mv.player,
                turn: self.turn,
            });
        }
        let outcome = rules::apply(&self.board, mv)
            .map_err(|source| ProtocolViolation::IllegalMove { timestamp, mv, source })?;

        self.board = outcome.board;
        self.turn = next_turn(&outcome);
        debug!(
            game = %self.game_id,
            %timestamp,
            house = mv.house,
            mover = %mv.player,
            turn = %self.turn,
            extra_turn = outcome.extra_turn,
            captured = outcome.captured,
            "Move applied"
        );
        let finished = self.check_game_over();

        let applied = AppliedMove {
            timestamp,
            outcome,
            turn: self.turn,
            finished,
            board: self.board,
        };
        self.history.push_back(applied.clone());
        Ok(applied)
    }

    /// End the game if the side on turn cannot move.
    fn check_game_over(&mut self) -> Option<FinalScores> {
        if self.is_finished() || rules::can_move(&self.board, self.turn) {
            return None;
        }
        let (swept, scores) = rules::final_scores(&self.board);
        self.board = swept;
        self.phase = Phase::Finished(scores);
        info!(
            game = %self.game_id,
            stuck = %self.turn,
            local_score = scores.scores[PlayerId::ZERO],
            remote_score = scores.scores[PlayerId::ONE],
            result = ?scores.result,
            "Game over"
        );
        Some(scores)
    }
}
