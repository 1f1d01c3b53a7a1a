//! Session snapshots for resuming without a full replay.
//!
//! A snapshot carries everything needed to keep folding: board, turn,
//! phase and the watermark. History is not included; the log already
//! holds it. After restoring, resubscribing to the log skips every record
//! at or below the snapshot's watermark.

use serde::{Deserialize, Serialize};

use crate::core::{Board, PlayerId};
use crate::sync::{GameId, LogicalTimestamp, Uid};

use super::state::{Phase, Session};
use super::turn::GameRole;

/// Snapshot codec failures.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// bincode could not encode or decode the snapshot.
    #[error("snapshot codec: {0}")]
    Codec(#[from] bincode::Error),
}

/// Serializable session state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Game being replayed.
    pub game_id: GameId,
    /// Local identity.
    pub local_uid: Uid,
    /// Local seat.
    pub role: GameRole,
    /// Canonical board, local perspective.
    pub board: Board,
    /// Side on turn.
    pub turn: PlayerId,
    /// Phase at capture time.
    pub phase: Phase,
    /// Replay watermark.
    pub last_applied: Option<LogicalTimestamp>,
}

impl SessionSnapshot {
    /// Encode with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode bytes produced by [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

impl Session {
    /// Capture the resumable part of this session.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            game_id: self.game_id().clone(),
            local_uid: self.local_uid().clone(),
            role: self.role(),
            board: *self.board(),
            turn: self.turn(),
            phase: self.phase(),
            last_applied: self.last_applied(),
        }
    }

    /// Resume from a snapshot. History starts empty.
    #[must_use]
    pub fn from_snapshot(snapshot: SessionSnapshot) -> Self {
        Session::restore(
            snapshot.game_id,
            snapshot.local_uid,
            snapshot.role,
            snapshot.board,
            snapshot.turn,
            snapshot.phase,
            snapshot.last_applied,
        )
    }
}
