//! Identifiers and the records exchanged with the move log.

use serde::{Deserialize, Serialize};

use crate::core::{Move, PlayerId};

/// Opaque client identity issued by the identity collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(String);

impl Uid {
    /// Wrap a raw identity string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw identity string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Uid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier of one game's move log.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(String);

impl GameId {
    /// Wrap a raw game identifier.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-assigned ordering marker. Totally ordered within a game.
///
/// Clients never mint these; only the move log does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogicalTimestamp(u64);

impl LogicalTimestamp {
    /// Wrap a raw timestamp.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for LogicalTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// A move as a client appends it: no timestamp yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMove {
    /// Issuing client.
    pub uid: Uid,
    /// House relative to the issuer's own side (0-5).
    pub house: u8,
}

/// A move as the log delivers it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Issuing client.
    pub uid: Uid,
    /// House relative to the issuer's own side (0-5).
    pub house: u8,
    /// Position in the log.
    pub timestamp: LogicalTimestamp,
}

impl MoveRecord {
    /// Stamp an appended move.
    #[must_use]
    pub fn new(new_move: NewMove, timestamp: LogicalTimestamp) -> Self {
        Self {
            uid: new_move.uid,
            house: new_move.house,
            timestamp,
        }
    }

    /// The side that issued this record, seen from `local`: the local
    /// client always sits on side 0.
    #[must_use]
    pub fn mover(&self, local: &Uid) -> PlayerId {
        if &self.uid == local {
            PlayerId::ZERO
        } else {
            PlayerId::ONE
        }
    }

    /// Translate into an absolute move on `local`'s board.
    ///
    /// `None` when the house is outside 0-5.
    #[must_use]
    pub fn to_move(&self, local: &Uid) -> Option<Move> {
        Move::from_relative(self.mover(local), usize::from(self.house))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(uid: &str, house: u8, ts: u64) -> MoveRecord {
        MoveRecord {
            uid: Uid::new(uid),
            house,
            timestamp: LogicalTimestamp::new(ts),
        }
    }

    #[test]
    fn test_local_record_maps_to_side_zero() {
        let me = Uid::new("alice");
        let mv = record("alice", 3, 1).to_move(&me).unwrap();
        assert_eq!(mv, Move::new(PlayerId::ZERO, 3));
    }

    #[test]
    fn test_remote_record_maps_to_side_one() {
        let me = Uid::new("alice");
        let mv = record("bob", 0, 1).to_move(&me).unwrap();
        assert_eq!(mv, Move::new(PlayerId::ONE, 7));

        let mv = record("bob", 5, 2).to_move(&me).unwrap();
        assert_eq!(mv, Move::new(PlayerId::ONE, 12));
    }

    #[test]
    fn test_out_of_range_house() {
        let me = Uid::new("alice");
        assert_eq!(record("bob", 6, 1).to_move(&me), None);
    }

    #[test]
    fn test_record_json_shape() {
        let json = serde_json::to_value(record("bob", 2, 17)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "uid": "bob", "house": 2, "timestamp": 17 })
        );
    }

    #[test]
    fn test_timestamp_order() {
        assert!(LogicalTimestamp::new(3) < LogicalTimestamp::new(10));
        assert_eq!(LogicalTimestamp::new(3).to_string(), "@3");
    }
}
