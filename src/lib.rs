//! # kalaha-sync
//!
//! A Kalaha rules engine plus the replay protocol that keeps two remote
//! clients on the same game.
//!
//! ## Design Principles
//!
//! 1. **The log is the truth**: Clients never apply their own moves
//!    directly. Every move is appended to a shared, server-ordered log and
//!    takes effect when it is read back, so both clients fold the same
//!    records in the same order.
//!
//! 2. **Exactly once**: Records are deduplicated by their log timestamp.
//!    Re-delivery, resubscription and out-of-order transport are absorbed
//!    by the reducer's reorder buffer. A record that arrives after a later
//!    one was folded rewinds the session and everything is refolded in
//!    order.
//!
//! 3. **Pure rules**: The engine is a set of functions from one immutable
//!    `Board` to the next. Illegal moves are values, not panics.
//!
//! ## Perspective
//!
//! Each client sees the board from its own side: the local player always
//! sits on side 0 (houses 0-5, store 6), the opponent on side 1 (houses
//! 7-12, store 13). Converged clients hold mirrored boards.
//!
//! ## Modules
//!
//! - `core`: Players, the board, moves, RNG, configuration
//! - `rules`: Legality, sowing and capture, end-of-game sweep, scoring
//! - `sync`: Log records and the reorder/dedup reducer
//! - `session`: Per-game session state, turn control, status messages, snapshots
//! - `collab`: Collaborator traits and in-memory implementations
//! - `client`: Lobby flow and the async session runner
//! - `sim`: Seeded random playouts

pub mod core;
pub mod rules;
pub mod sync;
pub mod session;
pub mod collab;
pub mod client;
pub mod sim;

// Re-export commonly used types
pub use crate::core::{
    Board, BoardConfig, GameRng, KalahaConfig, Move, PlayerId, PlayerMap, SyncConfig,
};

pub use crate::rules::{FinalScores, GameResult, IllegalMove, MoveOutcome};

pub use crate::sync::{
    Fold, GameId, IngestDecision, LogicalTimestamp, MoveLogReducer, MoveRecord, NewMove,
    ProtocolViolation, Uid,
};

pub use crate::session::{
    GameRole, Phase, PlayerNames, Session, SessionSnapshot, StatusMessage, SubmitError,
};

pub use crate::collab::{CollabError, Identity, Matchmaker, MoveLog, Presenter, ProfileStore};

pub use crate::client::{ClientError, GameClient, Lobby, SessionHandle, SessionRunner};
