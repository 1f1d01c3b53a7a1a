//! External collaborators.
//!
//! The engine never talks to a backend directly. Identity, profile
//! storage, matchmaking, the move log and the presentation layer sit
//! behind the traits here; `memory` provides in-process implementations
//! used by tests and local play.

mod error;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::core::{Board, PlayerId};
use crate::session::StatusMessage;
use crate::sync::{GameId, LogicalTimestamp, MoveRecord, NewMove, Uid};

pub use error::CollabError;
pub use memory::{
    Frame, MemoryDirectory, MemoryMoveLog, RecordingPresenter, StaticIdentity,
};

/// Profile key holding the display name.
pub const USERNAME_KEY: &str = "username";

/// Profile key holding the name the user is challenging.
pub const SEEK_USERNAME_KEY: &str = "seek-username";

/// Profile key holding the assigned game.
pub const GAME_ID_KEY: &str = "game-id";

/// Source of the local identity.
#[async_trait]
pub trait Identity: Send + Sync {
    /// Sign in if needed and return the current user.
    async fn current_user(&self) -> Result<Uid, CollabError>;
}

/// Per-user key-value profile storage.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Read `key` from `uid`'s profile.
    async fn get(&self, uid: &Uid, key: &str) -> Result<Option<String>, CollabError>;

    /// Write `key` on `uid`'s profile, keeping other keys.
    async fn set(&self, uid: &Uid, key: &str, value: &str) -> Result<(), CollabError>;

    /// Remove `key` from `uid`'s profile. Removing a missing key is fine.
    async fn delete(&self, uid: &Uid, key: &str) -> Result<(), CollabError>;
}

/// The two seats of a game record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GamePlayers {
    /// Creator; moves first.
    pub player0: Uid,
    /// Challenged user.
    pub player1: Uid,
}

/// Opponent discovery and game records.
#[async_trait]
pub trait Matchmaker: Send + Sync {
    /// A user named `username` whose profile is seeking `seeking`.
    async fn find_opponent(
        &self,
        username: &str,
        seeking: &str,
    ) -> Result<Option<Uid>, CollabError>;

    /// Create a game record.
    async fn create_game(&self, players: GamePlayers) -> Result<GameId, CollabError>;

    /// Seats of an existing game.
    async fn players(&self, game: &GameId) -> Result<GamePlayers, CollabError>;
}

/// Receiving end of a move-log subscription.
///
/// The first batch is every record logged so far, in timestamp order;
/// later batches carry new records. Batches may repeat records already
/// delivered. The channel closes when the log stops the subscription.
pub type MoveSubscription = mpsc::Receiver<Vec<MoveRecord>>;

/// Ordered, persistent, multi-subscriber log of moves.
#[async_trait]
pub trait MoveLog: Send + Sync {
    /// Append a move; the log assigns its timestamp.
    async fn append(&self, game: &GameId, mv: NewMove) -> Result<LogicalTimestamp, CollabError>;

    /// Subscribe to `game`. `buffer` bounds the undelivered batches.
    async fn subscribe(&self, game: &GameId, buffer: usize)
        -> Result<MoveSubscription, CollabError>;
}

/// Presentation layer.
#[async_trait]
pub trait Presenter: Send + Sync {
    /// Draw `board`. Returns once the frame (and any animation) is done.
    async fn render(&self, board: &Board);

    /// Highlight the side that may move; `None` after the game ends.
    fn activate(&self, player: Option<PlayerId>);

    /// Replace the status line.
    fn show(&self, status: &StatusMessage);
}
