//! Client side: lobby, session runner and the game client tying them
//! together.
//!
//! A [`GameClient`] holds at most one running session. Starting another
//! game replaces it; the old task is aborted and its subscription dropped.

mod error;
pub mod lobby;
pub mod runner;

use std::sync::Arc;

use tracing::{info, instrument};

use crate::collab::{Matchmaker, MoveLog, Presenter};
use crate::core::KalahaConfig;
use crate::session::{GameRole, PlayerNames, Session, SessionSnapshot};
use crate::sync::{GameId, LogicalTimestamp, Uid};

pub use error::ClientError;
pub use lobby::{ChallengeStatus, Lobby, SignInStatus};
pub use runner::{SessionHandle, SessionRunner};

/// One player's connection to the game collaborators.
pub struct GameClient {
    uid: Uid,
    matchmaker: Arc<dyn Matchmaker>,
    log: Arc<dyn MoveLog>,
    presenter: Arc<dyn Presenter>,
    config: KalahaConfig,
    active: Option<SessionHandle>,
}

impl GameClient {
    /// Client for the signed-in user `uid`.
    pub fn new(
        uid: Uid,
        matchmaker: Arc<dyn Matchmaker>,
        log: Arc<dyn MoveLog>,
        presenter: Arc<dyn Presenter>,
        config: KalahaConfig,
    ) -> Self {
        Self {
            uid,
            matchmaker,
            log,
            presenter,
            config,
            active: None,
        }
    }

    /// Local identity.
    #[must_use]
    pub fn uid(&self) -> &Uid {
        &self.uid
    }

    /// The running session, if any.
    #[must_use]
    pub fn session(&self) -> Option<&SessionHandle> {
        self.active.as_ref()
    }

    /// Start replaying `game` from the opening position.
    ///
    /// The local role comes from the game record: player 0 is whoever
    /// created it.
    #[instrument(skip(self, names), fields(uid = %self.uid))]
    pub async fn start_game(
        &mut self,
        game: GameId,
        names: PlayerNames,
    ) -> Result<&SessionHandle, ClientError> {
        let players = self.matchmaker.players(&game).await?;
        let role = GameRole::resolve(&self.uid, &players.player0);
        info!(%game, ?role, "Role resolved");

        let session = Session::new(game, self.uid.clone(), role, &self.config.board);
        self.launch(session, names).await
    }

    /// Resume from a snapshot; records up to its watermark are skipped.
    #[instrument(skip(self, snapshot, names), fields(uid = %self.uid, game = %snapshot.game_id))]
    pub async fn resume_game(
        &mut self,
        snapshot: SessionSnapshot,
        names: PlayerNames,
    ) -> Result<&SessionHandle, ClientError> {
        self.launch(Session::from_snapshot(snapshot), names).await
    }

    /// Submit a local move on the running session.
    pub async fn submit(&self, house: u8) -> Result<LogicalTimestamp, ClientError> {
        self.active
            .as_ref()
            .ok_or(ClientError::NoSession)?
            .submit(house)
            .await
    }

    /// Abandon the running session, if any.
    pub fn leave(&mut self) {
        if let Some(handle) = self.active.take() {
            handle.abandon();
        }
    }

    async fn launch(
        &mut self,
        session: Session,
        names: PlayerNames,
    ) -> Result<&SessionHandle, ClientError> {
        self.leave();
        let runner = SessionRunner::new(
            Arc::clone(&self.log),
            Arc::clone(&self.presenter),
            self.config.sync.clone(),
            names,
        );
        let handle = runner.spawn(session).await?;
        Ok(self.active.insert(handle))
    }
}

impl std::fmt::Debug for GameClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameClient")
            .field("uid", &self.uid)
            .field("config", &self.config)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}
