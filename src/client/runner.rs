//! Async session runner.
//!
//! One task per game: it owns the [`Session`] and the reducer, reads
//! batches from the move-log subscription and folds them one move at a
//! time. Each applied move is presented as two frames, the distributed
//! board then the final board, and the next move is not folded until the
//! presenter has acknowledged both. After every fold the session is
//! published on a `watch` channel. A late record rewinds the session, so
//! the base position is presented again before the refolded moves.
//!
//! Dropping or abandoning the [`SessionHandle`] aborts the task, which
//! drops the subscription. The remote log is never touched.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::collab::{MoveLog, MoveSubscription, Presenter};
use crate::core::SyncConfig;
use crate::session::{AppliedMove, PlayerNames, Session};
use crate::sync::{Fold, GameId, LogicalTimestamp, MoveLogReducer};

use super::error::ClientError;

/// Builds session tasks.
#[derive(Clone)]
pub struct SessionRunner {
    log: Arc<dyn MoveLog>,
    presenter: Arc<dyn Presenter>,
    config: SyncConfig,
    names: PlayerNames,
}

impl SessionRunner {
    /// Runner that reads from `log` and draws on `presenter`.
    pub fn new(
        log: Arc<dyn MoveLog>,
        presenter: Arc<dyn Presenter>,
        config: SyncConfig,
        names: PlayerNames,
    ) -> Self {
        Self {
            log,
            presenter,
            config,
            names,
        }
    }

    /// Subscribe to the session's game and start folding in the
    /// background.
    ///
    /// The subscription is opened before this returns, so a failing log
    /// is reported here rather than inside the task.
    #[instrument(skip(self, session), fields(game = %session.game_id()))]
    pub async fn spawn(self, session: Session) -> Result<SessionHandle, ClientError> {
        let game_id = session.game_id().clone();
        let subscription = self
            .log
            .subscribe(&game_id, self.config.subscription_buffer)
            .await?;

        let (tx, rx) = watch::channel(session.clone());
        let reducer = MoveLogReducer::new(&self.config);
        let log = Arc::clone(&self.log);
        let task = tokio::spawn(self.run(session, reducer, subscription, tx));
        info!(game = %game_id, "Session started");

        Ok(SessionHandle {
            game_id,
            state: rx,
            log,
            task: Some(task),
        })
    }

    async fn run(
        self,
        mut session: Session,
        mut reducer: MoveLogReducer,
        mut subscription: MoveSubscription,
        tx: watch::Sender<Session>,
    ) -> Session {
        self.present_position(&session).await;

        while let Some(batch) = subscription.recv().await {
            let buffered = reducer.ingest_batch(&session, batch);
            debug!(game = %session.game_id(), buffered, "Batch received");

            while let Some(fold) = reducer.step(&mut session) {
                match &fold {
                    Fold::Applied(applied) => self.present_move(&session, applied).await,
                    Fold::Rewound => self.present_position(&session).await,
                    Fold::Violation(_) => {}
                }
                tx.send_replace(session.clone());
            }
        }

        info!(
            game = %session.game_id(),
            last_applied = ?session.last_applied(),
            "Subscription ended"
        );
        session
    }

    async fn present_position(&self, session: &Session) {
        self.presenter.render(session.board()).await;
        self.presenter.activate(session.active_player());
        self.presenter.show(&session.status_message(&self.names));
    }

    async fn present_move(&self, session: &Session, applied: &AppliedMove) {
        self.presenter.render(&applied.outcome.distributed).await;
        self.presenter.render(&applied.outcome.board).await;
        if applied.finished.is_some() {
            self.presenter.render(&applied.board).await;
        }
        self.presenter.activate(session.active_player());
        self.presenter.show(&session.status_message(&self.names));
    }
}

/// Handle to a running session task.
pub struct SessionHandle {
    game_id: GameId,
    state: watch::Receiver<Session>,
    log: Arc<dyn MoveLog>,
    task: Option<JoinHandle<Session>>,
}

impl SessionHandle {
    /// Game being played.
    #[must_use]
    pub fn game_id(&self) -> &GameId {
        &self.game_id
    }

    /// Latest published session.
    #[must_use]
    pub fn current(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Receiver that sees every published session.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Session> {
        self.state.clone()
    }

    /// Whether the task is still folding.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Validate a local move and append it to the log.
    ///
    /// The board changes only once the record comes back through the
    /// subscription. A failed append is reported and not retried.
    #[instrument(skip(self), fields(game = %self.game_id))]
    pub async fn submit(&self, house: u8) -> Result<LogicalTimestamp, ClientError> {
        let new_move = self.current().request_move(house)?;
        match self.log.append(&self.game_id, new_move).await {
            Ok(timestamp) => {
                debug!(%timestamp, "Move appended");
                Ok(timestamp)
            }
            Err(err) => {
                warn!(error = %err, "Could not append move");
                Err(err.into())
            }
        }
    }

    /// Wait until a published session satisfies `done`.
    pub async fn wait_until(
        &self,
        done: impl FnMut(&Session) -> bool,
    ) -> Result<Session, ClientError> {
        let mut rx = self.state.clone();
        let session = rx.wait_for(done).await.map_err(|_| ClientError::Cancelled)?;
        Ok(session.clone())
    }

    /// Stop folding. The subscription is dropped; the log is untouched.
    pub fn abandon(mut self) {
        self.stop();
    }

    /// Wait for the subscription to end and return the final session.
    pub async fn join(mut self) -> Result<Session, ClientError> {
        let task = self.task.take().ok_or(ClientError::Cancelled)?;
        task.await.map_err(|_| ClientError::Cancelled)
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            if !task.is_finished() {
                task.abort();
                info!(game = %self.game_id, "Session abandoned");
            }
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("game_id", &self.game_id)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{MemoryMoveLog, RecordingPresenter};
    use crate::core::{BoardConfig, PlayerId};
    use crate::session::GameRole;
    use crate::sync::{NewMove, Uid};

    fn session(uid: &str, role: GameRole) -> Session {
        Session::new(GameId::new("g"), Uid::new(uid), role, &BoardConfig::default())
    }

    fn runner(log: &MemoryMoveLog, presenter: &Arc<RecordingPresenter>) -> SessionRunner {
        SessionRunner::new(
            Arc::new(log.clone()),
            Arc::clone(presenter) as Arc<dyn Presenter>,
            SyncConfig::default(),
            PlayerNames::new("alice", "bob"),
        )
    }

    #[tokio::test]
    async fn test_submit_round_trips_through_log() {
        let log = MemoryMoveLog::new();
        let presenter = Arc::new(RecordingPresenter::new());
        let handle = runner(&log, &presenter)
            .spawn(session("alice", GameRole::Player0))
            .await
            .unwrap();

        let ts = handle.submit(0).await.unwrap();
        let s = handle
            .wait_until(|s| s.last_applied() == Some(ts))
            .await
            .unwrap();

        assert_eq!(s.turn(), PlayerId::ONE);
        assert_eq!(s.board().seeds(0), Some(0));
        // Opening frame, then distributed and final.
        assert_eq!(presenter.boards().len(), 3);
        assert_eq!(presenter.last_status().as_deref(), Some("Waiting for bob."));
    }

    #[tokio::test]
    async fn test_submit_refused_locally() {
        let log = MemoryMoveLog::new();
        let presenter = Arc::new(RecordingPresenter::new());
        let handle = runner(&log, &presenter)
            .spawn(session("alice", GameRole::Player1))
            .await
            .unwrap();

        assert_eq!(
            handle.submit(0).await,
            Err(ClientError::Submit(crate::session::SubmitError::NotYourTurn))
        );
        assert!(log.records(&GameId::new("g")).is_empty());
    }

    #[tokio::test]
    async fn test_failed_append_is_reported() {
        let log = MemoryMoveLog::new();
        let presenter = Arc::new(RecordingPresenter::new());
        let handle = runner(&log, &presenter)
            .spawn(session("alice", GameRole::Player0))
            .await
            .unwrap();

        log.set_failing_appends(true);
        assert!(matches!(handle.submit(0).await, Err(ClientError::Collab(_))));
        assert!(handle.current().last_applied().is_none());
    }

    #[tokio::test]
    async fn test_join_after_close() {
        let log = MemoryMoveLog::new();
        let game = GameId::new("g");
        log.append(
            &game,
            NewMove {
                uid: Uid::new("alice"),
                house: 0,
            },
        )
        .await
        .unwrap();

        let presenter = Arc::new(RecordingPresenter::new());
        let handle = runner(&log, &presenter)
            .spawn(session("alice", GameRole::Player0))
            .await
            .unwrap();
        handle.wait_until(|s| s.last_applied().is_some()).await.unwrap();

        log.close(&game);
        let finished = handle.join().await.unwrap();
        assert_eq!(finished.turn(), PlayerId::ONE);
    }

    #[tokio::test]
    async fn test_abandon_stops_folding() {
        let log = MemoryMoveLog::new();
        let presenter = Arc::new(RecordingPresenter::new());
        let handle = runner(&log, &presenter)
            .spawn(session("alice", GameRole::Player0))
            .await
            .unwrap();
        let mut rx = handle.watch();
        handle.abandon();

        log.append(
            &GameId::new("g"),
            NewMove {
                uid: Uid::new("alice"),
                house: 0,
            },
        )
        .await
        .unwrap();

        // The sender lives in the aborted task, so the channel closes.
        assert!(rx.changed().await.is_err());
        assert_eq!(log.records(&GameId::new("g")).len(), 1);
    }
}
