//! In-process collaborators.
//!
//! `MemoryDirectory` serves both profiles and matchmaking. `MemoryMoveLog`
//! is an ordered log with broadcast subscriptions. `RecordingPresenter`
//! keeps every frame it was asked to show. The directory and the log have
//! failure switches so tests can drive the error paths.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, instrument, warn};

use crate::core::{Board, PlayerId};
use crate::session::StatusMessage;
use crate::sync::{GameId, LogicalTimestamp, MoveRecord, NewMove, Uid};

use super::{
    CollabError, GamePlayers, Identity, Matchmaker, MoveLog, MoveSubscription, Presenter,
    ProfileStore, GAME_ID_KEY, SEEK_USERNAME_KEY, USERNAME_KEY,
};

/// Default capacity of each game's live broadcast.
const BROADCAST_CAPACITY: usize = 64;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Identity
// =============================================================================

/// Identity fixed at construction.
#[derive(Clone, Debug, Default)]
pub struct StaticIdentity {
    uid: Option<Uid>,
}

impl StaticIdentity {
    /// Always signed in as `uid`.
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: Some(Uid::new(uid)),
        }
    }

    /// Sign-in always fails.
    #[must_use]
    pub fn signed_out() -> Self {
        Self { uid: None }
    }
}

#[async_trait]
impl Identity for StaticIdentity {
    async fn current_user(&self) -> Result<Uid, CollabError> {
        self.uid.clone().ok_or(CollabError::NotSignedIn)
    }
}

// =============================================================================
// Profiles and matchmaking
// =============================================================================

type Profile = FxHashMap<String, String>;

#[derive(Debug, Default)]
struct DirectoryState {
    profiles: FxHashMap<Uid, Profile>,
    games: FxHashMap<GameId, GamePlayers>,
    next_game: u64,
}

/// Profile store and matchmaker over in-memory maps.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    state: Mutex<DirectoryState>,
    failing: AtomicBool,
}

impl MemoryDirectory {
    /// Empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every request fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Copy of `uid`'s profile.
    #[must_use]
    pub fn profile(&self, uid: &Uid) -> Profile {
        lock(&self.state).profiles.get(uid).cloned().unwrap_or_default()
    }

    fn check(&self) -> Result<(), CollabError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(CollabError::unavailable("directory", "injected failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ProfileStore for MemoryDirectory {
    async fn get(&self, uid: &Uid, key: &str) -> Result<Option<String>, CollabError> {
        self.check()?;
        Ok(lock(&self.state)
            .profiles
            .get(uid)
            .and_then(|profile| profile.get(key))
            .cloned())
    }

    #[instrument(level = "debug", skip(self, uid, value), fields(uid = %uid))]
    async fn set(&self, uid: &Uid, key: &str, value: &str) -> Result<(), CollabError> {
        self.check()?;
        lock(&self.state)
            .profiles
            .entry(uid.clone())
            .or_default()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    #[instrument(level = "debug", skip(self, uid), fields(uid = %uid))]
    async fn delete(&self, uid: &Uid, key: &str) -> Result<(), CollabError> {
        self.check()?;
        if let Some(profile) = lock(&self.state).profiles.get_mut(uid) {
            profile.remove(key);
        }
        Ok(())
    }
}

#[async_trait]
impl Matchmaker for MemoryDirectory {
    async fn find_opponent(
        &self,
        username: &str,
        seeking: &str,
    ) -> Result<Option<Uid>, CollabError> {
        self.check()?;
        let state = lock(&self.state);
        let found = state
            .profiles
            .iter()
            .filter(|(_, profile)| {
                profile.get(USERNAME_KEY).map(String::as_str) == Some(username)
                    && profile.get(SEEK_USERNAME_KEY).map(String::as_str) == Some(seeking)
            })
            .map(|(uid, _)| uid.clone())
            .min();
        Ok(found)
    }

    #[instrument(level = "debug", skip(self))]
    async fn create_game(&self, players: GamePlayers) -> Result<GameId, CollabError> {
        self.check()?;
        let mut state = lock(&self.state);
        state.next_game += 1;
        let game = GameId::new(format!("game-{}", state.next_game));
        state.games.insert(game.clone(), players);
        debug!(%game, "Game record created");
        Ok(game)
    }

    async fn players(&self, game: &GameId) -> Result<GamePlayers, CollabError> {
        self.check()?;
        lock(&self.state)
            .games
            .get(game)
            .cloned()
            .ok_or_else(|| CollabError::UnknownGame(game.clone()))
    }
}

// =============================================================================
// Move log
// =============================================================================

#[derive(Debug)]
struct GameLog {
    records: Vec<MoveRecord>,
    live: Option<broadcast::Sender<Vec<MoveRecord>>>,
}

#[derive(Debug, Default)]
struct LogInner {
    games: Mutex<FxHashMap<GameId, GameLog>>,
    clock: AtomicU64,
    failing_appends: AtomicBool,
}

impl LogInner {
    fn records(&self, game: &GameId) -> Vec<MoveRecord> {
        lock(&self.games)
            .get(game)
            .map(|log| log.records.clone())
            .unwrap_or_default()
    }
}

/// Ordered move log shared by every client in the process.
///
/// Timestamps come from one counter, so they increase across all games.
/// Cloning shares the log.
#[derive(Clone, Debug, Default)]
pub struct MemoryMoveLog {
    inner: Arc<LogInner>,
}

impl MemoryMoveLog {
    /// Empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make appends fail (or succeed again).
    pub fn set_failing_appends(&self, failing: bool) {
        self.inner.failing_appends.store(failing, Ordering::SeqCst);
    }

    /// Every record of `game`, in timestamp order.
    #[must_use]
    pub fn records(&self, game: &GameId) -> Vec<MoveRecord> {
        self.inner.records(game)
    }

    /// Push `batch` to live subscribers as if the transport delivered it,
    /// without storing it. Models duplicated or reordered delivery.
    pub fn deliver(&self, game: &GameId, batch: Vec<MoveRecord>) {
        let games = lock(&self.inner.games);
        if let Some(live) = games.get(game).and_then(|log| log.live.as_ref()) {
            let _ = live.send(batch);
        }
    }

    /// Send every stored record of `game` to live subscribers again.
    pub fn redeliver(&self, game: &GameId) {
        let records = self.records(game);
        self.deliver(game, records);
    }

    /// Stop all subscriptions to `game`. Stored records stay readable;
    /// further appends fail.
    pub fn close(&self, game: &GameId) {
        if let Some(log) = lock(&self.inner.games).get_mut(game) {
            log.live = None;
        }
    }
}

#[async_trait]
impl MoveLog for MemoryMoveLog {
    #[instrument(level = "debug", skip(self, mv), fields(uid = %mv.uid, house = mv.house))]
    async fn append(&self, game: &GameId, mv: NewMove) -> Result<LogicalTimestamp, CollabError> {
        if self.inner.failing_appends.load(Ordering::SeqCst) {
            return Err(CollabError::unavailable("move log", "injected failure"));
        }

        let mut games = lock(&self.inner.games);
        let log = games.entry(game.clone()).or_insert_with(|| GameLog {
            records: Vec::new(),
            live: Some(broadcast::channel(BROADCAST_CAPACITY).0),
        });
        let Some(live) = &log.live else {
            return Err(CollabError::unavailable("move log", "log closed"));
        };

        let timestamp = LogicalTimestamp::new(self.inner.clock.fetch_add(1, Ordering::SeqCst) + 1);
        let record = MoveRecord::new(mv, timestamp);
        // No receivers is fine: late subscribers read `records`.
        let _ = live.send(vec![record.clone()]);
        log.records.push(record);
        Ok(timestamp)
    }

    #[instrument(level = "debug", skip(self))]
    async fn subscribe(
        &self,
        game: &GameId,
        buffer: usize,
    ) -> Result<MoveSubscription, CollabError> {
        let (initial, live) = {
            let mut games = lock(&self.inner.games);
            let log = games.entry(game.clone()).or_insert_with(|| GameLog {
                records: Vec::new(),
                live: Some(broadcast::channel(BROADCAST_CAPACITY).0),
            });
            let live = log
                .live
                .as_ref()
                .ok_or_else(|| CollabError::unavailable("move log", "log closed"))?
                .subscribe();
            (log.records.clone(), live)
        };

        let (tx, rx) = mpsc::channel(buffer.max(1));
        tokio::spawn(forward(
            Arc::clone(&self.inner),
            game.clone(),
            initial,
            live,
            tx,
        ));
        Ok(rx)
    }
}

/// Pump one subscription: the stored records first, then live batches.
///
/// A lagging subscriber gets the full record list again; the reducer
/// drops what it has already folded.
async fn forward(
    inner: Arc<LogInner>,
    game: GameId,
    initial: Vec<MoveRecord>,
    mut live: broadcast::Receiver<Vec<MoveRecord>>,
    tx: mpsc::Sender<Vec<MoveRecord>>,
) {
    if tx.send(initial).await.is_err() {
        return;
    }
    loop {
        let batch = match live.recv().await {
            Ok(batch) => batch,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(%game, skipped, "Subscriber lagged, resending full log");
                inner.records(&game)
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!(%game, "Move log closed");
                return;
            }
        };
        if tx.send(batch).await.is_err() {
            return;
        }
    }
}

// =============================================================================
// Presentation
// =============================================================================

/// One call made on a [`RecordingPresenter`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Frame {
    /// `render`.
    Render(Board),
    /// `activate`.
    Activate(Option<PlayerId>),
    /// `show`, rendered to text.
    Status(String),
}

/// Presenter that records frames, optionally taking time per render.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    frames: Mutex<Vec<Frame>>,
    render_delay: Option<Duration>,
}

impl RecordingPresenter {
    /// Presenter that acknowledges renders immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Presenter that takes `delay` to acknowledge each render.
    #[must_use]
    pub fn with_render_delay(delay: Duration) -> Self {
        Self {
            frames: Mutex::new(Vec::new()),
            render_delay: Some(delay),
        }
    }

    /// Every call so far.
    #[must_use]
    pub fn frames(&self) -> Vec<Frame> {
        lock(&self.frames).clone()
    }

    /// Rendered boards, in order.
    #[must_use]
    pub fn boards(&self) -> Vec<Board> {
        lock(&self.frames)
            .iter()
            .filter_map(|frame| match frame {
                Frame::Render(board) => Some(*board),
                _ => None,
            })
            .collect()
    }

    /// Most recent status line.
    #[must_use]
    pub fn last_status(&self) -> Option<String> {
        lock(&self.frames).iter().rev().find_map(|frame| match frame {
            Frame::Status(text) => Some(text.clone()),
            _ => None,
        })
    }
}

#[async_trait]
impl Presenter for RecordingPresenter {
    async fn render(&self, board: &Board) {
        if let Some(delay) = self.render_delay {
            tokio::time::sleep(delay).await;
        }
        lock(&self.frames).push(Frame::Render(*board));
    }

    fn activate(&self, player: Option<PlayerId>) {
        lock(&self.frames).push(Frame::Activate(player));
    }

    fn show(&self, status: &StatusMessage) {
        lock(&self.frames).push(Frame::Status(status.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(raw: &str) -> Uid {
        Uid::new(raw)
    }

    fn new_move(who: &str, house: u8) -> NewMove {
        NewMove {
            uid: uid(who),
            house,
        }
    }

    #[tokio::test]
    async fn test_static_identity() {
        assert_eq!(StaticIdentity::new("a").current_user().await, Ok(uid("a")));
        assert_eq!(
            StaticIdentity::signed_out().current_user().await,
            Err(CollabError::NotSignedIn)
        );
    }

    #[tokio::test]
    async fn test_profile_get_set_delete() {
        let dir = MemoryDirectory::new();
        let a = uid("a");

        assert_eq!(dir.get(&a, USERNAME_KEY).await, Ok(None));
        dir.set(&a, USERNAME_KEY, "alice").await.unwrap();
        dir.set(&a, GAME_ID_KEY, "g").await.unwrap();
        assert_eq!(dir.get(&a, USERNAME_KEY).await, Ok(Some("alice".to_owned())));

        dir.delete(&a, GAME_ID_KEY).await.unwrap();
        dir.delete(&a, SEEK_USERNAME_KEY).await.unwrap();
        assert_eq!(dir.profile(&a).len(), 1);
    }

    #[tokio::test]
    async fn test_find_opponent_needs_mutual_seek() {
        let dir = MemoryDirectory::new();
        dir.set(&uid("b"), USERNAME_KEY, "bob").await.unwrap();
        assert_eq!(dir.find_opponent("bob", "alice").await, Ok(None));

        dir.set(&uid("b"), SEEK_USERNAME_KEY, "carol").await.unwrap();
        assert_eq!(dir.find_opponent("bob", "alice").await, Ok(None));

        dir.set(&uid("b"), SEEK_USERNAME_KEY, "alice").await.unwrap();
        assert_eq!(dir.find_opponent("bob", "alice").await, Ok(Some(uid("b"))));
    }

    #[tokio::test]
    async fn test_game_records() {
        let dir = MemoryDirectory::new();
        let players = GamePlayers {
            player0: uid("a"),
            player1: uid("b"),
        };
        let game = dir.create_game(players.clone()).await.unwrap();
        assert_eq!(dir.players(&game).await, Ok(players));

        let missing = GameId::new("nope");
        assert_eq!(
            dir.players(&missing).await,
            Err(CollabError::UnknownGame(missing))
        );
    }

    #[tokio::test]
    async fn test_failing_directory() {
        let dir = MemoryDirectory::new();
        dir.set_failing(true);
        assert!(matches!(
            dir.get(&uid("a"), USERNAME_KEY).await,
            Err(CollabError::Unavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_append_assigns_increasing_timestamps() {
        let log = MemoryMoveLog::new();
        let game = GameId::new("g");

        let t1 = log.append(&game, new_move("a", 0)).await.unwrap();
        let t2 = log.append(&game, new_move("b", 1)).await.unwrap();
        assert!(t1 < t2);
        assert_eq!(log.records(&game).len(), 2);
    }

    #[tokio::test]
    async fn test_subscription_replays_then_streams() {
        let log = MemoryMoveLog::new();
        let game = GameId::new("g");
        log.append(&game, new_move("a", 0)).await.unwrap();

        let mut sub = log.subscribe(&game, 8).await.unwrap();
        let first = sub.recv().await.unwrap();
        assert_eq!(first.len(), 1);

        log.append(&game, new_move("b", 2)).await.unwrap();
        let second = sub.recv().await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].house, 2);

        log.redeliver(&game);
        assert_eq!(sub.recv().await.unwrap().len(), 2);

        log.close(&game);
        assert_eq!(sub.recv().await, None);
    }

    #[tokio::test]
    async fn test_failing_append() {
        let log = MemoryMoveLog::new();
        log.set_failing_appends(true);
        assert!(log.append(&GameId::new("g"), new_move("a", 0)).await.is_err());
        assert!(log.records(&GameId::new("g")).is_empty());
    }

    #[tokio::test]
    async fn test_recording_presenter() {
        let presenter = RecordingPresenter::new();
        presenter.render(&Board::default()).await;
        presenter.activate(Some(PlayerId::ZERO));
        presenter.show(&StatusMessage::Waiting {
            opponent: "bob".to_owned(),
        });

        assert_eq!(presenter.boards(), vec![Board::default()]);
        assert_eq!(presenter.frames().len(), 3);
        assert_eq!(presenter.last_status().as_deref(), Some("Waiting for bob."));
    }
}
