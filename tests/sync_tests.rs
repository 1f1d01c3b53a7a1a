//! End-to-end sync tests: two clients, one in-memory move log.

use std::sync::Arc;
use std::time::Duration;

use kalaha_sync::client::{GameClient, SessionHandle, SessionRunner};
use kalaha_sync::collab::{
    GamePlayers, Matchmaker, MemoryDirectory, MemoryMoveLog, MoveLog, Presenter,
    RecordingPresenter,
};
use kalaha_sync::core::{Board, GameRng, KalahaConfig, PlayerId, SyncConfig};
use kalaha_sync::rules;
use kalaha_sync::session::{GameRole, PlayerNames, Session};
use kalaha_sync::sync::{GameId, LogicalTimestamp, MoveRecord, NewMove, Uid};

// =============================================================================
// Helpers
// =============================================================================

struct Table {
    log: MemoryMoveLog,
    game: GameId,
    alice: GameClient,
    bob: GameClient,
    alice_view: Arc<RecordingPresenter>,
    bob_view: Arc<RecordingPresenter>,
}

/// Log output for failing runs: `RUST_LOG=kalaha_sync=debug cargo test`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn table() -> Table {
    init_tracing();
    let dir = Arc::new(MemoryDirectory::new());
    let log = MemoryMoveLog::new();
    let game = dir
        .create_game(GamePlayers {
            player0: Uid::new("a"),
            player1: Uid::new("b"),
        })
        .await
        .unwrap();

    let alice_view = Arc::new(RecordingPresenter::new());
    let bob_view = Arc::new(RecordingPresenter::new());
    let client = |uid: &str, view: &Arc<RecordingPresenter>| {
        GameClient::new(
            Uid::new(uid),
            Arc::clone(&dir) as Arc<dyn Matchmaker>,
            Arc::new(log.clone()) as Arc<dyn MoveLog>,
            Arc::clone(view) as Arc<dyn Presenter>,
            KalahaConfig::default(),
        )
    };
    let mut alice = client("a", &alice_view);
    let mut bob = client("b", &bob_view);
    alice
        .start_game(game.clone(), PlayerNames::new("alice", "bob"))
        .await
        .unwrap();
    bob.start_game(game.clone(), PlayerNames::new("bob", "alice"))
        .await
        .unwrap();

    Table {
        log,
        game,
        alice,
        bob,
        alice_view,
        bob_view,
    }
}

async fn applied(handle: &SessionHandle, ts: LogicalTimestamp) -> Session {
    tokio::time::timeout(
        Duration::from_secs(5),
        handle.wait_until(|s| s.has_seen(ts)),
    )
    .await
    .expect("fold timed out")
    .unwrap()
}

fn handle(client: &GameClient) -> &SessionHandle {
    client.session().unwrap()
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_two_clients_play_to_the_end() {
    let t = table().await;
    let mut rng = GameRng::new(17);

    loop {
        let a = handle(&t.alice).current();
        if a.is_finished() {
            break;
        }
        let mover = if a.is_local_turn() { &t.alice } else { &t.bob };
        let board = *handle(mover).current().board();
        let legal = rules::legal_moves(&board, PlayerId::ZERO);
        let house = *rng.choose(&legal).unwrap();

        let ts = mover.submit(u8::try_from(house).unwrap()).await.unwrap();
        let a = applied(handle(&t.alice), ts).await;
        let b = applied(handle(&t.bob), ts).await;
        assert_eq!(a.board().mirrored(), *b.board());
        if !a.is_finished() {
            assert_ne!(a.is_local_turn(), b.is_local_turn());
        }
    }

    let a = handle(&t.alice).current();
    let b = handle(&t.bob).current();
    assert!(b.is_finished());
    assert_eq!(a.board().mirrored(), *b.board());
    assert_eq!(a.board().total_seeds(), 48);

    let status = t.alice_view.last_status().unwrap();
    let finals = a.final_scores().unwrap();
    let expected = a.status_message(&PlayerNames::new("alice", "bob")).to_string();
    assert_eq!(status, expected);
    assert_eq!(
        finals.scores[PlayerId::ZERO] + finals.scores[PlayerId::ONE],
        48
    );
    assert!(t.bob_view.last_status().is_some());
}

#[tokio::test]
async fn test_turn_is_enforced_locally() {
    let t = table().await;
    // Bob is player 1; alice opens.
    assert!(t.bob.submit(0).await.is_err());
    assert!(t.log.records(&t.game).is_empty());

    let ts = t.alice.submit(0).await.unwrap();
    applied(handle(&t.alice), ts).await;
    applied(handle(&t.bob), ts).await;
    assert!(t.alice.submit(1).await.is_err());
    assert!(t.bob.submit(1).await.is_ok());
}

#[tokio::test]
async fn test_presenter_sees_distributed_then_final() {
    let log = MemoryMoveLog::new();
    let game = GameId::new("capture");
    let presenter = Arc::new(RecordingPresenter::new());
    let start = Board::from_slots([4, 1, 1, 4, 4, 4, 0, 4, 4, 4, 5, 4, 4, 0]);
    let session = Session::with_board(
        game.clone(),
        Uid::new("a"),
        GameRole::Player0,
        start,
        PlayerId::ZERO,
    );
    let handle = SessionRunner::new(
        Arc::new(log.clone()),
        Arc::clone(&presenter) as Arc<dyn Presenter>,
        SyncConfig::default(),
        PlayerNames::new("alice", "bob"),
    )
    .spawn(session)
    .await
    .unwrap();

    let ts = handle.submit(1).await.unwrap();
    applied(&handle, ts).await;

    let boards = presenter.boards();
    assert_eq!(boards.len(), 3);
    assert_eq!(boards[0], start);
    // Distributed: the seed landed, nothing captured yet.
    assert_eq!(boards[1].seeds(2), Some(2));
    assert_eq!(boards[1].store_seeds(PlayerId::ZERO), 0);
    // Final: house 2 and its opposite house 10 went to the store.
    assert_eq!(boards[2].seeds(2), Some(0));
    assert_eq!(boards[2].seeds(10), Some(0));
    assert_eq!(boards[2].store_seeds(PlayerId::ZERO), 7);
}

#[tokio::test(start_paused = true)]
async fn test_next_move_waits_for_render() {
    let log = MemoryMoveLog::new();
    let game = GameId::new("slow");
    for (uid, house) in [("a", 0), ("b", 0), ("a", 1)] {
        log.append(
            &game,
            NewMove {
                uid: Uid::new(uid),
                house,
            },
        )
        .await
        .unwrap();
    }

    let presenter = Arc::new(RecordingPresenter::with_render_delay(Duration::from_millis(50)));
    let handle = SessionRunner::new(
        Arc::new(log.clone()),
        Arc::clone(&presenter) as Arc<dyn Presenter>,
        SyncConfig::default(),
        PlayerNames::default(),
    )
    .spawn(Session::new(
        game,
        Uid::new("a"),
        GameRole::Player0,
        &Default::default(),
    ))
    .await
    .unwrap();

    let mut rx = handle.watch();
    let mut seen = 0;
    while seen < 3 {
        rx.changed().await.unwrap();
        let folded = rx.borrow_and_update().history().len();
        // Opening frame plus two per folded move, and nothing beyond.
        assert_eq!(presenter.boards().len(), 1 + 2 * folded);
        seen = folded;
    }
}

#[tokio::test]
async fn test_redelivery_changes_nothing() {
    let t = table().await;
    let ts = t.alice.submit(2).await.unwrap();
    let ts = {
        applied(handle(&t.alice), ts).await;
        // House 2 ends in the store: alice goes again.
        t.alice.submit(0).await.unwrap()
    };
    let before = applied(handle(&t.bob), ts).await;

    t.log.redeliver(&t.game);
    let mut records = t.log.records(&t.game);
    records.reverse();
    t.log.deliver(&t.game, records);

    // A fresh move proves the duplicates were consumed first.
    let ts = t.bob.submit(0).await.unwrap();
    let after = applied(handle(&t.bob), ts).await;
    assert_eq!(after.history().len(), before.history().len() + 1);
    assert!(after
        .history()
        .iter()
        .zip(before.history().iter())
        .all(|(a, b)| a.timestamp == b.timestamp));
}

#[tokio::test]
async fn test_resume_from_snapshot_skips_folded_records() {
    let mut t = table().await;
    let ts = t.alice.submit(0).await.unwrap();
    let ts = {
        applied(handle(&t.bob), ts).await;
        t.bob.submit(1).await.unwrap()
    };
    let snapshot = applied(handle(&t.alice), ts).await.snapshot();
    let bytes = snapshot.to_bytes().unwrap();
    t.alice.leave();

    let restored = kalaha_sync::session::SessionSnapshot::from_bytes(&bytes).unwrap();
    let resumed = t
        .alice
        .resume_game(restored, PlayerNames::new("alice", "bob"))
        .await
        .unwrap()
        .current();
    assert!(resumed.history().is_empty());
    assert_eq!(resumed.last_applied(), Some(ts));

    let ts = t.alice.submit(3).await.unwrap();
    let after = applied(handle(&t.alice), ts).await;
    // Only the new move is folded; the replayed log prefix is skipped.
    assert_eq!(after.history().len(), 1);
    let b = applied(handle(&t.bob), ts).await;
    assert_eq!(after.board().mirrored(), *b.board());
}

#[tokio::test]
async fn test_late_delivery_is_refolded_in_order() {
    init_tracing();
    let log = MemoryMoveLog::new();
    let game = GameId::new("late");
    let presenter = Arc::new(RecordingPresenter::new());
    let handle = SessionRunner::new(
        Arc::new(log.clone()),
        Arc::clone(&presenter) as Arc<dyn Presenter>,
        SyncConfig::default(),
        PlayerNames::new("alice", "bob"),
    )
    .spawn(Session::new(
        game.clone(),
        Uid::new("a"),
        GameRole::Player0,
        &Default::default(),
    ))
    .await
    .unwrap();

    let opener = MoveRecord::new(
        NewMove {
            uid: Uid::new("a"),
            house: 0,
        },
        LogicalTimestamp::new(1),
    );
    let reply = MoveRecord::new(
        NewMove {
            uid: Uid::new("b"),
            house: 0,
        },
        LogicalTimestamp::new(2),
    );

    // The reply overtakes the opener and is rejected as out of turn.
    log.deliver(&game, vec![reply.clone()]);
    let early = applied(&handle, reply.timestamp).await;
    assert!(early.history().is_empty());

    log.deliver(&game, vec![opener, reply]);
    let s = tokio::time::timeout(
        Duration::from_secs(5),
        handle.wait_until(|s| s.history().len() == 2),
    )
    .await
    .expect("refold timed out")
    .unwrap();

    assert_eq!(s.board().slots(), &[0, 5, 5, 5, 5, 4, 0, 0, 5, 5, 5, 5, 4, 0]);
    assert!(s.is_local_turn());
    // Opening, opening again after the rewind, then two frames per move.
    let boards = presenter.boards();
    assert_eq!(boards.len(), 6);
    assert_eq!(boards[1], Board::default());
}
