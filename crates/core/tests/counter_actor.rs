//! Counter actor integration tests against real SQLite persistence.

use std::sync::Arc;

use tempfile::TempDir;

use orderline_core::{
    create_counter, subscriber_channel, CounterStore, SqliteCounterStore,
};

fn sqlite_store(temp_dir: &TempDir) -> Arc<SqliteCounterStore> {
    let db_path = temp_dir.path().join("counter.db");
    Arc::new(SqliteCounterStore::new(&db_path).expect("Failed to create counter store"))
}

#[tokio::test]
async fn test_concurrent_increments_against_reset_counter() {
    let temp_dir = TempDir::new().unwrap();
    let store = sqlite_store(&temp_dir);

    let (handle, actor) = create_counter("orders", store.clone() as Arc<dyn CounterStore>, 256);
    tokio::spawn(actor.run());

    handle.reset().await.unwrap();

    let mut tasks = Vec::new();
    for _ in 0..200 {
        let handle = handle.clone();
        tasks.push(tokio::spawn(async move {
            handle.increment_completed().await.unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let snapshot = handle.get().await.unwrap();
    assert_eq!(snapshot.completed_count, 200, "no lost updates");
    assert_eq!(snapshot.queued_count, 0);

    // Persistence matches the in-memory result.
    let persisted = store.load("orders").unwrap().unwrap();
    assert_eq!(persisted.completed_count, 200);
}

#[tokio::test]
async fn test_cold_start_subscriber_sees_persisted_then_live_updates() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("counter.db");

    // A previous activation left state behind.
    {
        let store = Arc::new(SqliteCounterStore::new(&db_path).unwrap());
        let (handle, actor) = create_counter("orders", store as Arc<dyn CounterStore>, 16);
        tokio::spawn(actor.run());
        handle.increment_queued().await.unwrap();
        handle.increment_queued().await.unwrap();
        handle.increment_completed().await.unwrap();
    }

    // Fresh activation over the same database.
    let store = Arc::new(SqliteCounterStore::new(&db_path).unwrap());
    let (handle, actor) = create_counter("orders", store as Arc<dyn CounterStore>, 16);
    tokio::spawn(actor.run());

    let (sink, mut rx) = subscriber_channel();
    handle.subscribe(sink).await.unwrap();

    let initial = rx.recv().await.unwrap();
    assert_eq!(initial.queued_count, 2);
    assert_eq!(initial.completed_count, 1);

    handle.increment_completed().await.unwrap();
    let update = rx.recv().await.unwrap();
    assert_eq!(update.completed_count, 2);
}

#[tokio::test]
async fn test_fresh_counter_pushes_zero_snapshot_then_increment() {
    let temp_dir = TempDir::new().unwrap();
    let store = sqlite_store(&temp_dir);

    let (handle, actor) = create_counter("orders", store as Arc<dyn CounterStore>, 16);
    tokio::spawn(actor.run());

    // Subscriber connects to a counter that has never been written.
    let (sink, mut rx) = subscriber_channel();
    handle.subscribe(sink).await.unwrap();

    let initial = rx.recv().await.unwrap();
    assert_eq!(initial.completed_count, 0);
    assert_eq!(initial.queued_count, 0);

    // One external mutation arrives without the subscriber polling.
    handle.increment_completed().await.unwrap();
    let update = rx.recv().await.unwrap();
    assert_eq!(update.completed_count, 1);
    assert_eq!(update.queued_count, 0);
}

#[tokio::test]
async fn test_reset_zeroes_and_reaches_every_subscriber() {
    let temp_dir = TempDir::new().unwrap();
    let store = sqlite_store(&temp_dir);

    let (handle, actor) = create_counter("orders", store.clone() as Arc<dyn CounterStore>, 16);
    tokio::spawn(actor.run());

    for _ in 0..5 {
        handle.increment_queued().await.unwrap();
        handle.increment_completed().await.unwrap();
    }

    let mut receivers = Vec::new();
    for _ in 0..3 {
        let (sink, mut rx) = subscriber_channel();
        handle.subscribe(sink).await.unwrap();
        // Drain the handshake snapshot.
        rx.recv().await.unwrap();
        receivers.push(rx);
    }

    let snapshot = handle.reset().await.unwrap();
    assert_eq!(snapshot.queued_count, 0);
    assert_eq!(snapshot.completed_count, 0);

    for rx in &mut receivers {
        let pushed = rx.recv().await.unwrap();
        assert_eq!(pushed.queued_count, 0);
        assert_eq!(pushed.completed_count, 0);
    }

    let persisted = store.load("orders").unwrap().unwrap();
    assert_eq!(persisted.queued_count, 0);
    assert_eq!(persisted.completed_count, 0);
}

#[tokio::test]
async fn test_interleaved_queued_and_completed_increments() {
    let temp_dir = TempDir::new().unwrap();
    let store = sqlite_store(&temp_dir);

    let (handle, actor) = create_counter("orders", store as Arc<dyn CounterStore>, 256);
    tokio::spawn(actor.run());

    let mut tasks = Vec::new();
    for i in 0..100 {
        let handle = handle.clone();
        tasks.push(tokio::spawn(async move {
            if i % 2 == 0 {
                handle.increment_queued().await.unwrap();
            } else {
                handle.increment_completed().await.unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let snapshot = handle.get().await.unwrap();
    assert_eq!(snapshot.queued_count, 50);
    assert_eq!(snapshot.completed_count, 50);
}
