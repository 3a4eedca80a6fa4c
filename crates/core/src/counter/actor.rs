//! The counter actor.
//!
//! One long-lived task owns the counter state, its persistence, and the
//! subscriber set. Every caller funnels through the command channel, so two
//! concurrent increments can never race on a read-modify-write: each command
//! is handled to completion (mutate, persist, broadcast) before the next one
//! is dequeued.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::metrics::{COUNTER_MUTATIONS, COUNTER_SUBSCRIBERS_DROPPED};

use super::handle::CounterHandle;
use super::{CounterError, CounterSnapshot, CounterState, CounterStore};

/// Per-subscriber channel depth. A subscriber that falls this far behind is
/// treated as dead and pruned.
const SUBSCRIBER_BUFFER: usize = 32;

type Reply = tokio::sync::oneshot::Sender<Result<CounterSnapshot, CounterError>>;

/// Commands accepted by the counter actor.
pub(crate) enum CounterCommand {
    IncrementQueued { reply: Reply },
    IncrementCompleted { reply: Reply },
    Get { reply: Reply },
    Reset { reply: Reply },
    Subscribe { sink: mpsc::Sender<CounterSnapshot> },
}

/// The actor task. Owns state exclusively; no locks.
pub struct CounterActor {
    name: String,
    rx: mpsc::Receiver<CounterCommand>,
    store: Arc<dyn CounterStore>,
    state: CounterState,
    subscribers: Vec<mpsc::Sender<CounterSnapshot>>,
}

/// Create a counter actor and its handle.
///
/// Spawn the actor with `tokio::spawn(actor.run())`; clone the handle freely.
pub fn create_counter(
    name: impl Into<String>,
    store: Arc<dyn CounterStore>,
    buffer_size: usize,
) -> (CounterHandle, CounterActor) {
    let (tx, rx) = mpsc::channel(buffer_size);
    let handle = CounterHandle::new(tx);
    let actor = CounterActor {
        name: name.into(),
        rx,
        store,
        state: CounterState::default(),
        subscribers: Vec::new(),
    };
    (handle, actor)
}

/// Recommended per-subscriber channel capacity for callers building sinks.
pub fn subscriber_channel() -> (mpsc::Sender<CounterSnapshot>, mpsc::Receiver<CounterSnapshot>) {
    mpsc::channel(SUBSCRIBER_BUFFER)
}

impl CounterActor {
    /// Run the actor, consuming commands until every handle is dropped.
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) {
        // Cold start: pick up whatever was persisted; first activation
        // defaults to zeroes.
        match self.store.load(&self.name) {
            Ok(Some(state)) => {
                debug!(
                    "Counter '{}' restored (queued {}, completed {})",
                    self.name, state.queued_count, state.completed_count
                );
                self.state = state;
            }
            Ok(None) => debug!("Counter '{}' starting fresh", self.name),
            Err(e) => error!("Failed to load counter '{}': {}", self.name, e),
        }

        info!("Counter actor '{}' started", self.name);

        while let Some(command) = self.rx.recv().await {
            self.handle_command(command);
        }

        info!("Counter actor '{}' shutting down", self.name);
    }

    fn handle_command(&mut self, command: CounterCommand) {
        match command {
            CounterCommand::IncrementQueued { reply } => {
                COUNTER_MUTATIONS.with_label_values(&["increment_queued"]).inc();
                let result = self.mutate(|state| state.queued_count += 1);
                let _ = reply.send(result);
            }
            CounterCommand::IncrementCompleted { reply } => {
                COUNTER_MUTATIONS
                    .with_label_values(&["increment_completed"])
                    .inc();
                let result = self.mutate(|state| state.completed_count += 1);
                let _ = reply.send(result);
            }
            CounterCommand::Get { reply } => {
                let _ = reply.send(Ok(self.snapshot()));
            }
            CounterCommand::Reset { reply } => {
                COUNTER_MUTATIONS.with_label_values(&["reset"]).inc();
                let result = self.mutate(|state| *state = CounterState::default());
                let _ = reply.send(result);
            }
            CounterCommand::Subscribe { sink } => {
                // New subscribers get the current snapshot right away.
                let snapshot = self.snapshot();
                match sink.try_send(snapshot) {
                    Ok(()) => self.subscribers.push(sink),
                    Err(_) => debug!("Counter '{}' subscriber rejected at handshake", self.name),
                }
            }
        }
    }

    /// Apply a mutation, persist it, and broadcast the result.
    ///
    /// A failed persist rolls the in-memory state back and skips the
    /// broadcast, so memory, disk, and subscribers stay consistent.
    fn mutate(
        &mut self,
        apply: impl FnOnce(&mut CounterState),
    ) -> Result<CounterSnapshot, CounterError> {
        let previous = self.state;
        apply(&mut self.state);

        if let Err(e) = self.store.save(&self.name, &self.state) {
            error!("Failed to persist counter '{}': {}", self.name, e);
            self.state = previous;
            return Err(e);
        }

        let snapshot = self.snapshot();
        self.broadcast(snapshot);
        Ok(snapshot)
    }

    /// Push `snapshot` to every subscriber, pruning the ones that fail.
    fn broadcast(&mut self, snapshot: CounterSnapshot) {
        let before = self.subscribers.len();
        // try_send so one stalled subscriber cannot block the actor loop.
        self.subscribers.retain(|sink| sink.try_send(snapshot).is_ok());
        let dropped = before - self.subscribers.len();
        if dropped > 0 {
            debug!("Counter '{}' pruned {} subscriber(s)", self.name, dropped);
            COUNTER_SUBSCRIBERS_DROPPED.inc_by(dropped as u64);
        }
    }

    fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot::of(&self.state, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryCounterStore;

    fn spawn_counter() -> (CounterHandle, Arc<MemoryCounterStore>) {
        let store = Arc::new(MemoryCounterStore::new());
        let (handle, actor) = create_counter("orders", store.clone() as Arc<dyn CounterStore>, 64);
        tokio::spawn(actor.run());
        (handle, store)
    }

    #[tokio::test]
    async fn test_increment_returns_new_snapshot() {
        let (handle, _store) = spawn_counter();

        let snapshot = handle.increment_queued().await.unwrap();
        assert_eq!(snapshot.queued_count, 1);
        assert_eq!(snapshot.completed_count, 0);

        let snapshot = handle.increment_completed().await.unwrap();
        assert_eq!(snapshot.queued_count, 1);
        assert_eq!(snapshot.completed_count, 1);
    }

    #[tokio::test]
    async fn test_get_does_not_mutate() {
        let (handle, _store) = spawn_counter();

        handle.increment_queued().await.unwrap();
        let a = handle.get().await.unwrap();
        let b = handle.get().await.unwrap();
        assert_eq!(a.queued_count, 1);
        assert_eq!(b.queued_count, 1);
    }

    #[tokio::test]
    async fn test_mutations_are_persisted() {
        let (handle, store) = spawn_counter();

        handle.increment_completed().await.unwrap();
        handle.increment_completed().await.unwrap();

        let saved = store.load("orders").unwrap().unwrap();
        assert_eq!(saved.completed_count, 2);
    }

    #[tokio::test]
    async fn test_concurrent_increments_lose_no_updates() {
        let (handle, _store) = spawn_counter();
        handle.reset().await.unwrap();

        let mut tasks = Vec::new();
        for _ in 0..200 {
            let handle = handle.clone();
            tasks.push(tokio::spawn(async move {
                handle.increment_completed().await.unwrap()
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let snapshot = handle.get().await.unwrap();
        assert_eq!(snapshot.completed_count, 200);
        assert_eq!(snapshot.queued_count, 0);
    }

    #[tokio::test]
    async fn test_cold_start_restores_persisted_state() {
        let store = Arc::new(MemoryCounterStore::new());
        store
            .save(
                "orders",
                &CounterState {
                    queued_count: 8,
                    completed_count: 5,
                },
            )
            .unwrap();

        let (handle, actor) = create_counter("orders", store as Arc<dyn CounterStore>, 16);
        tokio::spawn(actor.run());

        let snapshot = handle.get().await.unwrap();
        assert_eq!(snapshot.queued_count, 8);
        assert_eq!(snapshot.completed_count, 5);
    }

    #[tokio::test]
    async fn test_subscriber_gets_snapshot_on_subscribe_then_updates() {
        let (handle, _store) = spawn_counter();

        let (sink, mut rx) = subscriber_channel();
        handle.subscribe(sink).await.unwrap();

        let initial = rx.recv().await.unwrap();
        assert_eq!(initial.queued_count, 0);
        assert_eq!(initial.completed_count, 0);

        handle.increment_completed().await.unwrap();
        let update = rx.recv().await.unwrap();
        assert_eq!(update.completed_count, 1);
    }

    #[tokio::test]
    async fn test_reset_broadcasts_zeroed_snapshot_to_all_subscribers() {
        let (handle, _store) = spawn_counter();
        handle.increment_queued().await.unwrap();

        let (sink_a, mut rx_a) = subscriber_channel();
        let (sink_b, mut rx_b) = subscriber_channel();
        handle.subscribe(sink_a).await.unwrap();
        handle.subscribe(sink_b).await.unwrap();
        rx_a.recv().await.unwrap();
        rx_b.recv().await.unwrap();

        handle.reset().await.unwrap();

        let a = rx_a.recv().await.unwrap();
        let b = rx_b.recv().await.unwrap();
        assert_eq!((a.queued_count, a.completed_count), (0, 0));
        assert_eq!((b.queued_count, b.completed_count), (0, 0));
    }

    #[tokio::test]
    async fn test_dead_subscriber_is_pruned_without_breaking_others() {
        let (handle, _store) = spawn_counter();

        let (sink_dead, rx_dead) = subscriber_channel();
        let (sink_live, mut rx_live) = subscriber_channel();
        handle.subscribe(sink_dead).await.unwrap();
        handle.subscribe(sink_live).await.unwrap();
        rx_live.recv().await.unwrap();

        drop(rx_dead);

        handle.increment_completed().await.unwrap();
        let update = rx_live.recv().await.unwrap();
        assert_eq!(update.completed_count, 1);

        // Another mutation still works with the dead sink gone.
        handle.increment_completed().await.unwrap();
        let update = rx_live.recv().await.unwrap();
        assert_eq!(update.completed_count, 2);
    }

    #[tokio::test]
    async fn test_persist_failure_rolls_back_and_surfaces_error() {
        let store = Arc::new(MemoryCounterStore::new());
        let (handle, actor) = create_counter("orders", store.clone() as Arc<dyn CounterStore>, 16);
        tokio::spawn(actor.run());

        handle.increment_completed().await.unwrap();

        store.fail_saves(true);
        let result = handle.increment_completed().await;
        assert!(matches!(result, Err(CounterError::Database(_))));

        // The failed increment must not be visible.
        store.fail_saves(false);
        let snapshot = handle.get().await.unwrap();
        assert_eq!(snapshot.completed_count, 1);
    }

    #[tokio::test]
    async fn test_calls_fail_cleanly_after_actor_stops() {
        let store = Arc::new(MemoryCounterStore::new());
        let (handle, actor) = create_counter("orders", store as Arc<dyn CounterStore>, 16);
        drop(actor);

        assert!(matches!(handle.get().await, Err(CounterError::Closed)));
        assert!(matches!(
            handle.increment_queued().await,
            Err(CounterError::Closed)
        ));
    }
}
