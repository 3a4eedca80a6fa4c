//! Client handle for the counter actor.

use tokio::sync::{mpsc, oneshot};

use super::actor::CounterCommand;
use super::{CounterError, CounterSnapshot};

/// Handle for talking to a running counter actor.
///
/// Cheaply cloneable; all clones funnel into the same actor task, which is
/// what serializes concurrent mutations.
#[derive(Clone)]
pub struct CounterHandle {
    tx: mpsc::Sender<CounterCommand>,
}

impl CounterHandle {
    pub(crate) fn new(tx: mpsc::Sender<CounterCommand>) -> Self {
        Self { tx }
    }

    /// Increment the queued-order count.
    pub async fn increment_queued(&self) -> Result<CounterSnapshot, CounterError> {
        self.call(|reply| CounterCommand::IncrementQueued { reply }).await
    }

    /// Increment the completed-order count.
    pub async fn increment_completed(&self) -> Result<CounterSnapshot, CounterError> {
        self.call(|reply| CounterCommand::IncrementCompleted { reply }).await
    }

    /// Read the current counts without mutating.
    pub async fn get(&self) -> Result<CounterSnapshot, CounterError> {
        self.call(|reply| CounterCommand::Get { reply }).await
    }

    /// Reset both counts to zero.
    pub async fn reset(&self) -> Result<CounterSnapshot, CounterError> {
        self.call(|reply| CounterCommand::Reset { reply }).await
    }

    /// Register a subscriber.
    ///
    /// The actor immediately pushes the current snapshot into `sink`, then
    /// one snapshot per mutation until the sink is closed or falls behind.
    pub async fn subscribe(
        &self,
        sink: mpsc::Sender<CounterSnapshot>,
    ) -> Result<(), CounterError> {
        self.tx
            .send(CounterCommand::Subscribe { sink })
            .await
            .map_err(|_| CounterError::Closed)
    }

    async fn call(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<CounterSnapshot, CounterError>>) -> CounterCommand,
    ) -> Result<CounterSnapshot, CounterError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| CounterError::Closed)?;
        reply_rx.await.map_err(|_| CounterError::Closed)?
    }
}
