//! The order counter: a single-writer actor with persisted state and a
//! self-pruning broadcast set.

mod actor;
mod handle;
mod registry;
mod sqlite;
mod store;
mod types;

pub use actor::{create_counter, subscriber_channel, CounterActor};
pub use handle::CounterHandle;
pub use registry::{CounterRegistry, DEFAULT_COUNTER_NAME};
pub use sqlite::SqliteCounterStore;
pub use store::{CounterError, CounterStore};
pub use types::{CounterSnapshot, CounterState};
