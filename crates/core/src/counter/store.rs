//! Counter persistence trait.

use thiserror::Error;

use super::CounterState;

/// Error type for counter operations.
#[derive(Debug, Error)]
pub enum CounterError {
    /// Database error while loading or saving counter state.
    #[error("counter database error: {0}")]
    Database(String),

    /// The counter actor is no longer running.
    #[error("counter actor is not running")]
    Closed,
}

/// Trait for counter storage backends.
///
/// State is keyed by the counter's logical name; one row per deployment.
pub trait CounterStore: Send + Sync {
    /// Load persisted state, or `None` if this counter has never been saved.
    fn load(&self, name: &str) -> Result<Option<CounterState>, CounterError>;

    /// Persist the state pair atomically.
    fn save(&self, name: &str, state: &CounterState) -> Result<(), CounterError>;
}
