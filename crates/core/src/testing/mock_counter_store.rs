//! In-memory counter store for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::counter::{CounterError, CounterState, CounterStore};

/// In-memory implementation of the CounterStore trait.
#[derive(Default)]
pub struct MemoryCounterStore {
    states: Mutex<HashMap<String, CounterState>>,
    fail_saves: AtomicBool,
}

impl MemoryCounterStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent saves fail with a database error.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// The state last saved under `name`, if any.
    pub fn saved(&self, name: &str) -> Option<CounterState> {
        self.states.lock().unwrap().get(name).copied()
    }
}

impl CounterStore for MemoryCounterStore {
    fn load(&self, name: &str) -> Result<Option<CounterState>, CounterError> {
        Ok(self.states.lock().unwrap().get(name).copied())
    }

    fn save(&self, name: &str, state: &CounterState) -> Result<(), CounterError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(CounterError::Database("injected failure".to_string()));
        }
        self.states
            .lock()
            .unwrap()
            .insert(name.to_string(), *state);
        Ok(())
    }
}
