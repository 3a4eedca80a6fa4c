//! Directory of live counter handles.
//!
//! Components reach the counter through this registry by its fixed logical
//! name rather than through a global; one deployment registers exactly one
//! authoritative handle per name.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::CounterHandle;

/// Logical name of the deployment's order counter.
pub const DEFAULT_COUNTER_NAME: &str = "orders";

/// Maps logical names to handles of running counter actors.
#[derive(Clone, Default)]
pub struct CounterRegistry {
    inner: Arc<RwLock<HashMap<String, CounterHandle>>>,
}

impl CounterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handle under `name`, replacing any previous registration.
    pub fn register(&self, name: impl Into<String>, handle: CounterHandle) {
        self.inner.write().unwrap().insert(name.into(), handle);
    }

    /// Look up the handle registered under `name`.
    pub fn get(&self, name: &str) -> Option<CounterHandle> {
        self.inner.read().unwrap().get(name).cloned()
    }
}
