use std::sync::Arc;

use orderline_core::{Config, CounterHandle, CounterRegistry, OrderStore, QueueProducer};

/// Shared application state
pub struct AppState {
    config: Config,
    order_store: Arc<dyn OrderStore>,
    counter_registry: CounterRegistry,
    counter_name: String,
    producer: QueueProducer,
}

impl AppState {
    pub fn new(
        config: Config,
        order_store: Arc<dyn OrderStore>,
        counter_registry: CounterRegistry,
        producer: QueueProducer,
    ) -> Self {
        let counter_name = config.counter.name.clone();
        Self {
            config,
            order_store,
            counter_registry,
            counter_name,
            producer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn order_store(&self) -> &dyn OrderStore {
        self.order_store.as_ref()
    }

    /// Look up the deployment's counter by its logical name.
    pub fn counter(&self) -> Option<CounterHandle> {
        self.counter_registry.get(&self.counter_name)
    }

    pub fn producer(&self) -> &QueueProducer {
        &self.producer
    }
}
