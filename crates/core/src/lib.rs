pub mod config;
pub mod counter;
pub mod fulfillment;
pub mod metrics;
pub mod order;
pub mod queue;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, CounterConfig,
    DatabaseConfig, ServerConfig,
};
pub use counter::{
    create_counter, subscriber_channel, CounterActor, CounterError, CounterHandle,
    CounterRegistry, CounterSnapshot, CounterState, CounterStore, SqliteCounterStore,
    DEFAULT_COUNTER_NAME,
};
pub use fulfillment::{
    FulfillmentAction, FulfillmentConfig, FulfillmentError, FulfillmentWorker,
    SimulatedFulfillment,
};
pub use order::{
    CreateOrderRequest, Order, OrderError, OrderFilter, OrderItem, OrderStatus, OrderStore,
    SqliteOrderStore,
};
pub use queue::{
    create_queue, BatchHandler, BatchOutcome, DeadLetterHandler, Delivery, OrderMessage,
    QueueConfig, QueueError, QueueProducer, QueueRunner,
};
