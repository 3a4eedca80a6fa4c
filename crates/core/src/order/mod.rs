//! Order records and their persistent store.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteOrderStore;
pub use store::{CreateOrderRequest, OrderError, OrderFilter, OrderStore};
pub use types::{Order, OrderItem, OrderStatus};
