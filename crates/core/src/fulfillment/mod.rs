//! Asynchronous order fulfillment.

mod action;
mod config;
mod types;
mod worker;

pub use action::{FulfillmentAction, SimulatedFulfillment};
pub use config::FulfillmentConfig;
pub use types::FulfillmentError;
pub use worker::FulfillmentWorker;
