//! Test doubles for the order store, counter store, and fulfillment action.
//!
//! These are used by the crate's own tests and by downstream integration
//! tests that need controllable failure behavior.

mod mock_action;
mod mock_counter_store;
mod mock_order_store;

pub use mock_action::ScriptedFulfillment;
pub use mock_counter_store::MemoryCounterStore;
pub use mock_order_store::MemoryOrderStore;
