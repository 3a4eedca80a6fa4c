//! HTTP/WebSocket server for the order fulfillment service.
//!
//! Exposed as a library so integration tests can build the router and state
//! in-process; the `orderline` binary wires the same pieces to a socket.

pub mod api;
pub mod metrics;
pub mod state;
