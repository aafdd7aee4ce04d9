//! Session event sink.
//!
//! The orchestrator publishes one event per pipeline transition so that
//! callers can observe a node without parsing logs.

/// Broadcast channel wrapper.
pub mod bus;
/// Session event definitions.
pub mod types;

pub use bus::{EventBus, NodeEvents};
pub use types::SessionEvent;

#[cfg(test)]
mod tests;
