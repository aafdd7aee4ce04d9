//! Organon Core - Gated Session Orchestrator
//!
//! This crate sequences requests for one actuation node through a fixed,
//! gated pipeline:
//! - Policy: payloads are validated before any resource is engaged
//! - Load: the node's live load must stay under the configured ceiling
//! - Encode, Stimulate, Decode: the only stages that touch the node and model
//! - Feedback: best-effort recording of (signal, response) pairs
//!
//! Every stage failure is turned into a [`ThinkResult`]; only construction
//! and calls on a closed session return an [`Error`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod collaborators;
pub mod error;
pub mod event_bus;
pub mod orchestrator;
pub mod pool;
pub mod types;

pub use collaborators::{
    ActuationInterface, Collaborators, Connection, Encoder, HealthMonitor, HealthMonitorFactory,
    ModelStore, PolicyGate, ResponseModel,
};
pub use error::{
    format_error_for_cli, ActuationError, EncodeError, Error, HealthError, ModelError, Result,
    UserFriendlyError,
};
pub use event_bus::{EventBus, NodeEvents, SessionEvent};
pub use orchestrator::{
    OrchestratorConfig, ResponseMetadata, SessionBuilder, SessionOrchestrator, SessionState,
    StageKind, ThinkOptions, ThinkResult, NODE_OVERLOADED, POLICY_VIOLATION, STIMULATE_CANCELLED,
};
pub use pool::NodePool;
pub use types::{
    EncodedInput, HealthReading, Intermediate, Metrics, Modality, NodeIdentity, Payload, Request,
};
