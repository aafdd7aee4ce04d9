//! Collaborator contracts
//!
//! The orchestrator only talks to the outside world through these traits.
//! Stimulate is the one call that may suspend on the external resource;
//! construction-time `connect` and `load` are async as well.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ActuationError, EncodeError, HealthError, ModelError};
use crate::types::{
    EncodedInput, HealthReading, Intermediate, Metrics, Modality, NodeIdentity, Payload,
};

/// Validates request payloads against an opaque rule set.
pub trait PolicyGate: Send + Sync {
    /// Returns `true` when the payload may be processed.
    fn validate_input(&self, payload: &Payload) -> bool;
}

/// Transforms a raw payload into the encoded representation.
pub trait Encoder: Send + Sync {
    /// Encode a payload for the given modality.
    fn encode(&self, payload: &Payload, modality: Modality)
        -> Result<EncodedInput, EncodeError>;
}

/// Health readings for one node.
pub trait HealthMonitor: Send + Sync {
    /// Current load reading.
    fn check_health(&self) -> Result<HealthReading, HealthError>;

    /// Load and processing time.
    fn metrics(&self) -> Result<Metrics, HealthError>;
}

/// Binds a health monitor to a node.
pub trait HealthMonitorFactory: Send + Sync {
    /// Create a monitor for `node` with the given load ceiling.
    fn bind(
        &self,
        node: &NodeIdentity,
        load_ceiling: f64,
    ) -> Result<Box<dyn HealthMonitor>, HealthError>;
}

/// Entry point to the actuation resource.
#[async_trait]
pub trait ActuationInterface: Send + Sync {
    /// Perform the interface handshake for `node`.
    async fn connect(
        &self,
        node: &NodeIdentity,
        interface_kind: &str,
        timeout: Duration,
    ) -> Result<Box<dyn Connection>, ActuationError>;
}

/// An exclusive connection to one node.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Engage the resource with an encoded input.
    async fn stimulate(
        &self,
        encoded: &EncodedInput,
        intensity: f64,
    ) -> Result<Intermediate, ActuationError>;

    /// Release the connection. Idempotent.
    async fn disconnect(&self);
}

/// Backing store for response models.
#[async_trait]
pub trait ModelStore: Send + Sync {
    /// Load the model `model_id` from `storage_ref`.
    async fn load(
        &self,
        model_id: &str,
        storage_ref: &str,
    ) -> Result<Box<dyn ResponseModel>, ModelError>;
}

/// A loaded response model.
pub trait ResponseModel: Send + Sync {
    /// Decode an intermediate representation into a response.
    fn decode(
        &self,
        intermediate: &Intermediate,
        neurofeedback: bool,
        context: &str,
    ) -> Result<String, ModelError>;

    /// Record an (intermediate, response) pair for later reuse.
    fn store_feedback(
        &self,
        intermediate: &Intermediate,
        response: &str,
        storage_ref: &str,
    ) -> Result<(), ModelError>;

    /// Release the model.
    fn unload(&self);
}

/// The full set of collaborators a session is built from.
#[derive(Clone)]
pub struct Collaborators {
    /// Actuation interface
    pub actuation: Arc<dyn ActuationInterface>,
    /// Response model store
    pub models: Arc<dyn ModelStore>,
    /// Health monitor factory
    pub health: Arc<dyn HealthMonitorFactory>,
    /// Policy gate
    pub policy: Arc<dyn PolicyGate>,
    /// Input encoder
    pub encoder: Arc<dyn Encoder>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
