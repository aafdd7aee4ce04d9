//! Simulation settings
//!
//! `SimConfig` is the `[sim]` section of the application config; `build`
//! turns it into a full collaborator set.

use organon_core::Collaborators;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::actuation::SimActuation;
use crate::encoder::FeatureEncoder;
use crate::health::ScriptedHealth;
use crate::model::SimModelStore;
use crate::policy::KeywordPolicy;

/// Settings for the simulated collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Load reported by the health monitor
    pub load: f64,
    /// Processing time reported by the health monitor, in seconds
    pub processing_time: f64,
    /// Handshake delay in milliseconds
    pub handshake_ms: u64,
    /// Stimulate latency in milliseconds
    pub latency_ms: u64,
    /// Terms rejected by the policy gate
    pub blocked_terms: Vec<String>,
    /// Model identifiers available in the store
    pub models: Vec<String>,
    /// Whether feedback writes fail
    pub feedback_fails: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            load: 0.3,
            processing_time: 0.05,
            handshake_ms: 0,
            latency_ms: 0,
            blocked_terms: Vec::new(),
            models: vec!["organoid-v1".to_string()],
            feedback_fails: false,
        }
    }
}

/// Collaborators built from a `SimConfig`, with handles for inspection
pub struct SimBundle {
    /// Collaborator set for a session
    pub collaborators: Collaborators,
    /// Actuation interface handle
    pub actuation: Arc<SimActuation>,
    /// Model store handle
    pub models: Arc<SimModelStore>,
    /// Health script handle
    pub health: Arc<ScriptedHealth>,
}

impl SimConfig {
    /// Build the simulated collaborators
    #[must_use]
    pub fn build(&self) -> SimBundle {
        let actuation = Arc::new(
            SimActuation::new()
                .with_handshake_delay(Duration::from_millis(self.handshake_ms))
                .with_latency(Duration::from_millis(self.latency_ms)),
        );
        let models = Arc::new(SimModelStore::new(self.models.iter().cloned()));
        models.set_storage_fails(self.feedback_fails);
        let health = Arc::new(ScriptedHealth::new(self.load, self.processing_time));

        let collaborators = Collaborators {
            actuation: actuation.clone(),
            models: models.clone(),
            health: health.clone(),
            policy: Arc::new(KeywordPolicy::new(&self.blocked_terms)),
            encoder: Arc::new(FeatureEncoder::new()),
        };

        SimBundle {
            collaborators,
            actuation,
            models,
            health,
        }
    }
}
