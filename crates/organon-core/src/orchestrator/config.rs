//! Orchestrator configuration
//!
//! - `OrchestratorConfig` holds the per-session settings fixed at construction
//! - `ThinkOptions` carries per-call bounds for the stimulate stage

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Configuration for a session orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Maximum acceptable load in [0, 1]
    pub load_ceiling: f64,
    /// Interface kind requested in the actuation handshake
    pub interface_kind: String,
    /// Upper bound on the actuation handshake, in milliseconds
    pub connect_timeout_ms: u64,
    /// Default upper bound on a stimulate call, in milliseconds (None = unbounded)
    pub stimulate_timeout_ms: Option<u64>,
    /// Intensity passed to every stimulate call
    pub intensity: f64,
    /// Whether decode runs with neurofeedback enabled
    pub neurofeedback: bool,
    /// Context tag passed to decode
    pub decode_context: String,
    /// Storage reference for model loading and feedback recording
    pub storage_ref: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            load_ceiling: 0.8,
            interface_kind: "mea".to_string(),
            connect_timeout_ms: 30_000,
            stimulate_timeout_ms: None,
            intensity: 0.5,
            neurofeedback: true,
            decode_context: "neural_response".to_string(),
            storage_ref: "feedback".to_string(),
        }
    }
}

impl OrchestratorConfig {
    /// Create a new configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the load ceiling
    #[must_use]
    pub fn with_load_ceiling(mut self, ceiling: f64) -> Self {
        self.load_ceiling = ceiling;
        self
    }

    /// Set the connect timeout.
    ///
    /// Sub-millisecond remainders round up; a zero duration is kept and
    /// rejected by `validate`.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = millis_ceil(timeout);
        self
    }

    /// Set the default stimulate timeout, rounded like `with_connect_timeout`
    #[must_use]
    pub fn with_stimulate_timeout(mut self, timeout: Duration) -> Self {
        self.stimulate_timeout_ms = Some(millis_ceil(timeout));
        self
    }

    /// Set the storage reference
    #[must_use]
    pub fn with_storage_ref(mut self, storage_ref: impl Into<String>) -> Self {
        self.storage_ref = storage_ref.into();
        self
    }

    /// Handshake timeout as a `Duration`
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Default stimulate timeout as a `Duration`
    #[must_use]
    pub fn stimulate_timeout(&self) -> Option<Duration> {
        self.stimulate_timeout_ms.map(Duration::from_millis)
    }

    /// Check that every setting is usable.
    pub fn validate(&self) -> Result<()> {
        if !self.load_ceiling.is_finite() || !(0.0..=1.0).contains(&self.load_ceiling) {
            return Err(invalid(
                "orchestrator.load_ceiling",
                format!("must be within [0, 1], got {}", self.load_ceiling),
            ));
        }
        if self.connect_timeout_ms == 0 {
            return Err(invalid(
                "orchestrator.connect_timeout_ms",
                "must be greater than zero",
            ));
        }
        if self.stimulate_timeout_ms == Some(0) {
            return Err(invalid(
                "orchestrator.stimulate_timeout_ms",
                "must be greater than zero when set",
            ));
        }
        if !self.intensity.is_finite() || self.intensity < 0.0 {
            return Err(invalid(
                "orchestrator.intensity",
                format!("must be a non-negative number, got {}", self.intensity),
            ));
        }
        if self.interface_kind.trim().is_empty() {
            return Err(invalid("orchestrator.interface_kind", "must not be empty"));
        }
        Ok(())
    }
}

/// Whole milliseconds in `timeout`, rounded up and saturating at `u64::MAX`
fn millis_ceil(timeout: Duration) -> u64 {
    let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
    if timeout.subsec_nanos() % 1_000_000 != 0 {
        millis.saturating_add(1)
    } else {
        millis
    }
}

fn invalid(field: &str, message: impl Into<String>) -> Error {
    Error::InvalidConfig {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Per-call options for `think_with`
#[derive(Debug, Clone, Default)]
pub struct ThinkOptions {
    /// Upper bound on the stimulate stage, overriding the configured default
    pub timeout: Option<Duration>,
    /// Cancels a pending stimulate call
    pub cancel: Option<CancellationToken>,
}

impl ThinkOptions {
    /// Create empty options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the stimulate stage
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attach a cancellation token
    #[must_use]
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}
