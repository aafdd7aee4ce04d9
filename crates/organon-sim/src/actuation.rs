//! Simulated actuation interface
//!
//! Connections answer after a fixed latency with a squashed copy of the
//! encoded features. Faults are queued and consumed one per stimulate call.

use async_trait::async_trait;
use organon_core::{
    ActuationError, ActuationInterface, Connection, EncodedInput, Intermediate, NodeIdentity,
};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

/// Call counters shared by an interface and its connections
#[derive(Debug, Default)]
pub struct ActuationStats {
    /// Successful handshakes
    pub connects: AtomicUsize,
    /// Stimulate calls started
    pub stimulates: AtomicUsize,
    /// Disconnect calls that released a live connection
    pub disconnects: AtomicUsize,
}

impl ActuationStats {
    /// Read a counter
    #[must_use]
    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// Simulated actuation interface
pub struct SimActuation {
    handshake_delay: Duration,
    latency: Duration,
    unreachable: Mutex<HashSet<NodeIdentity>>,
    faults: Arc<Mutex<VecDeque<ActuationError>>>,
    stats: Arc<ActuationStats>,
}

impl Default for SimActuation {
    fn default() -> Self {
        Self::new()
    }
}

impl SimActuation {
    /// Create an interface that answers immediately
    #[must_use]
    pub fn new() -> Self {
        Self {
            handshake_delay: Duration::ZERO,
            latency: Duration::ZERO,
            unreachable: Mutex::new(HashSet::new()),
            faults: Arc::new(Mutex::new(VecDeque::new())),
            stats: Arc::new(ActuationStats::default()),
        }
    }

    /// Delay every handshake
    #[must_use]
    pub fn with_handshake_delay(mut self, delay: Duration) -> Self {
        self.handshake_delay = delay;
        self
    }

    /// Delay every stimulate call
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Refuse handshakes for `node`
    pub fn mark_unreachable(&self, node: impl Into<NodeIdentity>) {
        self.unreachable
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(node.into());
    }

    /// Fail the next stimulate call on any connection with `error`
    pub fn fail_next_stimulate(&self, error: ActuationError) {
        self.faults
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(error);
    }

    /// Shared call counters
    #[must_use]
    pub fn stats(&self) -> Arc<ActuationStats> {
        self.stats.clone()
    }
}

#[async_trait]
impl ActuationInterface for SimActuation {
    async fn connect(
        &self,
        node: &NodeIdentity,
        interface_kind: &str,
        _timeout: Duration,
    ) -> Result<Box<dyn Connection>, ActuationError> {
        if !self.handshake_delay.is_zero() {
            tokio::time::sleep(self.handshake_delay).await;
        }

        let unreachable = self
            .unreachable
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(node);
        if unreachable {
            return Err(ActuationError::Unreachable(node.to_string()));
        }

        self.stats.connects.fetch_add(1, Ordering::SeqCst);
        debug!(node = %node, interface = interface_kind, "Simulated handshake complete");
        Ok(Box::new(SimConnection {
            node: node.clone(),
            latency: self.latency,
            connected: AtomicBool::new(true),
            faults: self.faults.clone(),
            stats: self.stats.clone(),
        }))
    }
}

/// A simulated node connection
pub struct SimConnection {
    node: NodeIdentity,
    latency: Duration,
    connected: AtomicBool,
    faults: Arc<Mutex<VecDeque<ActuationError>>>,
    stats: Arc<ActuationStats>,
}

#[async_trait]
impl Connection for SimConnection {
    async fn stimulate(
        &self,
        encoded: &EncodedInput,
        intensity: f64,
    ) -> Result<Intermediate, ActuationError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(ActuationError::Disconnected);
        }
        self.stats.stimulates.fetch_add(1, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let fault = self
            .faults
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        if let Some(fault) = fault {
            return Err(fault);
        }

        let gain = intensity as f32;
        Ok(Intermediate {
            signal: encoded.features.iter().map(|f| (f * gain).tanh()).collect(),
        })
    }

    async fn disconnect(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            self.stats.disconnects.fetch_add(1, Ordering::SeqCst);
            debug!(node = %self.node, "Simulated connection released");
        }
    }
}
