//! Node pool
//!
//! Shards sessions by node identity. Each node keeps its own exclusive
//! session; throughput grows by adding nodes, never by sharing one.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::collaborators::Collaborators;
use crate::error::{Error, Result};
use crate::event_bus::EventBus;
use crate::orchestrator::{OrchestratorConfig, SessionOrchestrator, ThinkOptions, ThinkResult};
use crate::types::{NodeIdentity, Request};

/// Pool entry for one node
enum Slot {
    /// Handshake in progress; the identity is reserved
    Connecting,
    /// Ready for requests
    Open(Arc<SessionOrchestrator>),
}

/// Sessions keyed by node identity.
///
/// No map guard is held across an await, so a slow handshake on one node
/// does not stall requests to the others.
pub struct NodePool {
    collaborators: Collaborators,
    config: OrchestratorConfig,
    event_bus: Option<Arc<EventBus>>,
    sessions: DashMap<NodeIdentity, Slot>,
}

/// Reservation of a node identity while its session connects.
///
/// Dropping it without `fill` frees the identity again, which also covers
/// an `open` future cancelled mid-handshake.
struct Reservation<'a> {
    sessions: &'a DashMap<NodeIdentity, Slot>,
    node: Option<NodeIdentity>,
}

impl Reservation<'_> {
    fn fill(mut self, session: Arc<SessionOrchestrator>) {
        if let Some(node) = self.node.take() {
            self.sessions.insert(node, Slot::Open(session));
        }
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if let Some(node) = self.node.take() {
            debug!(node = %node, "Releasing node reservation");
            self.sessions.remove(&node);
        }
    }
}

impl NodePool {
    /// Create an empty pool sharing one set of collaborators
    #[must_use]
    pub fn new(collaborators: Collaborators, config: OrchestratorConfig) -> Self {
        Self {
            collaborators,
            config,
            event_bus: None,
            sessions: DashMap::new(),
        }
    }

    /// Attach an event bus to every session opened afterwards
    #[must_use]
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Open a session for `node`.
    ///
    /// The identity is reserved before connecting, so a node is never
    /// connected twice. Other nodes stay usable during the handshake.
    pub async fn open(
        &self,
        node: impl Into<NodeIdentity>,
        model_id: impl Into<String>,
    ) -> Result<Arc<SessionOrchestrator>> {
        let node = node.into();
        match self.sessions.entry(node.clone()) {
            Entry::Occupied(_) => return Err(Error::NodeAlreadyOpen(node.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(Slot::Connecting);
            }
        }
        let reservation = Reservation {
            sessions: &self.sessions,
            node: Some(node.clone()),
        };

        let mut builder = SessionOrchestrator::builder(node, model_id, self.collaborators.clone())
            .with_config(self.config.clone());
        if let Some(bus) = &self.event_bus {
            builder = builder.with_event_bus(bus.clone());
        }
        let session = Arc::new(builder.connect().await?);

        reservation.fill(session.clone());
        Ok(session)
    }

    /// Session for `node`, if open
    pub async fn get(&self, node: &NodeIdentity) -> Option<Arc<SessionOrchestrator>> {
        let slot = self.sessions.get(node)?;
        match slot.value() {
            Slot::Open(session) => Some(session.clone()),
            Slot::Connecting => None,
        }
    }

    /// Identities of all open nodes; nodes still connecting are left out
    pub async fn nodes(&self) -> Vec<NodeIdentity> {
        self.sessions
            .iter()
            .filter(|entry| matches!(entry.value(), Slot::Open(_)))
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Route a request to the session for `node`
    pub async fn think(&self, node: &NodeIdentity, request: Request) -> Result<ThinkResult> {
        self.think_with(node, request, ThinkOptions::default()).await
    }

    /// Route a request to the session for `node` with per-call options
    pub async fn think_with(
        &self,
        node: &NodeIdentity,
        request: Request,
        options: ThinkOptions,
    ) -> Result<ThinkResult> {
        let session = self
            .get(node)
            .await
            .ok_or_else(|| Error::UnknownNode(node.to_string()))?;
        session.think_with(request, options).await
    }

    /// Remove `node` from the pool and shut its session down
    pub async fn close(&self, node: &NodeIdentity) -> Result<()> {
        match self
            .sessions
            .remove_if(node, |_, slot| matches!(slot, Slot::Open(_)))
        {
            Some((_, Slot::Open(session))) => session.shutdown().await,
            _ => Err(Error::UnknownNode(node.to_string())),
        }
    }

    /// Shut down every open session, returning how many closed cleanly.
    ///
    /// Handshakes still in progress are not waited for.
    pub async fn shutdown_all(&self) -> usize {
        let mut closed = 0;
        for node in self.nodes().await {
            let Some((node, Slot::Open(session))) = self
                .sessions
                .remove_if(&node, |_, slot| matches!(slot, Slot::Open(_)))
            else {
                continue;
            };
            match session.shutdown().await {
                Ok(()) => closed += 1,
                Err(e) => warn!(node = %node, error = %e, "Session shutdown failed"),
            }
        }
        info!(closed, "Node pool shut down");
        closed
    }
}
