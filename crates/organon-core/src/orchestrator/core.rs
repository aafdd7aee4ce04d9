//! Orchestrator core structure
//!
//! Contains `SessionOrchestrator`, its builder, and construction. A session
//! only exists once the connection, the model and the health monitor have
//! all been acquired; any failure releases what was acquired so far.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::collaborators::{
    Collaborators, Connection, Encoder, HealthMonitor, PolicyGate, ResponseModel,
};
use crate::error::{Error, Result};
use crate::event_bus::{EventBus, SessionEvent};
use crate::types::NodeIdentity;

use super::config::OrchestratorConfig;
use super::types::SessionState;

/// Resources held while the session is Ready.
pub(crate) struct LiveSession {
    pub(crate) connection: Box<dyn Connection>,
    pub(crate) model: Box<dyn ResponseModel>,
    pub(crate) health: Box<dyn HealthMonitor>,
}

/// Orchestrates the gated pipeline for one node.
pub struct SessionOrchestrator {
    pub(crate) node: NodeIdentity,
    pub(crate) model_id: String,
    pub(crate) config: OrchestratorConfig,
    pub(crate) policy: Arc<dyn PolicyGate>,
    pub(crate) encoder: Arc<dyn Encoder>,
    /// Held across the load check through decode; `None` once closed
    pub(crate) session: Mutex<Option<LiveSession>>,
    pub(crate) state: AtomicU8,
    pub(crate) event_bus: Option<Arc<EventBus>>,
}

impl std::fmt::Debug for SessionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionOrchestrator")
            .field("node", &self.node)
            .field("model_id", &self.model_id)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Builder for [`SessionOrchestrator`]
pub struct SessionBuilder {
    node: NodeIdentity,
    model_id: String,
    collaborators: Collaborators,
    config: OrchestratorConfig,
    event_bus: Option<Arc<EventBus>>,
}

impl SessionBuilder {
    /// Replace the configuration
    #[must_use]
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the load ceiling
    #[must_use]
    pub fn with_load_ceiling(mut self, ceiling: f64) -> Self {
        self.config.load_ceiling = ceiling;
        self
    }

    /// Set the event bus that receives session events
    #[must_use]
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Acquire the connection, load the model and bind the health monitor.
    pub async fn connect(self) -> Result<SessionOrchestrator> {
        let Self {
            node,
            model_id,
            collaborators,
            config,
            event_bus,
        } = self;

        config.validate()?;

        let timeout = config.connect_timeout();
        info!(
            node = %node,
            interface = %config.interface_kind,
            timeout_ms = config.connect_timeout_ms,
            "Connecting to actuation interface"
        );

        let handshake = collaborators
            .actuation
            .connect(&node, &config.interface_kind, timeout);
        let connection = match tokio::time::timeout(timeout, handshake).await {
            Ok(Ok(connection)) => connection,
            Ok(Err(source)) => {
                error!(node = %node, error = %source, "Actuation handshake failed");
                return Err(Error::Connection {
                    node: node.to_string(),
                    source,
                });
            }
            Err(_) => {
                error!(
                    node = %node,
                    timeout_ms = config.connect_timeout_ms,
                    "Actuation handshake timed out"
                );
                return Err(Error::ConnectTimeout {
                    node: node.to_string(),
                    timeout,
                });
            }
        };

        let model = match collaborators.models.load(&model_id, &config.storage_ref).await {
            Ok(model) => model,
            Err(source) => {
                error!(node = %node, model = %model_id, error = %source, "Model load failed");
                connection.disconnect().await;
                return Err(Error::ModelLoad {
                    model: model_id,
                    source,
                });
            }
        };

        let health = match collaborators.health.bind(&node, config.load_ceiling) {
            Ok(health) => health,
            Err(source) => {
                error!(node = %node, error = %source, "Health monitor bind failed");
                model.unload();
                connection.disconnect().await;
                return Err(Error::HealthMonitor {
                    node: node.to_string(),
                    source,
                });
            }
        };

        let orchestrator = SessionOrchestrator {
            node,
            model_id,
            config,
            policy: collaborators.policy,
            encoder: collaborators.encoder,
            session: Mutex::new(Some(LiveSession {
                connection,
                model,
                health,
            })),
            state: AtomicU8::new(SessionState::Ready as u8),
            event_bus,
        };

        info!(
            node = %orchestrator.node,
            model = %orchestrator.model_id,
            ceiling = orchestrator.config.load_ceiling,
            "Session ready"
        );
        orchestrator.emit(SessionEvent::Ready {
            node: orchestrator.node.clone(),
        });

        Ok(orchestrator)
    }
}

impl SessionOrchestrator {
    /// Start building a session for `node` using `model_id`
    #[must_use]
    pub fn builder(
        node: impl Into<NodeIdentity>,
        model_id: impl Into<String>,
        collaborators: Collaborators,
    ) -> SessionBuilder {
        SessionBuilder {
            node: node.into(),
            model_id: model_id.into(),
            collaborators,
            config: OrchestratorConfig::default(),
            event_bus: None,
        }
    }

    /// Construct a Ready session with the given configuration
    pub async fn connect(
        node: impl Into<NodeIdentity>,
        model_id: impl Into<String>,
        collaborators: Collaborators,
        config: OrchestratorConfig,
    ) -> Result<Self> {
        Self::builder(node, model_id, collaborators)
            .with_config(config)
            .connect()
            .await
    }

    /// Node this session is bound to
    #[must_use]
    pub fn node(&self) -> &NodeIdentity {
        &self.node
    }

    /// Loaded model identifier
    #[must_use]
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Configured load ceiling
    #[must_use]
    pub fn load_ceiling(&self) -> f64 {
        self.config.load_ceiling
    }

    /// Session configuration
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Event bus, if one was attached
    #[must_use]
    pub fn events(&self) -> Option<&Arc<EventBus>> {
        self.event_bus.as_ref()
    }

    pub(crate) fn set_state(&self, state: SessionState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }
}
