//! Orchestrator helper methods
//!
//! Event emission, usage-error construction and stage failure translation.

use tracing::error;

use crate::error::Error;
use crate::event_bus::SessionEvent;

use super::core::SessionOrchestrator;
use super::types::{SessionState, StageKind, ThinkResult};

impl SessionOrchestrator {
    /// Publish an event to the event bus (no-op if no bus is set).
    pub(crate) fn emit(&self, event: SessionEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish(event);
        }
    }

    pub(crate) fn closed_error(&self) -> Error {
        Error::SessionClosed {
            node: self.node.to_string(),
        }
    }

    /// Fail fast unless the session is Ready.
    pub(crate) fn ensure_ready(&self) -> Result<(), Error> {
        match self.state() {
            SessionState::Ready => Ok(()),
            _ => Err(self.closed_error()),
        }
    }

    /// Log, publish and wrap a stage failure.
    pub(crate) fn stage_failed(&self, stage: StageKind, reason: String) -> ThinkResult {
        error!(node = %self.node, stage = %stage, error = %reason, "Pipeline stage failed");
        self.emit(SessionEvent::StageFailed {
            node: self.node.clone(),
            stage,
            error: reason.clone(),
        });
        ThinkResult::failed(reason)
    }
}
