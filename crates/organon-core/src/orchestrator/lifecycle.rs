//! Session shutdown
//!
//! Shutdown takes the same lock as the pipeline, so it waits for an
//! in-flight `think` to finish before releasing anything.

use tracing::{info, warn};

use crate::error::Result;
use crate::event_bus::SessionEvent;

use super::core::SessionOrchestrator;
use super::types::SessionState;

impl SessionOrchestrator {
    /// Release the connection and unload the model.
    ///
    /// Returns `Err(Error::SessionClosed)` if the session is already closed.
    pub async fn shutdown(&self) -> Result<()> {
        self.ensure_ready()?;

        let mut guard = self.session.lock().await;
        let Some(live) = guard.take() else {
            return Err(self.closed_error());
        };
        self.set_state(SessionState::Closed);
        info!(node = %self.node, "Shutting down session");

        live.connection.disconnect().await;
        live.model.unload();
        drop(guard);

        info!(node = %self.node, model = %self.model_id, "Session closed");
        self.emit(SessionEvent::Closed {
            node: self.node.clone(),
        });
        Ok(())
    }
}

impl Drop for SessionOrchestrator {
    fn drop(&mut self) {
        if self.state() == SessionState::Ready {
            warn!(node = %self.node, "Session dropped without shutdown; connection not released");
        }
    }
}
