use super::types::SessionEvent;
use crate::types::NodeIdentity;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, SendError};
use tracing::debug;

/// Session event sink shared by every session that publishes to it.
///
/// Subscribers that fall more than `capacity` events behind get
/// `RecvError::Lagged`; publishing never waits on a subscriber.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events from every node.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Subscribe to events from `node` only.
    #[must_use]
    pub fn subscribe_node(&self, node: impl Into<NodeIdentity>) -> NodeEvents {
        NodeEvents {
            node: node.into(),
            receiver: self.sender.subscribe(),
        }
    }

    /// Publish an event, returning how many subscribers received it.
    pub fn publish(&self, event: SessionEvent) -> usize {
        match self.sender.send(event) {
            Ok(delivered) => delivered,
            Err(SendError(event)) => {
                debug!(node = %event.node(), "Session event dropped, no subscribers");
                0
            }
        }
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Receiver yielding the events of a single node.
///
/// Events from other nodes are skipped but still count toward lag.
#[derive(Debug)]
pub struct NodeEvents {
    node: NodeIdentity,
    receiver: broadcast::Receiver<SessionEvent>,
}

impl NodeEvents {
    /// Node this receiver follows
    #[must_use]
    pub fn node(&self) -> &NodeIdentity {
        &self.node
    }

    /// Next event for the node.
    pub async fn recv(&mut self) -> Result<SessionEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if event.node() == &self.node {
                return Ok(event);
            }
        }
    }
}
