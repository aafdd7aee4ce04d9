use serde::Serialize;

use crate::orchestrator::StageKind;
use crate::types::NodeIdentity;

/// Events published by a session orchestrator.
///
/// Payloads and responses are never included; events only carry the node,
/// the stage and a sanitized cause.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Construction finished and the session accepts requests
    Ready {
        /// Node identity
        node: NodeIdentity,
    },
    /// The policy gate rejected a request
    Rejected {
        /// Node identity
        node: NodeIdentity,
    },
    /// The load ceiling was exceeded
    Overloaded {
        /// Node identity
        node: NodeIdentity,
        /// Observed load
        load: f64,
        /// Configured ceiling
        ceiling: f64,
    },
    /// A pipeline stage failed
    StageFailed {
        /// Node identity
        node: NodeIdentity,
        /// Failing stage
        stage: StageKind,
        /// Failure reason
        error: String,
    },
    /// Feedback could not be recorded
    FeedbackDropped {
        /// Node identity
        node: NodeIdentity,
        /// Storage error
        error: String,
    },
    /// A request completed successfully
    Completed {
        /// Node identity
        node: NodeIdentity,
        /// Load observed by the load check
        load: f64,
        /// Processing time in seconds
        processing_time: f64,
    },
    /// The session was shut down
    Closed {
        /// Node identity
        node: NodeIdentity,
    },
}

impl SessionEvent {
    /// Node the event belongs to
    #[must_use]
    pub fn node(&self) -> &NodeIdentity {
        match self {
            Self::Ready { node }
            | Self::Rejected { node }
            | Self::Overloaded { node, .. }
            | Self::StageFailed { node, .. }
            | Self::FeedbackDropped { node, .. }
            | Self::Completed { node, .. }
            | Self::Closed { node } => node,
        }
    }
}
