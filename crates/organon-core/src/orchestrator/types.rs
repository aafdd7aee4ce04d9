//! Orchestrator result and state types
//!
//! - `ThinkResult` and `ResponseMetadata` for pipeline outcomes
//! - `SessionState` for the lifecycle state machine
//! - `StageKind` for naming pipeline stages in logs and events

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::NodeIdentity;

/// Outcome of one `think` call.
///
/// Serializes with a `status` discriminator; the rejection or failure reason
/// goes under `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ThinkResult {
    /// Every stage succeeded
    Success {
        /// Decoded response
        response: String,
        /// Node metadata observed during the call
        metadata: ResponseMetadata,
    },
    /// The policy gate refused the request
    Rejected {
        /// Rejection reason
        #[serde(rename = "error")]
        reason: String,
    },
    /// A gate or stage failed
    Failed {
        /// Failure reason
        #[serde(rename = "error")]
        reason: String,
    },
}

impl ThinkResult {
    /// Build a rejected result
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    /// Build a failed result
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    /// Status discriminator as serialized
    #[must_use]
    pub fn status(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Rejected { .. } => "rejected",
            Self::Failed { .. } => "failed",
        }
    }

    /// Whether the call succeeded
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Rejection or failure reason
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Rejected { reason } | Self::Failed { reason } => Some(reason),
        }
    }

    /// Decoded response, on success
    #[must_use]
    pub fn response(&self) -> Option<&str> {
        match self {
            Self::Success { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Metadata, on success
    #[must_use]
    pub fn metadata(&self) -> Option<&ResponseMetadata> {
        match self {
            Self::Success { metadata, .. } => Some(metadata),
            _ => None,
        }
    }
}

/// Metadata attached to a successful result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResponseMetadata {
    /// Node that served the request
    pub node_identity: NodeIdentity,
    /// Load observed by the load check
    pub load: f64,
    /// Processing time reported by the health monitor, in seconds
    pub processing_time: f64,
}

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum SessionState {
    /// Construction has not completed
    Uninitialized = 0,
    /// Accepting requests
    Ready = 1,
    /// Shut down; terminal
    Closed = 2,
}

impl SessionState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Uninitialized,
            1 => Self::Ready,
            _ => Self::Closed,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "Uninitialized"),
            Self::Ready => write!(f, "Ready"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Policy gate
    Policy,
    /// Load ceiling check
    Load,
    /// Input encoding
    Encode,
    /// Actuation call
    Stimulate,
    /// Response decoding
    Decode,
    /// Feedback recording
    Feedback,
    /// Result assembly
    Assemble,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Policy => "policy",
            Self::Load => "load",
            Self::Encode => "encode",
            Self::Stimulate => "stimulate",
            Self::Decode => "decode",
            Self::Feedback => "feedback",
            Self::Assemble => "assemble",
        };
        f.write_str(name)
    }
}
