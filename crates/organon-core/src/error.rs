//! Error types for organon-core
//!
//! Construction and usage errors surface as [`Error`]. Collaborator failures
//! use their own enums so the orchestrator can turn them into pipeline
//! results without losing the cause.

use std::time::Duration;
use thiserror::Error;

use crate::types::Modality;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration
    #[error("invalid configuration: {field}: {message}")]
    InvalidConfig {
        /// Config field name
        field: String,
        /// Detailed message
        message: String,
    },

    /// The actuation connection could not be acquired
    #[error("failed to connect to node {node}: {source}")]
    Connection {
        /// Node identity
        node: String,
        /// Underlying actuation error
        #[source]
        source: ActuationError,
    },

    /// The actuation handshake did not finish within the connect timeout
    #[error("connection to node {node} timed out after {timeout:?}")]
    ConnectTimeout {
        /// Node identity
        node: String,
        /// Configured timeout
        timeout: Duration,
    },

    /// The response model could not be loaded
    #[error("failed to load model {model}: {source}")]
    ModelLoad {
        /// Model identifier
        model: String,
        /// Underlying model error
        #[source]
        source: ModelError,
    },

    /// The health monitor could not be bound to the node
    #[error("health monitor unavailable for node {node}: {source}")]
    HealthMonitor {
        /// Node identity
        node: String,
        /// Underlying health error
        #[source]
        source: HealthError,
    },

    /// The session was shut down
    #[error("session closed for node {node}")]
    SessionClosed {
        /// Node identity
        node: String,
    },

    /// A session for this node is already open in the pool
    #[error("node already open: {0}")]
    NodeAlreadyOpen(String),

    /// No session for this node in the pool
    #[error("unknown node: {0}")]
    UnknownNode(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Failures raised by the actuation interface and its connections
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ActuationError {
    /// The node could not be reached
    #[error("node unreachable: {0}")]
    Unreachable(String),

    /// The interface handshake was refused
    #[error("interface handshake failed: {0}")]
    Handshake(String),

    /// The resource faulted mid-call
    #[error("actuation fault: {0}")]
    Fault(String),

    /// The connection was already released
    #[error("connection closed")]
    Disconnected,
}

/// Failures raised by the response model and its backing store
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelError {
    /// No model under this identifier
    #[error("model not found: {0}")]
    NotFound(String),

    /// The model exists but could not be loaded
    #[error("model load failed: {0}")]
    Load(String),

    /// The intermediate representation could not be decoded
    #[error("{0}")]
    Decode(String),

    /// Feedback could not be persisted
    #[error("feedback storage failed: {0}")]
    Storage(String),
}

/// Failures raised while encoding a request payload
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EncodeError {
    /// The payload does not have the expected shape
    #[error("malformed input: {0}")]
    Malformed(String),

    /// The encoder cannot handle this modality
    #[error("unsupported modality: {0}")]
    Unsupported(Modality),
}

/// Failures raised by the health monitor
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HealthError {
    /// No reading is available
    #[error("health reading unavailable: {0}")]
    Unavailable(String),
}

/// Trait for user-friendly error messages
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get a suggestion for how to fix the error
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for Error {
    fn user_message(&self) -> String {
        match self {
            Error::InvalidConfig { field, message } => {
                format!("Configuration error in '{}': {}", field, message)
            }
            Error::Connection { node, source } => {
                format!("Could not connect to node '{}': {}", node, source)
            }
            Error::ConnectTimeout { node, timeout } => format!(
                "Node '{}' did not answer the handshake within {:?}.",
                node, timeout
            ),
            Error::ModelLoad { model, source } => {
                format!("Response model '{}' could not be loaded: {}", model, source)
            }
            Error::HealthMonitor { node, source } => {
                format!("Health monitor for node '{}' is unavailable: {}", node, source)
            }
            Error::SessionClosed { node } => {
                format!("The session for node '{}' is closed.", node)
            }
            Error::NodeAlreadyOpen(node) => format!("Node '{}' already has a session.", node),
            Error::UnknownNode(node) => format!("No session is open for node '{}'.", node),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            Error::InvalidConfig { field, .. } => Some(format!(
                "Check the '{}' setting in config/default.toml or the ORGANON_ environment.",
                field
            )),
            Error::Connection { .. } | Error::ConnectTimeout { .. } => Some(
                "Check that the node is powered and reachable, or raise \
                 orchestrator.connect_timeout_ms."
                    .to_string(),
            ),
            Error::ModelLoad { .. } => {
                Some("Check the model identifier and its backing store.".to_string())
            }
            Error::SessionClosed { .. } => {
                Some("Open a new session for the node before sending requests.".to_string())
            }
            _ => None,
        }
    }
}

/// Format an error for display in the CLI
pub fn format_error_for_cli(error: &Error) -> String {
    let mut output = error.user_message();
    output.push('\n');

    if let Some(suggestion) = error.suggestion() {
        output.push('\n');
        output.push_str(&suggestion);
        output.push('\n');
    }

    output
}
