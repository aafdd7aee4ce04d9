//! Shared data types
//!
//! - `NodeIdentity` names one actuation resource
//! - `Request`, `Payload`, `Modality` describe a single call
//! - `HealthReading`, `Metrics` are fresh health monitor readings
//! - `EncodedInput`, `Intermediate` are the opaque stage hand-offs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one externally managed actuation resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeIdentity(String);

impl NodeIdentity {
    /// Create a node identity
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identity as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeIdentity {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeIdentity {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Input modality of a request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    /// Plain text
    #[default]
    Text,
    /// Image data
    Image,
    /// Audio data
    Audio,
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Image => write!(f, "image"),
            Self::Audio => write!(f, "audio"),
        }
    }
}

impl std::str::FromStr for Modality {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "image" => Ok(Self::Image),
            "audio" => Ok(Self::Audio),
            other => Err(format!("unknown modality '{}'", other)),
        }
    }
}

/// Request payload: free text or a structured mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    /// Free text
    Text(String),
    /// Structured key/value mapping
    Structured(serde_json::Map<String, serde_json::Value>),
}

impl Payload {
    /// Text view of the payload, if it is plain text
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Structured(_) => None,
        }
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// A single pipeline request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Request payload
    pub payload: Payload,
    /// Input modality
    #[serde(default)]
    pub modality: Modality,
}

impl Request {
    /// Create a request from a payload and modality
    #[must_use]
    pub fn new(payload: impl Into<Payload>, modality: Modality) -> Self {
        Self {
            payload: payload.into(),
            modality,
        }
    }

    /// Create a text request
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(Payload::Text(text.into()), Modality::Text)
    }

    /// Create a structured request
    #[must_use]
    pub fn structured(
        fields: serde_json::Map<String, serde_json::Value>,
        modality: Modality,
    ) -> Self {
        Self::new(Payload::Structured(fields), modality)
    }
}

/// Result of a load check
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthReading {
    /// Current load in [0, 1]
    pub load: f64,
}

/// Health metrics for a node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Current load in [0, 1]
    pub load: f64,
    /// Processing time of the last request, in seconds
    pub processing_time: f64,
}

/// Encoded representation handed to the actuation interface
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedInput {
    /// Modality the features were produced from
    pub modality: Modality,
    /// Encoded feature vector
    pub features: Vec<f32>,
}

/// Intermediate representation returned by a stimulate call
#[derive(Debug, Clone, PartialEq)]
pub struct Intermediate {
    /// Recorded response signal
    pub signal: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserialization() {
        let request: Request =
            serde_json::from_str(r#"{"payload": "hello", "modality": "text"}"#).unwrap();
        assert_eq!(request, Request::text("hello"));

        let request: Request =
            serde_json::from_str(r#"{"payload": {"content": "x"}, "modality": "image"}"#).unwrap();
        assert_eq!(request.modality, Modality::Image);
        assert!(matches!(request.payload, Payload::Structured(_)));
    }

    #[test]
    fn test_modality_defaults_to_text() {
        let request: Request = serde_json::from_str(r#"{"payload": "hi"}"#).unwrap();
        assert_eq!(request.modality, Modality::Text);
    }

    #[test]
    fn test_modality_parse() {
        assert_eq!("Audio".parse::<Modality>().unwrap(), Modality::Audio);
        assert!("video".parse::<Modality>().is_err());
    }

    #[test]
    fn test_node_identity_display() {
        let node = NodeIdentity::from("cl1-organoid-7x");
        assert_eq!(node.to_string(), "cl1-organoid-7x");
        assert_eq!(serde_json::to_string(&node).unwrap(), "\"cl1-organoid-7x\"");
    }
}
