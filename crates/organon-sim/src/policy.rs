//! Keyword policy gate
//!
//! Rejects payloads containing any blocked term, case-insensitively. String
//! values nested anywhere in a structured payload are checked too.

use organon_core::{Payload, PolicyGate};
use serde_json::Value;

/// Policy gate backed by a list of blocked terms
#[derive(Debug, Clone, Default)]
pub struct KeywordPolicy {
    blocked: Vec<String>,
}

impl KeywordPolicy {
    /// Block every term in `terms`
    #[must_use]
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            blocked: terms
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    fn is_blocked(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.blocked.iter().any(|term| lower.contains(term.as_str()))
    }

    fn value_blocked(&self, value: &Value) -> bool {
        match value {
            Value::String(s) => self.is_blocked(s),
            Value::Array(items) => items.iter().any(|v| self.value_blocked(v)),
            Value::Object(map) => map
                .iter()
                .any(|(k, v)| self.is_blocked(k) || self.value_blocked(v)),
            _ => false,
        }
    }
}

impl PolicyGate for KeywordPolicy {
    fn validate_input(&self, payload: &Payload) -> bool {
        match payload {
            Payload::Text(text) => !self.is_blocked(text),
            Payload::Structured(map) => !map
                .iter()
                .any(|(k, v)| self.is_blocked(k) || self.value_blocked(v)),
        }
    }
}
