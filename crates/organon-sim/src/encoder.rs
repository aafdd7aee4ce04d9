//! Byte-feature encoder
//!
//! Text becomes one feature per UTF-8 byte scaled into [0, 1]. Image and
//! audio payloads must carry base64 data. Structured payloads carry their
//! data in a string `content` field.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use organon_core::{EncodeError, EncodedInput, Encoder, Modality, Payload};
use serde_json::Value;

/// Default upper bound on encoded features
const DEFAULT_MAX_FEATURES: usize = 64 * 1024;

/// Encoder producing one feature per input byte
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    max_features: usize,
}

impl Default for FeatureEncoder {
    fn default() -> Self {
        Self {
            max_features: DEFAULT_MAX_FEATURES,
        }
    }
}

impl FeatureEncoder {
    /// Create an encoder with the default feature limit
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the number of features per request
    #[must_use]
    pub fn with_max_features(mut self, max: usize) -> Self {
        self.max_features = max;
        self
    }

    fn content<'a>(payload: &'a Payload) -> Result<&'a str, EncodeError> {
        match payload {
            Payload::Text(text) => Ok(text),
            Payload::Structured(map) => match map.get("content") {
                Some(Value::String(content)) => Ok(content),
                Some(_) => Err(EncodeError::Malformed(
                    "'content' field must be a string".to_string(),
                )),
                None => Err(EncodeError::Malformed("missing 'content' field".to_string())),
            },
        }
    }
}

impl Encoder for FeatureEncoder {
    fn encode(
        &self,
        payload: &Payload,
        modality: Modality,
    ) -> Result<EncodedInput, EncodeError> {
        let content = Self::content(payload)?;
        if content.trim().is_empty() {
            return Err(EncodeError::Malformed("empty payload".to_string()));
        }

        let bytes = match modality {
            Modality::Text => content.as_bytes().to_vec(),
            Modality::Image | Modality::Audio => STANDARD
                .decode(content.trim())
                .map_err(|e| EncodeError::Malformed(format!("invalid base64 data: {}", e)))?,
        };
        if bytes.len() > self.max_features {
            return Err(EncodeError::Malformed(format!(
                "payload of {} bytes exceeds the {} feature limit",
                bytes.len(),
                self.max_features
            )));
        }

        Ok(EncodedInput {
            modality,
            features: bytes.iter().map(|b| f32::from(*b) / 255.0).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn structured(value: Value) -> Payload {
        match value {
            Value::Object(map) => Payload::Structured(map),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_text_features() {
        let encoded = FeatureEncoder::new()
            .encode(&Payload::from("AB"), Modality::Text)
            .unwrap();
        assert_eq!(encoded.features.len(), 2);
        assert!((encoded.features[0] - 65.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_structured_requires_content() {
        let encoder = FeatureEncoder::new();
        let err = encoder
            .encode(&structured(json!({"pixels": [1, 2]})), Modality::Text)
            .unwrap_err();
        assert_eq!(err, EncodeError::Malformed("missing 'content' field".to_string()));

        let err = encoder
            .encode(&structured(json!({"content": 7})), Modality::Text)
            .unwrap_err();
        assert!(err.to_string().contains("must be a string"));

        assert!(encoder
            .encode(&structured(json!({"content": "hi"})), Modality::Text)
            .is_ok());
    }

    #[test]
    fn test_image_requires_base64() {
        let encoder = FeatureEncoder::new();
        let ok = encoder
            .encode(&Payload::from(STANDARD.encode([0u8, 255])), Modality::Image)
            .unwrap();
        assert_eq!(ok.features, vec![0.0, 1.0]);

        let err = encoder
            .encode(&Payload::from("not base64!"), Modality::Audio)
            .unwrap_err();
        assert!(err.to_string().starts_with("malformed input: invalid base64 data"));
    }

    #[test]
    fn test_limits() {
        let encoder = FeatureEncoder::new().with_max_features(3);
        assert!(encoder.encode(&Payload::from("abcd"), Modality::Text).is_err());
        assert!(encoder.encode(&Payload::from("   "), Modality::Text).is_err());
    }
}
