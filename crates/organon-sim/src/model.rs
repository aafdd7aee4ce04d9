//! Simulated response models
//!
//! Decoding summarizes the signal; feedback is kept in memory and shared
//! with the store so callers can inspect what was recorded.

use async_trait::async_trait;
use organon_core::{Intermediate, ModelError, ModelStore, ResponseModel};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// One recorded (signal, response) pair
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackRecord {
    /// Model that recorded the pair
    pub model_id: String,
    /// Storage reference the pair was written to
    pub storage_ref: String,
    /// Recorded signal
    pub signal: Vec<f32>,
    /// Response decoded from the signal
    pub response: String,
}

#[derive(Default)]
struct Shared {
    feedback: Mutex<Vec<FeedbackRecord>>,
    storage_fails: AtomicBool,
    loads: AtomicUsize,
    unloads: AtomicUsize,
}

/// In-memory model store
pub struct SimModelStore {
    models: HashSet<String>,
    shared: Arc<Shared>,
}

impl SimModelStore {
    /// Create a store holding the given model identifiers
    #[must_use]
    pub fn new<I, S>(models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            models: models.into_iter().map(Into::into).collect(),
            shared: Arc::new(Shared::default()),
        }
    }

    /// Make every later feedback write fail
    pub fn set_storage_fails(&self, fails: bool) {
        self.shared.storage_fails.store(fails, Ordering::SeqCst);
    }

    /// Feedback recorded so far
    #[must_use]
    pub fn feedback(&self) -> Vec<FeedbackRecord> {
        self.shared
            .feedback
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of models loaded
    #[must_use]
    pub fn load_count(&self) -> usize {
        self.shared.loads.load(Ordering::SeqCst)
    }

    /// Number of models unloaded
    #[must_use]
    pub fn unload_count(&self) -> usize {
        self.shared.unloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelStore for SimModelStore {
    async fn load(
        &self,
        model_id: &str,
        storage_ref: &str,
    ) -> Result<Box<dyn ResponseModel>, ModelError> {
        if !self.models.contains(model_id) {
            return Err(ModelError::NotFound(model_id.to_string()));
        }
        self.shared.loads.fetch_add(1, Ordering::SeqCst);
        debug!(model = model_id, storage = storage_ref, "Simulated model loaded");
        Ok(Box::new(SimModel {
            model_id: model_id.to_string(),
            shared: self.shared.clone(),
        }))
    }
}

/// A loaded simulated model
pub struct SimModel {
    model_id: String,
    shared: Arc<Shared>,
}

impl ResponseModel for SimModel {
    fn decode(
        &self,
        intermediate: &Intermediate,
        neurofeedback: bool,
        context: &str,
    ) -> Result<String, ModelError> {
        if intermediate.signal.is_empty() {
            return Err(ModelError::Decode("empty signal".to_string()));
        }

        let n = intermediate.signal.len();
        let mean = intermediate.signal.iter().sum::<f32>() / n as f32;
        let peak = intermediate
            .signal
            .iter()
            .copied()
            .fold(f32::MIN, f32::max);
        let mut response = format!(
            "[{}] {}: {} samples, mean activation {:.3}, peak {:.3}",
            self.model_id, context, n, mean, peak
        );
        if neurofeedback {
            response.push_str(" (neurofeedback)");
        }
        Ok(response)
    }

    fn store_feedback(
        &self,
        intermediate: &Intermediate,
        response: &str,
        storage_ref: &str,
    ) -> Result<(), ModelError> {
        if self.shared.storage_fails.load(Ordering::SeqCst) {
            return Err(ModelError::Storage(format!("{} is read-only", storage_ref)));
        }
        self.shared
            .feedback
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(FeedbackRecord {
                model_id: self.model_id.clone(),
                storage_ref: storage_ref.to_string(),
                signal: intermediate.signal.clone(),
                response: response.to_string(),
            });
        Ok(())
    }

    fn unload(&self) {
        self.shared.unloads.fetch_add(1, Ordering::SeqCst);
        debug!(model = %self.model_id, "Simulated model unloaded");
    }
}
