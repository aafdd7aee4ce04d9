//! The `think` pipeline
//!
//! Policy → Load → Encode → Stimulate → Decode & record → Assemble. The first
//! gate or stage that fails ends the call with a `ThinkResult`; only a closed
//! session produces an `Err`.

use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::collaborators::Connection;
use crate::error::Result;
use crate::event_bus::SessionEvent;
use crate::types::{EncodedInput, Intermediate, Request};

use super::config::ThinkOptions;
use super::core::SessionOrchestrator;
use super::types::{ResponseMetadata, StageKind, ThinkResult};

/// Reason returned when the policy gate refuses a request
pub const POLICY_VIOLATION: &str = "ethics/policy violation";
/// Reason returned when the load ceiling is exceeded
pub const NODE_OVERLOADED: &str = "node overloaded";
/// Reason returned when a stimulate call is cancelled
pub const STIMULATE_CANCELLED: &str = "stimulate cancelled";

impl SessionOrchestrator {
    /// Run one request through the pipeline with default options.
    pub async fn think(&self, request: Request) -> Result<ThinkResult> {
        self.think_with(request, ThinkOptions::default()).await
    }

    /// Run one request through the pipeline.
    ///
    /// Returns `Err(Error::SessionClosed)` when the session has been shut
    /// down; every collaborator failure is reported as a `ThinkResult`.
    #[instrument(
        skip(self, request, options),
        fields(node = %self.node, modality = %request.modality)
    )]
    pub async fn think_with(&self, request: Request, options: ThinkOptions) -> Result<ThinkResult> {
        self.ensure_ready()?;

        // Side-effect free, so it runs outside the session lock
        if !self.policy.validate_input(&request.payload) {
            warn!(node = %self.node, "Request rejected by policy gate");
            self.emit(SessionEvent::Rejected {
                node: self.node.clone(),
            });
            return Ok(ThinkResult::rejected(POLICY_VIOLATION));
        }
        debug!(node = %self.node, "Policy check passed");

        let guard = self.session.lock().await;
        let Some(live) = guard.as_ref() else {
            return Err(self.closed_error());
        };
        let started = Instant::now();

        let load = match live.health.check_health() {
            Ok(reading) => reading.load,
            Err(e) => {
                return Ok(self.stage_failed(StageKind::Load, format!("health check failed: {}", e)))
            }
        };
        let ceiling = self.config.load_ceiling;
        // a NaN reading counts as overloaded
        if load.is_nan() || load > ceiling {
            warn!(node = %self.node, load, ceiling, "Node overloaded");
            self.emit(SessionEvent::Overloaded {
                node: self.node.clone(),
                load,
                ceiling,
            });
            return Ok(ThinkResult::failed(NODE_OVERLOADED));
        }
        debug!(node = %self.node, load, ceiling, "Load check passed");

        let encoded = match self.encoder.encode(&request.payload, request.modality) {
            Ok(encoded) => encoded,
            Err(e) => {
                return Ok(self.stage_failed(StageKind::Encode, format!("encoding failed: {}", e)))
            }
        };
        debug!(node = %self.node, features = encoded.features.len(), "Input encoded");

        let intermediate = match self
            .stimulate(live.connection.as_ref(), &encoded, &options)
            .await
        {
            Ok(intermediate) => intermediate,
            Err(reason) => return Ok(self.stage_failed(StageKind::Stimulate, reason)),
        };
        debug!(node = %self.node, samples = intermediate.signal.len(), "Stimulation complete");

        let response = match live.model.decode(
            &intermediate,
            self.config.neurofeedback,
            &self.config.decode_context,
        ) {
            Ok(response) => response,
            Err(e) => {
                return Ok(self.stage_failed(StageKind::Decode, format!("decoding failed: {}", e)))
            }
        };

        if let Err(e) = live
            .model
            .store_feedback(&intermediate, &response, &self.config.storage_ref)
        {
            warn!(node = %self.node, error = %e, "Feedback not recorded");
            self.emit(SessionEvent::FeedbackDropped {
                node: self.node.clone(),
                error: e.to_string(),
            });
        }

        let processing_time = match live.health.metrics() {
            Ok(metrics) => metrics.processing_time,
            Err(e) => {
                warn!(
                    node = %self.node,
                    error = %e,
                    "Metrics unavailable, using measured duration"
                );
                started.elapsed().as_secs_f64()
            }
        };
        drop(guard);

        info!(node = %self.node, load, processing_time, "Request completed");
        self.emit(SessionEvent::Completed {
            node: self.node.clone(),
            load,
            processing_time,
        });

        Ok(ThinkResult::Success {
            response,
            metadata: ResponseMetadata {
                node_identity: self.node.clone(),
                load,
                processing_time,
            },
        })
    }

    /// Stimulate with the per-call timeout and cancellation applied.
    async fn stimulate(
        &self,
        connection: &dyn Connection,
        encoded: &EncodedInput,
        options: &ThinkOptions,
    ) -> std::result::Result<Intermediate, String> {
        let call = connection.stimulate(encoded, self.config.intensity);
        let limit = options.timeout.or_else(|| self.config.stimulate_timeout());
        let cancel = options.cancel.clone().unwrap_or_else(CancellationToken::new);

        let bounded = async move {
            match limit {
                Some(limit) => match tokio::time::timeout(limit, call).await {
                    Ok(result) => result.map_err(|e| e.to_string()),
                    Err(_) => Err(format!(
                        "stimulate timed out after {}ms",
                        limit.as_millis()
                    )),
                },
                None => call.await.map_err(|e| e.to_string()),
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(STIMULATE_CANCELLED.to_string()),
            result = bounded => result,
        }
    }
}
