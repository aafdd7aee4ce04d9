//! Scripted health monitor
//!
//! Reports a fixed load, or pops queued readings first. Every monitor bound
//! from one `ScriptedHealth` shares its script.

use organon_core::{
    HealthError, HealthMonitor, HealthMonitorFactory, HealthReading, Metrics, NodeIdentity,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::debug;

#[derive(Debug)]
struct Script {
    load: f64,
    processing_time: f64,
    queued: VecDeque<f64>,
    last: f64,
    available: bool,
}

/// Health monitor factory with a scripted load
#[derive(Debug, Clone)]
pub struct ScriptedHealth {
    script: Arc<Mutex<Script>>,
}

impl ScriptedHealth {
    /// Report `load` and `processing_time` (seconds) on every reading
    #[must_use]
    pub fn new(load: f64, processing_time: f64) -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                load,
                processing_time,
                queued: VecDeque::new(),
                last: load,
                available: true,
            })),
        }
    }

    /// Queue readings returned before falling back to the fixed load
    #[must_use]
    pub fn with_readings(self, readings: impl IntoIterator<Item = f64>) -> Self {
        self.lock().queued.extend(readings);
        self
    }

    /// Change the fixed load
    pub fn set_load(&self, load: f64) {
        self.lock().load = load;
    }

    /// Make readings fail (`false`) or succeed again (`true`)
    pub fn set_available(&self, available: bool) {
        self.lock().available = available;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl HealthMonitorFactory for ScriptedHealth {
    fn bind(
        &self,
        node: &NodeIdentity,
        load_ceiling: f64,
    ) -> Result<Box<dyn HealthMonitor>, HealthError> {
        debug!(node = %node, ceiling = load_ceiling, "Scripted health monitor bound");
        Ok(Box::new(self.clone()))
    }
}

impl HealthMonitor for ScriptedHealth {
    fn check_health(&self) -> Result<HealthReading, HealthError> {
        let mut script = self.lock();
        if !script.available {
            return Err(HealthError::Unavailable("telemetry offline".to_string()));
        }
        let load = script.queued.pop_front().unwrap_or(script.load);
        script.last = load;
        Ok(HealthReading { load })
    }

    fn metrics(&self) -> Result<Metrics, HealthError> {
        let script = self.lock();
        if !script.available {
            return Err(HealthError::Unavailable("telemetry offline".to_string()));
        }
        Ok(Metrics {
            load: script.last,
            processing_time: script.processing_time,
        })
    }
}
