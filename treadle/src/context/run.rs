//! The mutable context threaded through a workflow run.

use super::{Adapter, MetricLog, MetricPoint};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// The execution context for a single workflow run.
///
/// One context is created per run and moved through the entire execution by
/// exclusive ownership: each stage consumes it and returns an updated
/// version. The `state` map is the sole channel for passing data between
/// stages; `config` and `adapters` are fixed after construction.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Run identifier.
    run_id: Uuid,
    /// Immutable run configuration.
    config: HashMap<String, serde_json::Value>,
    /// Mutable key/value state shared across stages.
    state: HashMap<String, serde_json::Value>,
    /// External collaborators keyed by port name.
    adapters: HashMap<String, Arc<dyn Adapter>>,
    /// Accumulated metric observations.
    metrics: MetricLog,
    /// Name of the stage currently executing.
    current_stage: Option<String>,
    /// Options of the stage currently executing.
    stage_opts: HashMap<String, serde_json::Value>,
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RunContext {
    /// Creates an empty context with a fresh run ID.
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            config: HashMap::new(),
            state: HashMap::new(),
            adapters: HashMap::new(),
            metrics: MetricLog::new(),
            current_stage: None,
            stage_opts: HashMap::new(),
        }
    }

    /// Sets a configuration option. Configuration is read-only once the run
    /// starts; there is no mutator on the running context.
    #[must_use]
    pub fn with_config(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }

    /// Merges a configuration map.
    #[must_use]
    pub fn with_config_map(mut self, config: HashMap<String, serde_json::Value>) -> Self {
        self.config.extend(config);
        self
    }

    /// Seeds an initial state entry.
    #[must_use]
    pub fn with_state(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.state.insert(key.into(), value);
        self
    }

    /// Registers an adapter under a port name.
    #[must_use]
    pub fn with_adapter(mut self, port: impl Into<String>, adapter: Arc<dyn Adapter>) -> Self {
        self.adapters.insert(port.into(), adapter);
        self
    }

    /// Returns the run identifier.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Reads a configuration option.
    #[must_use]
    pub fn config(&self, key: &str) -> Option<&serde_json::Value> {
        self.config.get(key)
    }

    /// Reads a state entry.
    #[must_use]
    pub fn state(&self, key: &str) -> Option<&serde_json::Value> {
        self.state.get(key)
    }

    /// Writes a state entry, overwriting any previous value.
    pub fn put_state(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.state.insert(key.into(), value);
    }

    /// Removes a state entry. Removal is always an explicit act of a stage;
    /// the engine itself never deletes state.
    pub fn remove_state(&mut self, key: &str) -> Option<serde_json::Value> {
        self.state.remove(key)
    }

    /// Returns the number of state entries.
    #[must_use]
    pub fn state_len(&self) -> usize {
        self.state.len()
    }

    /// Looks up an adapter by port name.
    #[must_use]
    pub fn adapter(&self, port: &str) -> Option<&Arc<dyn Adapter>> {
        self.adapters.get(port)
    }

    /// Looks up an adapter and downcasts it to a concrete type.
    #[must_use]
    pub fn adapter_as<T: Adapter + 'static>(&self, port: &str) -> Option<&T> {
        self.adapters
            .get(port)
            .and_then(|a| a.as_any().downcast_ref::<T>())
    }

    /// Records a metric observation.
    pub fn record_metric(&mut self, name: impl Into<String>, value: f64) {
        self.metrics.record(MetricPoint::new(name, value));
    }

    /// Records a metric observation tagged with a step.
    pub fn record_metric_at_step(&mut self, name: impl Into<String>, value: f64, step: u64) {
        self.metrics.record(MetricPoint::new(name, value).with_step(step));
    }

    /// Returns all metric observations in chronological order.
    #[must_use]
    pub fn metrics(&self) -> Vec<MetricPoint> {
        self.metrics.snapshot()
    }

    /// Returns the metric log.
    #[must_use]
    pub fn metric_log(&self) -> &MetricLog {
        &self.metrics
    }

    /// Returns the name of the stage currently executing, if any.
    #[must_use]
    pub fn current_stage(&self) -> Option<&str> {
        self.current_stage.as_deref()
    }

    /// Returns the options of the stage currently executing.
    #[must_use]
    pub fn stage_opts(&self) -> &HashMap<String, serde_json::Value> {
        &self.stage_opts
    }

    /// Overwrites the per-stage metadata. Called by the runner immediately
    /// before each stage execution.
    pub fn set_current_stage(
        &mut self,
        name: impl Into<String>,
        opts: HashMap<String, serde_json::Value>,
    ) {
        self.current_stage = Some(name.into());
        self.stage_opts = opts;
    }
}
