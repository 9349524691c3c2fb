//! Append-only metric log accumulated over a workflow run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single recorded metric observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    /// Metric name.
    pub name: String,
    /// Observed value.
    pub value: f64,
    /// Optional step tag (e.g. training step or epoch).
    pub step: Option<u64>,
    /// When the observation was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl MetricPoint {
    /// Creates a metric point stamped with the current time.
    #[must_use]
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            step: None,
            recorded_at: Utc::now(),
        }
    }

    /// Sets the step tag.
    #[must_use]
    pub fn with_step(mut self, step: u64) -> Self {
        self.step = Some(step);
        self
    }
}

/// The ordered log of metric observations for a run.
///
/// Points are held newest-first internally; reads normalize to chronological
/// insertion order. Entries are never removed.
#[derive(Debug, Clone, Default)]
pub struct MetricLog {
    points: Vec<MetricPoint>,
}

impl MetricLog {
    /// Creates an empty metric log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an observation.
    pub fn record(&mut self, point: MetricPoint) {
        self.points.insert(0, point);
    }

    /// Returns all observations in chronological order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<MetricPoint> {
        self.points.iter().rev().cloned().collect()
    }

    /// Returns the most recent observation with the given name.
    #[must_use]
    pub fn latest(&self, name: &str) -> Option<&MetricPoint> {
        self.points.iter().find(|p| p.name == name)
    }

    /// Returns the number of recorded observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
