//! Metric Record - one tracked sample of a run's metric sequence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Context;

/// Metric Record represents a single metric data point.
///
/// A run's metric sequence is identified by `name` + `context`; `step`
/// orders the samples inside that sequence.
///
/// ## Time-Series Optimization
///
/// Metrics are stored with:
/// - `run_hash` as the partition key
/// - `name` + `context` as the sequence key
/// - `step` as the sort key for time-series ordering
/// - `timestamp` for wall-clock time correlation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricRecord {
    run_hash: String,
    name: String,
    context: Context,
    step: u64,
    value: f64,
    timestamp: DateTime<Utc>,
}

impl MetricRecord {
    /// Create a new metric record with an empty context.
    ///
    /// # Arguments
    ///
    /// * `run_hash` - Hash of the owning run
    /// * `name` - Metric name (e.g., "train_loss", "accuracy")
    /// * `step` - Batch iteration or epoch index
    /// * `value` - Metric value
    #[must_use]
    pub fn new(run_hash: impl Into<String>, name: impl Into<String>, step: u64, value: f64) -> Self {
        Self::builder(run_hash, name, step, value).build()
    }

    /// Create a builder for constructing a metric record with optional fields.
    #[must_use]
    pub fn builder(
        run_hash: impl Into<String>,
        name: impl Into<String>,
        step: u64,
        value: f64,
    ) -> MetricRecordBuilder {
        MetricRecordBuilder::new(run_hash, name, step, value)
    }

    /// Get the owning run hash.
    #[must_use]
    pub fn run_hash(&self) -> &str {
        &self.run_hash
    }

    /// Get the metric name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the context tags of the sequence this sample belongs to.
    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.context
    }

    /// Get the step index.
    #[must_use]
    pub const fn step(&self) -> u64 {
        self.step
    }

    /// Get the metric value.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Get the timestamp when the metric was recorded.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// True if this sample belongs to the `name` sequence under `context`.
    #[must_use]
    pub fn in_sequence(&self, name: &str, context: &Context) -> bool {
        self.name == name && &self.context == context
    }
}

/// Builder for `MetricRecord`.
#[derive(Debug)]
pub struct MetricRecordBuilder {
    run_hash: String,
    name: String,
    context: Context,
    step: u64,
    value: f64,
    timestamp: DateTime<Utc>,
}

impl MetricRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(run_hash: impl Into<String>, name: impl Into<String>, step: u64, value: f64) -> Self {
        Self {
            run_hash: run_hash.into(),
            name: name.into(),
            context: Context::new(),
            step,
            value,
            timestamp: Utc::now(),
        }
    }

    /// Set the context tags.
    #[must_use]
    pub fn context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Set a custom timestamp (used when loading persisted series).
    #[must_use]
    pub const fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Build the `MetricRecord`.
    #[must_use]
    pub fn build(self) -> MetricRecord {
        MetricRecord {
            run_hash: self.run_hash,
            name: self.name,
            context: self.context,
            step: self.step,
            value: self.value,
            timestamp: self.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_record_new() {
        let metric = MetricRecord::new("abc", "train_loss", 0, 0.5);
        assert_eq!(metric.run_hash(), "abc");
        assert_eq!(metric.name(), "train_loss");
        assert_eq!(metric.step(), 0);
        assert!(metric.context().is_empty());
        assert!((metric.value() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_metric_sequence_membership() {
        let metric = MetricRecord::builder("abc", "train_loss", 3, 0.5)
            .context(Context::subset("train"))
            .build();
        assert!(metric.in_sequence("train_loss", &Context::subset("train")));
        assert!(!metric.in_sequence("train_loss", &Context::subset("val")));
        assert!(!metric.in_sequence("lr_0", &Context::subset("train")));
    }
}
