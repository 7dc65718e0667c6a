//! Experiment Store - concurrent storage for experiment tracking data
//!
//! This module provides the storage layer behind a run repository,
//! optimized for time-series metric queries.

use dashmap::DashMap;

use super::{Context, ExperimentRecord, MetricRecord, RunRecord};

/// Concurrent in-memory store for experiment tracking data.
///
/// ## Design
///
/// All maps are `DashMap`s so one store can be shared (behind `Arc`)
/// by several run handles. Metrics are partitioned by run hash; each
/// partition is an append-only vector filtered and sorted on query.
///
/// Accessors return clones: holding a `DashMap` guard across another
/// call into the same shard would deadlock.
#[derive(Debug, Default)]
pub struct ExperimentStore {
    experiments: DashMap<String, ExperimentRecord>,
    runs: DashMap<String, RunRecord>,
    metrics: DashMap<String, Vec<MetricRecord>>,
}

impl ExperimentStore {
    /// Create a new empty experiment store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the store is empty (no experiments, runs, or metrics).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty() && self.runs.is_empty() && self.metric_count() == 0
    }

    /// Get the number of experiments in the store.
    #[must_use]
    pub fn experiment_count(&self) -> usize {
        self.experiments.len()
    }

    /// Get the number of runs in the store.
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Get the number of metric samples across all runs.
    #[must_use]
    pub fn metric_count(&self) -> usize {
        self.metrics.iter().map(|entry| entry.value().len()).sum()
    }

    /// Register an experiment name, keeping the existing record if present.
    pub fn ensure_experiment(&self, name: &str) {
        self.experiments
            .entry(name.to_string())
            .or_insert_with(|| ExperimentRecord::new(name));
    }

    /// Get an experiment by name.
    #[must_use]
    pub fn get_experiment(&self, name: &str) -> Option<ExperimentRecord> {
        self.experiments.get(name).map(|entry| entry.value().clone())
    }

    /// Add (or replace) a run.
    pub fn add_run(&self, run: RunRecord) {
        self.ensure_experiment(run.experiment());
        self.runs.insert(run.run_hash().to_string(), run);
    }

    /// True if a run with this hash exists.
    #[must_use]
    pub fn contains_run(&self, run_hash: &str) -> bool {
        self.runs.contains_key(run_hash)
    }

    /// Get a run by hash.
    #[must_use]
    pub fn get_run(&self, run_hash: &str) -> Option<RunRecord> {
        self.runs.get(run_hash).map(|entry| entry.value().clone())
    }

    /// Apply `update` to a stored run and return its result.
    ///
    /// Returns `None` if the run does not exist.
    pub fn update_run<T>(&self, run_hash: &str, update: impl FnOnce(&mut RunRecord) -> T) -> Option<T> {
        self.runs.get_mut(run_hash).map(|mut entry| update(entry.value_mut()))
    }

    /// Hashes of all stored runs, sorted.
    #[must_use]
    pub fn run_hashes(&self) -> Vec<String> {
        let mut hashes: Vec<String> = self.runs.iter().map(|entry| entry.key().clone()).collect();
        hashes.sort();
        hashes
    }

    /// Get all runs for an experiment.
    #[must_use]
    pub fn get_runs_for_experiment(&self, experiment: &str) -> Vec<RunRecord> {
        self.runs
            .iter()
            .filter(|entry| entry.value().experiment() == experiment)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Add a metric sample to its run partition.
    pub fn add_metric(&self, metric: MetricRecord) {
        self.metrics
            .entry(metric.run_hash().to_string())
            .or_default()
            .push(metric);
    }

    /// Add many samples of one run partition at once (used when loading).
    pub fn extend_metrics(&self, run_hash: &str, metrics: impl IntoIterator<Item = MetricRecord>) {
        self.metrics
            .entry(run_hash.to_string())
            .or_default()
            .extend(metrics);
    }

    /// All samples of a run, in insertion order.
    #[must_use]
    pub fn metrics_for_run(&self, run_hash: &str) -> Vec<MetricRecord> {
        self.metrics
            .get(run_hash)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Get metrics for a specific run and name across every context,
    /// ordered by step.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use trueno_track::experiment::{ExperimentStore, MetricRecord};
    ///
    /// let store = ExperimentStore::new();
    /// for step in 0..100 {
    ///     let loss = 1.0 / (step as f64 + 1.0);
    ///     store.add_metric(MetricRecord::new("abc", "train_loss", step, loss));
    /// }
    ///
    /// let loss_curve = store.get_metrics_for_run("abc", "train_loss");
    /// assert_eq!(loss_curve.len(), 100);
    /// ```
    #[must_use]
    pub fn get_metrics_for_run(&self, run_hash: &str, name: &str) -> Vec<MetricRecord> {
        self.collect_sorted(run_hash, |m| m.name() == name)
    }

    /// Get one metric sequence (`name` under exactly `context`), ordered by step.
    #[must_use]
    pub fn get_metrics_in_context(
        &self,
        run_hash: &str,
        name: &str,
        context: &Context,
    ) -> Vec<MetricRecord> {
        self.collect_sorted(run_hash, |m| m.in_sequence(name, context))
    }

    /// Highest step recorded for a sequence, if any.
    #[must_use]
    pub fn last_step(&self, run_hash: &str, name: &str, context: &Context) -> Option<u64> {
        self.metrics.get(run_hash).and_then(|entry| {
            entry
                .value()
                .iter()
                .filter(|m| m.in_sequence(name, context))
                .map(MetricRecord::step)
                .max()
        })
    }

    fn collect_sorted(&self, run_hash: &str, keep: impl Fn(&MetricRecord) -> bool) -> Vec<MetricRecord> {
        let mut metrics: Vec<MetricRecord> = self
            .metrics
            .get(run_hash)
            .map(|entry| entry.value().iter().filter(|m| keep(*m)).cloned().collect())
            .unwrap_or_default();

        // Stable sort keeps insertion order for equal steps
        metrics.sort_by_key(MetricRecord::step);

        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_default() {
        let store = ExperimentStore::new();
        assert!(store.is_empty());
        assert_eq!(store.experiment_count(), 0);
        assert_eq!(store.run_count(), 0);
        assert_eq!(store.metric_count(), 0);
    }

    #[test]
    fn test_add_run_registers_experiment() {
        let store = ExperimentStore::new();
        store.add_run(RunRecord::new("abc", "resnet"));

        assert!(store.contains_run("abc"));
        assert_eq!(store.experiment_count(), 1);
        assert!(store.get_experiment("resnet").is_some());
    }

    #[test]
    fn test_get_metrics_for_run_ordering() {
        let store = ExperimentStore::new();

        // Add out of order
        store.add_metric(MetricRecord::new("abc", "loss", 2, 0.2));
        store.add_metric(MetricRecord::new("abc", "loss", 0, 0.0));
        store.add_metric(MetricRecord::new("abc", "loss", 1, 0.1));

        let metrics = store.get_metrics_for_run("abc", "loss");

        assert_eq!(metrics.len(), 3);
        assert_eq!(metrics[0].step(), 0);
        assert_eq!(metrics[1].step(), 1);
        assert_eq!(metrics[2].step(), 2);
    }

    #[test]
    fn test_last_step_is_per_context() {
        let store = ExperimentStore::new();
        let train = Context::subset("train");
        store.add_metric(MetricRecord::builder("abc", "loss", 7, 0.1).context(train.clone()).build());
        store.add_metric(MetricRecord::builder("abc", "loss", 2, 0.3).context(Context::subset("val")).build());

        assert_eq!(store.last_step("abc", "loss", &train), Some(7));
        assert_eq!(store.last_step("abc", "loss", &Context::subset("val")), Some(2));
        assert_eq!(store.last_step("abc", "loss", &Context::new()), None);
        assert_eq!(store.last_step("zzz", "loss", &train), None);
    }

    #[test]
    fn test_update_missing_run() {
        let store = ExperimentStore::new();
        assert!(store.update_run("missing", |run| run.start()).is_none());
    }
}
