//! Experiment record and store tests

use chrono::{TimeZone, Utc};
use trueno_track::experiment::{
    Context, ExperimentRecord, ExperimentStore, MetricRecord, RunRecord, RunStatus,
};

// =============================================================================
// ExperimentRecord Tests
// =============================================================================

#[test]
fn test_experiment_record_creation() {
    let record = ExperimentRecord::new("pets");

    assert_eq!(record.name(), "pets");
    assert!(record.created_at().timestamp() > 0);
}

#[test]
fn test_experiment_record_serialization() {
    let record = ExperimentRecord::new("serialization");

    let json = serde_json::to_string(&record).expect("serialization failed");
    let deserialized: ExperimentRecord =
        serde_json::from_str(&json).expect("deserialization failed");

    assert_eq!(record, deserialized);
}

// =============================================================================
// RunRecord Tests
// =============================================================================

#[test]
fn test_run_record_creation() {
    let run = RunRecord::new("a1b2c3", "pets");

    assert_eq!(run.run_hash(), "a1b2c3");
    assert_eq!(run.experiment(), "pets");
    assert_eq!(run.status(), RunStatus::Pending);
    assert!(run.started_at().is_none());
    assert!(run.params().is_empty());
}

#[test]
fn test_run_record_complete_then_restart() {
    let mut run = RunRecord::new("a1b2c3", "pets");
    run.start();
    let started = run.started_at();
    run.complete(RunStatus::Success);

    assert_eq!(run.status(), RunStatus::Success);
    assert!(run.ended_at().is_some());
    assert!(!run.is_active());

    run.start();
    assert!(run.is_active());
    assert!(run.ended_at().is_none());
    assert_eq!(run.started_at(), started);
}

#[test]
fn test_run_record_serialization_keeps_params() {
    let mut run = RunRecord::builder("a1b2c3", "pets")
        .system_tracking_interval(Some(10))
        .capture_terminal_logs(true)
        .build();
    run.set_param("batch_size", serde_json::json!(64));

    let json = serde_json::to_string(&run).expect("serialization failed");
    let deserialized: RunRecord = serde_json::from_str(&json).expect("deserialization failed");

    assert_eq!(run, deserialized);
    assert_eq!(deserialized.param("batch_size"), Some(&serde_json::json!(64)));
}

#[test]
fn test_run_status_variants() {
    let statuses = [
        RunStatus::Pending,
        RunStatus::Running,
        RunStatus::Success,
        RunStatus::Failed,
        RunStatus::Cancelled,
    ];
    assert_eq!(statuses.iter().filter(|s| s.is_terminal()).count(), 3);
}

// =============================================================================
// MetricRecord Tests
// =============================================================================

#[test]
fn test_metric_record_with_explicit_timestamp() {
    let ts = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
    let metric = MetricRecord::builder("a1b2c3", "accuracy", 4, 0.91)
        .context(Context::subset("val"))
        .timestamp(ts)
        .build();

    assert_eq!(metric.timestamp(), ts);
    assert_eq!(metric.step(), 4);
    assert!(metric.in_sequence("accuracy", &Context::subset("val")));
    assert!(!metric.in_sequence("accuracy", &Context::new()));
}

#[test]
fn test_context_display() {
    let ctx = Context::subset("train").with("fold", "2");
    assert_eq!(ctx.to_string(), "{fold: 2, subset: train}");
    assert_eq!(Context::new().to_string(), "{}");
}

// =============================================================================
// ExperimentStore Tests
// =============================================================================

#[test]
fn test_store_groups_runs_by_experiment() {
    let store = ExperimentStore::new();
    store.add_run(RunRecord::new("r1", "pets"));
    store.add_run(RunRecord::new("r2", "pets"));
    store.add_run(RunRecord::new("r3", "mnist"));

    assert_eq!(store.experiment_count(), 2);
    assert_eq!(store.get_runs_for_experiment("pets").len(), 2);
    assert_eq!(store.run_hashes(), vec!["r1", "r2", "r3"]);
}

#[test]
fn test_store_update_run() {
    let store = ExperimentStore::new();
    store.add_run(RunRecord::new("r1", "pets"));

    assert_eq!(store.update_run("r1", |run| run.start()), Some(()));
    assert!(store.get_run("r1").unwrap().is_active());
    assert!(store.update_run("missing", |run| run.start()).is_none());
}

#[test]
fn test_get_metrics_for_run_ordered_by_step() {
    let store = ExperimentStore::new();
    for step in [3, 1, 2, 0] {
        store.add_metric(MetricRecord::new("r1", "loss", step, 1.0 / f64::from(step as u32 + 1)));
    }
    store.add_metric(MetricRecord::new("r1", "accuracy", 0, 0.5));
    store.add_metric(MetricRecord::new("r2", "loss", 0, 0.1));

    let steps: Vec<u64> = store
        .get_metrics_for_run("r1", "loss")
        .iter()
        .map(MetricRecord::step)
        .collect();
    assert_eq!(steps, vec![0, 1, 2, 3]);
    assert_eq!(store.metrics_for_run("r1").len(), 5);
    assert_eq!(store.last_step("r1", "loss", &Context::new()), Some(3));
    assert_eq!(store.last_step("r1", "loss", &Context::subset("val")), None);
}
