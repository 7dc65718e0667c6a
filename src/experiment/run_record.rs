//! Run Record - one tracked training session

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Run is created but not yet started.
    Pending,
    /// Run is open and accepting metrics and parameters.
    Running,
    /// Run was closed normally.
    Success,
    /// Run failed with an error.
    Failed,
    /// Run was cancelled by user or system.
    Cancelled,
}

impl RunStatus {
    /// True for the final states a run is closed with.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Cancelled)
    }
}

/// Run Record represents a single tracked training session.
///
/// The `run_hash` is the stable identity of the run: resuming a run by
/// hash reopens the same record and keeps appending to its metric
/// sequences. Parameters are a JSON object keyed by top-level name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunRecord {
    run_hash: String,
    experiment: String,
    status: RunStatus,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    system_tracking_interval: Option<u64>,
    log_system_params: bool,
    capture_terminal_logs: bool,
    params: Map<String, Value>,
}

impl RunRecord {
    /// Create a new run record in Pending status with tracking flags off.
    ///
    /// # Arguments
    ///
    /// * `run_hash` - Unique identifier for the run
    /// * `experiment` - Name of the experiment the run belongs to
    #[must_use]
    pub fn new(run_hash: impl Into<String>, experiment: impl Into<String>) -> Self {
        RunRecordBuilder::new(run_hash, experiment).build()
    }

    /// Create a builder for constructing a run record with optional fields.
    #[must_use]
    pub fn builder(run_hash: impl Into<String>, experiment: impl Into<String>) -> RunRecordBuilder {
        RunRecordBuilder::new(run_hash, experiment)
    }

    /// Get the run hash.
    #[must_use]
    pub fn run_hash(&self) -> &str {
        &self.run_hash
    }

    /// Get the experiment name.
    #[must_use]
    pub fn experiment(&self) -> &str {
        &self.experiment
    }

    /// Get the current run status.
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    /// True while the run accepts writes.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == RunStatus::Running
    }

    /// Get the start timestamp, if the run has started.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Get the end timestamp, if the run has completed.
    #[must_use]
    pub const fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// System usage sampling interval in seconds, `None` when disabled.
    #[must_use]
    pub const fn system_tracking_interval(&self) -> Option<u64> {
        self.system_tracking_interval
    }

    /// Whether system parameters were requested for this run.
    #[must_use]
    pub const fn log_system_params(&self) -> bool {
        self.log_system_params
    }

    /// Whether terminal output capture was requested for this run.
    #[must_use]
    pub const fn capture_terminal_logs(&self) -> bool {
        self.capture_terminal_logs
    }

    /// All run parameters.
    #[must_use]
    pub const fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// One run parameter.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    /// Set (or overwrite) a run parameter.
    pub fn set_param(&mut self, key: impl Into<String>, value: Value) {
        self.params.insert(key.into(), value);
    }

    /// Update the tracking flags (done again on every resume).
    pub fn set_tracking_flags(
        &mut self,
        system_tracking_interval: Option<u64>,
        log_system_params: bool,
        capture_terminal_logs: bool,
    ) {
        self.system_tracking_interval = system_tracking_interval;
        self.log_system_params = log_system_params;
        self.capture_terminal_logs = capture_terminal_logs;
    }

    /// Start the run, transitioning to Running.
    ///
    /// The first start stamps `started_at`; starting a finished run
    /// (resume) clears `ended_at` and keeps the original start time.
    pub fn start(&mut self) {
        self.status = RunStatus::Running;
        self.started_at.get_or_insert_with(Utc::now);
        self.ended_at = None;
    }

    /// Complete the run with the given final status.
    ///
    /// Sets the `ended_at` timestamp to now.
    pub fn complete(&mut self, status: RunStatus) {
        self.status = status;
        self.ended_at = Some(Utc::now());
    }
}

/// Builder for `RunRecord`.
#[derive(Debug)]
pub struct RunRecordBuilder {
    run_hash: String,
    experiment: String,
    system_tracking_interval: Option<u64>,
    log_system_params: bool,
    capture_terminal_logs: bool,
}

impl RunRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(run_hash: impl Into<String>, experiment: impl Into<String>) -> Self {
        Self {
            run_hash: run_hash.into(),
            experiment: experiment.into(),
            system_tracking_interval: None,
            log_system_params: false,
            capture_terminal_logs: false,
        }
    }

    /// Set the system usage sampling interval in seconds.
    #[must_use]
    pub const fn system_tracking_interval(mut self, interval: Option<u64>) -> Self {
        self.system_tracking_interval = interval;
        self
    }

    /// Request system parameter logging.
    #[must_use]
    pub const fn log_system_params(mut self, enabled: bool) -> Self {
        self.log_system_params = enabled;
        self
    }

    /// Request terminal output capture.
    #[must_use]
    pub const fn capture_terminal_logs(mut self, enabled: bool) -> Self {
        self.capture_terminal_logs = enabled;
        self
    }

    /// Build the `RunRecord`.
    #[must_use]
    pub fn build(self) -> RunRecord {
        RunRecord {
            run_hash: self.run_hash,
            experiment: self.experiment,
            status: RunStatus::Pending,
            started_at: None,
            ended_at: None,
            system_tracking_interval: self.system_tracking_interval,
            log_system_params: self.log_system_params,
            capture_terminal_logs: self.capture_terminal_logs,
            params: Map::new(),
        }
    }
}
