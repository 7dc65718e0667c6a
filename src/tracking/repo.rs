//! Embedded run repository
//!
//! A [`Repo`] owns an [`ExperimentStore`] shared by every run handle it
//! opens. With a location, closed runs are persisted through
//! [`crate::storage`] and reloaded by [`Repo::open`], so a run hash
//! captured in one process can be resumed in the next.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{RunHandle, RunOptions, TrackingClient};
use crate::config::ConfigValue;
use crate::experiment::{Context, ExperimentStore, MetricRecord, RunRecord, RunStatus, DEFAULT_EXPERIMENT};
use crate::{storage, Error, Result};

/// Repository directory used when no location is given
pub const DEFAULT_REPO_DIR: &str = ".trueno-track";

/// Run parameter holding the host description
pub const SYSTEM_PARAMS_KEY: &str = "__system_params";

/// Embedded run repository.
///
/// Cloning is cheap and yields a handle to the same store. A `Repo` is
/// bound to one location, so [`RunOptions::repo`] has no effect on it;
/// use [`super::Tracker`] to route runs by location.
#[derive(Debug, Clone)]
pub struct Repo {
    store: Arc<ExperimentStore>,
    location: Option<PathBuf>,
}

impl Repo {
    /// Repository that lives only as long as its clones.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(ExperimentStore::new()),
            location: None,
        }
    }

    /// Open (or create) a repository directory and load its runs.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created or a persisted
    /// run cannot be read.
    pub fn open(location: impl Into<PathBuf>) -> Result<Self> {
        let location = location.into();
        std::fs::create_dir_all(&location)?;

        let store = ExperimentStore::new();
        let runs = storage::load_runs(&location)?;
        let loaded = runs.len();
        for (run, metrics) in runs {
            let run_hash = run.run_hash().to_string();
            store.add_run(run);
            store.extend_metrics(&run_hash, metrics);
        }

        debug!(location = %location.display(), runs = loaded, "repository opened");
        Ok(Self {
            store: Arc::new(store),
            location: Some(location),
        })
    }

    /// Location used when a caller does not pick one.
    #[must_use]
    pub fn default_location() -> PathBuf {
        PathBuf::from(DEFAULT_REPO_DIR)
    }

    /// Directory this repository persists to, if any.
    #[must_use]
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    /// The underlying store (for queries).
    #[must_use]
    pub fn store(&self) -> &ExperimentStore {
        &self.store
    }

    /// Snapshot of one run record.
    #[must_use]
    pub fn run(&self, run_hash: &str) -> Option<RunRecord> {
        self.store.get_run(run_hash)
    }

    fn create_run(&self, options: &RunOptions) -> Result<RepoRun> {
        let experiment = options.experiment.as_deref().unwrap_or(DEFAULT_EXPERIMENT);
        let run_hash = self.new_run_hash();

        let mut record = RunRecord::builder(&run_hash, experiment)
            .system_tracking_interval(options.system_tracking_interval)
            .log_system_params(options.log_system_params)
            .capture_terminal_logs(options.capture_terminal_logs)
            .build();
        record.start();
        if options.log_system_params {
            record.set_param(SYSTEM_PARAMS_KEY, system_params());
        }
        self.store.add_run(record);

        info!(run = %run_hash, experiment, "run created");
        Ok(RepoRun::new(run_hash, self))
    }

    fn resume_run(&self, run_hash: &str, options: &RunOptions) -> Result<RepoRun> {
        self.store
            .update_run(run_hash, |run| {
                run.set_tracking_flags(
                    options.system_tracking_interval,
                    options.log_system_params,
                    options.capture_terminal_logs,
                );
                if options.log_system_params {
                    run.set_param(SYSTEM_PARAMS_KEY, system_params());
                }
                run.start();
            })
            .ok_or_else(|| Error::RunNotFound(run_hash.to_string()))?;

        info!(run = %run_hash, "run resumed");
        Ok(RepoRun::new(run_hash.to_string(), self))
    }

    /// 24 hex characters (96 random bits), unique within this repository.
    fn new_run_hash(&self) -> String {
        loop {
            let candidate = format!("{:024x}", rand::random::<u128>() >> 32);
            if !self.store.contains_run(&candidate) {
                return candidate;
            }
        }
    }
}

impl TrackingClient for Repo {
    type Handle = RepoRun;

    fn open_run(&self, options: &RunOptions) -> Result<RepoRun> {
        if let Some(requested) = &options.repo {
            debug!(
                requested = %requested.display(),
                "repo option ignored, runs stay in this repository"
            );
        }
        match &options.run_hash {
            Some(run_hash) => self.resume_run(run_hash, options),
            None => self.create_run(options),
        }
    }
}

fn system_params() -> Value {
    json!({
        "os": std::env::consts::OS,
        "arch": std::env::consts::ARCH,
        "family": std::env::consts::FAMILY,
        "pid": std::process::id(),
        "executable": std::env::current_exe().ok().map(|path| path.display().to_string()),
    })
}

/// Open run of a [`Repo`].
#[derive(Debug)]
pub struct RepoRun {
    run_hash: String,
    store: Arc<ExperimentStore>,
    location: Option<PathBuf>,
    // Next auto step per (name, context) sequence
    next_steps: FxHashMap<(String, Context), u64>,
    active: bool,
}

impl RepoRun {
    fn new(run_hash: String, repo: &Repo) -> Self {
        Self {
            run_hash,
            store: Arc::clone(&repo.store),
            location: repo.location.clone(),
            next_steps: FxHashMap::default(),
            active: true,
        }
    }

    fn ensure_active(&self) -> Result<()> {
        if self.active {
            Ok(())
        } else {
            Err(Error::RunClosed(self.run_hash.clone()))
        }
    }
}

impl RunHandle for RepoRun {
    fn hash(&self) -> &str {
        &self.run_hash
    }

    fn track(&mut self, value: f64, name: &str, step: Option<u64>, context: &Context) -> Result<()> {
        self.ensure_active()?;
        if name.is_empty() {
            return Err(Error::InvalidMetric {
                name: String::new(),
                reason: "metric name is empty".to_string(),
            });
        }
        if !value.is_finite() {
            return Err(Error::InvalidMetric {
                name: name.to_string(),
                reason: format!("non-finite value {value}"),
            });
        }

        let store = &self.store;
        let run_hash = &self.run_hash;
        let next = self
            .next_steps
            .entry((name.to_string(), context.clone()))
            .or_insert_with(|| store.last_step(run_hash, name, context).map_or(0, |last| last + 1));
        let step = step.unwrap_or(*next);
        *next = (*next).max(step.saturating_add(1));

        store.add_metric(
            MetricRecord::builder(run_hash.as_str(), name, step, value)
                .context(context.clone())
                .build(),
        );
        Ok(())
    }

    fn set(&mut self, key: &str, value: &ConfigValue, strict: bool) -> Result<()> {
        self.ensure_active()?;
        if key.is_empty() {
            return Err(Error::InvalidParam {
                key: String::new(),
                reason: "parameter key is empty".to_string(),
            });
        }

        let json = value.to_json(key, strict)?;
        self.store
            .update_run(&self.run_hash, |run| run.set_param(key, json))
            .ok_or_else(|| Error::RunNotFound(self.run_hash.clone()))
    }

    fn close(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }

        let mut record = self
            .store
            .get_run(&self.run_hash)
            .ok_or_else(|| Error::RunNotFound(self.run_hash.clone()))?;
        record.complete(RunStatus::Success);

        // The stored record only completes once it is on disk
        if let Some(location) = &self.location {
            storage::save_run(location, &record, &self.store.metrics_for_run(&self.run_hash))?;
        }
        self.store
            .update_run(&self.run_hash, |run| *run = record)
            .ok_or_else(|| Error::RunNotFound(self.run_hash.clone()))?;

        self.active = false;
        info!(run = %self.run_hash, "run closed");
        Ok(())
    }

    fn active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_hash_format() {
        let repo = Repo::in_memory();
        let run = repo.open_run(&RunOptions::default()).unwrap();
        assert_eq!(run.hash().len(), 24);
        assert!(run.hash().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_auto_step_continues_after_explicit_step() {
        let repo = Repo::in_memory();
        let mut run = repo.open_run(&RunOptions::default()).unwrap();
        let ctx = Context::new();

        run.track(1.0, "acc", Some(5), &ctx).unwrap();
        run.track(2.0, "acc", None, &ctx).unwrap();

        let steps: Vec<u64> = repo
            .store()
            .get_metrics_for_run(run.hash(), "acc")
            .iter()
            .map(MetricRecord::step)
            .collect();
        assert_eq!(steps, vec![5, 6]);
    }

    #[test]
    fn test_system_params_only_when_requested() {
        let repo = Repo::in_memory();
        let quiet = repo.open_run(&RunOptions::default()).unwrap();
        let chatty = repo
            .open_run(&RunOptions {
                log_system_params: true,
                ..RunOptions::default()
            })
            .unwrap();

        assert!(repo.run(quiet.hash()).unwrap().param(SYSTEM_PARAMS_KEY).is_none());
        let params = repo.run(chatty.hash()).unwrap();
        assert_eq!(
            params.param(SYSTEM_PARAMS_KEY).unwrap()["os"],
            Value::from(std::env::consts::OS)
        );
    }

    #[test]
    fn test_failed_persist_keeps_run_open() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repo::open(dir.path()).unwrap();
        let mut run = repo.open_run(&RunOptions::default()).unwrap();
        // A plain file where the runs directory should go
        std::fs::write(dir.path().join(storage::RUNS_DIR), b"").unwrap();

        assert!(run.close().is_err());
        assert!(run.active());
        assert_eq!(repo.run(run.hash()).unwrap().status(), RunStatus::Running);
        run.track(1.0, "loss", None, &Context::new()).unwrap();

        std::fs::remove_file(dir.path().join(storage::RUNS_DIR)).unwrap();
        run.close().unwrap();
        assert_eq!(repo.run(run.hash()).unwrap().status(), RunStatus::Success);
        assert!(Repo::open(dir.path()).unwrap().run(run.hash()).is_some());
    }

    #[test]
    fn test_repo_option_does_not_redirect_runs() {
        let repo = Repo::in_memory();
        let run = repo
            .open_run(&RunOptions {
                repo: Some(PathBuf::from("/nonexistent/elsewhere")),
                ..RunOptions::default()
            })
            .unwrap();
        assert!(repo.run(run.hash()).is_some());
    }

    #[test]
    fn test_empty_names_rejected() {
        let repo = Repo::in_memory();
        let mut run = repo.open_run(&RunOptions::default()).unwrap();
        assert!(run.track(1.0, "", None, &Context::new()).is_err());
        assert!(run.set("", &ConfigValue::Int(1), false).is_err());
    }
}
