//! Tracking client interface
//!
//! The lifecycle callback talks to a tracking backend only through
//! [`TrackingClient`] (open a run) and [`RunHandle`] (write to it).
//!
//! Two clients ship with the crate:
//! - [`Repo`]: one embedded run repository, in memory or on disk
//! - [`Tracker`]: opens a [`Repo`] per requested location on demand
//!
//! ```rust
//! use trueno_track::experiment::Context;
//! use trueno_track::tracking::{Repo, RunHandle, RunOptions, TrackingClient};
//!
//! # fn main() -> trueno_track::Result<()> {
//! let repo = Repo::in_memory();
//! let mut run = repo.open_run(&RunOptions::default())?;
//! run.track(0.5, "train_loss", Some(0), &Context::subset("train"))?;
//! run.close()?;
//!
//! assert!(!run.active());
//! assert_eq!(repo.store().get_metrics_for_run(run.hash(), "train_loss").len(), 1);
//! # Ok(())
//! # }
//! ```

mod repo;
mod tracker;

pub use repo::{Repo, RepoRun, DEFAULT_REPO_DIR, SYSTEM_PARAMS_KEY};
pub use tracker::Tracker;

use std::path::PathBuf;

use crate::config::ConfigValue;
use crate::experiment::Context;
use crate::Result;

/// Default system usage sampling interval, in seconds
pub const DEFAULT_SYSTEM_TRACKING_INTERVAL: u64 = 10;

/// Parameters for opening a run.
///
/// With `run_hash` set the run is resumed; otherwise a new run is
/// created under `experiment`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Hash of a run to resume
    pub run_hash: Option<String>,
    /// Repository location; `None` selects the client's default
    pub repo: Option<PathBuf>,
    /// Experiment label for a new run; `None` selects the default experiment
    pub experiment: Option<String>,
    /// System usage sampling interval in seconds; `None` disables it
    pub system_tracking_interval: Option<u64>,
    /// Record system parameters on the run
    pub log_system_params: bool,
    /// Capture terminal output into the run
    pub capture_terminal_logs: bool,
}

impl RunOptions {
    /// True when these options resume an existing run.
    #[must_use]
    pub const fn is_resume(&self) -> bool {
        self.run_hash.is_some()
    }
}

/// Backend able to create or resume runs.
pub trait TrackingClient {
    /// Handle type of an open run
    type Handle: RunHandle;

    /// Create a run, or resume the one named by `options.run_hash`.
    ///
    /// # Errors
    ///
    /// Returns an error if the run cannot be created, or the hash to
    /// resume is unknown.
    fn open_run(&self, options: &RunOptions) -> Result<Self::Handle>;
}

/// Write access to one open run.
pub trait RunHandle {
    /// Stable identifier of the run, usable to resume it later.
    fn hash(&self) -> &str;

    /// Append a sample to the `name` sequence under `context`.
    ///
    /// `step = None` continues the sequence after its last step.
    ///
    /// # Errors
    ///
    /// Returns an error if the run is closed or the value is rejected.
    fn track(&mut self, value: f64, name: &str, step: Option<u64>, context: &Context) -> Result<()>;

    /// Set a run-level parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if the run is closed, the key is empty, or
    /// `strict` is set and the value has no faithful stored form.
    fn set(&mut self, key: &str, value: &ConfigValue, strict: bool) -> Result<()>;

    /// Close the run. Closing a closed run is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the run cannot be finalized.
    fn close(&mut self) -> Result<()>;

    /// True while the run accepts writes.
    fn active(&self) -> bool;
}
