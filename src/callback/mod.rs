//! Training loop lifecycle callback
//!
//! [`TrackingCallback`] forwards training loop events into one tracked run:
//!
//! | Hook               | Effect |
//! |--------------------|--------|
//! | `on_fit_start`     | gather + format config, open the run, attach config as params |
//! | `on_epoch_start`   | reset the loop's metric accumulators |
//! | `on_batch_end`     | track `train_loss` and every `{hyper}_{group}` at the batch step |
//! | `on_epoch_end`     | track recorded epoch metrics (except loss, epoch, time) |
//! | `teardown`         | close the run once |
//!
//! State: `Uninitialized → Active → Closed`, never back. The run is
//! opened lazily by whichever hook needs it first.
//!
//! Config gathering and formatting never fail; a missing learner
//! attribute only drops its own field. Metric emission and run
//! creation/closing errors are returned to the caller.

mod config;
mod gather;
mod learner;

pub use config::CallbackConfig;
pub use gather::{gather_config, LEARNER_KEY};
pub use learner::{Learner, ParamGroup, Recorder};

use std::fmt;
use std::marker::PhantomData;
use std::path::PathBuf;

use tracing::warn;

use crate::config::{format_config, ConfigMap};
use crate::experiment::Context;
use crate::tracking::{RunHandle, TrackingClient};
use crate::{Error, Result};

/// Recorded epoch values never forwarded by `on_epoch_end`
pub const EXCLUDED_EPOCH_METRICS: [&str; 3] = ["train_loss", "epoch", "time"];

/// Name of the per-batch loss sequence
pub const LOSS_METRIC: &str = "train_loss";

/// Lifecycle of a [`TrackingCallback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    /// No run opened yet
    Uninitialized,
    /// Run open
    Active,
    /// Run closed by teardown; terminal
    Closed,
}

/// Training loop callback that records one run through a [`TrackingClient`].
///
/// Call [`TrackingCallback::teardown`] on every exit path; `Drop` only
/// backs it up and can merely log a failed close.
///
/// ```rust
/// use trueno_track::callback::TrackingCallback;
/// use trueno_track::tracking::{Repo, RunHandle};
///
/// # fn main() -> trueno_track::Result<()> {
/// let repo = Repo::in_memory();
/// let mut callback = TrackingCallback::builder()
///     .experiment_name("resnet")
///     .log_system_params(false)
///     .build(repo.clone());
///
/// let hash = callback.ensure_handle()?.hash().to_string();
/// callback.teardown()?;
///
/// assert_eq!(repo.run(&hash).unwrap().experiment(), "resnet");
/// # Ok(())
/// # }
/// ```
pub struct TrackingCallback<C: TrackingClient> {
    client: C,
    config: CallbackConfig,
    run: Option<C::Handle>,
    closed: bool,
}

impl<C: TrackingClient> TrackingCallback<C> {
    /// Display name of the callback, used to skip itself when gathering config.
    pub const NAME: &'static str = "TrackingCallback";

    /// Create a callback; a `run_hash` in `config` makes it resume that run.
    #[must_use]
    pub fn new(client: C, config: CallbackConfig) -> Self {
        Self {
            client,
            config,
            run: None,
            closed: false,
        }
    }

    /// Start building a callback.
    #[must_use]
    pub fn builder() -> TrackingCallbackBuilder<C> {
        TrackingCallbackBuilder::default()
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> AdapterState {
        if self.closed {
            AdapterState::Closed
        } else if self.run.is_some() {
            AdapterState::Active
        } else {
            AdapterState::Uninitialized
        }
    }

    /// Hash of the tracked run: the configured one before the run is
    /// opened, the created one afterwards.
    #[must_use]
    pub fn run_hash(&self) -> Option<&str> {
        self.config.run_hash.as_deref()
    }

    /// Effective configuration.
    #[must_use]
    pub const fn config(&self) -> &CallbackConfig {
        &self.config
    }

    /// The tracking client.
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Open the run if needed and return it.
    ///
    /// Resumes the stored run hash when there is one; otherwise creates
    /// a run and stores its hash.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AdapterClosed`] after teardown, or the client's
    /// error if the run cannot be opened.
    pub fn ensure_handle(&mut self) -> Result<&mut C::Handle> {
        if self.closed {
            return Err(Error::AdapterClosed);
        }
        let run = match self.run.take() {
            Some(run) => run,
            None => self.open_run()?,
        };
        Ok(self.run.insert(run))
    }

    /// Lazy accessor for the run; same as [`Self::ensure_handle`].
    ///
    /// # Errors
    ///
    /// See [`Self::ensure_handle`].
    pub fn experiment(&mut self) -> Result<&mut C::Handle> {
        self.ensure_handle()
    }

    fn open_run(&mut self) -> Result<C::Handle> {
        if let Some(run_hash) = &self.config.run_hash {
            return self.client.open_run(&self.config.resume_options(run_hash));
        }
        let run = self.client.open_run(&self.config.create_options())?;
        self.config.run_hash = Some(run.hash().to_string());
        Ok(run)
    }

    /// Fit start: snapshot the config and open the run with it.
    ///
    /// Does nothing if the run is already open. Parameters that the run
    /// refuses are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns error if the run cannot be opened.
    pub fn on_fit_start<L: Learner + ?Sized>(&mut self, learner: &L) -> Result<()> {
        if self.closed {
            return Err(Error::AdapterClosed);
        }
        if self.run.is_some() {
            return Ok(());
        }

        let config = format_config(self.gather_config(learner));
        let run = self.ensure_handle()?;
        for (key, value) in &config {
            if let Err(e) = run.set(key, value, false) {
                warn!(key = %key, error = %e, "could not log config parameter");
            }
        }
        Ok(())
    }

    /// Epoch start: reset the loop's metric accumulators.
    pub fn on_epoch_start<L: Learner + ?Sized>(&mut self, learner: &mut L) {
        learner.reset_metrics();
    }

    /// Batch end: track the loss and every optimizer hyper-parameter.
    ///
    /// # Errors
    ///
    /// Returns error if the run cannot be opened or a sample is rejected.
    pub fn on_batch_end<L: Learner + ?Sized>(&mut self, learner: &L) -> Result<()> {
        let context = Context::subset(if learner.training() { "train" } else { "val" });
        let step = Some(learner.train_iter());
        let run = self.ensure_handle()?;

        run.track(learner.loss(), LOSS_METRIC, step, &context)?;
        for (group, hypers) in learner.hypers().iter().enumerate() {
            for (name, value) in hypers {
                run.track(*value, &format!("{name}_{group}"), step, &context)?;
            }
        }
        Ok(())
    }

    /// Epoch end: track every recorded value except the excluded names
    /// and values that were not computed.
    ///
    /// # Errors
    ///
    /// Returns error if the run cannot be opened or a sample is rejected.
    pub fn on_epoch_end<L: Learner + ?Sized>(&mut self, learner: &L) -> Result<()> {
        let context = Context::new();
        let run = self.ensure_handle()?;

        for (name, value) in learner.recorder().iter() {
            if EXCLUDED_EPOCH_METRICS.contains(&name) {
                continue;
            }
            if let Some(value) = value {
                run.track(value, name, None, &context)?;
            }
        }
        Ok(())
    }

    /// Close the run if it is open. Repeated calls are no-ops.
    ///
    /// # Errors
    ///
    /// Returns the client's error if closing fails; the callback then
    /// stays active so teardown can be retried.
    pub fn teardown(&mut self) -> Result<()> {
        let Some(run) = self.run.as_mut() else {
            return Ok(());
        };
        if run.active() {
            run.close()?;
        }
        self.closed = true;
        Ok(())
    }

    /// Best-effort config snapshot of `learner`; never fails.
    #[must_use]
    pub fn gather_config<L: Learner + ?Sized>(&self, learner: &L) -> ConfigMap {
        gather_config(learner, Self::NAME)
    }
}

impl<C: TrackingClient> Drop for TrackingCallback<C> {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            warn!(error = %e, "tracking callback dropped with a run that failed to close");
        }
    }
}

/// Builder for [`TrackingCallback`].
pub struct TrackingCallbackBuilder<C> {
    config: CallbackConfig,
    client: PhantomData<fn() -> C>,
}

impl<C> Default for TrackingCallbackBuilder<C> {
    fn default() -> Self {
        Self::from_config(CallbackConfig::default())
    }
}

impl<C> fmt::Debug for TrackingCallbackBuilder<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackingCallbackBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl<C> TrackingCallbackBuilder<C> {
    /// Start from an existing config.
    #[must_use]
    pub const fn from_config(config: CallbackConfig) -> Self {
        Self {
            config,
            client: PhantomData,
        }
    }

    /// Set the repository location.
    #[must_use]
    pub fn repo(mut self, repo: impl Into<PathBuf>) -> Self {
        self.config.repo = Some(repo.into());
        self
    }

    /// Set the experiment label.
    #[must_use]
    pub fn experiment_name(mut self, name: impl Into<String>) -> Self {
        self.config.experiment_name = Some(name.into());
        self
    }

    /// Set the system usage sampling interval in seconds (`None` disables).
    #[must_use]
    pub const fn system_tracking_interval(mut self, seconds: Option<u64>) -> Self {
        self.config.system_tracking_interval = seconds;
        self
    }

    /// Enable or disable system parameter logging.
    #[must_use]
    pub const fn log_system_params(mut self, enabled: bool) -> Self {
        self.config.log_system_params = enabled;
        self
    }

    /// Enable or disable terminal output capture.
    #[must_use]
    pub const fn capture_terminal_logs(mut self, enabled: bool) -> Self {
        self.config.capture_terminal_logs = enabled;
        self
    }

    /// Resume this run instead of creating one.
    #[must_use]
    pub fn run_hash(mut self, run_hash: impl Into<String>) -> Self {
        self.config.run_hash = Some(run_hash.into());
        self
    }

    /// Build the callback around `client`.
    #[must_use]
    pub fn build(self, client: C) -> TrackingCallback<C>
    where
        C: TrackingClient,
    {
        TrackingCallback::new(client, self.config)
    }
}
