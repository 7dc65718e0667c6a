//! Tracking callback configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::tracking::{RunOptions, DEFAULT_SYSTEM_TRACKING_INTERVAL};
use crate::Result;

/// Settings of a [`super::TrackingCallback`].
///
/// Deserializable so it can live next to the rest of a training config:
///
/// ```rust
/// use trueno_track::callback::CallbackConfig;
///
/// let config = CallbackConfig::from_json(r#"{"experiment_name": "resnet", "log_system_params": false}"#)?;
/// assert_eq!(config.experiment_name.as_deref(), Some("resnet"));
/// assert_eq!(config.system_tracking_interval, Some(10));
/// assert!(config.capture_terminal_logs);
/// # Ok::<(), trueno_track::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallbackConfig {
    /// Repository location; `None` uses the client's default
    pub repo: Option<PathBuf>,
    /// Experiment label of a newly created run
    pub experiment_name: Option<String>,
    /// System usage sampling interval in seconds; `None` disables it
    pub system_tracking_interval: Option<u64>,
    /// Record installed system parameters on the run
    pub log_system_params: bool,
    /// Capture terminal output into the run
    pub capture_terminal_logs: bool,
    /// Hash of a run to resume instead of creating one
    pub run_hash: Option<String>,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            repo: None,
            experiment_name: None,
            system_tracking_interval: Some(DEFAULT_SYSTEM_TRACKING_INTERVAL),
            log_system_params: true,
            capture_terminal_logs: true,
            run_hash: None,
        }
    }
}

impl CallbackConfig {
    /// Parse a JSON config; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the JSON is malformed or has mistyped fields.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Options for creating a fresh run.
    #[must_use]
    pub fn create_options(&self) -> RunOptions {
        RunOptions {
            run_hash: None,
            repo: self.repo.clone(),
            experiment: self.experiment_name.clone(),
            system_tracking_interval: self.system_tracking_interval,
            log_system_params: self.log_system_params,
            capture_terminal_logs: self.capture_terminal_logs,
        }
    }

    /// Options for resuming `run_hash`; the experiment label is not sent.
    #[must_use]
    pub fn resume_options(&self, run_hash: &str) -> RunOptions {
        RunOptions {
            run_hash: Some(run_hash.to_string()),
            experiment: None,
            ..self.create_options()
        }
    }
}
