//! Experiment Record - label grouping runs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name used when a run is created without an experiment label.
pub const DEFAULT_EXPERIMENT: &str = "default";

/// Experiment Record represents an experiment label.
///
/// Runs reference their experiment by name; the record is created the
/// first time a run is opened under that name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExperimentRecord {
    name: String,
    created_at: DateTime<Utc>,
}

impl ExperimentRecord {
    /// Create a new experiment record stamped with the current time.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created_at: Utc::now(),
        }
    }

    /// Get the experiment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_experiment_record_new() {
        let record = ExperimentRecord::new("resnet");
        assert_eq!(record.name(), "resnet");
        assert!(record.created_at().timestamp() > 0);
    }
}
