//! Experiment Tracking Schema
//!
//! Records kept by a run repository.
//!
//! ## Schema Overview
//!
//! ```text
//! ExperimentRecord (1) ──< RunRecord (N)
//!                              │
//!                              └──< MetricRecord (N) [time-series, keyed by name + Context]
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use trueno_track::experiment::{Context, ExperimentStore, MetricRecord, RunRecord, RunStatus};
//!
//! let store = ExperimentStore::new();
//!
//! let mut run = RunRecord::new("4f0c1e2d9a7b6c5d4e3f2a1b", "default");
//! run.start();
//! store.add_run(run);
//!
//! store.add_metric(
//!     MetricRecord::builder("4f0c1e2d9a7b6c5d4e3f2a1b", "train_loss", 0, 0.5)
//!         .context(Context::subset("train"))
//!         .build(),
//! );
//!
//! store.update_run("4f0c1e2d9a7b6c5d4e3f2a1b", |run| run.complete(RunStatus::Success));
//! ```

mod context;
mod experiment_record;
mod metric_record;
mod run_record;
mod store;

pub use context::Context;
pub use experiment_record::{ExperimentRecord, DEFAULT_EXPERIMENT};
pub use metric_record::{MetricRecord, MetricRecordBuilder};
pub use run_record::{RunRecord, RunRecordBuilder, RunStatus};
pub use store::ExperimentStore;
