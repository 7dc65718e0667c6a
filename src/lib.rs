//! # Trueno-Track: Experiment Tracking for Training Loops
//!
//! **Version**: 0.1.0
//!
//! Trueno-Track records training runs: a lifecycle callback forwards
//! training loop events (fit start, batch end, epoch end, teardown) to a
//! tracking client, which stores run parameters and metric sequences in an
//! embedded, optionally on-disk repository.
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Poka-Yoke safety**: one run per callback, idempotent teardown
//! - **Jidoka**: config introspection never aborts training
//! - **Genchi Genbutsu**: metrics persisted as Parquet for direct inspection
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use trueno_track::callback::TrackingCallback;
//! use trueno_track::tracking::Tracker;
//!
//! let mut callback = TrackingCallback::builder()
//!     .repo("runs/.trueno-track")
//!     .experiment_name("resnet34")
//!     .build(Tracker::new());
//!
//! // callback.on_fit_start(&learner)?;
//! // for each batch:  callback.on_batch_end(&learner)?;
//! // for each epoch:  callback.on_epoch_end(&learner)?;
//! callback.teardown()?;
//! # Ok::<(), trueno_track::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod callback;
pub mod config;
pub mod error;
pub mod experiment;
pub mod schema;
pub mod storage;
pub mod tracking;

pub use error::{Error, Result};

use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// Meant for binaries and demos; does nothing if a global subscriber is
/// already set.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .finish()
        .try_init();
}
