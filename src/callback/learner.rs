//! Training loop surface read by the tracking callback

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::Describe;

/// Scalar hyper-parameters of one optimizer parameter group.
pub type ParamGroup = BTreeMap<String, f64>;

/// Epoch-level values recorded by the training loop.
///
/// `metric_names[i]` labels `values[i]`; a `None` value was not computed
/// this epoch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recorder {
    /// Names of the recorded columns (`"epoch"`, `"train_loss"`, ...)
    pub metric_names: Vec<String>,
    /// Values of the last epoch, aligned with `metric_names`
    pub values: Vec<Option<f64>>,
}

impl Recorder {
    /// Create a recorder snapshot.
    #[must_use]
    pub fn new<S: Into<String>>(metric_names: impl IntoIterator<Item = S>, values: Vec<Option<f64>>) -> Self {
        Self {
            metric_names: metric_names.into_iter().map(Into::into).collect(),
            values,
        }
    }

    /// Name/value pairs; extra names or values without a partner are dropped.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.metric_names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// The training loop as seen from a tracking callback.
///
/// Required methods back the per-batch and per-epoch hooks. The
/// `anyhow::Result` methods are optional introspection used only for
/// the config snapshot: the defaults report the attribute as missing and
/// a failing attribute only drops its own field.
pub trait Learner {
    /// Loss of the last batch.
    fn loss(&self) -> f64;

    /// Global batch iteration counter.
    fn train_iter(&self) -> u64;

    /// True during the training phase, false during validation.
    fn training(&self) -> bool;

    /// Optimizer hyper-parameters, one map per parameter group.
    fn hypers(&self) -> &[ParamGroup];

    /// Recorded epoch values.
    fn recorder(&self) -> &Recorder;

    /// Callbacks attached to the loop (including the tracking callback).
    fn callbacks(&self) -> &[Arc<dyn Describe>];

    /// The learner itself as a describable config value.
    fn describe(&self) -> Arc<dyn Describe>;

    /// Reset the loop's own metric accumulators.
    fn reset_metrics(&mut self);

    /// Number of model inputs per batch.
    fn n_inp(&self) -> anyhow::Result<usize> {
        Err(missing("n_inp"))
    }

    /// Shapes of every tensor of one validation batch (inputs first).
    fn one_batch_shapes(&self) -> anyhow::Result<Vec<Vec<usize>>> {
        Err(missing("one_batch"))
    }

    /// Batch size of the data loaders.
    fn batch_size(&self) -> anyhow::Result<usize> {
        Err(missing("batch_size"))
    }

    /// Number of training batches per epoch.
    fn batches_per_epoch(&self) -> anyhow::Result<usize> {
        Err(missing("batch_per_epoch"))
    }

    /// Total trainable parameter count of the model.
    fn model_parameters(&self) -> anyhow::Result<u64> {
        Err(missing("model_parameters"))
    }

    /// Device type the data is moved to (`"cpu"`, `"cuda"`).
    fn device(&self) -> anyhow::Result<String> {
        Err(missing("device"))
    }

    /// Index of the first trainable layer group; 0 means unfrozen.
    fn frozen_idx(&self) -> anyhow::Result<usize> {
        Err(missing("frozen_idx"))
    }

    /// Dataset transforms.
    fn dataset_tfms(&self) -> anyhow::Result<String> {
        Err(missing("dataset.tfms"))
    }

    /// Per-item transforms of the data loaders.
    fn after_item(&self) -> anyhow::Result<String> {
        Err(missing("after_item"))
    }

    /// Pre-collation transforms of the data loaders.
    fn before_batch(&self) -> anyhow::Result<String> {
        Err(missing("before_batch"))
    }

    /// Per-batch transforms of the data loaders.
    fn after_batch(&self) -> anyhow::Result<String> {
        Err(missing("after_batch"))
    }
}

fn missing(attribute: &str) -> anyhow::Error {
    anyhow::anyhow!("learner does not expose `{attribute}`")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_pairs_names_and_values() {
        let recorder = Recorder::new(["epoch", "train_loss"], vec![Some(1.0), None]);
        let pairs: Vec<_> = recorder.iter().collect();
        assert_eq!(pairs, vec![("epoch", Some(1.0)), ("train_loss", None)]);
    }

    #[test]
    fn test_recorder_truncates_to_shorter_side() {
        let recorder = Recorder::new(["epoch", "train_loss", "accuracy"], vec![Some(0.0)]);
        assert_eq!(recorder.iter().count(), 1);
    }
}
