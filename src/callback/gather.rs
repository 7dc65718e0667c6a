//! Best-effort config snapshot of a learner.

use tracing::{debug, warn};

use super::Learner;
use crate::config::{ConfigMap, ConfigValue};

/// Key of the learner's own entry in the snapshot
pub const LEARNER_KEY: &str = "Learner";

/// Collect everything loggable about `learner`; never fails.
///
/// Callbacks whose display form equals `own_name` are skipped so the
/// tracking callback does not describe itself.
pub fn gather_config<L: Learner + ?Sized>(learner: &L, own_name: &str) -> ConfigMap {
    let mut config = ConfigMap::new();
    config.insert(LEARNER_KEY, ConfigValue::Object(learner.describe()));

    for callback in learner.callbacks() {
        let name = callback.to_string();
        if name == own_name {
            continue;
        }
        let value = callback
            .stored_args()
            .map_or(ConfigValue::Bool(true), ConfigValue::Map);
        config.insert(name, value);
    }

    if let Err(e) = gather_input_dims(learner, &mut config) {
        warn!(error = %e, "failed to gather input dimensions");
    }

    record(&mut config, &["batch_size"], learner.batch_size().map(ConfigValue::from));
    record(
        &mut config,
        &["batch_per_epoch"],
        learner.batches_per_epoch().map(ConfigValue::from),
    );
    record(
        &mut config,
        &["model_parameters"],
        learner.model_parameters().map(ConfigValue::from),
    );
    record(&mut config, &["device"], learner.device().map(ConfigValue::from));
    record(
        &mut config,
        &["frozen"],
        learner.frozen_idx().map(|idx| ConfigValue::Bool(idx != 0)),
    );
    record(&mut config, &["frozen_idx"], learner.frozen_idx().map(ConfigValue::from));
    record(&mut config, &["dataset", "tfms"], learner.dataset_tfms().map(ConfigValue::from));
    record(&mut config, &["dls", "after_item"], learner.after_item().map(ConfigValue::from));
    record(&mut config, &["dls", "before_batch"], learner.before_batch().map(ConfigValue::from));
    record(&mut config, &["dls", "after_batch"], learner.after_batch().map(ConfigValue::from));

    config
}

fn record(config: &mut ConfigMap, path: &[&str], outcome: anyhow::Result<ConfigValue>) {
    match outcome {
        Ok(value) => config.insert_path(path, value),
        Err(e) => debug!(field = %path.join("."), error = %e, "config field unavailable"),
    }
}

/// `n_inp` plus `input {n} dim {i}` for the first `n_inp` tensors of one
/// batch. The dims are merged only if every input could be measured.
fn gather_input_dims<L: Learner + ?Sized>(learner: &L, config: &mut ConfigMap) -> anyhow::Result<()> {
    let n_inp = learner.n_inp()?;
    config.insert("n_inp", n_inp);

    let shapes = learner.one_batch_shapes()?;
    let mut dims = ConfigMap::new();
    for n in 0..n_inp {
        let shape = shapes.get(n).ok_or_else(|| {
            anyhow::anyhow!("batch holds {} tensors, expected {n_inp} inputs", shapes.len())
        })?;
        for (i, dim) in shape.iter().enumerate() {
            dims.insert(format!("input {} dim {}", n + 1, i + 1), *dim);
        }
    }

    config.extend(dims);
    Ok(())
}
