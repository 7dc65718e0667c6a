//! Training Loop: Tracking a Run End to End
//!
//! This example drives the tracking callback through a simulated training
//! loop (3 epochs x 20 batches), then reopens the repository from disk and
//! resumes the same run for one more epoch.
//!
//! Run with: cargo run --example training_loop
//! Verbose:  RUST_LOG=debug cargo run --example training_loop

use std::fmt;
use std::sync::Arc;

use trueno_track::callback::{Learner, ParamGroup, Recorder, TrackingCallback};
use trueno_track::config::{ConfigMap, Describe};
use trueno_track::experiment::Context;
use trueno_track::tracking::{Repo, Tracker};

#[derive(Debug)]
struct Described {
    name: String,
    args: Option<ConfigMap>,
}

impl fmt::Display for Described {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Describe for Described {
    fn stored_args(&self) -> Option<ConfigMap> {
        self.args.clone()
    }
}

/// Toy learner: loss decays geometrically, learning rate follows a cosine.
struct ToyLearner {
    epoch: u64,
    iter: u64,
    loss: f64,
    training: bool,
    hypers: Vec<ParamGroup>,
    recorder: Recorder,
    callbacks: Vec<Arc<dyn Describe>>,
    epoch_losses: Vec<f64>,
}

impl ToyLearner {
    const BATCHES: u64 = 20;
    const BASE_LR: f64 = 0.01;

    fn new() -> Self {
        let mut scheduler = ConfigMap::new();
        scheduler.insert("max_lr", Self::BASE_LR);
        scheduler.insert("pct_start", 0.25);

        Self {
            epoch: 0,
            iter: 0,
            loss: 2.3,
            training: true,
            hypers: vec![ParamGroup::new()],
            recorder: Recorder::default(),
            callbacks: vec![
                Arc::new(Described {
                    name: "OneCycleScheduler".to_string(),
                    args: Some(scheduler),
                }) as Arc<dyn Describe>,
                Arc::new(Described {
                    name: TrackingCallback::<Tracker>::NAME.to_string(),
                    args: None,
                }),
            ],
            epoch_losses: Vec::new(),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn step(&mut self) {
        let progress = (self.iter % Self::BATCHES) as f64 / Self::BATCHES as f64;
        let lr = Self::BASE_LR * 0.5 * (1.0 + (std::f64::consts::PI * progress).cos());
        self.hypers[0].insert("lr".to_string(), lr);
        self.hypers[0].insert("mom".to_string(), 0.9);
        self.loss *= 0.97;
        self.epoch_losses.push(self.loss);
        self.iter += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    fn finish_epoch(&mut self) {
        let mean = self.epoch_losses.iter().sum::<f64>() / self.epoch_losses.len() as f64;
        self.recorder = Recorder::new(
            ["epoch", "train_loss", "valid_loss", "accuracy", "time"],
            vec![
                Some(self.epoch as f64),
                Some(mean),
                Some(mean * 1.1),
                Some(1.0 - mean / 3.0),
                Some(1.5),
            ],
        );
        self.epoch += 1;
    }
}

impl Learner for ToyLearner {
    fn loss(&self) -> f64 {
        self.loss
    }

    fn train_iter(&self) -> u64 {
        self.iter
    }

    fn training(&self) -> bool {
        self.training
    }

    fn hypers(&self) -> &[ParamGroup] {
        &self.hypers
    }

    fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    fn callbacks(&self) -> &[Arc<dyn Describe>] {
        &self.callbacks
    }

    fn describe(&self) -> Arc<dyn Describe> {
        let mut args = ConfigMap::new();
        args.insert("arch", "toy_mlp");
        args.insert("wd", 0.01);
        Arc::new(Described {
            name: "Learner(toy_mlp)".to_string(),
            args: Some(args),
        })
    }

    fn reset_metrics(&mut self) {
        self.epoch_losses.clear();
    }

    fn n_inp(&self) -> anyhow::Result<usize> {
        Ok(1)
    }

    fn one_batch_shapes(&self) -> anyhow::Result<Vec<Vec<usize>>> {
        Ok(vec![vec![32, 784], vec![32]])
    }

    fn batch_size(&self) -> anyhow::Result<usize> {
        Ok(32)
    }

    fn batches_per_epoch(&self) -> anyhow::Result<usize> {
        Ok(Self::BATCHES as usize)
    }

    fn model_parameters(&self) -> anyhow::Result<u64> {
        Ok(101_770)
    }

    fn device(&self) -> anyhow::Result<String> {
        Ok("cpu".to_string())
    }
}

fn run_epoch(cb: &mut TrackingCallback<Tracker>, learner: &mut ToyLearner) -> trueno_track::Result<()> {
    cb.on_epoch_start(learner);
    for _ in 0..ToyLearner::BATCHES {
        learner.step();
        cb.on_batch_end(&*learner)?;
    }
    learner.finish_epoch();
    cb.on_epoch_end(&*learner)
}

fn main() -> trueno_track::Result<()> {
    trueno_track::init_tracing();

    let location = std::env::temp_dir().join("trueno-track-demo");
    println!("=== Trueno-Track Training Loop ===\n");
    println!("Repository: {}\n", location.display());

    // Phase 1: train 3 epochs
    let mut learner = ToyLearner::new();
    let mut cb = TrackingCallback::builder()
        .repo(&location)
        .experiment_name("toy-mlp")
        .build(Tracker::new());

    cb.on_fit_start(&learner)?;
    for _ in 0..3 {
        run_epoch(&mut cb, &mut learner)?;
    }
    cb.teardown()?;

    let run_hash = cb.run_hash().unwrap_or_default().to_string();
    println!("Trained 3 epochs, run hash: {run_hash}");

    // Phase 2: resume the run with a fresh client
    let mut cb = TrackingCallback::builder()
        .repo(&location)
        .run_hash(run_hash.clone())
        .build(Tracker::new());
    run_epoch(&mut cb, &mut learner)?;
    cb.teardown()?;
    println!("Resumed for 1 more epoch\n");

    // Inspect what was persisted
    let repo = Repo::open(&location)?;
    let Some(run) = repo.run(&run_hash) else {
        println!("Run {run_hash} not found in {}", location.display());
        return Ok(());
    };
    println!("Experiment: {}", run.experiment());
    println!("Status:     {:?}", run.status());
    println!("Parameters:");
    for (key, value) in run.params() {
        println!("  {key} = {value}");
    }

    let losses = repo
        .store()
        .get_metrics_in_context(&run_hash, "train_loss", &Context::subset("train"));
    println!("\ntrain_loss samples: {}", losses.len());
    if let (Some(first), Some(last)) = (losses.first(), losses.last()) {
        println!("  step {:>3}: {:.4}", first.step(), first.value());
        println!("  step {:>3}: {:.4}", last.step(), last.value());
    }

    println!("\naccuracy per epoch:");
    for metric in repo.store().get_metrics_for_run(&run_hash, "accuracy") {
        println!("  epoch {}: {:.4}", metric.step(), metric.value());
    }

    Ok(())
}
