// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Pick the backend            (Layer 5 - ml)
//   Step 2: Load and orient the JSON    (Layer 4 - data)
//   Step 3: Split train/valid/test      (Layer 4 - data)
//   Step 4: Pad rows into matrices      (Layer 4 - data)
//   Step 5: Build or resume the model   (Layer 5 + 6)
//   Step 6: Save the model config       (Layer 6 - infra)
//   Step 7: Run the training loop       (Layer 5 - ml)
//   Step 8: Final checkpoint + report   (Layer 6 - infra)
//
// One seed drives everything: the backend's parameter init,
// the split permutation and (inside the trainer) the row
// shuffles and autoregressive orderings.
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{bail, Result};
use burn::tensor::backend::AutodiffBackend;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::progress::CheckpointProgress;
use crate::data::{
    loader::JsonDatasetLoader,
    rectangularizer::rectangularize,
    splitter::split_indices,
};
use crate::domain::interaction::Orientation;
use crate::domain::traits::{DatasetSource, ModelSink};
use crate::infra::{
    checkpoint::{self, CheckpointManager},
    metrics::MetricsLogger,
};
use crate::ml::{
    backend::{dispatch, BackendJob},
    model::CfNadeConfig,
    trainer::{CfNadeTrainer, EvalOrdering, TrainerConfig},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// All knobs for one training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Negative → CPU, otherwise accelerator index
    pub gpu:            i32,
    /// Checkpoint to resume from
    pub input:          Option<PathBuf>,
    pub output:         PathBuf,
    pub data_file:      PathBuf,
    pub batch_size:     usize,
    pub layer_num:      usize,
    pub hidden_size:    usize,
    pub ordinal_weight: f64,
    pub epochs:         usize,
    /// 0 disables epoch checkpoints
    pub save_iter:      usize,
    pub lr:             f64,
    pub weight_decay:   f64,
    pub item_base:      bool,
    pub seed:           u64,
    pub eval_ordering:  EvalOrdering,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            gpu:            -1,
            input:          None,
            output:         PathBuf::from("model.bin"),
            data_file:      PathBuf::from("dataset.json"),
            batch_size:     512,
            layer_num:      1,
            hidden_size:    500,
            ordinal_weight: 1.0,
            epochs:         200,
            save_iter:      10,
            lr:             1e-3,
            weight_decay:   0.015,
            item_base:      false,
            seed:           1,
            eval_ordering:  EvalOrdering::Fixed,
        }
    }
}

impl TrainConfig {
    fn orientation(&self) -> Orientation {
        if self.item_base { Orientation::ItemBased } else { Orientation::UserBased }
    }

    fn trainer_config(&self) -> TrainerConfig {
        TrainerConfig {
            epochs:         self.epochs,
            batch_size:     self.batch_size,
            learning_rate:  self.lr,
            weight_decay:   self.weight_decay,
            ordinal_weight: self.ordinal_weight,
            eval_ordering:  self.eval_ordering,
            seed:           self.seed,
        }
    }
}

/// What a finished run reports back to the CLI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainSummary {
    pub best_valid_accuracy: Option<f64>,
    /// Test accuracy of the epoch with the best validation accuracy
    pub best_test_accuracy:  Option<f64>,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(self) -> Result<TrainSummary> {
        // ── Step 1: Pick the backend ──────────────────────────────────────────
        // Fails here, before any data is read, if the device is unavailable.
        dispatch(self.config.gpu, self)
    }
}

impl BackendJob for TrainUseCase {
    type Output = TrainSummary;

    fn run<B: AutodiffBackend>(self, device: B::Device) -> Result<TrainSummary> {
        let cfg = &self.config;
        B::seed(cfg.seed);

        // ── Step 2: Load and orient ───────────────────────────────────────────
        let dataset = JsonDatasetLoader::new(&cfg.data_file)
            .load()?
            .oriented(cfg.orientation());
        let rating_levels = dataset.rating_levels();
        tracing::info!(
            "{} rows x {} columns, {} rating levels, {} train-pool interactions",
            dataset.user_count,
            dataset.item_count,
            rating_levels,
            dataset.train.len(),
        );

        // ── Step 3: Split ─────────────────────────────────────────────────────
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let split = split_indices(dataset.train.len(), dataset.test.is_some(), &mut rng)?;

        let train = dataset.train.select(&split.train);
        let valid = dataset.train.select(&split.valid);
        let test  = match (&split.test, &dataset.test) {
            (Some(indices), _)  => dataset.train.select(indices),
            (None, Some(given)) => given.clone(),
            (None, None)        => bail!("split produced no test set and none was supplied"),
        };
        tracing::info!(
            "Split: {} train, {} valid, {} test",
            train.len(),
            valid.len(),
            test.len(),
        );

        // ── Step 4: Pad rows into matrices ────────────────────────────────────
        let rows = dataset.user_count;
        let train = rectangularize(&train, rows)?;
        let valid = rectangularize(&valid, rows)?;
        let test  = rectangularize(&test,  rows)?;
        for (name, m) in [("train", &train), ("valid", &valid), ("test", &test)] {
            tracing::debug!(
                "{} matrix: {}x{}, {} interactions",
                name,
                m.rows(),
                m.width(),
                m.interaction_count(),
            );
        }

        // ── Step 5: Build or resume the model ─────────────────────────────────
        let model_config = CfNadeConfig::new(dataset.item_count, rating_levels, cfg.layer_num.max(1))
            .with_hidden_size(cfg.hidden_size);
        let mut model = model_config.init::<B>(&device);

        if let Some(input) = &cfg.input {
            if let Some(saved) = checkpoint::load_config(input)? {
                if !saved.same_architecture(&model_config) {
                    bail!(
                        "checkpoint '{}' was trained with {:?}, current run needs {:?}",
                        input.display(),
                        saved,
                        model_config,
                    );
                }
            }
            model = checkpoint::load_model(model, input, &device)?;
        }

        // ── Step 6: Save config next to the checkpoint ────────────────────────
        let ckpt = CheckpointManager::new(&cfg.output)?;
        ckpt.save_config(&model_config)?;
        let metrics = MetricsLogger::new(ckpt.metrics_path())?;
        tracing::info!("Logging epoch metrics to '{}'", metrics.csv_path().display());

        // ── Step 7: Train ─────────────────────────────────────────────────────
        let mut progress = CheckpointProgress::new(ckpt, cfg.save_iter).with_metrics(metrics);
        let trainer = CfNadeTrainer::<B>::new(cfg.trainer_config(), device);
        let model = trainer.fit(model, &train, &valid, &test, &mut progress)?;

        // ── Step 8: Final checkpoint ──────────────────────────────────────────
        progress.sink().save_primary(&model)?;

        Ok(TrainSummary {
            best_valid_accuracy: progress.tracker().best_valid_accuracy(),
            best_test_accuracy:  progress.tracker().best_test_accuracy(),
        })
    }
}
