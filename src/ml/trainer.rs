// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Epoch loop over shuffled minibatches of rows with Adam and
// weight decay, followed by forward-only evaluation.
//
// Per epoch:
//   1. shuffle row order (seeded)
//   2. for every batch_size rows:
//        draw orderings → forward → backward → Adam step
//   3. model.valid() → evaluate train, valid, test splits
//   4. callback.on_epoch_end(model, report)
//
// Key Burn insights:
//   - Training uses B (Autodiff<…>) for gradients
//   - model.valid() returns the model on B::InnerBackend
//   - Evaluation batches must also use B::InnerBackend
//
// Evaluation ordering: the model is evaluated under the same
// random masking scheme as training. EvalOrdering::Fixed
// re-seeds the evaluation sampler every epoch, so epoch N and
// epoch N+1 are scored under identical masks and the metric
// only moves when the model does. EvalOrdering::Random keeps
// drawing fresh orderings, matching training-time behaviour.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    module::AutodiffModule,
    optim::{decay::WeightDecayConfig, AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::data::{batcher::RatingBatcher, ordering::OrderSampler, rectangularizer::PaddedMatrix};
use crate::domain::progress::{EpochReport, SplitMetrics};
use crate::domain::traits::EpochCallback;
use crate::ml::model::{BatchStats, CfNadeModel};

/// How evaluation draws its autoregressive orderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvalOrdering {
    /// Same seed every epoch, so metrics are comparable across epochs
    Fixed,
    /// Fresh orderings every epoch
    Random,
}

// ─── TrainerConfig ────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    pub epochs:         usize,
    pub batch_size:     usize,
    pub learning_rate:  f64,
    pub weight_decay:   f64,
    pub ordinal_weight: f64,
    pub eval_ordering:  EvalOrdering,
    pub seed:           u64,
}

// ─── SplitAccumulator ─────────────────────────────────────────────────────────
/// Running sums over the batches of one split.
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitAccumulator {
    totals: BatchStats,
}

impl SplitAccumulator {
    pub fn add(&mut self, stats: BatchStats) {
        self.totals.cost_sum      += stats.cost_sum;
        self.totals.correct       += stats.correct;
        self.totals.squared_error += stats.squared_error;
        self.totals.active_rows   += stats.active_rows;
        self.totals.target_count  += stats.target_count;
    }

    /// Means over the split; empty denominators give 0.
    pub fn finish(&self) -> SplitMetrics {
        let rows    = self.totals.active_rows;
        let targets = self.totals.target_count;
        SplitMetrics {
            loss:     if rows    > 0 { self.totals.cost_sum / rows as f64 } else { 0.0 },
            accuracy: if targets > 0 { self.totals.correct / targets as f64 } else { 0.0 },
            rmse:     if targets > 0 { (self.totals.squared_error / targets as f64).sqrt() } else { 0.0 },
        }
    }
}

// ─── CfNadeTrainer ────────────────────────────────────────────────────────────
pub struct CfNadeTrainer<B: AutodiffBackend> {
    config: TrainerConfig,
    device: B::Device,
}

impl<B: AutodiffBackend> CfNadeTrainer<B> {
    pub fn new(config: TrainerConfig, device: B::Device) -> Self {
        Self { config, device }
    }

    /// Train for the configured number of epochs and return the
    /// final model. Callback errors stop training immediately.
    pub fn fit<C>(
        &self,
        mut model: CfNadeModel<B>,
        train:     &PaddedMatrix,
        valid:     &PaddedMatrix,
        test:      &PaddedMatrix,
        callback:  &mut C,
    ) -> Result<CfNadeModel<B>>
    where
        C: EpochCallback<CfNadeModel<B>>,
    {
        let cfg = &self.config;

        // ── Adam optimiser with L2 weight decay ──────────────────────────────
        // The decay term is added to the gradient before the Adam update.
        let mut optim = AdamConfig::new()
            .with_weight_decay(Some(WeightDecayConfig::new(cfg.weight_decay as f32)))
            .init();

        // ── Randomness: one stream per concern ────────────────────────────────
        let mut seeds         = StdRng::seed_from_u64(cfg.seed);
        let mut shuffle_rng   = StdRng::seed_from_u64(seeds.gen());
        let mut train_sampler = OrderSampler::seeded(seeds.gen());
        let eval_seed: u64    = seeds.gen();
        let mut eval_sampler  = OrderSampler::seeded(eval_seed);

        let train_batcher = RatingBatcher::<B>::new(self.device.clone());
        let eval_batcher  = RatingBatcher::<B::InnerBackend>::new(self.device.clone());

        let mut rows: Vec<usize> = (0..train.rows()).collect();

        // ── Epoch loop ────────────────────────────────────────────────────────
        for epoch in 1..=cfg.epochs {

            // ── Training phase ────────────────────────────────────────────────
            rows.shuffle(&mut shuffle_rng);
            let mut step_loss_sum = 0.0f64;
            let mut steps         = 0usize;

            for chunk in rows.chunks(cfg.batch_size.max(1)) {
                let batch = train_batcher.batch(train, chunk, &mut train_sampler);
                if batch.target_count == 0 {
                    continue;
                }

                let loss = model.forward_loss(&batch, cfg.ordinal_weight).loss;
                step_loss_sum += loss.clone().into_scalar().elem::<f64>();
                steps += 1;

                // Backward pass + Adam update
                let grads = loss.backward();
                let grads = GradientsParams::from_grads(grads, &model);
                model = optim.step(cfg.learning_rate, model, grads);
            }

            tracing::debug!(
                "epoch {} ran {} steps, mean step loss {:.4}",
                epoch,
                steps,
                if steps > 0 { step_loss_sum / steps as f64 } else { 0.0 },
            );

            // ── Evaluation phase ──────────────────────────────────────────────
            // model.valid() → CfNadeModel<B::InnerBackend>, no autodiff graph
            let model_valid = model.valid();
            let mut score = |matrix: &PaddedMatrix| {
                if cfg.eval_ordering == EvalOrdering::Fixed {
                    eval_sampler = OrderSampler::seeded(eval_seed);
                }
                evaluate(&model_valid, &eval_batcher, matrix, &mut eval_sampler, cfg)
            };

            let report = EpochReport {
                epoch,
                train: score(train).unwrap_or_default(),
                valid: score(valid),
                test:  score(test),
            };

            callback.on_epoch_end(&model, &report)?;
        }

        tracing::info!("Training complete after {} epochs", cfg.epochs);
        Ok(model)
    }
}

/// Forward-only pass over every row of `matrix`, in row order.
/// Returns None when the split holds no interactions.
pub fn evaluate<B: Backend>(
    model:   &CfNadeModel<B>,
    batcher: &RatingBatcher<B>,
    matrix:  &PaddedMatrix,
    sampler: &mut OrderSampler,
    cfg:     &TrainerConfig,
) -> Option<SplitMetrics> {
    if matrix.is_empty() {
        return None;
    }

    let rows: Vec<usize> = (0..matrix.rows()).collect();
    let mut acc = SplitAccumulator::default();

    for chunk in rows.chunks(cfg.batch_size.max(1)) {
        let batch = batcher.batch(matrix, chunk, sampler);
        if batch.active_rows == 0 {
            continue;
        }
        let output = model.forward_loss(&batch, cfg.ordinal_weight);
        acc.add(output.stats(&batch));
    }

    Some(acc.finish())
}
