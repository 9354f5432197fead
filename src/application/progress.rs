// ============================================================
// Layer 2 — Checkpoint Progress (epoch callback)
// ============================================================
// What happens between two epochs:
//
//   1. print the epoch summary line
//   2. append the metrics row          (if a logger is attached)
//   3. tracker.observe(valid, test)
//        improved → overwrite the primary checkpoint
//   4. epoch % save_iter == 0 → write the epoch checkpoint
//
// Any write failure is returned to the trainer, which stops.
//
// Reference: Rust Book §10 (Generic Types and Traits)

use anyhow::Result;

use crate::domain::progress::{EpochReport, ProgressTracker, SplitMetrics};
use crate::domain::traits::{EpochCallback, ModelSink};
use crate::infra::metrics::MetricsLogger;

pub struct CheckpointProgress<S> {
    sink:      S,
    tracker:   ProgressTracker,
    save_iter: usize,
    metrics:   Option<MetricsLogger>,
}

impl<S> CheckpointProgress<S> {
    /// `save_iter == 0` disables epoch checkpoints.
    pub fn new(sink: S, save_iter: usize) -> Self {
        Self { sink, tracker: ProgressTracker::new(), save_iter, metrics: None }
    }

    pub fn with_metrics(mut self, logger: MetricsLogger) -> Self {
        self.metrics = Some(logger);
        self
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl<M, S: ModelSink<M>> EpochCallback<M> for CheckpointProgress<S> {
    fn on_epoch_end(&mut self, model: &M, report: &EpochReport) -> Result<()> {
        println!("{}", summary_line(report));

        if let Some(logger) = &self.metrics {
            logger.log(report)?;
        }

        if self.tracker.observe(report.valid_accuracy(), report.test_accuracy()) {
            tracing::info!(
                "epoch {}: new best valid accuracy {:.4}, saving checkpoint",
                report.epoch,
                report.valid_accuracy().unwrap_or_default(),
            );
            self.sink.save_primary(model)?;
        }

        if self.save_iter > 0 && report.epoch % self.save_iter == 0 {
            self.sink.save_epoch(model, report.epoch)?;
        }

        Ok(())
    }
}

fn summary_line(report: &EpochReport) -> String {
    fn part(name: &str, m: Option<&SplitMetrics>) -> String {
        match m {
            Some(m) => format!("{name} loss {:.4} acc {:.4} rmse {:.4}", m.loss, m.accuracy, m.rmse),
            None    => format!("{name} -"),
        }
    }
    format!(
        "epoch {:>4} | {} | {} | {}",
        report.epoch,
        part("train", Some(&report.train)),
        part("valid", report.valid.as_ref()),
        part("test",  report.test.as_ref()),
    )
}
