// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records per-epoch metrics to a CSV file.
//
// Metrics recorded per epoch, for train / valid / test:
//   - loss:  reweighted autoregressive cost per non-empty row
//   - acc:   fraction of targets predicted to the exact level
//   - rmse:  root mean squared error of the expected rating
//
// A split with no interactions leaves its three cells empty.
//
// Example CSV output:
//   epoch,train_loss,train_acc,train_rmse,valid_loss,valid_acc,valid_rmse,test_loss,test_acc,test_rmse
//   1,2.104512,0.301200,1.204100,2.150300,0.288000,1.233400,,,
//   2,1.993020,0.334100,1.150800,2.071900,0.301700,1.198300,,,
//
// How to read the metrics:
//   - train_loss should fall every epoch
//   - valid_acc rising then flattening → the best checkpoint is near the knee
//   - valid_loss rising while train_loss falls → overfitting
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::progress::{EpochReport, SplitMetrics};

const HEADER: &str = "epoch,\
    train_loss,train_acc,train_rmse,\
    valid_loss,valid_acc,valid_rmse,\
    test_loss,test_acc,test_rmse";

/// Appends one CSV row per epoch.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the header if the file doesn't exist yet, so a
    /// resumed run keeps appending to the same log.
    pub fn new(csv_path: impl Into<PathBuf>) -> Result<Self> {
        let csv_path = csv_path.into();

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create metrics log '{}'", csv_path.display()))?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, report: &EpochReport) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open metrics log '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{},{},{}",
            report.epoch,
            cells(Some(&report.train)),
            cells(report.valid.as_ref()),
            cells(report.test.as_ref()),
        )?;

        tracing::debug!("Logged epoch {} metrics", report.epoch);
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

fn cells(m: Option<&SplitMetrics>) -> String {
    match m {
        Some(m) => format!("{:.6},{:.6},{:.6}", m.loss, m.accuracy, m.rmse),
        None    => ",,".to_string(),
    }
}
