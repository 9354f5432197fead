// ============================================================
// Layer 3 — Epoch Metrics and Progress Tracking
// ============================================================
// Plain data describing how an epoch went, plus the small
// state machine that decides when a new best model exists.
//
// ProgressTracker lifecycle:
//   create  → ProgressTracker::new()          (no best yet)
//   update  → tracker.observe(valid, test)    (once per epoch)
//   read    → tracker.best_test_accuracy()    (after training)
//
// "No best yet" is represented by None, which compares worse
// than any real accuracy, so the first scored epoch always wins.

use serde::{Deserialize, Serialize};

// ─── SplitMetrics ─────────────────────────────────────────────────────────────
/// Mean loss / accuracy / RMSE over one split for one epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitMetrics {
    /// Reweighted autoregressive cost per non-empty row
    pub loss:     f64,
    /// Fraction of target ratings whose rounded prediction is exact
    pub accuracy: f64,
    /// Root mean squared error of the expected rating on targets
    pub rmse:     f64,
}

// ─── EpochReport ──────────────────────────────────────────────────────────────
/// Everything the trainer hands to the epoch callback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochReport {
    /// 1-based epoch number
    pub epoch: usize,
    pub train: SplitMetrics,
    /// None when the validation split has no interactions
    pub valid: Option<SplitMetrics>,
    /// None when the test split has no interactions
    pub test:  Option<SplitMetrics>,
}

impl EpochReport {
    pub fn valid_accuracy(&self) -> Option<f64> {
        self.valid.map(|m| m.accuracy)
    }

    pub fn test_accuracy(&self) -> Option<f64> {
        self.test.map(|m| m.accuracy)
    }
}

// ─── ProgressTracker ──────────────────────────────────────────────────────────
/// Best validation accuracy seen so far and the test accuracy
/// recorded in that same epoch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressTracker {
    best_valid_accuracy: Option<f64>,
    best_test_accuracy:  Option<f64>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one epoch. Returns true when `valid_accuracy` is a
    /// strict improvement, in which case the test accuracy of this
    /// epoch becomes the reported one.
    pub fn observe(&mut self, valid_accuracy: Option<f64>, test_accuracy: Option<f64>) -> bool {
        let Some(valid) = valid_accuracy else {
            return false;
        };
        if valid.is_nan() {
            return false;
        }
        let improved = match self.best_valid_accuracy {
            None       => true,
            Some(best) => valid > best,
        };
        if improved {
            self.best_valid_accuracy = Some(valid);
            self.best_test_accuracy  = test_accuracy;
        }
        improved
    }

    pub fn best_valid_accuracy(&self) -> Option<f64> {
        self.best_valid_accuracy
    }

    pub fn best_test_accuracy(&self) -> Option<f64> {
        self.best_test_accuracy
    }
}
