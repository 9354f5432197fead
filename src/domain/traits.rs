// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams between layers. The trainer only knows it has an
// EpochCallback; the callback only knows it has a ModelSink;
// the use case only knows it has a DatasetSource.
//
//   JsonDatasetLoader  → DatasetSource
//   CheckpointManager  → ModelSink<CfNadeModel<B>>
//   CheckpointProgress → EpochCallback<CfNadeModel<B>>
//
// All three are generic over the model type M so this layer
// stays free of any tensor-library types.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::interaction::RatingDataset;
use crate::domain::progress::EpochReport;

// ─── DatasetSource ────────────────────────────────────────────────────────────
/// Anything that can produce a validated rating dataset.
pub trait DatasetSource {
    fn load(&self) -> Result<RatingDataset>;
}

// ─── ModelSink ────────────────────────────────────────────────────────────────
/// Where model snapshots go. Every write is synchronous and an
/// error must abort training.
pub trait ModelSink<M> {
    /// Overwrite the primary checkpoint.
    fn save_primary(&self, model: &M) -> Result<()>;

    /// Write the epoch-suffixed checkpoint for `epoch`.
    fn save_epoch(&self, model: &M, epoch: usize) -> Result<()>;
}

// ─── EpochCallback ────────────────────────────────────────────────────────────
/// Invoked by the trainer exactly once per epoch, after that
/// epoch's updates and evaluation are complete.
pub trait EpochCallback<M> {
    fn on_epoch_end(&mut self, model: &M, report: &EpochReport) -> Result<()>;
}
