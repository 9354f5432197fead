// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from the dataset file to device-ready batches.
//
//   dataset.json
//       │
//       ▼
//   JsonDatasetLoader → validated interaction columns
//       │
//       ▼
//   split_indices     → train / valid / test index sets
//       │
//       ▼
//   rectangularize    → padded item + rating matrices
//       │
//       ▼
//   OrderSampler      → one random ordering per row
//       │
//       ▼
//   RatingBatcher     → tensors for the model forward pass
//
// Each module is responsible for exactly one step.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Rust Book §13 (Iterators and Closures)

/// Reads and validates the JSON dataset container
pub mod loader;

/// Shuffles and splits interactions into train/valid/test
pub mod splitter;

/// Pads ragged rows into fixed-width matrices
pub mod rectangularizer;

/// Seeded autoregressive ordering per row
pub mod ordering;

/// Builds tensor batches from padded rows
pub mod batcher;
