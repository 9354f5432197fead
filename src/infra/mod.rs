// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Handles the filesystem concerns that don't belong in any
// specific business layer:
//
//   checkpoint.rs      — Saving and loading model weights
//                        Serialises model parameters with Burn's
//                        named MessagePack recorder. Also saves
//                        the model config as JSON so a resumed
//                        run can check the architecture.
//
//   metrics.rs         — Training metrics logging
//                        Writes epoch-level loss, accuracy and
//                        RMSE per split to a CSV file.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
