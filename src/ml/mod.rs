// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains the tensor code. The data layer hands
// it padded matrices and batches; everything that builds a
// graph, computes a cost or steps an optimiser lives here.
//
// What's in this layer:
//
//   loss.rs      — Reconstruction and ordinal costs over the
//                  R rating levels, and their blend
//
//   model.rs     — CF-NADE: cumulative context encoding,
//                  stacked tanh layers, cumulative scores,
//                  expected-rating predictions
//
//   trainer.rs   — The training loop
//                  Adam with weight decay, per-epoch
//                  evaluation, epoch callback
//
//   backend.rs   — Picks CPU or accelerator from the device
//                  id and runs a backend-generic job on it
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Zheng et al. (2016) A Neural Autoregressive Approach to CF

/// Reconstruction / ordinal costs
pub mod loss;

/// CF-NADE architecture
pub mod model;

/// Epoch loop with evaluation
pub mod trainer;

/// Device id → Burn backend
pub mod backend;
