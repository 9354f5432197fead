// ============================================================
// Layer 4 — Rating Batcher
// ============================================================
// Converts a handful of padded rows plus their freshly drawn
// visibility masks into device tensors for one forward pass.
//
// How batching works here:
//   Input:  N row indices into a PaddedMatrix of width W
//   Output: RatingBatch with tensors of shape [N, W]
//
//   We flatten row after row into one long Vec, then reshape:
//   [r1_s1, r1_s2, ..., r1_sW, r2_s1, ..., rN_sW] → [N, W]
//
// Sentinel slots are rewritten before they reach the device:
//   item   -1 → 0     (a valid gather/scatter index)
//   rating -1 → 0     (matches no rating level)
// and both mask tensors are 0 there, so nothing downstream can
// pick them up.
//
// Reference: Burn Book §4 (Batcher)
//            Rust Book §8 (Vectors)

use burn::prelude::*;

use crate::data::ordering::OrderSampler;
use crate::data::rectangularizer::{PaddedMatrix, SENTINEL};

// ─── RatingBatch ──────────────────────────────────────────────────────────────
/// A batch of padded rows ready for the model forward pass.
/// All 2-D tensors have shape [batch_size, width].
#[derive(Debug, Clone)]
pub struct RatingBatch<B: Backend> {
    /// Column ids, sentinel slots set to 0
    pub items:       Tensor<B, 2, Int>,
    /// Ratings 1..=R, sentinel slots set to 0
    pub ratings:     Tensor<B, 2, Int>,
    /// 1.0 for conditioning context, 0.0 otherwise
    pub observed:    Tensor<B, 2>,
    /// 1.0 for slots whose rating is predicted, 0.0 otherwise
    pub targets:     Tensor<B, 2>,
    /// Per-row D / (D - d) reweighting — shape [batch_size, 1]
    pub row_weights: Tensor<B, 2>,
    /// Rows with at least one real entry
    pub active_rows:  usize,
    /// Total number of target slots in the batch
    pub target_count: usize,
}

// ─── RatingBatcher ────────────────────────────────────────────────────────────
/// Holds the target device so tensors are created on the
/// correct GPU/CPU.
#[derive(Clone, Debug)]
pub struct RatingBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> RatingBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    /// Build a batch from `rows` of `matrix`, drawing one ordering
    /// per row from `sampler` in the order the rows are given.
    pub fn batch(
        &self,
        matrix:  &PaddedMatrix,
        rows:    &[usize],
        sampler: &mut OrderSampler,
    ) -> RatingBatch<B> {
        let batch_size = rows.len();
        let width      = matrix.width();
        let cells      = batch_size * width;

        let mut items    = Vec::with_capacity(cells);
        let mut ratings  = Vec::with_capacity(cells);
        let mut observed = vec![0.0f32; cells];
        let mut targets  = vec![0.0f32; cells];
        let mut weights  = Vec::with_capacity(batch_size);

        let mut active_rows  = 0usize;
        let mut target_count = 0usize;

        for (b, &row) in rows.iter().enumerate() {
            // ── Ids and ratings, sentinels zeroed ─────────────────────────────
            items.extend(matrix.items_row(row).iter().map(|&x| if x == SENTINEL { 0 } else { x }));
            ratings.extend(matrix.ratings_row(row).iter().map(|&x| if x == SENTINEL { 0 } else { x }));

            // ── Autoregressive split for this row ─────────────────────────────
            let mask = sampler.draw(matrix.row_len(row));
            for (k, &is_observed) in mask.observed.iter().enumerate() {
                if is_observed {
                    observed[b * width + k] = 1.0;
                } else {
                    targets[b * width + k] = 1.0;
                }
            }
            if !mask.is_empty() {
                active_rows += 1;
            }
            target_count += mask.target_count();
            weights.push(mask.weight);
        }

        // ── Create tensors ────────────────────────────────────────────────────
        let items = Tensor::<B, 1, Int>::from_ints(items.as_slice(), &self.device)
            .reshape([batch_size, width]);
        let ratings = Tensor::<B, 1, Int>::from_ints(ratings.as_slice(), &self.device)
            .reshape([batch_size, width]);
        let observed = Tensor::<B, 1>::from_floats(observed.as_slice(), &self.device)
            .reshape([batch_size, width]);
        let targets = Tensor::<B, 1>::from_floats(targets.as_slice(), &self.device)
            .reshape([batch_size, width]);
        let row_weights = Tensor::<B, 1>::from_floats(weights.as_slice(), &self.device)
            .reshape([batch_size, 1]);

        RatingBatch {
            items,
            ratings,
            observed,
            targets,
            row_weights,
            active_rows,
            target_count,
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::rectangularizer::rectangularize;
    use crate::domain::interaction::Interactions;

    type TestBackend = burn::backend::NdArray;

    fn matrix() -> PaddedMatrix {
        let data = Interactions::from_triples(&[(0, 1, 4), (0, 2, 3), (1, 0, 5), (2, 3, 2), (2, 4, 1)]);
        // row 3 stays empty
        rectangularize(&data, 4).unwrap()
    }

    #[test]
    fn test_shapes_and_sentinel_rewrite() {
        let batcher = RatingBatcher::<TestBackend>::new(Default::default());
        let mut sampler = OrderSampler::seeded(0);
        let batch = batcher.batch(&matrix(), &[1, 3], &mut sampler);

        assert_eq!(batch.items.dims(), [2, 2]);
        assert_eq!(batch.row_weights.dims(), [2, 1]);

        let items: Vec<i64> = batch.items.into_data().convert::<i64>().to_vec().unwrap();
        let ratings: Vec<i64> = batch.ratings.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(items,   vec![0, 0, 0, 0]);
        assert_eq!(ratings, vec![5, 0, 0, 0]);
    }

    #[test]
    fn test_masks_partition_real_slots() {
        let batcher = RatingBatcher::<TestBackend>::new(Default::default());
        let mut sampler = OrderSampler::seeded(9);
        let batch = batcher.batch(&matrix(), &[0, 1, 2, 3], &mut sampler);

        let observed: Vec<f32> = batch.observed.into_data().to_vec().unwrap();
        let targets:  Vec<f32> = batch.targets.into_data().to_vec().unwrap();
        let covered: Vec<f32> = observed.iter().zip(&targets).map(|(o, t)| o + t).collect();

        // real slots are covered exactly once; padding and the empty row not at all
        assert_eq!(covered, vec![1.0, 1.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0]);
        assert_eq!(batch.active_rows, 3);
        assert_eq!(batch.target_count, targets.iter().filter(|&&t| t == 1.0).count());

        let weights: Vec<f32> = batch.row_weights.into_data().to_vec().unwrap();
        assert_eq!(weights[3], 0.0);
        assert_eq!(weights[1], 1.0);
    }
}
