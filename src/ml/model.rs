// ============================================================
// Layer 5 — CF-NADE Model
// ============================================================
// For one row (a user in user-base mode) the model sees the
// ratings in the observed context and predicts a distribution
// over R levels for every target slot.
//
//   context x  = Σ_{observed i} Σ_{j≤r_i} onehot(i, j)    [M·R]
//   h_1        = tanh(W x + c)                             [H]
//   h_{l+1}    = tanh(U_l h_l + c_l)     (layer_num - 1 times)
//   raw_j(i)   = V_j[i]·h + b_j[i]                         [M, R]
//   s_k(i)     = Σ_{j≤k} raw_j(i)
//   p(r_i = k) = softmax_k s(i)
//
// Both the input and the output side share weights across
// rating levels cumulatively (rating k reuses the parameters
// of every level below it), which is what lets CF-NADE learn
// from sparse high ratings.
//
// The dense context x is built with a scatter from the padded
// [batch, width] ids, so memory scales with M·R per row, not
// with width·M.
//
// Reference: Zheng et al. (2016) A Neural Autoregressive Approach to CF
//            Burn Book §3 (Building Blocks)

use burn::{
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::activation::softmax,
};

use crate::data::batcher::RatingBatch;
use crate::ml::loss::{composite_cost, upper_triangular, RatingLevels};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct CfNadeConfig {
    /// Number of distinct column ids (items in user-base mode)
    pub item_count:    usize,
    /// Number of ordinal rating levels (R)
    pub rating_levels: usize,
    /// Stacked hidden layers, at least 1
    pub layer_num:     usize,
    #[config(default = 500)]
    pub hidden_size:   usize,
}

impl CfNadeConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> CfNadeModel<B> {
        let input = LinearConfig::new(self.item_count * self.rating_levels, self.hidden_size)
            .init(device);
        let hidden_layers = (1..self.layer_num.max(1))
            .map(|_| LinearConfig::new(self.hidden_size, self.hidden_size).init(device))
            .collect();
        let output = LinearConfig::new(self.hidden_size, self.item_count * self.rating_levels)
            .init(device);

        CfNadeModel {
            input,
            hidden_layers,
            output,
            item_count:    self.item_count,
            rating_levels: self.rating_levels,
        }
    }

    /// True when both configs describe the same parameter shapes.
    pub fn same_architecture(&self, other: &Self) -> bool {
        self.item_count == other.item_count
            && self.rating_levels == other.rating_levels
            && self.layer_num == other.layer_num
            && self.hidden_size == other.hidden_size
    }
}

#[derive(Module, Debug)]
pub struct CfNadeModel<B: Backend> {
    pub input:         Linear<B>,
    pub hidden_layers: Vec<Linear<B>>,
    pub output:        Linear<B>,
    pub item_count:    usize,
    pub rating_levels: usize,
}

// ─── Output ───────────────────────────────────────────────────────────────────
pub struct CfNadeOutput<B: Backend> {
    /// Mean reweighted cost per non-empty row — shape [1]
    pub loss:          Tensor<B, 1>,
    /// Reweighted cost of each row — shape [batch, 1]
    pub row_costs:     Tensor<B, 2>,
    /// Expected rating Σ_k k·p_k for every slot — shape [batch, width]
    pub predictions:   Tensor<B, 2>,
    /// Targets whose rounded prediction is exact — shape [1]
    pub correct:       Tensor<B, 1>,
    /// Σ (prediction - rating)² over targets — shape [1]
    pub squared_error: Tensor<B, 1>,
}

/// Host-side sums for one batch, ready to accumulate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatchStats {
    pub cost_sum:      f64,
    pub correct:       f64,
    pub squared_error: f64,
    pub active_rows:   usize,
    pub target_count:  usize,
}

impl<B: Backend> CfNadeOutput<B> {
    pub fn stats(&self, batch: &RatingBatch<B>) -> BatchStats {
        BatchStats {
            cost_sum:      self.row_costs.clone().sum().into_scalar().elem::<f64>(),
            correct:       self.correct.clone().into_scalar().elem::<f64>(),
            squared_error: self.squared_error.clone().into_scalar().elem::<f64>(),
            active_rows:   batch.active_rows,
            target_count:  batch.target_count,
        }
    }
}

impl<B: Backend> CfNadeModel<B> {
    /// Cumulative scores for every slot of the batch — `[batch, width, R]`.
    pub fn forward(&self, batch: &RatingBatch<B>) -> Tensor<B, 3> {
        let [batch_size, width] = batch.items.dims();
        let levels = self.rating_levels;
        let device = batch.items.device();

        // ── Dense cumulative context ──────────────────────────────────────────
        // slot (row, k, j) lands at column item*R + j of the context vector;
        // only observed slots carry a value, so padding adds zeros at id 0.
        let slots: Vec<Tensor<B, 2, Int>> = (0..levels)
            .map(|j| {
                batch.items.clone()
                    .mul_scalar(levels as i32)
                    .add_scalar(j as i32)
            })
            .collect();
        let slots: Tensor<B, 3, Int> = Tensor::stack(slots, 2);

        let encoded = RatingLevels::new(batch.ratings.clone(), levels).at_or_below
            * batch.observed.clone().unsqueeze_dim::<3>(2);

        let context = Tensor::<B, 2>::zeros([batch_size, self.item_count * levels], &device)
            .scatter(
                1,
                slots.reshape([batch_size, width * levels]),
                encoded.reshape([batch_size, width * levels]),
            );

        // ── Hidden representation ─────────────────────────────────────────────
        let mut hidden = self.input.forward(context).tanh();
        for layer in &self.hidden_layers {
            hidden = layer.forward(hidden).tanh();
        }

        // ── Scores for the slots in this batch ────────────────────────────────
        let raw = self.output
            .forward(hidden)
            .reshape([batch_size, self.item_count, levels]);
        let index = batch.items.clone()
            .unsqueeze_dim::<3>(2)
            .expand([batch_size, width, levels]);
        let raw = raw.gather(1, index);

        raw.reshape([batch_size * width, levels])
            .matmul(upper_triangular::<B>(levels, &device))
            .reshape([batch_size, width, levels])
    }

    /// Forward pass plus composite cost, predictions and hit counts.
    pub fn forward_loss(&self, batch: &RatingBatch<B>, ordinal_weight: f64) -> CfNadeOutput<B> {
        let [batch_size, width] = batch.items.dims();
        let device = batch.items.device();
        let scores = self.forward(batch);

        // ── Cost ──────────────────────────────────────────────────────────────
        let levels = RatingLevels::new(batch.ratings.clone(), self.rating_levels);
        let costs  = composite_cost(scores.clone(), &levels, ordinal_weight)
            .mask_fill(batch.targets.clone().equal_elem(0.0), 0.0);
        let row_costs = costs.sum_dim(1) * batch.row_weights.clone();
        let loss = row_costs.clone()
            .sum()
            .div_scalar(batch.active_rows.max(1) as f64);

        // ── Expected rating per slot ──────────────────────────────────────────
        let level_values = Tensor::<B, 1, Int>::arange(1..(self.rating_levels as i64 + 1), &device)
            .float()
            .reshape([1, 1, self.rating_levels]);
        let predictions = (softmax(scores.detach(), 2) * level_values)
            .sum_dim(2)
            .reshape([batch_size, width]);

        let correct = exact_hits(predictions.clone(), batch.ratings.clone(), batch.targets.clone());
        let error = predictions.clone() - batch.ratings.clone().float();
        let squared_error = (error.powf_scalar(2.0) * batch.targets.clone()).sum();

        CfNadeOutput { loss, row_costs, predictions, correct, squared_error }
    }
}

/// Target slots whose prediction, rounded half up, equals the
/// true rating — shape [1].
pub fn exact_hits<B: Backend>(
    predictions: Tensor<B, 2>,
    ratings:     Tensor<B, 2, Int>,
    targets:     Tensor<B, 2>,
) -> Tensor<B, 1> {
    let rounded = predictions.add_scalar(0.5).floor();
    rounded
        .equal(ratings.float())
        .float()
        .mask_fill(targets.equal_elem(0.0), 0.0)
        .sum()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::batcher::RatingBatcher;
    use crate::data::ordering::OrderSampler;
    use crate::data::rectangularizer::{rectangularize, PaddedMatrix};
    use crate::domain::interaction::Interactions;
    use burn::{
        backend::Autodiff,
        optim::{AdamConfig, GradientsParams, Optimizer},
    };

    type TestBackend = burn::backend::NdArray;
    type TestAutodiff = Autodiff<TestBackend>;

    fn matrix() -> PaddedMatrix {
        // user 2 never rates anything
        let data = Interactions::from_triples(&[
            (0, 0, 5), (0, 1, 4), (0, 2, 1), (0, 3, 2),
            (1, 1, 3), (1, 2, 2),
            (3, 0, 4), (3, 3, 1), (3, 4, 5),
        ]);
        rectangularize(&data, 4).unwrap()
    }

    fn model<B: Backend>(layer_num: usize) -> CfNadeModel<B> {
        CfNadeConfig::new(5, 5, layer_num)
            .with_hidden_size(8)
            .init(&Default::default())
    }

    #[test]
    fn test_score_shape() {
        let m = matrix();
        let batch = RatingBatcher::<TestBackend>::new(Default::default())
            .batch(&m, &[0, 1, 2, 3], &mut OrderSampler::seeded(1));
        let scores = model::<TestBackend>(2).forward(&batch);
        assert_eq!(scores.dims(), [4, m.width(), 5]);
    }

    #[test]
    fn test_layer_num_controls_depth() {
        assert_eq!(model::<TestBackend>(1).hidden_layers.len(), 0);
        assert_eq!(model::<TestBackend>(3).hidden_layers.len(), 2);
    }

    #[test]
    fn test_predictions_stay_in_rating_range() {
        let m = matrix();
        let batch = RatingBatcher::<TestBackend>::new(Default::default())
            .batch(&m, &[0, 1, 3], &mut OrderSampler::seeded(4));
        let out = model::<TestBackend>(1).forward_loss(&batch, 1.0);
        let preds: Vec<f32> = out.predictions.into_data().to_vec().unwrap();
        assert!(preds.iter().all(|&p| (1.0..=5.0).contains(&p)));
    }

    #[test]
    fn test_empty_row_contributes_nothing() {
        let m = matrix();
        let net = model::<TestBackend>(1);
        let batcher = RatingBatcher::<TestBackend>::new(Default::default());

        // The empty row comes last, so it cannot shift the draws of row 0.
        let with_empty = batcher.batch(&m, &[0, 2], &mut OrderSampler::seeded(3));
        let alone      = batcher.batch(&m, &[0],    &mut OrderSampler::seeded(3));

        let out = net.forward_loss(&with_empty, 0.5);
        let row_costs: Vec<f32> = out.row_costs.clone().into_data().to_vec().unwrap();
        assert_eq!(row_costs[1], 0.0);
        assert_eq!(with_empty.active_rows, alone.active_rows);
        assert_eq!(with_empty.target_count, alone.target_count);

        let a = out.stats(&with_empty);
        let b = net.forward_loss(&alone, 0.5).stats(&alone);
        assert!((a.cost_sum - b.cost_sum).abs() < 1e-4);
        assert_eq!(a.correct, b.correct);
    }

    #[test]
    fn test_all_empty_batch_is_finite_zero() {
        let m = matrix();
        let batch = RatingBatcher::<TestBackend>::new(Default::default())
            .batch(&m, &[2], &mut OrderSampler::seeded(0));
        let out = model::<TestBackend>(1).forward_loss(&batch, 1.0);
        let stats = out.stats(&batch);
        assert_eq!(stats.cost_sum, 0.0);
        assert_eq!(stats.target_count, 0);
        assert_eq!(out.loss.into_scalar().elem::<f64>(), 0.0);
    }

    #[test]
    fn test_half_way_predictions_round_up() {
        let device = Default::default();
        let predictions = Tensor::<TestBackend, 1>::from_floats([2.5f32, 3.49, 1.5, 4.6, 2.0].as_slice(), &device)
            .reshape([1, 5]);
        let ratings = Tensor::<TestBackend, 1, Int>::from_ints([3, 3, 1, 5, 2].as_slice(), &device)
            .reshape([1, 5]);
        // last slot is not a target, so its exact match is not counted
        let targets = Tensor::<TestBackend, 1>::from_floats([1.0f32, 1.0, 1.0, 1.0, 0.0].as_slice(), &device)
            .reshape([1, 5]);
        let hits = exact_hits(predictions, ratings, targets).into_scalar().elem::<f64>();
        assert_eq!(hits, 3.0);
    }

    #[test]
    fn test_row_cost_is_target_cost_times_reweighting() {
        let m = matrix();
        let rows = [0, 1, 3];
        let net = model::<TestBackend>(1);
        let batch = RatingBatcher::<TestBackend>::new(Default::default())
            .batch(&m, &rows, &mut OrderSampler::seeded(21));

        // Same seed, same draw order: the masks the batcher used.
        let mut sampler = OrderSampler::seeded(21);
        let masks: Vec<_> = rows.iter().map(|&r| sampler.draw(m.row_len(r))).collect();

        let scores = net.forward(&batch);
        let levels = RatingLevels::new(batch.ratings.clone(), 5);
        let slot_costs: Vec<f32> = composite_cost(scores, &levels, 0.5).into_data().to_vec().unwrap();
        let row_costs: Vec<f32> = net.forward_loss(&batch, 0.5).row_costs.into_data().to_vec().unwrap();

        let width = m.width();
        for (i, mask) in masks.iter().enumerate() {
            let reweight = mask.len() as f32 / mask.target_count() as f32;
            assert!((mask.weight - reweight).abs() < 1e-6);

            let target_sum: f32 = mask.observed.iter().enumerate()
                .filter(|(_, observed)| !**observed)
                .map(|(k, _)| slot_costs[i * width + k])
                .sum();
            let expected = target_sum * reweight;
            assert!((row_costs[i] - expected).abs() < 1e-3 * expected.abs().max(1.0),
                "row {i}: {} vs {expected}", row_costs[i]);
        }
    }

    #[test]
    fn test_saturated_scores_keep_loss_finite() {
        let m = matrix();
        let batch = RatingBatcher::<TestBackend>::new(Default::default())
            .batch(&m, &[1, 2], &mut OrderSampler::seeded(5));

        let mut net = model::<TestBackend>(1);
        net.output.weight = net.output.weight.map(|w| w.mul_scalar(400.0));

        for weight in [0.0, 0.5, 1.0] {
            let out = net.forward_loss(&batch, weight);
            let loss = out.loss.into_scalar().elem::<f64>();
            assert!(loss.is_finite(), "ordinal weight {weight}: loss {loss}");
            let row_costs: Vec<f32> = out.row_costs.into_data().to_vec().unwrap();
            // row 2 is empty: nothing from its padding reaches the cost
            assert_eq!(row_costs[1], 0.0);
        }
    }

    #[test]
    fn test_adam_steps_reduce_loss_on_fixed_ordering() {
        let m = matrix();
        let device = Default::default();
        let batcher = RatingBatcher::<TestAutodiff>::new(device);
        let batch = batcher.batch(&m, &[0, 1, 3], &mut OrderSampler::seeded(8));

        let mut net = model::<TestAutodiff>(2);
        let mut optim = AdamConfig::new().init();

        let first = net.forward_loss(&batch, 1.0).loss.into_scalar().elem::<f64>();
        for _ in 0..40 {
            let loss  = net.forward_loss(&batch, 1.0).loss;
            let grads = GradientsParams::from_grads(loss.backward(), &net);
            net = optim.step(1e-2, net, grads);
        }
        let last = net.forward_loss(&batch, 1.0).loss.into_scalar().elem::<f64>();
        assert!(last < first, "loss did not decrease: {first} -> {last}");
    }
}
