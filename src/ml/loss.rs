// ============================================================
// Layer 5 — CF-NADE Costs
// ============================================================
// Per-slot costs over R ordinal rating levels.
//
// Inputs:  scores  [batch, width, R]   (cumulative scores s_1..s_R)
//          ratings [batch, width]      (1..=R, 0 for padding)
//
// Reconstruction (NLL):
//   -log softmax(s)[r]
//
// Ordinal (Plackett-Luce over two rankings):
//   r ≻ r-1 ≻ ... ≻ 1   and   r ≻ r+1 ≻ ... ≻ R
//
//   -Σ_{j≤r} log( e^{s_j} / Σ_{t≤j} e^{s_t} )
//   -Σ_{j≥r} log( e^{s_j} / Σ_{t≥j} e^{s_t} )
//
// A prediction far from the true level breaks more of these
// pairwise preferences than a near miss, so the ordinal term
// grows with rank distance while NLL does not.
//
// Composite:  (1 - λ)·NLL + λ·ordinal,  λ = ordinal_weight
//
// Each normaliser log Σ e^{s_t} is a log-sum-exp over a prefix
// or suffix of the levels, shifted by that slice's own max, so
// every term is finite however far apart the scores are. R is
// small; one slice per level is cheap.
//
// Reference: Zheng et al. (2016) A Neural Autoregressive Approach to CF, §3.3

use burn::{prelude::*, tensor::activation::log_softmax};

/// `[levels, levels]` matrix with ones where row ≤ column.
/// `x.matmul(tri)` gives prefix sums along the last axis,
/// `x.matmul(tri.transpose())` gives suffix sums.
pub fn upper_triangular<B: Backend>(levels: usize, device: &B::Device) -> Tensor<B, 2> {
    let ones: Vec<f32> = (0..levels * levels)
        .map(|i| if i / levels <= i % levels { 1.0 } else { 0.0 })
        .collect();
    Tensor::<B, 1>::from_floats(ones.as_slice(), device).reshape([levels, levels])
}

// ─── RatingLevels ─────────────────────────────────────────────────────────────
/// 0/1 masks over the R levels for each slot, all `[batch, width, R]`.
#[derive(Debug, Clone)]
pub struct RatingLevels<B: Backend> {
    /// level == rating
    pub exact:       Tensor<B, 3>,
    /// level ≤ rating (also the cumulative input encoding)
    pub at_or_below: Tensor<B, 3>,
    /// level ≥ rating
    pub at_or_above: Tensor<B, 3>,
}

impl<B: Backend> RatingLevels<B> {
    pub fn new(ratings: Tensor<B, 2, Int>, levels: usize) -> Self {
        let mut exact       = Vec::with_capacity(levels);
        let mut at_or_below = Vec::with_capacity(levels);
        let mut at_or_above = Vec::with_capacity(levels);

        for j in 0..levels {
            let level = (j + 1) as i32;
            exact.push(ratings.clone().equal_elem(level).float());
            at_or_below.push(ratings.clone().greater_equal_elem(level).float());
            at_or_above.push(ratings.clone().lower_equal_elem(level).float());
        }

        Self {
            exact:       Tensor::stack(exact, 2),
            at_or_below: Tensor::stack(at_or_below, 2),
            at_or_above: Tensor::stack(at_or_above, 2),
        }
    }
}

/// Negative log-likelihood of the true level — `[batch, width]`.
pub fn reconstruction_cost<B: Backend>(scores: Tensor<B, 3>, levels: &RatingLevels<B>) -> Tensor<B, 2> {
    let [batch, width, _] = scores.dims();
    let log_probs = log_softmax(scores, 2);
    (log_probs * levels.exact.clone())
        .sum_dim(2)
        .neg()
        .reshape([batch, width])
}

/// `log Σ exp(x)` along the last axis — `[batch, width, 1]`.
fn log_sum_exp<B: Backend>(x: Tensor<B, 3>) -> Tensor<B, 3> {
    let max = x.clone().max_dim(2).detach();
    (x - max.clone()).exp().sum_dim(2).log() + max
}

/// Ordinal Plackett-Luce cost — `[batch, width]`.
pub fn ordinal_cost<B: Backend>(scores: Tensor<B, 3>, levels: &RatingLevels<B>) -> Tensor<B, 2> {
    let [batch, width, r] = scores.dims();

    let mut prefix = Vec::with_capacity(r);
    let mut suffix = Vec::with_capacity(r);
    for j in 0..r {
        prefix.push(log_sum_exp(scores.clone().slice([0..batch, 0..width, 0..j + 1])));
        suffix.push(log_sum_exp(scores.clone().slice([0..batch, 0..width, j..r])));
    }
    let prefix = Tensor::cat(prefix, 2);
    let suffix = Tensor::cat(suffix, 2);

    // s_j - lse ≤ 0 and finite, so the 0/1 masks select cleanly.
    let downward = (scores.clone() - prefix) * levels.at_or_below.clone();
    let upward   = (scores - suffix) * levels.at_or_above.clone();

    (downward.sum_dim(2) + upward.sum_dim(2))
        .neg()
        .reshape([batch, width])
}

/// `(1 - ordinal_weight)·NLL + ordinal_weight·ordinal` — `[batch, width]`.
pub fn composite_cost<B: Backend>(
    scores:         Tensor<B, 3>,
    levels:         &RatingLevels<B>,
    ordinal_weight: f64,
) -> Tensor<B, 2> {
    let nll = reconstruction_cost(scores.clone(), levels);
    if ordinal_weight == 0.0 {
        return nll;
    }
    let ordinal = ordinal_cost(scores, levels);
    nll.mul_scalar(1.0 - ordinal_weight) + ordinal.mul_scalar(ordinal_weight)
}
