// ============================================================
// Layer 4 — Autoregressive Order Sampler
// ============================================================
// CF-NADE conditions each rating on the ratings that come
// before it in a random ordering. Training samples ONE such
// ordering per row per forward pass:
//
//   row with D = 5 rated slots: [a b c d e]
//   permutation:                 [d a e c b]
//   cut point d ~ U{0..D-1}:     2
//   observed (context):          d a
//   targets  (predicted):        e c b
//
// The cost of the targets is scaled by D / (D - d). Averaged
// over the uniform cut point, that weighting makes the sampled
// cost an unbiased estimate of the full autoregressive cost.
//
// The sampler owns its own seeded RNG and is passed in by the
// trainer, so tests can pin the ordering exactly.
//
// Reference: Uria et al. (2016) Neural Autoregressive Distribution Estimation
//            Zheng et al. (2016) A Neural Autoregressive Approach to CF

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

// ─── VisibilityMask ───────────────────────────────────────────────────────────
/// One row's split of its rated slots into context and targets.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityMask {
    /// `observed[k]` is true when slot k is conditioning context.
    /// Length equals the row's number of real entries.
    pub observed: Vec<bool>,
    /// D / (D - d), or 0 for an empty row
    pub weight:   f32,
}

impl VisibilityMask {
    pub fn len(&self) -> usize {
        self.observed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observed.is_empty()
    }

    /// Number of slots whose rating is predicted.
    pub fn target_count(&self) -> usize {
        self.observed.iter().filter(|&&o| !o).count()
    }
}

// ─── OrderSampler ─────────────────────────────────────────────────────────────
/// Seeded generator of random autoregressive orderings.
#[derive(Debug, Clone)]
pub struct OrderSampler {
    rng: StdRng,
}

impl OrderSampler {
    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    /// Draw the visibility mask for a row with `len` real entries.
    /// Empty rows consume no randomness.
    pub fn draw(&mut self, len: usize) -> VisibilityMask {
        if len == 0 {
            return VisibilityMask { observed: Vec::new(), weight: 0.0 };
        }

        let mut order: Vec<usize> = (0..len).collect();
        order.shuffle(&mut self.rng);
        let cut = self.rng.gen_range(0..len);

        let mut observed = vec![false; len];
        for &slot in &order[..cut] {
            observed[slot] = true;
        }

        VisibilityMask {
            observed,
            weight: len as f32 / (len - cut) as f32,
        }
    }
}
