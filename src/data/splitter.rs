// ============================================================
// Layer 4 — Train/Validation/Test Splitter
// ============================================================
// Shuffles interaction indices once and cuts the permutation
// into contiguous slices.
//
// Two modes:
//   No test set supplied:  85% train |  5% valid | 10% test
//   Test set supplied:     95% train |  5% valid | (given)
//
// Slice sizes use floor, and the last slice takes whatever
// remains, so every index lands in exactly one split.
//
//   n = 5, no test set → train ⌊4.25⌋=4, valid ⌊0.25⌋=0, test 1
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom with a
// caller-supplied RNG, so a fixed seed gives a fixed split.
//
// Reference: Rust Book §8 (Vectors)
//            rand crate documentation

use anyhow::{ensure, Result};
use rand::{seq::SliceRandom, Rng};

const TRAIN_FRACTION:           f64 = 0.85;
const VALID_FRACTION:           f64 = 0.05;
const TRAIN_FRACTION_WITH_TEST: f64 = 0.95;

/// Index sets into the train pool.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub valid: Vec<usize>,
    /// None when the test set is supplied separately
    pub test:  Option<Vec<usize>>,
}

/// Randomly permute `0..data_length` and split it.
///
/// # Arguments
/// * `data_length`   - Size of the train pool
/// * `test_supplied` - Whether a dedicated test set exists
/// * `rng`           - Seeded generator owned by the caller
///
/// Fails on an empty pool or when the train slice would be empty.
pub fn split_indices<R: Rng + ?Sized>(
    data_length:   usize,
    test_supplied: bool,
    rng:           &mut R,
) -> Result<SplitIndices> {
    ensure!(data_length > 0, "cannot split an empty interaction list");

    let mut order: Vec<usize> = (0..data_length).collect();
    order.shuffle(rng);

    let total = data_length as f64;
    let split = if test_supplied {
        let train_num = (total * TRAIN_FRACTION_WITH_TEST) as usize;
        let valid     = order.split_off(train_num);
        SplitIndices { train: order, valid, test: None }
    } else {
        let train_num = (total * TRAIN_FRACTION) as usize;
        let valid_num = (total * VALID_FRACTION) as usize;
        let test      = order.split_off(train_num + valid_num);
        let valid     = order.split_off(train_num);
        SplitIndices { train: order, valid, test: Some(test) }
    };

    ensure!(
        !split.train.is_empty(),
        "train split is empty ({} interactions are too few to split)",
        data_length
    );

    tracing::debug!(
        "Dataset split: {} train, {} valid, {} test",
        split.train.len(),
        split.valid.len(),
        split.test.as_ref().map_or(0, Vec::len),
    );

    Ok(split)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_micro_case_boundaries() {
        let mut rng = StdRng::seed_from_u64(1);
        let s = split_indices(5, false, &mut rng).unwrap();
        assert_eq!(s.train.len(), 4);
        assert_eq!(s.valid.len(), 0);
        assert_eq!(s.test.unwrap().len(), 1);
    }

    #[test]
    fn test_hundred_without_test_set() {
        let mut rng = StdRng::seed_from_u64(7);
        let s = split_indices(100, false, &mut rng).unwrap();
        assert_eq!(s.train.len(), 85);
        assert_eq!(s.valid.len(), 5);
        assert_eq!(s.test.unwrap().len(), 10);
    }

    #[test]
    fn test_supplied_test_set_only_carves_validation() {
        let mut rng = StdRng::seed_from_u64(7);
        let s = split_indices(20, true, &mut rng).unwrap();
        assert_eq!(s.train.len(), 19);
        assert_eq!(s.valid.len(), 1);
        assert!(s.test.is_none());
    }

    #[test]
    fn test_same_seed_same_split() {
        let a = split_indices(50, false, &mut StdRng::seed_from_u64(3)).unwrap();
        let b = split_indices(50, false, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_and_degenerate_inputs_fail() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(split_indices(0, false, &mut rng).is_err());
        // ⌊1 × 0.85⌋ = 0 leaves nothing to train on
        assert!(split_indices(1, false, &mut rng).is_err());
    }

    proptest! {
        #[test]
        fn prop_splits_cover_every_index_once(
            n in 2usize..400,
            seed in any::<u64>(),
            test_supplied in any::<bool>(),
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let s = split_indices(n, test_supplied, &mut rng).unwrap();

            let mut all: Vec<usize> = s.train.clone();
            all.extend(&s.valid);
            if let Some(test) = &s.test {
                all.extend(test);
            }
            all.sort_unstable();
            prop_assert_eq!(all, (0..n).collect::<Vec<_>>());
        }
    }
}
