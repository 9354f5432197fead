// ============================================================
// Layer 4 — Dataset Loader
// ============================================================
// Loads a rating dataset from a JSON file.
//
// The container is a 4-element array:
//
//   [ user_count,
//     item_count,
//     [users, items, ratings, timestamps],     ← train pool
//     [users, items, ratings, timestamps] ]    ← test set or null
//
// serde reads it straight into tuple structs, so a container
// with the wrong arity fails during deserialisation. After
// parsing, every column is checked:
//   - all four columns of a block have the same length
//   - user ids in [0, user_count), item ids in [0, item_count)
//   - ratings are integers >= 1
//
// Reference: serde / serde_json documentation
//            Rust Book §9 (Error Handling)

use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::{fs, path::PathBuf};

use crate::domain::interaction::{Interactions, Rating, RatingDataset, Timestamp};
use crate::domain::traits::DatasetSource;

// ─── On-disk shape ────────────────────────────────────────────────────────────
#[derive(Debug, Deserialize)]
struct RawColumns(Vec<i64>, Vec<i64>, Vec<i64>, Vec<Timestamp>);

#[derive(Debug, Deserialize)]
struct RawContainer(usize, usize, RawColumns, Option<RawColumns>);

// ─── JsonDatasetLoader ────────────────────────────────────────────────────────
/// Loads a dataset container from a JSON file.
pub struct JsonDatasetLoader {
    path: PathBuf,
}

impl JsonDatasetLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetSource for JsonDatasetLoader {
    fn load(&self) -> Result<RatingDataset> {
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read dataset '{}'", self.path.display()))?;

        let dataset = parse_dataset(&json)
            .with_context(|| format!("Malformed dataset '{}'", self.path.display()))?;

        tracing::info!(
            "Loaded dataset: {} users, {} items, {} train interactions, {} test interactions",
            dataset.user_count,
            dataset.item_count,
            dataset.train.len(),
            dataset.test.as_ref().map_or(0, Interactions::len),
        );
        Ok(dataset)
    }
}

/// Parse and validate a JSON dataset container.
pub fn parse_dataset(json: &str) -> Result<RatingDataset> {
    let RawContainer(user_count, item_count, train, test) = serde_json::from_str(json)?;

    let train = validate_block("train", train, user_count, item_count)?;
    ensure!(!train.is_empty(), "train block holds no interactions");
    let test = test
        .map(|block| validate_block("test", block, user_count, item_count))
        .transpose()?;

    Ok(RatingDataset { user_count, item_count, train, test })
}

fn validate_block(
    name:       &str,
    block:      RawColumns,
    user_count: usize,
    item_count: usize,
) -> Result<Interactions> {
    let RawColumns(users, items, ratings, timestamps) = block;

    let users   = check_ids(name, "user", users, user_count)?;
    let items   = check_ids(name, "item", items, item_count)?;
    let ratings = ratings
        .into_iter()
        .map(|r| {
            ensure!(
                (1..=Rating::MAX as i64).contains(&r),
                "{name}: rating {r} is outside 1..={}",
                Rating::MAX
            );
            Ok(r as Rating)
        })
        .collect::<Result<Vec<_>>>()?;

    Interactions::new(users, items, ratings, timestamps)
        .with_context(|| format!("{name} block has ragged columns"))
}

fn check_ids(block: &str, kind: &str, ids: Vec<i64>, count: usize) -> Result<Vec<usize>> {
    ids.into_iter()
        .map(|id| {
            ensure!(
                id >= 0 && (id as u64) < count as u64,
                "{block}: {kind} id {id} is outside [0, {count})"
            );
            Ok(id as usize)
        })
        .collect()
}
