// ============================================================
// Layer 3 — Interaction Domain Types
// ============================================================
// A rating dataset is a list of (user, item, rating) triples.
// We store them column-wise: four parallel vectors of equal
// length, the same layout the dataset file uses.
//
//   users:      [0, 0, 1, 2, 2]
//   items:      [1, 2, 0, 3, 4]
//   ratings:    [4, 3, 5, 2, 1]
//   timestamps: [0, 0, 0, 0, 0]   ← carried along, never used
//
// Item-base mode swaps the user and item columns, so every
// downstream step can keep talking about "rows" and "columns".
//
// Reference: Rust Book §5 (Structs), §8 (Vectors)

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// Ordinal rating level, 1-based.
pub type Rating = u8;

/// Seconds since epoch; kept only so datasets round-trip.
pub type Timestamp = i64;

// ─── Orientation ──────────────────────────────────────────────────────────────
/// Which entity indexes the rows of the padded matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    /// Rows are users, columns are the items they rated.
    UserBased,
    /// Rows are items, columns are the users who rated them.
    ItemBased,
}

// ─── Interactions ─────────────────────────────────────────────────────────────
/// Column-wise list of rating interactions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Interactions {
    users:      Vec<usize>,
    items:      Vec<usize>,
    ratings:    Vec<Rating>,
    timestamps: Vec<Timestamp>,
}

impl Interactions {
    /// Build from parallel columns. All four must have the same length.
    pub fn new(
        users:      Vec<usize>,
        items:      Vec<usize>,
        ratings:    Vec<Rating>,
        timestamps: Vec<Timestamp>,
    ) -> Result<Self> {
        let n = users.len();
        ensure!(
            items.len() == n && ratings.len() == n && timestamps.len() == n,
            "interaction columns differ in length: users={}, items={}, ratings={}, timestamps={}",
            n,
            items.len(),
            ratings.len(),
            timestamps.len(),
        );
        Ok(Self { users, items, ratings, timestamps })
    }

    /// Build from (user, item, rating) triples with zero timestamps.
    pub fn from_triples(triples: &[(usize, usize, Rating)]) -> Self {
        Self {
            users:      triples.iter().map(|t| t.0).collect(),
            items:      triples.iter().map(|t| t.1).collect(),
            ratings:    triples.iter().map(|t| t.2).collect(),
            timestamps: vec![0; triples.len()],
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn users(&self) -> &[usize] {
        &self.users
    }

    pub fn items(&self) -> &[usize] {
        &self.items
    }

    pub fn ratings(&self) -> &[Rating] {
        &self.ratings
    }

    pub fn timestamps(&self) -> &[Timestamp] {
        &self.timestamps
    }

    /// Highest rating present, or 0 for an empty list.
    pub fn max_rating(&self) -> Rating {
        self.ratings.iter().copied().max().unwrap_or(0)
    }

    /// Gather the interactions at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            users:      indices.iter().map(|&i| self.users[i]).collect(),
            items:      indices.iter().map(|&i| self.items[i]).collect(),
            ratings:    indices.iter().map(|&i| self.ratings[i]).collect(),
            timestamps: indices.iter().map(|&i| self.timestamps[i]).collect(),
        }
    }

    /// Swap the user and item columns (item-base mode).
    pub fn swap_roles(self) -> Self {
        Self {
            users:      self.items,
            items:      self.users,
            ratings:    self.ratings,
            timestamps: self.timestamps,
        }
    }
}

// ─── RatingDataset ────────────────────────────────────────────────────────────
/// A loaded dataset: entity counts plus the train pool and an
/// optional dedicated test set.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingDataset {
    pub user_count: usize,
    pub item_count: usize,
    pub train:      Interactions,
    pub test:       Option<Interactions>,
}

impl RatingDataset {
    /// Re-orient so that rows are indexed by the chosen entity.
    /// After `ItemBased`, `user_count` holds the item count and the
    /// `users` column holds item ids.
    pub fn oriented(self, orientation: Orientation) -> Self {
        match orientation {
            Orientation::UserBased => self,
            Orientation::ItemBased => Self {
                user_count: self.item_count,
                item_count: self.user_count,
                train:      self.train.swap_roles(),
                test:       self.test.map(Interactions::swap_roles),
            },
        }
    }

    /// Number of ordinal rating levels (R), taken from the data.
    pub fn rating_levels(&self) -> usize {
        let test_max = self.test.as_ref().map_or(0, |t| t.max_rating());
        self.train.max_rating().max(test_max) as usize
    }
}
