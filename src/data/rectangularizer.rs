// ============================================================
// Layer 4 — Rectangularizer
// ============================================================
// Converts ragged per-row interaction lists into two padded
// matrices of identical shape: item ids and ratings.
//
// Example (user-base, 3 users):
//   interactions: (0,1,4) (0,2,3) (1,0,5) (2,3,2) (2,4,1)
//
//   items            ratings
//   [ 1,  2]         [ 4,  3]
//   [ 0, -1]         [ 5, -1]      ← user 1 has one rating
//   [ 3,  4]         [ 2,  1]
//
// Width is the largest per-row count in this split. Entries
// are packed to the left in source order; -1 fills the rest.
// In item-base mode the caller swaps the columns first, so the
// same code produces item-indexed rows.
//
// Reference: Rust Book §8 (Vectors)

use anyhow::{ensure, Result};

use crate::domain::interaction::Interactions;

/// Marks an absent slot in both padded matrices.
pub const SENTINEL: i32 = -1;

// ─── PaddedMatrix ─────────────────────────────────────────────────────────────
/// Row-major pair of `rows × width` item and rating matrices.
#[derive(Debug, Clone, PartialEq)]
pub struct PaddedMatrix {
    rows:    usize,
    width:   usize,
    items:   Vec<i32>,
    ratings: Vec<i32>,
}

impl PaddedMatrix {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Item ids of row `row`, including trailing sentinels.
    pub fn items_row(&self, row: usize) -> &[i32] {
        &self.items[row * self.width..(row + 1) * self.width]
    }

    /// Ratings of row `row`, including trailing sentinels.
    pub fn ratings_row(&self, row: usize) -> &[i32] {
        &self.ratings[row * self.width..(row + 1) * self.width]
    }

    /// Number of real (non-sentinel) entries in `row`.
    pub fn row_len(&self, row: usize) -> usize {
        self.items_row(row).iter().take_while(|&&x| x != SENTINEL).count()
    }

    /// Total number of real entries across all rows.
    pub fn interaction_count(&self) -> usize {
        self.items.iter().filter(|&&x| x != SENTINEL).count()
    }

    /// True when no row holds a single interaction.
    pub fn is_empty(&self) -> bool {
        self.width == 0
    }

    /// (column, rating) pairs of `row`, sentinels dropped.
    pub fn row_pairs(&self, row: usize) -> Vec<(i32, i32)> {
        self.items_row(row)
            .iter()
            .zip(self.ratings_row(row))
            .filter(|(&item, _)| item != SENTINEL)
            .map(|(&item, &rating)| (item, rating))
            .collect()
    }
}

/// Pad `interactions` into a `row_count × width` matrix pair,
/// rows indexed by the `users` column.
///
/// Fails when a row id is not below `row_count`.
pub fn rectangularize(interactions: &Interactions, row_count: usize) -> Result<PaddedMatrix> {
    // ── Count entries per row ─────────────────────────────────────────────────
    let mut counts = vec![0usize; row_count];
    for &row in interactions.users() {
        ensure!(
            row < row_count,
            "row id {} out of range for row count {}",
            row,
            row_count
        );
        counts[row] += 1;
    }
    let width = counts.iter().copied().max().unwrap_or(0);

    // ── Fill left to right in source order ────────────────────────────────────
    let mut items   = vec![SENTINEL; row_count * width];
    let mut ratings = vec![SENTINEL; row_count * width];
    let mut next    = vec![0usize; row_count];

    for ((&row, &col), &rating) in interactions
        .users()
        .iter()
        .zip(interactions.items())
        .zip(interactions.ratings())
    {
        let slot = row * width + next[row];
        items[slot]   = col as i32;
        ratings[slot] = rating as i32;
        next[row] += 1;
    }

    tracing::debug!(
        "Rectangularized {} interactions into {}x{}",
        interactions.len(),
        row_count,
        width
    );

    Ok(PaddedMatrix { rows: row_count, width, items, ratings })
}
