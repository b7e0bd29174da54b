//! # Delete + Compact
//!
//! Removes whole clusters (with their cells and tokens) and particles, then
//! closes the gaps so every live array stays dense.
//!
//! ## Passes
//!
//! 1. Clusters: drop deleted ones, record their cell and token ranges, and
//!    pull the token start of survivors back by the tokens removed so far
//! 2. Cells: drop cells inside a removed range, build the old → new remap
//! 3. Tokens: drop removed ones, rewrite owner indices through the remap
//! 4. Particles: drop deleted ids
//! 5. Rewrite every surviving `cell_start` and connection through the remap

use std::collections::HashSet;

use crate::arena::Arena;
use crate::convert::to_u32;

/// Old → new positions for one compaction of the cell array.
///
/// Built once per compaction; meaningless after the next one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexRemap {
    /// `kept_before[i]` = number of surviving elements with old index < i.
    kept_before: Vec<u32>,
    /// Removal mask by old index.
    removed: Vec<bool>,
}

impl IndexRemap {
    /// Builds a remap from a removal mask.
    #[must_use]
    pub fn from_mask(removed: Vec<bool>) -> Self {
        let mut kept_before = Vec::with_capacity(removed.len() + 1);
        let mut kept = 0u32;
        kept_before.push(0);
        for gone in &removed {
            if !gone {
                kept += 1;
            }
            kept_before.push(kept);
        }
        Self {
            kept_before,
            removed,
        }
    }

    /// New index of a surviving element, `None` if it was removed or is out
    /// of range.
    #[inline]
    #[must_use]
    pub fn get(&self, old: usize) -> Option<u32> {
        match self.removed.get(old) {
            Some(false) => self.kept_before.get(old).copied(),
            _ => None,
        }
    }

    /// New position of a range start: the number of survivors before it.
    ///
    /// Defined for removed and one-past-the-end indices too, which keeps
    /// empty ranges well placed.
    #[inline]
    #[must_use]
    pub fn shift(&self, old: usize) -> u32 {
        let last = self.kept_before.len().saturating_sub(1);
        self.kept_before[old.min(last)]
    }

    /// Number of removed elements.
    #[must_use]
    pub fn removed_count(&self) -> usize {
        self.removed.iter().filter(|gone| **gone).count()
    }
}

/// Elements removed by one compaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Removed {
    pub clusters: usize,
    pub cells: usize,
    pub tokens: usize,
    pub particles: usize,
}

/// Deletes the given cluster and particle ids and compacts every array.
pub(crate) fn delete_and_compact(
    arena: &mut Arena,
    deleted_clusters: &HashSet<u64>,
    deleted_particles: &HashSet<u64>,
) -> Removed {
    if deleted_clusters.is_empty() && deleted_particles.is_empty() {
        return Removed::default();
    }

    let mut cell_mask = vec![false; arena.cells.len()];
    let mut token_mask = vec![false; arena.tokens.len()];

    // Clusters
    let mut tokens_shift = 0u32;
    let clusters = arena.clusters.retain_indexed(|_, cluster| {
        if deleted_clusters.contains(&cluster.id) {
            for index in cluster.cell_range() {
                if let Some(gone) = cell_mask.get_mut(index) {
                    *gone = true;
                }
            }
            for index in cluster.token_range() {
                if let Some(gone) = token_mask.get_mut(index) {
                    *gone = true;
                }
            }
            tokens_shift += cluster.num_tokens;
            false
        } else {
            cluster.token_start = cluster.token_start.saturating_sub(tokens_shift);
            true
        }
    });

    // Cells
    let remap = IndexRemap::from_mask(cell_mask);
    let cells = arena.cells.retain_indexed(|old, _| remap.get(old).is_some());

    // Tokens
    let tokens = arena.tokens.retain_indexed(|old, token| {
        if token_mask.get(old).copied().unwrap_or(false) {
            return false;
        }
        match remap.get(token.cell_index as usize) {
            Some(new) => {
                token.cell_index = new;
                true
            }
            None => false,
        }
    });

    // Particles
    let particles = arena
        .particles
        .retain_indexed(|_, particle| !deleted_particles.contains(&particle.id));

    // Index fix-up
    if cells > 0 {
        for cluster in arena.clusters.as_mut_slice() {
            cluster.cell_start = remap.shift(cluster.cell_start as usize);
        }
        for cell in arena.cells.as_mut_slice() {
            let mut kept = 0;
            for slot in 0..cell.num_connections as usize {
                if let Some(new) = remap.get(cell.connections[slot] as usize) {
                    cell.connections[kept] = new;
                    kept += 1;
                }
            }
            for slot in &mut cell.connections[kept..] {
                *slot = 0;
            }
            cell.num_connections = to_u32(kept);
        }
    }

    Removed {
        clusters,
        cells,
        tokens,
        particles,
    }
}
