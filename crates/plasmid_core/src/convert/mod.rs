//! # Graph ⇄ Arena Conversion
//!
//! The marshalling layer between the id-based [`GraphModel`] and the
//! index-based [`Arena`].
//!
//! ## Operations
//!
//! | Call                             | Effect                                   |
//! |----------------------------------|------------------------------------------|
//! | [`Converter::load_snapshot`]     | clear, then append a whole model         |
//! | [`Converter::append`]            | append a model onto the live arrays      |
//! | [`Converter::apply_change_set`]  | delete + compact, modify, then append    |
//! | [`read_snapshot`]                | pure read back into a model              |
//!
//! ## Atomicity
//!
//! Every mutating call checkpoints the arena first. If any step fails the
//! checkpoint is restored before the error is returned, so a failed call
//! leaves the arena bit-identical to its state before the call.
//!
//! ## Concurrency
//!
//! The converter takes no locks. The driver must make sure the compute
//! engine is not touching the arena while a converter holds it.

mod append;
mod classify;
mod compact;
mod modify;
mod read;

pub use compact::IndexRemap;
pub use read::read_snapshot;

use plasmid_shared::{ChangeSet, GraphModel};

use crate::arena::Arena;
use crate::convert::append::ClaimedIds;
use crate::error::ConvertResult;
use crate::identity::IdentitySource;

/// Counts reported by one conversion call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConvertStats {
    /// Clusters appended.
    pub clusters_added: usize,
    /// Clusters removed by compaction.
    pub clusters_removed: usize,
    /// Clusters patched in place.
    pub clusters_modified: usize,
    /// Cells appended.
    pub cells_added: usize,
    /// Cells removed by compaction.
    pub cells_removed: usize,
    /// Cells patched in place.
    pub cells_modified: usize,
    /// Particles appended.
    pub particles_added: usize,
    /// Particles removed by compaction.
    pub particles_removed: usize,
    /// Particles patched in place.
    pub particles_modified: usize,
    /// Tokens appended with new cells.
    pub tokens_added: usize,
    /// Tokens removed by compaction.
    pub tokens_removed: usize,
    /// Cell-level add/delete entries skipped inside modified clusters.
    pub cells_ignored: usize,
}

impl ConvertStats {
    /// Total number of entities touched.
    #[must_use]
    pub fn total_changes(&self) -> usize {
        self.clusters_added
            + self.clusters_removed
            + self.clusters_modified
            + self.cells_added
            + self.cells_removed
            + self.cells_modified
            + self.particles_added
            + self.particles_removed
            + self.particles_modified
    }
}

/// Borrows an arena and an id source for the duration of one or more
/// conversions.
///
/// # Example
///
/// ```rust,ignore
/// let table = IdTable::with_seed(0);
/// let mut ids = table.lane()?;
/// let mut converter = Converter::new(&mut arena, &mut ids);
/// converter.load_snapshot(&model)?;
/// converter.apply_change_set(&ChangeSet::diff(&model, &edited))?;
/// ```
pub struct Converter<'a> {
    arena: &'a mut Arena,
    ids: &'a mut dyn IdentitySource,
    claimed: ClaimedIds,
}

impl<'a> Converter<'a> {
    /// Creates a converter over `arena`, drawing fresh ids from `ids`.
    pub fn new(arena: &'a mut Arena, ids: &'a mut dyn IdentitySource) -> Self {
        Self {
            arena,
            ids,
            claimed: ClaimedIds::default(),
        }
    }

    /// The borrowed arena.
    #[inline]
    #[must_use]
    pub fn arena(&self) -> &Arena {
        self.arena
    }

    /// Replaces the arena contents with `model`.
    ///
    /// # Errors
    ///
    /// - `CapacityExceeded` if the model does not fit
    /// - `LookupFailure` if a connection id is not a cell of its cluster
    /// - `DuplicateId` if an explicit id is already in use for its kind
    /// - `IdentityExhausted` if a fresh id cannot be drawn
    ///
    /// The arena is unchanged on error.
    pub fn load_snapshot(&mut self, model: &GraphModel) -> ConvertResult<ConvertStats> {
        self.transaction("load_snapshot", |converter| {
            converter.arena.clear();
            converter.append_model(model)
        })
    }

    /// Appends `model` without clearing.
    ///
    /// # Errors
    ///
    /// Same as [`Converter::load_snapshot`]. The arena is unchanged on error.
    pub fn append(&mut self, model: &GraphModel) -> ConvertResult<ConvertStats> {
        self.transaction("append", |converter| converter.append_model(model))
    }

    /// Applies `changes` in place: delete + compact, modify, then append.
    ///
    /// # Errors
    ///
    /// - `CapacityExceeded` if additions or rebuilt tokens do not fit
    /// - `LookupFailure` if a delta names an id with no live entity
    /// - `DuplicateId` if an added entity reuses a live id of its kind
    /// - `IdentityExhausted` if a fresh id cannot be drawn
    ///
    /// The arena is unchanged on error.
    pub fn apply_change_set(&mut self, changes: &ChangeSet) -> ConvertResult<ConvertStats> {
        self.transaction("apply_change_set", |converter| {
            let plan = classify::classify(changes);
            let mut stats = ConvertStats {
                cells_ignored: plan.ignored_cells,
                ..ConvertStats::default()
            };
            if plan.ignored_cells > 0 {
                tracing::warn!(
                    "Ignoring {} cell-level add/delete entries inside modified clusters",
                    plan.ignored_cells
                );
            }

            let removed = compact::delete_and_compact(
                converter.arena,
                &plan.deleted_clusters,
                &plan.deleted_particles,
            );
            stats.clusters_removed = removed.clusters;
            stats.cells_removed = removed.cells;
            stats.tokens_removed = removed.tokens;
            stats.particles_removed = removed.particles;

            converter.apply_modifications(&plan, &mut stats)?;

            converter.claimed = ClaimedIds::from_arena(converter.arena);
            for cluster in &plan.added_clusters {
                converter.append_cluster(cluster, &mut stats)?;
            }
            for particle in &plan.added_particles {
                converter.append_particle(particle, &mut stats)?;
            }
            Ok(stats)
        })
    }

    /// Reads the arena back into a model.
    #[must_use]
    pub fn read_snapshot(&self) -> GraphModel {
        read_snapshot(self.arena)
    }

    /// Appends every cluster, then every particle.
    fn append_model(&mut self, model: &GraphModel) -> ConvertResult<ConvertStats> {
        let mut stats = ConvertStats::default();
        self.claimed = ClaimedIds::from_arena(self.arena);
        for cluster in &model.clusters {
            self.append_cluster(cluster, &mut stats)?;
        }
        for particle in &model.particles {
            self.append_particle(particle, &mut stats)?;
        }
        Ok(stats)
    }

    /// Runs `op`, restoring the arena if it fails.
    fn transaction<F>(&mut self, name: &str, op: F) -> ConvertResult<ConvertStats>
    where
        F: FnOnce(&mut Self) -> ConvertResult<ConvertStats>,
    {
        let checkpoint = self.arena.checkpoint();
        match op(self) {
            Ok(stats) => {
                let header = self.arena.header();
                tracing::debug!(
                    "{}: +{}/-{}/~{} clusters, +{}/-{}/~{} cells, +{}/-{}/~{} particles; live {} clusters {} cells {} particles {} tokens {} string bytes",
                    name,
                    stats.clusters_added,
                    stats.clusters_removed,
                    stats.clusters_modified,
                    stats.cells_added,
                    stats.cells_removed,
                    stats.cells_modified,
                    stats.particles_added,
                    stats.particles_removed,
                    stats.particles_modified,
                    header.num_clusters,
                    header.num_cells,
                    header.num_particles,
                    header.num_tokens,
                    header.string_bytes,
                );
                Ok(stats)
            }
            Err(err) => {
                tracing::warn!("{} failed, rolling back: {}", name, err);
                if let Err(restore_err) = self.arena.restore(&checkpoint) {
                    tracing::error!("{} rollback failed: {}", name, restore_err);
                }
                Err(err)
            }
        }
    }
}

/// Clamps an index or count into the arena's `u32` fields.
///
/// Capacities are validated to fit in `u32`, so live values never clamp.
#[inline]
pub(crate) fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
