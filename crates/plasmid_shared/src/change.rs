//! # Change Sets
//!
//! Incremental edits to a world that already lives in the arena.
//!
//! Every entity in a [`ChangeSet`] is wrapped in a [`Tracked`] marker:
//!
//! - **Added**: no prior identity in the arena, appended at the tail
//! - **Modified**: a per-field delta; `None` fields leave the arena untouched
//! - **Deleted**: only the id matters
//! - **Unchanged**: carried for completeness, ignored when applied
//!
//! Deletion works on whole clusters and particles only. Cells inside a
//! live cluster can be modified but not added or removed one by one.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::description::{
    CellDescription, CellFeatureDescription, CellMetadata, ClusterDescription, ClusterMetadata,
    GraphModel, ParticleDescription, ParticleMetadata, TokenDescription,
};
use crate::math::Vec2;

/// Classification of one entity inside a change set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Tracked<T> {
    /// New entity.
    Added(T),
    /// Existing entity with a field delta.
    Modified(T),
    /// Entity to remove.
    Deleted(T),
    /// Existing entity, nothing to do.
    Unchanged(T),
}

impl<T> Tracked<T> {
    /// Returns the wrapped value.
    #[inline]
    #[must_use]
    pub const fn value(&self) -> &T {
        match self {
            Self::Added(v) | Self::Modified(v) | Self::Deleted(v) | Self::Unchanged(v) => v,
        }
    }

    /// True for [`Tracked::Added`].
    #[inline]
    #[must_use]
    pub const fn is_added(&self) -> bool {
        matches!(self, Self::Added(_))
    }

    /// True for [`Tracked::Modified`].
    #[inline]
    #[must_use]
    pub const fn is_modified(&self) -> bool {
        matches!(self, Self::Modified(_))
    }

    /// True for [`Tracked::Deleted`].
    #[inline]
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted(_))
    }
}

/// Returns `after` if it differs from `before`, otherwise `None`.
fn delta<T: Clone + PartialEq>(before: &Option<T>, after: &Option<T>) -> Option<T> {
    if before == after {
        None
    } else {
        after.clone()
    }
}

// ============================================================================
// PARTICLE
// ============================================================================

/// Field delta for a particle.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticleChange {
    /// Id of the particle.
    pub id: u64,
    /// New position.
    pub pos: Option<Vec2>,
    /// New velocity.
    pub vel: Option<Vec2>,
    /// New energy.
    pub energy: Option<f32>,
    /// New metadata.
    pub metadata: Option<ParticleMetadata>,
}

impl ParticleChange {
    /// Creates an empty delta for `id`.
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Delta from `before` to `after`.
    #[must_use]
    pub fn diff(before: &ParticleDescription, after: &ParticleDescription) -> Self {
        Self {
            id: after.id,
            pos: delta(&before.pos, &after.pos),
            vel: delta(&before.vel, &after.vel),
            energy: delta(&before.energy, &after.energy),
            metadata: delta(&before.metadata, &after.metadata),
        }
    }

    /// True if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos.is_none() && self.vel.is_none() && self.energy.is_none() && self.metadata.is_none()
    }
}

impl From<&ParticleDescription> for ParticleChange {
    fn from(desc: &ParticleDescription) -> Self {
        Self {
            id: desc.id,
            pos: desc.pos,
            vel: desc.vel,
            energy: desc.energy,
            metadata: desc.metadata,
        }
    }
}

impl From<&ParticleChange> for ParticleDescription {
    fn from(change: &ParticleChange) -> Self {
        Self {
            id: change.id,
            pos: change.pos,
            vel: change.vel,
            energy: change.energy,
            metadata: change.metadata,
        }
    }
}

// ============================================================================
// CELL
// ============================================================================

/// Field delta for a cell.
///
/// `tokens` is all-or-nothing: when present it replaces the cell's entire
/// token list, when absent the existing tokens are kept verbatim.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CellChange {
    /// Id of the cell.
    pub id: u64,
    /// New position.
    pub pos: Option<Vec2>,
    /// New energy.
    pub energy: Option<f32>,
    /// New maximum connection count.
    pub max_connections: Option<u32>,
    /// New connection list (ids).
    pub connecting_cells: Option<Vec<u64>>,
    /// New token branch number.
    pub token_branch_number: Option<u32>,
    /// New token-blocked flag.
    pub token_blocked: Option<bool>,
    /// New token usage counter.
    pub token_usages: Option<u32>,
    /// New feature.
    pub feature: Option<CellFeatureDescription>,
    /// New metadata.
    pub metadata: Option<CellMetadata>,
    /// Replacement token list.
    pub tokens: Option<Vec<TokenDescription>>,
}

impl CellChange {
    /// Creates an empty delta for `id`.
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Delta from `before` to `after`.
    #[must_use]
    pub fn diff(before: &CellDescription, after: &CellDescription) -> Self {
        Self {
            id: after.id,
            pos: delta(&before.pos, &after.pos),
            energy: delta(&before.energy, &after.energy),
            max_connections: delta(&before.max_connections, &after.max_connections),
            connecting_cells: delta(&before.connecting_cells, &after.connecting_cells),
            token_branch_number: delta(&before.token_branch_number, &after.token_branch_number),
            token_blocked: delta(&before.token_blocked, &after.token_blocked),
            token_usages: delta(&before.token_usages, &after.token_usages),
            feature: delta(&before.feature, &after.feature),
            metadata: delta(&before.metadata, &after.metadata),
            tokens: delta(&before.tokens, &after.tokens),
        }
    }

    /// True if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos.is_none()
            && self.energy.is_none()
            && self.max_connections.is_none()
            && self.connecting_cells.is_none()
            && self.token_branch_number.is_none()
            && self.token_blocked.is_none()
            && self.token_usages.is_none()
            && self.feature.is_none()
            && self.metadata.is_none()
            && self.tokens.is_none()
    }
}

impl From<&CellDescription> for CellChange {
    fn from(desc: &CellDescription) -> Self {
        Self {
            id: desc.id,
            pos: desc.pos,
            energy: desc.energy,
            max_connections: desc.max_connections,
            connecting_cells: desc.connecting_cells.clone(),
            token_branch_number: desc.token_branch_number,
            token_blocked: desc.token_blocked,
            token_usages: desc.token_usages,
            feature: desc.feature.clone(),
            metadata: desc.metadata.clone(),
            tokens: desc.tokens.clone(),
        }
    }
}

impl From<&CellChange> for CellDescription {
    fn from(change: &CellChange) -> Self {
        Self {
            id: change.id,
            pos: change.pos,
            energy: change.energy,
            max_connections: change.max_connections,
            connecting_cells: change.connecting_cells.clone(),
            token_branch_number: change.token_branch_number,
            token_blocked: change.token_blocked,
            token_usages: change.token_usages,
            feature: change.feature.clone(),
            metadata: change.metadata.clone(),
            tokens: change.tokens.clone(),
        }
    }
}

// ============================================================================
// CLUSTER
// ============================================================================

/// Field delta for a cluster, plus per-cell tracking.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterChange {
    /// Id of the cluster.
    pub id: u64,
    /// New position.
    pub pos: Option<Vec2>,
    /// New velocity.
    pub vel: Option<Vec2>,
    /// New angle.
    pub angle: Option<f32>,
    /// New angular velocity.
    pub angular_vel: Option<f32>,
    /// New metadata.
    pub metadata: Option<ClusterMetadata>,
    /// Per-cell tracking.
    pub cells: Vec<Tracked<CellChange>>,
}

impl ClusterChange {
    /// Creates an empty delta for `id`.
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Adds a modified cell.
    #[must_use]
    pub fn with_modified_cell(mut self, cell: CellChange) -> Self {
        self.cells.push(Tracked::Modified(cell));
        self
    }

    /// Delta from `before` to `after`, matching cells by id.
    #[must_use]
    pub fn diff(before: &ClusterDescription, after: &ClusterDescription) -> Self {
        let before_cells: HashMap<u64, &CellDescription> =
            before.cells.iter().map(|c| (c.id, c)).collect();

        let mut cells = Vec::with_capacity(after.cells.len());
        for cell in &after.cells {
            match before_cells.get(&cell.id) {
                Some(previous) if cell.id != 0 => {
                    let change = CellChange::diff(previous, cell);
                    if change.is_empty() {
                        cells.push(Tracked::Unchanged(CellChange::new(cell.id)));
                    } else {
                        cells.push(Tracked::Modified(change));
                    }
                }
                _ => cells.push(Tracked::Added(CellChange::from(cell))),
            }
        }
        for cell in &before.cells {
            if !after.cells.iter().any(|c| c.id == cell.id) {
                cells.push(Tracked::Deleted(CellChange::new(cell.id)));
            }
        }

        Self {
            id: after.id,
            pos: delta(&before.pos, &after.pos),
            vel: delta(&before.vel, &after.vel),
            angle: delta(&before.angle, &after.angle),
            angular_vel: delta(&before.angular_vel, &after.angular_vel),
            metadata: delta(&before.metadata, &after.metadata),
            cells,
        }
    }

    /// True if no field is set and every cell is unchanged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos.is_none()
            && self.vel.is_none()
            && self.angle.is_none()
            && self.angular_vel.is_none()
            && self.metadata.is_none()
            && self.cells.iter().all(|c| matches!(c, Tracked::Unchanged(_)))
    }
}

impl From<&ClusterDescription> for ClusterChange {
    fn from(desc: &ClusterDescription) -> Self {
        Self {
            id: desc.id,
            pos: desc.pos,
            vel: desc.vel,
            angle: desc.angle,
            angular_vel: desc.angular_vel,
            metadata: desc.metadata.clone(),
            cells: desc
                .cells
                .iter()
                .map(|c| Tracked::Added(CellChange::from(c)))
                .collect(),
        }
    }
}

impl From<&ClusterChange> for ClusterDescription {
    /// Cells tracked as deleted are dropped.
    fn from(change: &ClusterChange) -> Self {
        Self {
            id: change.id,
            pos: change.pos,
            vel: change.vel,
            angle: change.angle,
            angular_vel: change.angular_vel,
            metadata: change.metadata.clone(),
            cells: change
                .cells
                .iter()
                .filter(|c| !c.is_deleted())
                .map(|c| CellDescription::from(c.value()))
                .collect(),
        }
    }
}

// ============================================================================
// CHANGE SET
// ============================================================================

/// A batch of add / modify / delete intents.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    /// Tracked clusters.
    pub clusters: Vec<Tracked<ClusterChange>>,
    /// Tracked particles.
    pub particles: Vec<Tracked<ParticleChange>>,
}

impl ChangeSet {
    /// Creates an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A change set that adds every entity of `model`.
    #[must_use]
    pub fn from_model(model: &GraphModel) -> Self {
        let mut changes = Self::new();
        for cluster in &model.clusters {
            changes.add_cluster(cluster);
        }
        for particle in &model.particles {
            changes.add_particle(particle);
        }
        changes
    }

    /// Classifies every entity of `after` against `before` by id.
    ///
    /// Entities with id 0 or unknown ids are added, entities missing from
    /// `after` are deleted, the rest are modified or unchanged.
    #[must_use]
    pub fn diff(before: &GraphModel, after: &GraphModel) -> Self {
        let before_clusters: HashMap<u64, &ClusterDescription> =
            before.clusters.iter().map(|c| (c.id, c)).collect();
        let before_particles: HashMap<u64, &ParticleDescription> =
            before.particles.iter().map(|p| (p.id, p)).collect();

        let mut changes = Self::new();

        for cluster in &after.clusters {
            match before_clusters.get(&cluster.id) {
                Some(previous) if cluster.id != 0 => {
                    let change = ClusterChange::diff(previous, cluster);
                    if change.is_empty() {
                        changes.clusters.push(Tracked::Unchanged(change));
                    } else {
                        changes.clusters.push(Tracked::Modified(change));
                    }
                }
                _ => {
                    changes.add_cluster(cluster);
                }
            }
        }
        for cluster in &before.clusters {
            if !after.clusters.iter().any(|c| c.id == cluster.id) {
                changes.delete_cluster(cluster.id);
            }
        }

        for particle in &after.particles {
            match before_particles.get(&particle.id) {
                Some(previous) if particle.id != 0 => {
                    let change = ParticleChange::diff(previous, particle);
                    if change.is_empty() {
                        changes.particles.push(Tracked::Unchanged(change));
                    } else {
                        changes.particles.push(Tracked::Modified(change));
                    }
                }
                _ => {
                    changes.add_particle(particle);
                }
            }
        }
        for particle in &before.particles {
            if !after.particles.iter().any(|p| p.id == particle.id) {
                changes.delete_particle(particle.id);
            }
        }

        changes
    }

    /// Marks a cluster for addition.
    pub fn add_cluster(&mut self, cluster: &ClusterDescription) -> &mut Self {
        self.clusters.push(Tracked::Added(ClusterChange::from(cluster)));
        self
    }

    /// Records a cluster delta.
    pub fn modify_cluster(&mut self, change: ClusterChange) -> &mut Self {
        self.clusters.push(Tracked::Modified(change));
        self
    }

    /// Marks a cluster, with all its cells and tokens, for deletion.
    pub fn delete_cluster(&mut self, id: u64) -> &mut Self {
        self.clusters.push(Tracked::Deleted(ClusterChange::new(id)));
        self
    }

    /// Marks a particle for addition.
    pub fn add_particle(&mut self, particle: &ParticleDescription) -> &mut Self {
        self.particles.push(Tracked::Added(ParticleChange::from(particle)));
        self
    }

    /// Records a particle delta.
    pub fn modify_particle(&mut self, change: ParticleChange) -> &mut Self {
        self.particles.push(Tracked::Modified(change));
        self
    }

    /// Marks a particle for deletion.
    pub fn delete_particle(&mut self, id: u64) -> &mut Self {
        self.particles.push(Tracked::Deleted(ParticleChange::new(id)));
        self
    }

    /// True if applying this change set would do nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters.iter().all(|c| matches!(c, Tracked::Unchanged(_)))
            && self.particles.iter().all(|p| matches!(p, Tracked::Unchanged(_)))
    }
}
