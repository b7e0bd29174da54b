//! # In-Place Modification
//!
//! Patches surviving clusters, cells and particles with the fields present
//! in their deltas, then rebuilds the whole token array.
//!
//! Tokens are never patched one by one. Every surviving token is grouped by
//! the id of its owning cell, the array is emptied, and tokens are written
//! back cluster by cluster, cell by cell, in arena order. A cell whose delta
//! carries a token list gets exactly that list; every other cell gets its
//! previous tokens verbatim. Cluster token ranges are recomputed as the
//! rebuild proceeds.

use std::collections::{HashMap, HashSet};

use plasmid_shared::{CellChange, ClusterChange, ParticleChange};

use crate::arena::{Arena, ArenaCell, ArenaCluster, ArenaParticle, ArenaToken, StringPool};
use crate::config::ArenaConfig;
use crate::convert::append::{
    intern_cell_metadata, make_token, resolve_connections, set_connections, write_feature,
};
use crate::convert::classify::UpdatePlan;
use crate::convert::{to_u32, ConvertStats, Converter};
use crate::error::{ConvertError, ConvertResult, EntityKind};

impl Converter<'_> {
    /// Applies every delta of `plan` to the compacted arena.
    ///
    /// # Errors
    ///
    /// - `LookupFailure` if a delta's id matches no live entity, or a
    ///   connection id is not a cell of the same cluster
    /// - `CapacityExceeded` if interned text or rebuilt tokens do not fit
    pub(super) fn apply_modifications(
        &mut self,
        plan: &UpdatePlan<'_>,
        stats: &mut ConvertStats,
    ) -> ConvertResult<()> {
        let arena = &mut *self.arena;
        let config = arena.config().clone();

        // Clusters
        let mut seen = HashSet::new();
        for cluster in arena.clusters.as_mut_slice() {
            if let Some(change) = plan.modified_clusters.get(&cluster.id) {
                patch_cluster(cluster, change, &mut arena.strings)?;
                seen.insert(cluster.id);
            }
        }
        ensure_all_seen(plan.modified_clusters.keys(), &seen, EntityKind::Cluster)?;
        stats.clusters_modified = seen.len();

        // Cells
        seen.clear();
        let ranges: Vec<_> = arena
            .clusters
            .as_slice()
            .iter()
            .map(ArenaCluster::cell_range)
            .collect();
        if !plan.modified_cells.is_empty() {
            for range in &ranges {
                patch_cluster_cells(arena, range.clone(), plan, &config, &mut seen)?;
            }
        }
        ensure_all_seen(plan.modified_cells.keys(), &seen, EntityKind::Cell)?;
        stats.cells_modified = seen.len();

        // Tokens
        rebuild_tokens(arena, &ranges, plan, &config)?;

        // Particles
        seen.clear();
        for particle in arena.particles.as_mut_slice() {
            if let Some(change) = plan.modified_particles.get(&particle.id) {
                patch_particle(particle, change);
                seen.insert(particle.id);
            }
        }
        ensure_all_seen(plan.modified_particles.keys(), &seen, EntityKind::Particle)?;
        stats.particles_modified = seen.len();

        Ok(())
    }
}

/// Fails with the first delta id that matched nothing.
fn ensure_all_seen<'k>(
    mut wanted: impl Iterator<Item = &'k u64>,
    seen: &HashSet<u64>,
    kind: EntityKind,
) -> ConvertResult<()> {
    match wanted.find(|id| !seen.contains(*id)) {
        Some(id) => Err(ConvertError::lookup(kind, *id)),
        None => Ok(()),
    }
}

fn patch_cluster(
    cluster: &mut ArenaCluster,
    change: &ClusterChange,
    strings: &mut StringPool,
) -> ConvertResult<()> {
    if let Some(pos) = change.pos {
        cluster.pos = pos;
    }
    if let Some(vel) = change.vel {
        cluster.vel = vel;
    }
    if let Some(angle) = change.angle {
        cluster.angle = angle;
    }
    if let Some(angular_vel) = change.angular_vel {
        cluster.angular_vel = angular_vel;
    }
    if let Some(metadata) = &change.metadata {
        cluster.name = strings.intern(&metadata.name)?;
    }
    Ok(())
}

/// Patches the modified cells of one cluster.
///
/// Connection ids are resolved against the cells of that cluster only.
fn patch_cluster_cells(
    arena: &mut Arena,
    range: std::ops::Range<usize>,
    plan: &UpdatePlan<'_>,
    config: &ArenaConfig,
    seen: &mut HashSet<u64>,
) -> ConvertResult<()> {
    let start = range.start;
    let Some(cells) = arena.cells.as_mut_slice().get_mut(range) else {
        return Ok(());
    };
    let mut index_by_id: Option<HashMap<u64, u32>> = None;

    for offset in 0..cells.len() {
        let Some(change) = plan.modified_cells.get(&cells[offset].id) else {
            continue;
        };
        let connections = match &change.connecting_cells {
            Some(ids) => {
                let local = index_by_id.get_or_insert_with(|| {
                    cells
                        .iter()
                        .enumerate()
                        .map(|(i, cell)| (cell.id, to_u32(start + i)))
                        .collect()
                });
                Some(resolve_connections(ids, config.max_cell_connections, |id| {
                    local.get(&id).copied()
                })?)
            }
            None => None,
        };
        patch_cell(
            &mut cells[offset],
            change,
            connections.as_deref(),
            &mut arena.strings,
            config,
        )?;
        seen.insert(cells[offset].id);
    }
    Ok(())
}

fn patch_cell(
    cell: &mut ArenaCell,
    change: &CellChange,
    connections: Option<&[u32]>,
    strings: &mut StringPool,
    config: &ArenaConfig,
) -> ConvertResult<()> {
    if let Some(pos) = change.pos {
        cell.pos = pos;
    }
    if let Some(energy) = change.energy {
        cell.energy = energy;
    }
    if let Some(max_connections) = change.max_connections {
        cell.max_connections = max_connections;
    }
    if let Some(connections) = connections {
        set_connections(cell, connections);
    }
    if let Some(branch) = change.token_branch_number {
        cell.branch_number = branch;
    }
    if let Some(blocked) = change.token_blocked {
        cell.token_blocked = u32::from(blocked);
    }
    if let Some(usages) = change.token_usages {
        cell.token_usages = usages;
    }
    if let Some(feature) = &change.feature {
        write_feature(cell, feature, config);
    }
    if let Some(metadata) = &change.metadata {
        cell.metadata = intern_cell_metadata(metadata, strings)?;
    }
    Ok(())
}

fn patch_particle(particle: &mut ArenaParticle, change: &ParticleChange) {
    if let Some(pos) = change.pos {
        particle.pos = pos;
    }
    if let Some(vel) = change.vel {
        particle.vel = vel;
    }
    if let Some(energy) = change.energy {
        particle.energy = energy;
    }
    if let Some(metadata) = change.metadata {
        particle.color = metadata.color;
    }
}

/// Rewrites the token array from scratch in cluster / cell order.
fn rebuild_tokens(
    arena: &mut Arena,
    ranges: &[std::ops::Range<usize>],
    plan: &UpdatePlan<'_>,
    config: &ArenaConfig,
) -> ConvertResult<()> {
    let cells = arena.cells.as_slice();
    let mut previous: HashMap<u64, Vec<ArenaToken>> = HashMap::new();
    for token in arena.tokens.as_slice() {
        if let Some(owner) = cells.get(token.cell_index as usize) {
            previous.entry(owner.id).or_default().push(*token);
        }
    }
    arena.tokens.clear();

    for (cluster_index, range) in ranges.iter().enumerate() {
        let token_start = arena.tokens.len();
        for cell_index in range.clone() {
            let Some(cell_id) = arena.cells.get(cell_index).map(|cell| cell.id) else {
                continue;
            };
            let replacement = plan
                .modified_cells
                .get(&cell_id)
                .and_then(|change| change.tokens.as_ref());
            if let Some(tokens) = replacement {
                for token in tokens {
                    arena.tokens.push(make_token(token, cell_index, config))?;
                }
            } else if let Some(tokens) = previous.remove(&cell_id) {
                for mut token in tokens {
                    token.cell_index = to_u32(cell_index);
                    arena.tokens.push(token)?;
                }
            }
        }
        if let Some(cluster) = arena.clusters.get_mut(cluster_index) {
            cluster.token_start = to_u32(token_start);
            cluster.num_tokens = to_u32(arena.tokens.len() - token_start);
        }
    }
    Ok(())
}
