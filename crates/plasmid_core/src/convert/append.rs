//! # GraphModel → Arena Append
//!
//! Clusters are appended in two phases so mutual connections can resolve:
//!
//! 1. Append every cell (and its tokens) of the cluster, recording id → index
//! 2. Walk the same cells again and translate each connection id through
//!    that map
//!
//! Byte payloads longer than the configured limits are truncated; metadata
//! text is interned and fails if the pool is full.
//!
//! Explicit ids are claimed per entity kind. An id already held by a live
//! entity, or by an earlier addition in the same call, is rejected.

use std::collections::{HashMap, HashSet};

use bytemuck::Zeroable;

use plasmid_shared::{
    CellDescription, CellFeatureDescription, CellMetadata, ClusterDescription,
    ParticleDescription, TokenDescription,
};

use crate::arena::{
    Arena, ArenaCell, ArenaCluster, ArenaParticle, ArenaToken, CellMetadataSlot, StringPool,
    StringRef,
};
use crate::config::ArenaConfig;
use crate::convert::{to_u32, ConvertStats, Converter};
use crate::error::{CapacityKind, ConvertError, ConvertResult, EntityKind};

/// Ids already taken in each entity id space.
#[derive(Debug, Default)]
pub(super) struct ClaimedIds {
    clusters: HashSet<u64>,
    cells: HashSet<u64>,
    particles: HashSet<u64>,
}

impl ClaimedIds {
    /// Collects the ids of every live entity.
    pub(super) fn from_arena(arena: &Arena) -> Self {
        Self {
            clusters: arena.clusters.as_slice().iter().map(|c| c.id).collect(),
            cells: arena.cells.as_slice().iter().map(|c| c.id).collect(),
            particles: arena.particles.as_slice().iter().map(|p| p.id).collect(),
        }
    }

    /// Marks `id` as taken, returning `false` if it already was.
    fn claim(&mut self, kind: EntityKind, id: u64) -> bool {
        let set = match kind {
            EntityKind::Cluster => &mut self.clusters,
            EntityKind::Cell => &mut self.cells,
            EntityKind::Particle => &mut self.particles,
        };
        set.insert(id)
    }
}

impl Converter<'_> {
    /// Returns `id`, or a fresh one if it is the unassigned sentinel.
    ///
    /// # Errors
    ///
    /// `DuplicateId` if an explicit `id` is already claimed for `kind`.
    fn resolve_id(&mut self, kind: EntityKind, id: u64) -> ConvertResult<u64> {
        if id == 0 {
            let fresh = self.ids.next_id()?;
            self.claimed.claim(kind, fresh);
            Ok(fresh)
        } else if self.claimed.claim(kind, id) {
            Ok(id)
        } else {
            Err(ConvertError::duplicate(kind, id))
        }
    }

    /// Appends a cluster with all its cells, tokens and connections.
    pub(super) fn append_cluster(
        &mut self,
        desc: &ClusterDescription,
        stats: &mut ConvertStats,
    ) -> ConvertResult<()> {
        let id = self.resolve_id(EntityKind::Cluster, desc.id)?;
        let name = match &desc.metadata {
            Some(metadata) => self.arena.strings.intern(&metadata.name)?,
            None => StringRef::EMPTY,
        };
        let cluster_index = self.arena.clusters.push(ArenaCluster {
            id,
            pos: desc.pos.unwrap_or_else(|| desc.pos_from_cells()),
            vel: desc.vel.unwrap_or_default(),
            angle: desc.angle.unwrap_or(0.0),
            angular_vel: desc.angular_vel.unwrap_or(0.0),
            cell_start: to_u32(self.arena.cells.len()),
            num_cells: 0,
            token_start: to_u32(self.arena.tokens.len()),
            num_tokens: 0,
            name,
        })?;

        // Phase 1: cells and their tokens.
        let mut index_by_id: HashMap<u64, usize> = HashMap::with_capacity(desc.cells.len());
        let mut cell_indices = Vec::with_capacity(desc.cells.len());
        let mut num_tokens = 0;
        for cell in &desc.cells {
            let (index, tokens) = self.append_cell(cell)?;
            if let Some(stored) = self.arena.cells.get(index) {
                index_by_id.insert(stored.id, index);
            }
            cell_indices.push(index);
            num_tokens += tokens;
        }

        // Phase 2: connections.
        let max_connections = self.arena.config().max_cell_connections;
        for (cell, &index) in desc.cells.iter().zip(&cell_indices) {
            let Some(ids) = &cell.connecting_cells else {
                continue;
            };
            let connections = resolve_connections(ids, max_connections, |id| {
                index_by_id.get(&id).map(|index| to_u32(*index))
            })?;
            if let Some(stored) = self.arena.cells.get_mut(index) {
                set_connections(stored, &connections);
            }
        }

        if let Some(cluster) = self.arena.clusters.get_mut(cluster_index) {
            cluster.num_cells = to_u32(desc.cells.len());
            cluster.num_tokens = to_u32(num_tokens);
        }

        stats.clusters_added += 1;
        stats.cells_added += desc.cells.len();
        stats.tokens_added += num_tokens;
        Ok(())
    }

    /// Appends one cell and its tokens, returning the cell index and the
    /// number of tokens written.
    fn append_cell(&mut self, desc: &CellDescription) -> ConvertResult<(usize, usize)> {
        let config = self.arena.config().clone();
        let declared_connections = desc.connecting_cells.as_ref().map_or(0, Vec::len);

        let mut cell = ArenaCell::zeroed();
        cell.id = self.resolve_id(EntityKind::Cell, desc.id)?;
        cell.pos = desc.pos.unwrap_or_default();
        cell.energy = desc.energy.unwrap_or(0.0);
        cell.max_connections = desc
            .max_connections
            .unwrap_or_else(|| to_u32(declared_connections));
        cell.branch_number = desc.token_branch_number.unwrap_or(0);
        cell.token_blocked = u32::from(desc.token_blocked.unwrap_or(false));
        cell.token_usages = desc.token_usages.unwrap_or(0);
        match &desc.feature {
            Some(feature) => write_feature(&mut cell, feature, &config),
            None => write_feature(&mut cell, &CellFeatureDescription::default(), &config),
        }
        if let Some(metadata) = &desc.metadata {
            cell.metadata = intern_cell_metadata(metadata, &mut self.arena.strings)?;
        }
        let index = self.arena.cells.push(cell)?;

        let tokens = desc.tokens.as_deref().unwrap_or_default();
        for token in tokens {
            self.arena.tokens.push(make_token(token, index, &config))?;
        }
        Ok((index, tokens.len()))
    }

    /// Appends a free particle.
    pub(super) fn append_particle(
        &mut self,
        desc: &ParticleDescription,
        stats: &mut ConvertStats,
    ) -> ConvertResult<()> {
        let id = self.resolve_id(EntityKind::Particle, desc.id)?;
        self.arena.particles.push(ArenaParticle {
            id,
            pos: desc.pos.unwrap_or_default(),
            vel: desc.vel.unwrap_or_default(),
            energy: desc.energy.unwrap_or(0.0),
            color: desc.metadata.map_or(0, |m| m.color),
        })?;
        stats.particles_added += 1;
        Ok(())
    }
}

// ============================================================================
// FIELD WRITERS
// ============================================================================

/// Copies `source` into `target`, truncating to `limit` and zero-padding.
///
/// # Returns
///
/// Number of bytes copied.
fn copy_padded(source: &[u8], target: &mut [u8], limit: usize) -> usize {
    let len = source.len().min(limit).min(target.len());
    target.fill(0);
    target[..len].copy_from_slice(&source[..len]);
    len
}

/// Writes a feature's type tag and byte blocks.
pub(super) fn write_feature(
    cell: &mut ArenaCell,
    feature: &CellFeatureDescription,
    config: &ArenaConfig,
) {
    cell.function_type = u32::from(feature.function.as_u8());
    cell.num_static_bytes = to_u32(copy_padded(
        &feature.const_data,
        &mut cell.static_data,
        config.cell_static_bytes,
    ));
    cell.num_mutable_bytes = to_u32(copy_padded(
        &feature.volatile_data,
        &mut cell.mutable_data,
        config.cell_mutable_bytes,
    ));
}

/// Interns a cell's metadata strings.
pub(super) fn intern_cell_metadata(
    metadata: &CellMetadata,
    strings: &mut StringPool,
) -> ConvertResult<CellMetadataSlot> {
    Ok(CellMetadataSlot {
        color: metadata.color,
        name: strings.intern(&metadata.name)?,
        description: strings.intern(&metadata.description)?,
        source_code: strings.intern(&metadata.source_code)?,
    })
}

/// Builds an arena token owned by `cell_index`.
pub(super) fn make_token(
    desc: &TokenDescription,
    cell_index: usize,
    config: &ArenaConfig,
) -> ArenaToken {
    let mut token = ArenaToken::zeroed();
    token.energy = desc.energy;
    token.cell_index = to_u32(cell_index);
    copy_padded(&desc.data, &mut token.memory, config.token_memory_size);
    token
}

/// Translates connection ids into cell indices.
///
/// # Errors
///
/// - `CapacityExceeded(Connections)` if there are more than `max` ids
/// - `LookupFailure(Cell)` if `lookup` cannot resolve an id
pub(super) fn resolve_connections<F>(
    ids: &[u64],
    max: usize,
    lookup: F,
) -> ConvertResult<Vec<u32>>
where
    F: Fn(u64) -> Option<u32>,
{
    if ids.len() > max {
        return Err(ConvertError::capacity(CapacityKind::Connections, max));
    }
    ids.iter()
        .map(|&id| lookup(id).ok_or_else(|| ConvertError::lookup(EntityKind::Cell, id)))
        .collect()
}

/// Overwrites a cell's connection slots.
pub(super) fn set_connections(cell: &mut ArenaCell, connections: &[u32]) {
    cell.connections = [0; plasmid_shared::MAX_CELL_CONNECTIONS];
    cell.connections[..connections.len()].copy_from_slice(connections);
    cell.num_connections = to_u32(connections.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use plasmid_shared::CellFunction;

    #[test]
    fn test_copy_padded_truncates() {
        let mut target = [9u8; 4];
        assert_eq!(copy_padded(&[1, 2, 3, 4, 5, 6], &mut target, 3), 3);
        assert_eq!(target, [1, 2, 3, 0]);
    }

    #[test]
    fn test_write_feature_respects_limits() {
        let config = ArenaConfig {
            cell_static_bytes: 2,
            ..ArenaConfig::default()
        };
        let feature = CellFeatureDescription::new(CellFunction::Scanner)
            .with_const_data(vec![1, 2, 3])
            .with_volatile_data(vec![7]);

        let mut cell = ArenaCell::zeroed();
        write_feature(&mut cell, &feature, &config);
        assert_eq!(cell.function_type, 2);
        assert_eq!(cell.static_bytes(), &[1, 2]);
        assert_eq!(cell.mutable_bytes(), &[7]);
    }

    #[test]
    fn test_make_token_zero_pads() {
        let config = ArenaConfig {
            token_memory_size: 4,
            ..ArenaConfig::default()
        };
        let token = make_token(&TokenDescription::new(1.5, vec![5, 6]), 3, &config);
        assert_eq!(token.cell_index, 3);
        assert_eq!(&token.memory[..4], &[5, 6, 0, 0]);
        assert!(token.memory[4..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_claimed_ids_are_per_kind() {
        let mut claimed = ClaimedIds::default();
        assert!(claimed.claim(EntityKind::Cell, 5));
        assert!(!claimed.claim(EntityKind::Cell, 5));
        assert!(claimed.claim(EntityKind::Cluster, 5));
        assert!(claimed.claim(EntityKind::Particle, 5));
    }

    #[test]
    fn test_resolve_connections_errors() {
        let lookup = |id: u64| u32::try_from(id).ok().filter(|index| *index < 10);
        assert_eq!(resolve_connections(&[1, 2], 8, lookup).unwrap(), vec![1, 2]);
        assert_eq!(
            resolve_connections(&[1, 42], 8, lookup).unwrap_err(),
            ConvertError::lookup(EntityKind::Cell, 42)
        );
        assert_eq!(
            resolve_connections(&[1, 2, 3], 2, lookup).unwrap_err(),
            ConvertError::capacity(CapacityKind::Connections, 2)
        );
    }
}
