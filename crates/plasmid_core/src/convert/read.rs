//! # Arena → GraphModel Read
//!
//! A single pass over clusters and their cells, then one scan of the token
//! array. Connections are translated from indices back to neighbor ids, and
//! each token finds its owner through an index → (cluster, cell) table built
//! during the cell pass. The arena is never mutated.

use plasmid_shared::{
    CellDescription, CellFeatureDescription, CellFunction, CellMetadata, ClusterDescription,
    ClusterMetadata, GraphModel, ParticleDescription, ParticleMetadata, TokenDescription,
};

use crate::arena::{Arena, ArenaCell, StringPool, StringRef};

/// Reads the whole arena into a fresh model.
///
/// Every optional field of the result is present. Token data is always
/// `token_memory_size` bytes long.
#[must_use]
pub fn read_snapshot(arena: &Arena) -> GraphModel {
    let cells = arena.cells.as_slice();
    let strings = &arena.strings;
    let mut owner: Vec<Option<(usize, usize)>> = vec![None; cells.len()];
    let mut model = GraphModel::new();

    for (cluster_index, cluster) in arena.clusters.as_slice().iter().enumerate() {
        let mut desc = ClusterDescription::new(cluster.id)
            .with_pos(cluster.pos)
            .with_vel(cluster.vel)
            .with_angle(cluster.angle)
            .with_angular_vel(cluster.angular_vel)
            .with_metadata(ClusterMetadata {
                name: decode(strings, cluster.name),
            });

        for cell_index in cluster.cell_range() {
            let Some(cell) = cells.get(cell_index) else {
                break;
            };
            owner[cell_index] = Some((cluster_index, desc.cells.len()));
            desc.cells.push(read_cell(cell, cells, strings));
        }
        model.add_cluster(desc);
    }

    for particle in arena.particles.as_slice() {
        model.add_particle(
            ParticleDescription::new(particle.id)
                .with_pos(particle.pos)
                .with_vel(particle.vel)
                .with_energy(particle.energy)
                .with_metadata(ParticleMetadata {
                    color: particle.color,
                }),
        );
    }

    let memory_size = arena.config().token_memory_size;
    for token in arena.tokens.as_slice() {
        let Some(Some((cluster_index, cell_offset))) = owner.get(token.cell_index as usize) else {
            continue;
        };
        model.clusters[*cluster_index].cells[*cell_offset].add_token(TokenDescription::new(
            token.energy,
            &token.memory[..memory_size],
        ));
    }

    model
}

fn read_cell(cell: &ArenaCell, cells: &[ArenaCell], strings: &StringPool) -> CellDescription {
    let connecting_cells: Vec<u64> = cell
        .connection_indices()
        .iter()
        .filter_map(|index| cells.get(*index as usize).map(|neighbor| neighbor.id))
        .collect();

    let function = u8::try_from(cell.function_type)
        .ok()
        .and_then(CellFunction::from_u8)
        .unwrap_or_default();
    let feature = CellFeatureDescription::new(function)
        .with_const_data(cell.static_bytes())
        .with_volatile_data(cell.mutable_bytes());

    let slot = &cell.metadata;
    let metadata = CellMetadata {
        color: slot.color,
        name: decode(strings, slot.name),
        description: decode(strings, slot.description),
        source_code: decode(strings, slot.source_code),
    };

    CellDescription::new(cell.id)
        .with_pos(cell.pos)
        .with_energy(cell.energy)
        .with_max_connections(cell.max_connections)
        .with_connecting_cells(connecting_cells)
        .with_token_branch_number(cell.branch_number)
        .with_token_blocked(cell.token_blocked != 0)
        .with_token_usages(cell.token_usages)
        .with_feature(feature)
        .with_metadata(metadata)
        .with_tokens(Vec::new())
}

/// Decodes a pool string; only references with a non-zero length are read.
fn decode(strings: &StringPool, reference: StringRef) -> String {
    if reference.is_empty() {
        return String::new();
    }
    strings.resolve(reference).unwrap_or_default().to_owned()
}
