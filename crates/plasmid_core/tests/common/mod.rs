//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use plasmid_core::{Arena, ArenaConfig, IdLane, IdTable};
use plasmid_shared::{
    CellDescription, CellFeatureDescription, CellFunction, CellMetadata, ClusterDescription,
    ClusterMetadata, GraphModel, ParticleDescription, ParticleMetadata, TokenDescription, Vec2,
};

/// Token memory size used by every fixture arena.
pub const TOKEN_BYTES: usize = 8;

/// Default capacities with a short token memory.
pub fn test_config() -> ArenaConfig {
    ArenaConfig {
        token_memory_size: TOKEN_BYTES,
        ..ArenaConfig::default()
    }
}

pub fn test_arena() -> Arena {
    Arena::new(test_config()).unwrap()
}

/// A lane over a private table.
pub fn test_lane(seed: u64) -> IdLane {
    let table: Arc<IdTable> = IdTable::with_seed(seed);
    table.lane().unwrap()
}

/// A token whose memory already has the arena's length.
pub fn token(energy: f32, fill: u8) -> TokenDescription {
    TokenDescription::new(energy, vec![fill; TOKEN_BYTES])
}

/// A cell with every optional field present, so it reads back equal.
pub fn full_cell(id: u64, pos: Vec2, connections: Vec<u64>) -> CellDescription {
    CellDescription::new(id)
        .with_pos(pos)
        .with_energy(100.0)
        .with_max_connections(4)
        .with_connecting_cells(connections)
        .with_token_branch_number(0)
        .with_token_blocked(false)
        .with_token_usages(0)
        .with_feature(CellFeatureDescription::new(CellFunction::Computer))
        .with_metadata(CellMetadata::default())
        .with_tokens(Vec::new())
}

fn full_cluster(id: u64, name: &str, cells: Vec<CellDescription>) -> ClusterDescription {
    let mut cluster = ClusterDescription::new(id)
        .with_vel(Vec2::new(0.5, -0.25))
        .with_angle(0.0)
        .with_angular_vel(0.0)
        .with_metadata(ClusterMetadata { name: name.into() });
    cluster.cells = cells;
    cluster.pos = Some(cluster.pos_from_cells());
    cluster
}

/// A `width` x `height` grid of cells with ids `first_cell_id..`, each
/// connected to its horizontal and vertical neighbors.
pub fn rectangular_cluster(
    id: u64,
    first_cell_id: u64,
    width: u64,
    height: u64,
    origin: Vec2,
) -> ClusterDescription {
    let cell_id = |x: u64, y: u64| first_cell_id + y * width + x;
    let mut cells = Vec::new();
    for y in 0..height {
        for x in 0..width {
            let mut connections = Vec::new();
            if x > 0 {
                connections.push(cell_id(x - 1, y));
            }
            if x + 1 < width {
                connections.push(cell_id(x + 1, y));
            }
            if y > 0 {
                connections.push(cell_id(x, y - 1));
            }
            if y + 1 < height {
                connections.push(cell_id(x, y + 1));
            }
            #[allow(clippy::cast_precision_loss)]
            let pos = origin + Vec2::new(x as f32, y as f32);
            cells.push(full_cell(cell_id(x, y), pos, connections));
        }
    }
    full_cluster(id, "rectangle", cells)
}

/// A chain of `len` cells along the x axis.
pub fn horizontal_cluster(id: u64, first_cell_id: u64, len: u64, origin: Vec2) -> ClusterDescription {
    let mut cluster = rectangular_cluster(id, first_cell_id, len, 1, origin);
    if let Some(metadata) = cluster.metadata.as_mut() {
        metadata.name = "chain".into();
    }
    cluster
}

/// One cell carrying a feature payload, metadata text and tokens.
pub fn populated_cluster(id: u64, cell_id: u64) -> ClusterDescription {
    let cell = full_cell(cell_id, Vec2::new(3.0, 4.0), Vec::new())
        .with_energy(42.5)
        .with_max_connections(6)
        .with_token_branch_number(2)
        .with_token_blocked(true)
        .with_token_usages(9)
        .with_feature(
            CellFeatureDescription::new(CellFunction::Constructor)
                .with_const_data(vec![1, 2, 3, 4, 5])
                .with_volatile_data(vec![9, 8]),
        )
        .with_metadata(CellMetadata {
            color: 3,
            name: "builder".into(),
            description: "copies itself".into(),
            source_code: "mov [1], 2".into(),
        })
        .with_tokens(vec![token(10.0, 0xA1), token(20.0, 0xB2)]);
    full_cluster(id, "populated", vec![cell])
}

/// `count` particles with ids `first_id..`.
pub fn particles(first_id: u64, count: u64) -> Vec<ParticleDescription> {
    (0..count)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let offset = i as f32;
            ParticleDescription::new(first_id + i)
                .with_pos(Vec2::new(offset, -offset))
                .with_vel(Vec2::new(0.1, 0.2))
                .with_energy(5.0 + offset)
                .with_metadata(ParticleMetadata { color: 1 })
        })
        .collect()
}

/// Two clusters and three particles.
pub fn world() -> GraphModel {
    let mut model = GraphModel::new();
    model
        .add_cluster(rectangular_cluster(100, 1, 3, 2, Vec2::new(10.0, 10.0)))
        .add_cluster(horizontal_cluster(200, 20, 4, Vec2::new(-5.0, 0.0)))
        .add_cluster(populated_cluster(300, 40));
    for particle in particles(1000, 3) {
        model.add_particle(particle);
    }
    model
}

/// Ids of the clusters in arena order.
pub fn cluster_ids(arena: &Arena) -> Vec<u64> {
    arena.clusters.as_slice().iter().map(|c| c.id).collect()
}

/// Ids of the cells in arena order.
pub fn cell_ids(arena: &Arena) -> Vec<u64> {
    arena.cells.as_slice().iter().map(|c| c.id).collect()
}
