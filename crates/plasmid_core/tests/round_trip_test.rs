//! Integration test for snapshot load and read back.

mod common;

use std::collections::HashSet;

use common::{test_arena, test_lane, world};
use plasmid_core::{read_snapshot, Converter};
use plasmid_shared::{CellDescription, ClusterDescription, GraphModel, ParticleDescription, Vec2};

#[test]
fn test_round_trip_fixture_world() {
    let mut arena = test_arena();
    let mut lane = test_lane(1);
    let model = world();

    let stats = Converter::new(&mut arena, &mut lane)
        .load_snapshot(&model)
        .unwrap();
    assert_eq!(stats.clusters_added, 3);
    assert_eq!(stats.cells_added, model.cell_count());
    assert_eq!(stats.tokens_added, 2);
    assert_eq!(stats.particles_added, 3);

    let read = read_snapshot(&arena);
    assert_eq!(read.sorted_by_id(), model.sorted_by_id());
}

#[test]
fn test_round_trip_is_order_independent() {
    let mut arena = test_arena();
    let mut lane = test_lane(2);
    let mut model = world();
    model.clusters.reverse();
    model.particles.reverse();

    Converter::new(&mut arena, &mut lane)
        .load_snapshot(&model)
        .unwrap();
    assert_eq!(read_snapshot(&arena).sorted_by_id(), world().sorted_by_id());
}

#[test]
fn test_load_replaces_previous_world() {
    let mut arena = test_arena();
    let mut lane = test_lane(3);
    let mut converter = Converter::new(&mut arena, &mut lane);

    converter.load_snapshot(&world()).unwrap();
    let mut small = GraphModel::new();
    small.add_particle(ParticleDescription::new(7).with_energy(1.0));
    converter.load_snapshot(&small).unwrap();

    let header = converter.arena().header();
    assert_eq!(header.num_clusters, 0);
    assert_eq!(header.num_cells, 0);
    assert_eq!(header.num_tokens, 0);
    assert_eq!(header.num_particles, 1);
    assert_eq!(header.string_bytes, 0);
}

#[test]
fn test_append_keeps_existing_entities() {
    let mut arena = test_arena();
    let mut lane = test_lane(4);
    let mut converter = Converter::new(&mut arena, &mut lane);
    converter.load_snapshot(&world()).unwrap();

    let mut extra = GraphModel::new();
    extra.add_cluster(common::horizontal_cluster(900, 901, 2, Vec2::ZERO));
    converter.append(&extra).unwrap();

    let read = converter.read_snapshot();
    assert_eq!(read.clusters.len(), 4);
    let appended = read.clusters.iter().find(|c| c.id == 900).unwrap();
    assert_eq!(appended.cells[0].connecting_cells, Some(vec![902]));
    assert_eq!(appended.cells[1].connecting_cells, Some(vec![901]));
}

#[test]
fn test_unassigned_ids_are_filled() {
    let mut arena = test_arena();
    let mut lane = test_lane(5);

    let mut model = GraphModel::new();
    model
        .add_cluster(
            ClusterDescription::new(0)
                .with_cell(CellDescription::new(0).with_pos(Vec2::new(1.0, 0.0)))
                .with_cell(CellDescription::new(0).with_pos(Vec2::new(3.0, 0.0))),
        )
        .add_particle(ParticleDescription::new(0))
        .add_particle(ParticleDescription::new(0));
    Converter::new(&mut arena, &mut lane)
        .load_snapshot(&model)
        .unwrap();

    let read = read_snapshot(&arena);
    let mut ids = HashSet::new();
    ids.insert(read.clusters[0].id);
    for cell in &read.clusters[0].cells {
        ids.insert(cell.id);
    }
    for particle in &read.particles {
        ids.insert(particle.id);
    }
    assert_eq!(ids.len(), 5);
    assert!(!ids.contains(&0));
}

#[test]
fn test_absent_fields_take_defaults() {
    let mut arena = test_arena();
    let mut lane = test_lane(6);

    let mut model = GraphModel::new();
    model.add_cluster(
        ClusterDescription::new(1)
            .with_cell(
                CellDescription::new(10)
                    .with_pos(Vec2::new(2.0, 2.0))
                    .with_connecting_cells(vec![11]),
            )
            .with_cell(
                CellDescription::new(11)
                    .with_pos(Vec2::new(4.0, 6.0))
                    .with_connecting_cells(vec![10]),
            ),
    );
    Converter::new(&mut arena, &mut lane)
        .load_snapshot(&model)
        .unwrap();

    let read = read_snapshot(&arena);
    let cluster = &read.clusters[0];
    assert_eq!(cluster.pos, Some(Vec2::new(3.0, 4.0)));
    assert_eq!(cluster.vel, Some(Vec2::ZERO));
    assert_eq!(cluster.angle, Some(0.0));
    assert_eq!(cluster.metadata.as_ref().map(|m| m.name.as_str()), Some(""));

    let cell = &cluster.cells[0];
    assert_eq!(cell.energy, Some(0.0));
    assert_eq!(cell.max_connections, Some(1));
    assert_eq!(cell.token_blocked, Some(false));
    assert_eq!(cell.tokens, Some(Vec::new()));
}

#[test]
fn test_empty_cluster_is_kept() {
    let mut arena = test_arena();
    let mut lane = test_lane(7);

    let mut model = GraphModel::new();
    model.add_cluster(ClusterDescription::new(77));
    Converter::new(&mut arena, &mut lane)
        .load_snapshot(&model)
        .unwrap();

    let read = read_snapshot(&arena);
    assert_eq!(read.clusters.len(), 1);
    assert!(read.clusters[0].cells.is_empty());
    assert_eq!(read.clusters[0].pos, Some(Vec2::ZERO));
}
