//! Integration test for cluster deletion and index compaction.

mod common;

use common::{cell_ids, cluster_ids, full_cell, test_arena, test_lane, token};
use plasmid_core::{read_snapshot, Arena, Converter};
use plasmid_shared::{ChangeSet, ClusterDescription, GraphModel, Vec2};

/// Cluster A (1) owns cells 1, 2, 3 with two tokens on cell 2; cluster B (2)
/// owns cells 4, 5.
fn a_then_b(tokens_on_b: bool) -> GraphModel {
    let a = ClusterDescription::new(1)
        .with_cell(full_cell(1, Vec2::new(0.0, 0.0), vec![2]))
        .with_cell(
            full_cell(2, Vec2::new(1.0, 0.0), vec![1, 3])
                .with_tokens(vec![token(1.0, 0x11), token(2.0, 0x22)]),
        )
        .with_cell(full_cell(3, Vec2::new(2.0, 0.0), vec![2]));

    let mut last = full_cell(5, Vec2::new(6.0, 0.0), vec![4]);
    if tokens_on_b {
        last = last.with_tokens(vec![token(3.0, 0x55)]);
    }
    let b = ClusterDescription::new(2)
        .with_cell(full_cell(4, Vec2::new(5.0, 0.0), vec![5]))
        .with_cell(last);

    let mut model = GraphModel::new();
    model.add_cluster(a).add_cluster(b);
    model
}

fn loaded(model: &GraphModel) -> Arena {
    let mut arena = test_arena();
    let mut lane = test_lane(11);
    Converter::new(&mut arena, &mut lane)
        .load_snapshot(model)
        .unwrap();
    arena
}

#[test]
fn test_delete_first_cluster_leaves_only_second() {
    let mut arena = loaded(&a_then_b(false));
    assert_eq!(arena.tokens.len(), 2);

    let mut changes = ChangeSet::new();
    changes.delete_cluster(1);
    let mut lane = test_lane(12);
    let stats = Converter::new(&mut arena, &mut lane)
        .apply_change_set(&changes)
        .unwrap();

    assert_eq!(stats.clusters_removed, 1);
    assert_eq!(stats.cells_removed, 3);
    assert_eq!(stats.tokens_removed, 2);

    assert_eq!(cluster_ids(&arena), vec![2]);
    assert_eq!(cell_ids(&arena), vec![4, 5]);
    let survivor = arena.clusters.as_slice()[0];
    assert_eq!(survivor.cell_start, 0);
    assert_eq!(survivor.num_cells, 2);
    assert_eq!(survivor.num_tokens, 0);
    assert_eq!(arena.tokens.len(), 0);
}

#[test]
fn test_delete_shifts_indices_by_removed_count() {
    let mut arena = loaded(&a_then_b(true));
    let before_cell_start = arena.clusters.as_slice()[1].cell_start;
    let before_connections: Vec<Vec<u32>> = arena.cells.as_slice()[3..]
        .iter()
        .map(|c| c.connection_indices().to_vec())
        .collect();
    let before_owner = arena.tokens.as_slice()[2].cell_index;

    let mut changes = ChangeSet::new();
    changes.delete_cluster(1);
    let mut lane = test_lane(13);
    Converter::new(&mut arena, &mut lane)
        .apply_change_set(&changes)
        .unwrap();

    let removed = 3;
    let survivor = arena.clusters.as_slice()[0];
    assert_eq!(survivor.cell_start, before_cell_start - removed);
    assert_eq!(survivor.token_start, 0);
    assert_eq!(survivor.num_tokens, 1);

    for (cell, before) in arena.cells.as_slice().iter().zip(&before_connections) {
        let shifted: Vec<u32> = before.iter().map(|i| i - removed).collect();
        assert_eq!(cell.connection_indices(), &shifted[..]);
    }

    let token = arena.tokens.as_slice()[0];
    assert_eq!(token.cell_index, before_owner - removed);
    assert_eq!(arena.cells.as_slice()[token.cell_index as usize].id, 5);
    assert_eq!(token.memory[0], 0x55);
}

#[test]
fn test_delete_last_cluster_keeps_first_untouched() {
    let model = a_then_b(true);
    let mut arena = loaded(&model);
    let first_cells = arena.cell_bytes()[..3 * std::mem::size_of::<plasmid_core::ArenaCell>()]
        .to_vec();

    let mut changes = ChangeSet::new();
    changes.delete_cluster(2);
    let mut lane = test_lane(14);
    Converter::new(&mut arena, &mut lane)
        .apply_change_set(&changes)
        .unwrap();

    assert_eq!(cluster_ids(&arena), vec![1]);
    assert_eq!(arena.cell_bytes(), &first_cells[..]);
    assert_eq!(arena.tokens.len(), 2);
}

#[test]
fn test_delete_then_add_in_one_change_set() {
    let mut arena = loaded(&a_then_b(true));

    let added = ClusterDescription::new(3)
        .with_cell(full_cell(6, Vec2::new(9.0, 9.0), vec![7]))
        .with_cell(full_cell(7, Vec2::new(9.0, 10.0), vec![6]).with_tokens(vec![token(4.0, 7)]));
    let mut changes = ChangeSet::new();
    changes.delete_cluster(1).add_cluster(&added);
    let mut lane = test_lane(15);
    Converter::new(&mut arena, &mut lane)
        .apply_change_set(&changes)
        .unwrap();

    assert_eq!(cluster_ids(&arena), vec![2, 3]);
    assert_eq!(cell_ids(&arena), vec![4, 5, 6, 7]);
    let third = arena.clusters.as_slice()[1];
    assert_eq!(third.cell_start, 2);
    assert_eq!(third.token_start, 1);
    assert_eq!(arena.cells.as_slice()[2].connection_indices(), &[3]);
    assert_eq!(arena.tokens.as_slice()[1].cell_index, 3);

    let read = read_snapshot(&arena);
    let cell_7 = &read.clusters[1].cells[1];
    assert_eq!(cell_7.tokens.as_ref().map(Vec::len), Some(1));
}

#[test]
fn test_delete_particles() {
    let mut model = a_then_b(false);
    for particle in common::particles(50, 4) {
        model.add_particle(particle);
    }
    let mut arena = loaded(&model);

    let mut changes = ChangeSet::new();
    changes.delete_particle(50).delete_particle(52);
    let mut lane = test_lane(16);
    let stats = Converter::new(&mut arena, &mut lane)
        .apply_change_set(&changes)
        .unwrap();

    assert_eq!(stats.particles_removed, 2);
    let ids: Vec<u64> = arena.particles.as_slice().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![51, 53]);
    assert_eq!(arena.clusters.len(), 2);
}
