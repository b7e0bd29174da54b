//! Partitions a change set into the inputs of each update phase.

use std::collections::{HashMap, HashSet};

use plasmid_shared::{
    CellChange, ChangeSet, ClusterChange, ClusterDescription, ParticleChange, ParticleDescription,
    Tracked,
};

/// What each phase of an incremental update has to do.
#[derive(Debug, Default)]
pub(crate) struct UpdatePlan<'c> {
    pub deleted_clusters: HashSet<u64>,
    pub deleted_particles: HashSet<u64>,
    pub modified_clusters: HashMap<u64, &'c ClusterChange>,
    pub modified_cells: HashMap<u64, &'c CellChange>,
    pub modified_particles: HashMap<u64, &'c ParticleChange>,
    pub added_clusters: Vec<ClusterDescription>,
    pub added_particles: Vec<ParticleDescription>,
    /// Cell entries tracked as added or deleted inside a modified cluster.
    pub ignored_cells: usize,
}

pub(crate) fn classify(changes: &ChangeSet) -> UpdatePlan<'_> {
    let mut plan = UpdatePlan::default();

    // Deletions first so a delta for a deleted entity is dropped.
    for entry in &changes.clusters {
        if let Tracked::Deleted(cluster) = entry {
            plan.deleted_clusters.insert(cluster.id);
        }
    }
    for entry in &changes.particles {
        if let Tracked::Deleted(particle) = entry {
            plan.deleted_particles.insert(particle.id);
        }
    }

    for entry in &changes.clusters {
        match entry {
            Tracked::Added(cluster) => plan.added_clusters.push(ClusterDescription::from(cluster)),
            Tracked::Modified(cluster) if cluster.id == 0 => {
                plan.added_clusters.push(ClusterDescription::from(cluster));
            }
            Tracked::Modified(cluster) if !plan.deleted_clusters.contains(&cluster.id) => {
                plan.modified_clusters.insert(cluster.id, cluster);
                for cell in &cluster.cells {
                    match cell {
                        Tracked::Modified(delta) if delta.id != 0 => {
                            plan.modified_cells.insert(delta.id, delta);
                        }
                        Tracked::Unchanged(_) => {}
                        _ => plan.ignored_cells += 1,
                    }
                }
            }
            _ => {}
        }
    }

    for entry in &changes.particles {
        match entry {
            Tracked::Added(particle) => {
                plan.added_particles.push(ParticleDescription::from(particle));
            }
            Tracked::Modified(particle) if particle.id == 0 => {
                plan.added_particles.push(ParticleDescription::from(particle));
            }
            Tracked::Modified(particle) if !plan.deleted_particles.contains(&particle.id) => {
                plan.modified_particles.insert(particle.id, particle);
            }
            _ => {}
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use plasmid_shared::CellDescription;

    #[test]
    fn test_classify_partitions_entries() {
        let mut changes = ChangeSet::new();
        changes
            .add_cluster(&ClusterDescription::new(0).with_cell(CellDescription::new(0)))
            .delete_cluster(5)
            .modify_cluster(ClusterChange::new(6).with_modified_cell(CellChange {
                energy: Some(2.0),
                ..CellChange::new(61)
            }))
            .delete_particle(9)
            .modify_particle(ParticleChange::new(0));

        let plan = classify(&changes);
        assert_eq!(plan.added_clusters.len(), 1);
        assert!(plan.deleted_clusters.contains(&5));
        assert!(plan.modified_clusters.contains_key(&6));
        assert_eq!(plan.modified_cells[&61].energy, Some(2.0));
        assert!(plan.deleted_particles.contains(&9));
        assert_eq!(plan.added_particles.len(), 1);
        assert_eq!(plan.ignored_cells, 0);
    }

    #[test]
    fn test_cell_add_delete_inside_modified_cluster_is_ignored() {
        let mut cluster = ClusterChange::new(3);
        cluster.cells.push(Tracked::Added(CellChange::new(0)));
        cluster.cells.push(Tracked::Deleted(CellChange::new(31)));
        cluster.cells.push(Tracked::Unchanged(CellChange::new(32)));

        let mut changes = ChangeSet::new();
        changes.modify_cluster(cluster);

        let plan = classify(&changes);
        assert_eq!(plan.ignored_cells, 2);
        assert!(plan.modified_cells.is_empty());
    }

    #[test]
    fn test_delta_for_deleted_entity_is_dropped() {
        let mut changes = ChangeSet::new();
        changes
            .modify_cluster(ClusterChange::new(4).with_modified_cell(CellChange::new(41)))
            .delete_cluster(4);

        let plan = classify(&changes);
        assert!(plan.modified_clusters.is_empty());
        assert!(plan.modified_cells.is_empty());
    }
}
