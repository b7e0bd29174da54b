//! # Arena
//!
//! Fixed-capacity flat storage mirroring the world for the compute engine.
//!
//! ## Design Philosophy
//!
//! All memory is allocated once when the arena is created:
//! - No reallocation, capacity is a hard ceiling
//! - Every append is capacity-checked before it writes
//! - Cells and tokens of one cluster occupy contiguous index ranges
//!
//! ```text
//! ┌────────┬──────────┬─────────┬───────────┬────────┬─────────────┐
//! │ header │ clusters │  cells  │ particles │ tokens │ string pool │
//! └────────┴──────────┴─────────┴───────────┴────────┴─────────────┘
//! ```

mod checkpoint;
pub mod layout;
mod pool;
mod storage;

pub use checkpoint::ArenaCheckpoint;
pub use layout::{
    ArenaCell, ArenaCluster, ArenaHeader, ArenaParticle, ArenaToken, CellMetadataSlot, StringRef,
};
pub use pool::StringPool;
pub use storage::FixedArray;

use crate::config::ArenaConfig;
use crate::error::{CapacityKind, ConvertResult};

/// The world as the compute engine sees it.
///
/// # Example
///
/// ```rust,ignore
/// let mut arena = Arena::new(ArenaConfig::default())?;
/// Converter::new(&mut arena, &mut ids).load_snapshot(&model)?;
/// upload(arena.header(), arena.cell_bytes());
/// ```
#[derive(Debug)]
pub struct Arena {
    config: ArenaConfig,
    /// Cluster array.
    pub clusters: FixedArray<ArenaCluster>,
    /// Cell array.
    pub cells: FixedArray<ArenaCell>,
    /// Particle array.
    pub particles: FixedArray<ArenaParticle>,
    /// Token array.
    pub tokens: FixedArray<ArenaToken>,
    /// Metadata string pool.
    pub strings: StringPool,
}

impl Arena {
    /// Allocates an arena with the capacities in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConvertError::InvalidConfig`] if `config` fails
    /// validation.
    pub fn new(config: ArenaConfig) -> ConvertResult<Self> {
        config.validate()?;
        Ok(Self {
            clusters: FixedArray::new(config.max_clusters, CapacityKind::Clusters),
            cells: FixedArray::new(config.max_cells, CapacityKind::Cells),
            particles: FixedArray::new(config.max_particles, CapacityKind::Particles),
            tokens: FixedArray::new(config.max_tokens, CapacityKind::Tokens),
            strings: StringPool::new(config.string_pool_bytes),
            config,
        })
    }

    /// Capacities this arena was created with.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// The five live counts.
    // Counts are bounded by capacities validated to fit in u32.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn header(&self) -> ArenaHeader {
        ArenaHeader {
            num_clusters: self.clusters.len() as u32,
            num_cells: self.cells.len() as u32,
            num_particles: self.particles.len() as u32,
            num_tokens: self.tokens.len() as u32,
            string_bytes: self.strings.used() as u32,
        }
    }

    /// True if nothing is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
            && self.cells.is_empty()
            && self.particles.is_empty()
            && self.tokens.is_empty()
            && self.strings.used() == 0
    }

    /// Resets every live count and the pool cursor.
    pub fn clear(&mut self) {
        self.clusters.clear();
        self.cells.clear();
        self.particles.clear();
        self.tokens.clear();
        self.strings.reset();
    }

    /// Copies the live state for rollback.
    #[must_use]
    pub fn checkpoint(&self) -> ArenaCheckpoint {
        ArenaCheckpoint {
            clusters: self.clusters.as_slice().to_vec(),
            cells: self.cells.as_slice().to_vec(),
            particles: self.particles.as_slice().to_vec(),
            tokens: self.tokens.as_slice().to_vec(),
            strings: self.strings.as_bytes().to_vec(),
        }
    }

    /// Restores the state captured by [`Arena::checkpoint`].
    ///
    /// # Errors
    ///
    /// Only fails if `checkpoint` came from an arena with larger capacities.
    pub fn restore(&mut self, checkpoint: &ArenaCheckpoint) -> ConvertResult<()> {
        self.clusters.replace_all(&checkpoint.clusters)?;
        self.cells.replace_all(&checkpoint.cells)?;
        self.particles.replace_all(&checkpoint.particles)?;
        self.tokens.replace_all(&checkpoint.tokens)?;
        self.strings.replace_all(&checkpoint.strings)?;
        Ok(())
    }

    /// Header as raw bytes.
    #[must_use]
    pub fn header_bytes(&self) -> [u8; 20] {
        bytemuck::cast(self.header())
    }

    /// Live clusters as raw bytes.
    #[inline]
    #[must_use]
    pub fn cluster_bytes(&self) -> &[u8] {
        self.clusters.as_bytes()
    }

    /// Live cells as raw bytes.
    #[inline]
    #[must_use]
    pub fn cell_bytes(&self) -> &[u8] {
        self.cells.as_bytes()
    }

    /// Live particles as raw bytes.
    #[inline]
    #[must_use]
    pub fn particle_bytes(&self) -> &[u8] {
        self.particles.as_bytes()
    }

    /// Live tokens as raw bytes.
    #[inline]
    #[must_use]
    pub fn token_bytes(&self) -> &[u8] {
        self.tokens.as_bytes()
    }

    /// Used pool bytes.
    #[inline]
    #[must_use]
    pub fn string_bytes(&self) -> &[u8] {
        self.strings.as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;

    fn small_config() -> ArenaConfig {
        ArenaConfig {
            max_clusters: 2,
            max_cells: 4,
            max_particles: 2,
            max_tokens: 2,
            string_pool_bytes: 32,
            ..ArenaConfig::default()
        }
    }

    #[test]
    fn test_arena_creation() {
        let arena = Arena::new(small_config()).unwrap();
        assert_eq!(arena.cells.capacity(), 4);
        assert_eq!(arena.strings.capacity(), 32);
        assert!(arena.is_empty());
        assert_eq!(arena.header(), ArenaHeader::default());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ArenaConfig {
            max_tokens: 0,
            ..small_config()
        };
        assert!(Arena::new(config).is_err());
    }

    #[test]
    fn test_checkpoint_restore_is_exact() {
        let mut arena = Arena::new(small_config()).unwrap();
        let mut particle = ArenaParticle::zeroed();
        particle.id = 1;
        arena.particles.push(particle).unwrap();
        arena.strings.intern("first").unwrap();

        let checkpoint = arena.checkpoint();
        let before = (arena.particle_bytes().to_vec(), arena.header());

        particle.id = 2;
        arena.particles.push(particle).unwrap();
        arena.strings.intern("second").unwrap();
        arena.particles.as_mut_slice()[0].energy = 5.0;

        arena.restore(&checkpoint).unwrap();
        assert_eq!((arena.particle_bytes().to_vec(), arena.header()), before);
        assert_eq!(arena.string_bytes(), b"first");
    }

    #[test]
    fn test_clear_resets_counts() {
        let mut arena = Arena::new(small_config()).unwrap();
        arena.clusters.push(ArenaCluster::zeroed()).unwrap();
        arena.strings.intern("x").unwrap();

        arena.clear();
        assert!(arena.is_empty());
        assert!(arena.header_bytes().iter().all(|b| *b == 0));
    }
}
