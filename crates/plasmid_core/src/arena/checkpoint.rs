//! # Arena Checkpoints
//!
//! A copy of every live prefix and the used pool bytes, taken before a mutating
//! conversion and restored if it fails.

use crate::arena::layout::{ArenaCell, ArenaCluster, ArenaParticle, ArenaToken};

/// Snapshot of arena state for transactional rollback.
///
/// Slots past each live count are always zeroed, so restoring the live
/// prefixes reproduces the arena bit for bit.
#[derive(Clone, Debug)]
pub struct ArenaCheckpoint {
    pub(crate) clusters: Vec<ArenaCluster>,
    pub(crate) cells: Vec<ArenaCell>,
    pub(crate) particles: Vec<ArenaParticle>,
    pub(crate) tokens: Vec<ArenaToken>,
    pub(crate) strings: Vec<u8>,
}
