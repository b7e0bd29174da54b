//! # Shared Arena Handle
//!
//! The driver-side lock around an arena.
//!
//! ```text
//! Compute step:  engine holds a read guard, kernels run on the arena
//! Edit step:     driver holds the write guard, a Converter mutates it
//! Display step:  any thread holds a read guard, read_snapshot builds a model
//! ```
//!
//! The converter itself never locks; this handle is how a multi-threaded
//! driver keeps the engine and the converter off the arena at the same time.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use plasmid_shared::GraphModel;

use crate::arena::Arena;
use crate::convert::{read_snapshot, Converter};
use crate::identity::IdentitySource;

/// A cloneable, lock-protected arena.
#[derive(Clone, Debug)]
pub struct SharedArena {
    inner: Arc<RwLock<Arena>>,
}

impl SharedArena {
    /// Wraps `arena`.
    #[must_use]
    pub fn new(arena: Arena) -> Self {
        Self {
            inner: Arc::new(RwLock::new(arena)),
        }
    }

    /// Shared access for the compute engine or readers.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, Arena> {
        self.inner.read()
    }

    /// Exclusive access.
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, Arena> {
        self.inner.write()
    }

    /// Runs `edit` with a converter over the exclusively locked arena.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// shared.edit(&mut lane, |converter| converter.apply_change_set(&changes))?;
    /// ```
    pub fn edit<R>(
        &self,
        ids: &mut dyn IdentitySource,
        edit: impl FnOnce(&mut Converter<'_>) -> R,
    ) -> R {
        let mut guard = self.inner.write();
        let mut converter = Converter::new(&mut guard, ids);
        edit(&mut converter)
    }

    /// Reads the arena into a model under a shared lock.
    #[must_use]
    pub fn snapshot(&self) -> GraphModel {
        read_snapshot(&self.inner.read())
    }
}
