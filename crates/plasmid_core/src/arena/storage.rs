//! # Fixed Element Storage
//!
//! Pre-allocated, dense element storage with a live-count cursor.
//!
//! The storage uses a dense array strategy:
//! - All slots are allocated and zeroed at creation, never reallocated
//! - Elements `[0, len)` are live, every slot at or past `len` is zeroed
//! - Appends check capacity before writing

use bytemuck::Pod;

use crate::error::{CapacityKind, ConvertError, ConvertResult};

/// A fixed-capacity array of Pod elements.
///
/// # Example
///
/// ```rust,ignore
/// let mut particles: FixedArray<ArenaParticle> = FixedArray::new(1024, CapacityKind::Particles);
/// let index = particles.push(particle)?;
/// ```
pub struct FixedArray<T: Pod> {
    /// Backing slots.
    data: Box<[T]>,
    /// Live element count.
    len: usize,
    /// Reported in capacity errors.
    kind: CapacityKind,
}

impl<T: Pod> FixedArray<T> {
    /// Creates zeroed storage for `capacity` elements.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of live elements
    /// * `kind` - Region name used in capacity errors
    #[must_use]
    pub fn new(capacity: usize, kind: CapacityKind) -> Self {
        Self {
            data: vec![T::zeroed(); capacity].into_boxed_slice(),
            len: 0,
            kind,
        }
    }

    /// Fixed capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Live element count.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// True if no element is live.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Free slots.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.capacity() - self.len
    }

    /// Appends an element, returning its index.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::CapacityExceeded`] if the array is full. No
    /// slot is touched in that case.
    pub fn push(&mut self, item: T) -> ConvertResult<usize> {
        if self.len >= self.data.len() {
            return Err(ConvertError::capacity(self.kind, self.data.len()));
        }
        let index = self.len;
        self.data[index] = item;
        self.len += 1;
        Ok(index)
    }

    /// Gets a live element.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    /// Gets a live element mutably.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(index)
    }

    /// Live elements.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data[..self.len]
    }

    /// Live elements, mutably.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data[..self.len]
    }

    /// Live elements as raw bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.as_slice())
    }

    /// Keeps only the elements for which `keep` returns true.
    ///
    /// Survivors shift left in order; vacated slots are zeroed. `keep`
    /// receives each element's index before the shift.
    ///
    /// # Returns
    ///
    /// Number of removed elements.
    pub fn retain_indexed<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(usize, &mut T) -> bool,
    {
        let mut write = 0;
        for read in 0..self.len {
            if keep(read, &mut self.data[read]) {
                if write != read {
                    self.data[write] = self.data[read];
                }
                write += 1;
            }
        }
        let removed = self.len - write;
        self.truncate(write);
        removed
    }

    /// Shortens to `len` live elements, zeroing the rest.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        for slot in &mut self.data[len..self.len] {
            *slot = T::zeroed();
        }
        self.len = len;
    }

    /// Drops every live element.
    ///
    /// This is a **zero-allocation** operation.
    #[inline]
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Replaces the live elements with `items`.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::CapacityExceeded`] if `items` does not fit.
    /// The array is unchanged in that case.
    pub fn replace_all(&mut self, items: &[T]) -> ConvertResult<()> {
        if items.len() > self.data.len() {
            return Err(ConvertError::capacity(self.kind, self.data.len()));
        }
        let old_len = self.len;
        self.data[..items.len()].copy_from_slice(items);
        self.len = items.len();
        if old_len > self.len {
            for slot in &mut self.data[self.len..old_len] {
                *slot = T::zeroed();
            }
        }
        Ok(())
    }
}

impl<T: Pod> std::fmt::Debug for FixedArray<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedArray")
            .field("kind", &self.kind)
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .finish()
    }
}
