//! # String Pool
//!
//! A bump allocator for metadata text.
//!
//! Strings are appended at the write cursor and never freed individually.
//! Offsets only grow within a pool's lifetime; the pool is reclaimed all at
//! once by [`StringPool::reset`].

use crate::arena::layout::StringRef;
use crate::error::{CapacityKind, ConvertError, ConvertResult};

/// An append-only byte pool.
///
/// # Example
///
/// ```rust,ignore
/// let mut pool = StringPool::new(1024);
/// let name = pool.intern("scanner")?;
/// assert_eq!(pool.resolve(name), Some("scanner"));
/// ```
pub struct StringPool {
    /// Backing bytes.
    storage: Box<[u8]>,
    /// Write cursor.
    cursor: usize,
}

impl StringPool {
    /// Creates a zeroed pool of `capacity` bytes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            storage: vec![0u8; capacity].into_boxed_slice(),
            cursor: 0,
        }
    }

    /// Returns the total capacity in bytes.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Returns the used space in bytes.
    #[inline]
    #[must_use]
    pub const fn used(&self) -> usize {
        self.cursor
    }

    /// Returns the remaining free space in bytes.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.capacity() - self.cursor
    }

    /// Appends `text` at the cursor.
    ///
    /// The empty string is never stored and yields [`StringRef::EMPTY`].
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::CapacityExceeded`] if the bytes do not fit.
    /// The cursor does not move in that case.
    pub fn intern(&mut self, text: &str) -> ConvertResult<StringRef> {
        if text.is_empty() {
            return Ok(StringRef::EMPTY);
        }
        let bytes = text.as_bytes();
        let end = self.cursor + bytes.len();
        if end > self.storage.len() {
            return Err(ConvertError::capacity(
                CapacityKind::StringPool,
                self.storage.len(),
            ));
        }
        let (Ok(offset), Ok(len)) = (u32::try_from(self.cursor), u32::try_from(bytes.len())) else {
            return Err(ConvertError::capacity(
                CapacityKind::StringPool,
                self.storage.len(),
            ));
        };

        self.storage[self.cursor..end].copy_from_slice(bytes);
        self.cursor = end;
        Ok(StringRef { offset, len })
    }

    /// Looks up an interned string.
    ///
    /// # Returns
    ///
    /// `None` if the reference points past the cursor or the bytes are not
    /// valid UTF-8.
    #[must_use]
    pub fn resolve(&self, reference: StringRef) -> Option<&str> {
        let start = reference.offset as usize;
        let end = reference.end() as usize;
        if end > self.cursor {
            return None;
        }
        std::str::from_utf8(&self.storage[start..end]).ok()
    }

    /// Used bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.storage[..self.cursor]
    }

    /// Moves the cursor back to `cursor`, zeroing the released bytes.
    pub fn rewind(&mut self, cursor: usize) {
        if cursor >= self.cursor {
            return;
        }
        self.storage[cursor..self.cursor].fill(0);
        self.cursor = cursor;
    }

    /// Replaces the used bytes with `bytes`, zeroing anything past them.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::CapacityExceeded`] if `bytes` does not fit.
    pub fn replace_all(&mut self, bytes: &[u8]) -> ConvertResult<()> {
        if bytes.len() > self.storage.len() {
            return Err(ConvertError::capacity(
                CapacityKind::StringPool,
                self.storage.len(),
            ));
        }
        let old = self.cursor;
        self.storage[..bytes.len()].copy_from_slice(bytes);
        self.cursor = bytes.len();
        if old > self.cursor {
            self.storage[self.cursor..old].fill(0);
        }
        Ok(())
    }

    /// Releases every string at once.
    ///
    /// Previously returned references become invalid and must not be used.
    #[inline]
    pub fn reset(&mut self) {
        self.rewind(0);
    }
}

impl std::fmt::Debug for StringPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StringPool")
            .field("used", &self.cursor)
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_and_resolve() {
        let mut pool = StringPool::new(64);
        let a = pool.intern("alpha").unwrap();
        let b = pool.intern("beta").unwrap();

        assert_eq!(a, StringRef { offset: 0, len: 5 });
        assert_eq!(b, StringRef { offset: 5, len: 4 });
        assert_eq!(pool.resolve(a), Some("alpha"));
        assert_eq!(pool.resolve(b), Some("beta"));
        assert_eq!(pool.used(), 9);
    }

    #[test]
    fn test_empty_string_takes_no_space() {
        let mut pool = StringPool::new(4);
        assert_eq!(pool.intern("").unwrap(), StringRef::EMPTY);
        assert_eq!(pool.used(), 0);
    }

    #[test]
    fn test_overflow_leaves_cursor() {
        let mut pool = StringPool::new(6);
        pool.intern("abcd").unwrap();

        let err = pool.intern("xyz").unwrap_err();
        assert_eq!(err, ConvertError::capacity(CapacityKind::StringPool, 6));
        assert_eq!(pool.used(), 4);
        assert_eq!(pool.remaining(), 2);
    }

    #[test]
    fn test_rewind_invalidates_tail() {
        let mut pool = StringPool::new(16);
        let keep = pool.intern("keep").unwrap();
        let drop = pool.intern("drop").unwrap();

        pool.rewind(4);
        assert_eq!(pool.resolve(keep), Some("keep"));
        assert_eq!(pool.resolve(drop), None);
        assert_eq!(pool.storage[4..8], [0, 0, 0, 0]);

        pool.reset();
        assert_eq!(pool.used(), 0);
    }
}
