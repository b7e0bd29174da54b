//! # Identity Source
//!
//! Globally unique 64-bit entity ids without a mutex.
//!
//! ## Layout
//!
//! ```text
//!  63            48 47                                   0
//! ┌────────────────┬──────────────────────────────────────┐
//! │  lane prefix   │            running counter           │
//! └────────────────┴──────────────────────────────────────┘
//! ```
//!
//! An [`IdTable`] holds a seeded, pre-shuffled permutation of every
//! non-zero 16-bit prefix. Each worker thread draws an [`IdLane`] from the
//! table (one atomic increment) and then counts locally. Two lanes never
//! share a prefix, so concurrent callers never observe duplicate ids, and
//! no id is ever zero.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{ConvertError, ConvertResult};

/// Supplies fresh, never-zero, never-reused entity ids.
pub trait IdentitySource {
    /// Returns the next id.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::IdentityExhausted`] if no id is left.
    fn next_id(&mut self) -> ConvertResult<u64>;
}

/// Bits reserved for the running counter.
const COUNTER_BITS: u32 = 48;

/// Largest counter value of one lane.
const COUNTER_MAX: u64 = (1 << COUNTER_BITS) - 1;

/// Shared table of lane prefixes.
///
/// # Thread Safety
///
/// `lane` may be called from any number of threads at once; the cursor is
/// advanced atomically.
#[derive(Debug)]
pub struct IdTable {
    /// Shuffled prefixes, each used at most once.
    prefixes: Box<[u16]>,
    /// Next unused entry in `prefixes`.
    cursor: AtomicUsize,
}

impl IdTable {
    /// Creates a table of every non-zero prefix, shuffled by `seed`.
    #[must_use]
    pub fn with_seed(seed: u64) -> Arc<Self> {
        Self::with_lanes(seed, u16::MAX)
    }

    /// Creates a table holding only `lanes` prefixes.
    ///
    /// # Arguments
    ///
    /// * `seed` - Shuffle seed
    /// * `lanes` - Number of prefixes drawn from the shuffled permutation
    #[must_use]
    pub fn with_lanes(seed: u64, lanes: u16) -> Arc<Self> {
        let mut prefixes: Vec<u16> = (1..=u16::MAX).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        prefixes.shuffle(&mut rng);
        prefixes.truncate(usize::from(lanes));

        Arc::new(Self {
            prefixes: prefixes.into_boxed_slice(),
            cursor: AtomicUsize::new(0),
        })
    }

    /// Prefixes not yet handed out.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.prefixes
            .len()
            .saturating_sub(self.cursor.load(Ordering::Relaxed))
    }

    /// Claims the next unused prefix.
    fn claim(&self) -> ConvertResult<u64> {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.prefixes
            .get(index)
            .map(|prefix| u64::from(*prefix) << COUNTER_BITS)
            .ok_or(ConvertError::IdentityExhausted)
    }

    /// Opens a new lane for one worker.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::IdentityExhausted`] once every prefix is taken.
    pub fn lane(self: &Arc<Self>) -> ConvertResult<IdLane> {
        Ok(IdLane {
            prefix: self.claim()?,
            counter: 0,
            table: Arc::clone(self),
        })
    }
}

/// A per-worker id counter.
///
/// Not shared between threads; open one lane per worker.
#[derive(Debug)]
pub struct IdLane {
    table: Arc<IdTable>,
    /// Prefix already shifted into the high bits.
    prefix: u64,
    /// Last counter value handed out.
    counter: u64,
}

impl IdLane {
    /// Prefix of this lane, unshifted.
    #[inline]
    #[must_use]
    pub const fn prefix(&self) -> u64 {
        self.prefix >> COUNTER_BITS
    }
}

impl IdentitySource for IdLane {
    fn next_id(&mut self) -> ConvertResult<u64> {
        if self.counter == COUNTER_MAX {
            self.prefix = self.table.claim()?;
            self.counter = 0;
        }
        self.counter += 1;
        Ok(self.prefix | self.counter)
    }
}
