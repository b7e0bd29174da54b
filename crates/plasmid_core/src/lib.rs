//! # PLASMID Core
//!
//! The marshalling layer between the graph-shaped world description and the
//! fixed-capacity arena a compute engine runs on.
//!
//! ## Architecture Rules
//!
//! 1. **Capacity is a hard ceiling** - the arena is allocated once and every
//!    append is checked before it writes
//! 2. **Ids are stable, indices are not** - indices are recomputed by every
//!    conversion and never kept across calls
//! 3. **All or nothing** - a failed conversion leaves the arena exactly as it
//!    was before the call
//!
//! ## Example
//!
//! ```rust,ignore
//! use plasmid_core::{Arena, ArenaConfig, Converter, IdTable};
//!
//! let mut arena = Arena::new(ArenaConfig::from_toml(&config_text)?)?;
//! let table = IdTable::with_seed(seed);
//! let mut ids = table.lane()?;
//!
//! let mut converter = Converter::new(&mut arena, &mut ids);
//! converter.load_snapshot(&model)?;
//! converter.apply_change_set(&changes)?;
//! let view = converter.read_snapshot();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod arena;
pub mod config;
pub mod convert;
pub mod error;
pub mod identity;
pub mod sync;

pub use arena::{
    Arena, ArenaCell, ArenaCheckpoint, ArenaCluster, ArenaHeader, ArenaParticle, ArenaToken,
    CellMetadataSlot, FixedArray, StringPool, StringRef,
};
pub use config::ArenaConfig;
pub use convert::{read_snapshot, ConvertStats, Converter, IndexRemap};
pub use error::{CapacityKind, ConvertError, ConvertResult, EntityKind};
pub use identity::{IdLane, IdTable, IdentitySource};
pub use sync::SharedArena;
