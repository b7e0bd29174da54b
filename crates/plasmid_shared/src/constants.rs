//! # Layout Ceilings
//!
//! Hard upper bounds baked into the arena element layout.
//!
//! **CRITICAL:** These values size fixed arrays inside the Pod structs that
//! the compute engine reads. Changing one changes the device layout and
//! requires rebuilding the engine kernels. Runtime configuration may choose
//! smaller limits, never larger ones.

/// Maximum number of connection slots stored per cell.
pub const MAX_CELL_CONNECTIONS: usize = 8;

/// Maximum length of a cell feature's constant byte block.
pub const MAX_CELL_STATIC_BYTES: usize = 48;

/// Maximum length of a cell feature's mutable byte block.
pub const MAX_CELL_MUTABLE_BYTES: usize = 16;

/// Maximum length of a token's memory buffer.
pub const MAX_TOKEN_MEMORY: usize = 256;
