//! # Arena Configuration
//!
//! Capacity constants supplied once when the arena is created.
//!
//! ```toml
//! max_clusters = 1000
//! max_cells = 20000
//! string_pool_bytes = 1048576
//! ```
//!
//! Absent keys take their defaults. Per-cell byte limits may be lowered
//! below the compile-time ceilings of the arena layout but never raised.

use serde::{Deserialize, Serialize};

use plasmid_shared::{
    MAX_CELL_CONNECTIONS, MAX_CELL_MUTABLE_BYTES, MAX_CELL_STATIC_BYTES, MAX_TOKEN_MEMORY,
};

use crate::error::{ConvertError, ConvertResult};

/// Fixed capacities of one arena.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArenaConfig {
    /// Maximum live clusters.
    pub max_clusters: usize,
    /// Maximum live cells.
    pub max_cells: usize,
    /// Maximum live particles.
    pub max_particles: usize,
    /// Maximum live tokens.
    pub max_tokens: usize,
    /// Size of the metadata string pool in bytes.
    pub string_pool_bytes: usize,
    /// Bytes of constant feature data kept per cell.
    pub cell_static_bytes: usize,
    /// Bytes of mutable feature data kept per cell.
    pub cell_mutable_bytes: usize,
    /// Bytes of memory per token.
    pub token_memory_size: usize,
    /// Connection slots per cell.
    pub max_cell_connections: usize,
}

impl ArenaConfig {
    /// Default cluster capacity.
    pub const DEFAULT_MAX_CLUSTERS: usize = 1_000;
    /// Default cell capacity.
    pub const DEFAULT_MAX_CELLS: usize = 20_000;
    /// Default particle capacity.
    pub const DEFAULT_MAX_PARTICLES: usize = 20_000;
    /// Default token capacity.
    pub const DEFAULT_MAX_TOKENS: usize = 5_000;
    /// Default string pool size (1MB).
    pub const DEFAULT_STRING_POOL_BYTES: usize = 1024 * 1024;

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::InvalidConfig`] if the document does not parse
    /// or a value is out of range.
    pub fn from_toml(source: &str) -> ConvertResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| ConvertError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every capacity.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> ConvertResult<()> {
        let capacities = [
            ("max_clusters", self.max_clusters),
            ("max_cells", self.max_cells),
            ("max_particles", self.max_particles),
            ("max_tokens", self.max_tokens),
        ];
        for (name, value) in capacities {
            if value == 0 {
                return Err(ConvertError::InvalidConfig(format!("{name} must be non-zero")));
            }
            // Indices are stored as u32 inside the arena.
            if u32::try_from(value).is_err() {
                return Err(ConvertError::InvalidConfig(format!(
                    "{name} = {value} does not fit in u32"
                )));
            }
        }
        if u32::try_from(self.string_pool_bytes).is_err() {
            return Err(ConvertError::InvalidConfig(format!(
                "string_pool_bytes = {} does not fit in u32",
                self.string_pool_bytes
            )));
        }

        let ceilings = [
            ("cell_static_bytes", self.cell_static_bytes, MAX_CELL_STATIC_BYTES),
            ("cell_mutable_bytes", self.cell_mutable_bytes, MAX_CELL_MUTABLE_BYTES),
            ("token_memory_size", self.token_memory_size, MAX_TOKEN_MEMORY),
            ("max_cell_connections", self.max_cell_connections, MAX_CELL_CONNECTIONS),
        ];
        for (name, value, ceiling) in ceilings {
            if value > ceiling {
                return Err(ConvertError::InvalidConfig(format!(
                    "{name} = {value} exceeds layout ceiling {ceiling}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            max_clusters: Self::DEFAULT_MAX_CLUSTERS,
            max_cells: Self::DEFAULT_MAX_CELLS,
            max_particles: Self::DEFAULT_MAX_PARTICLES,
            max_tokens: Self::DEFAULT_MAX_TOKENS,
            string_pool_bytes: Self::DEFAULT_STRING_POOL_BYTES,
            cell_static_bytes: MAX_CELL_STATIC_BYTES,
            cell_mutable_bytes: MAX_CELL_MUTABLE_BYTES,
            token_memory_size: MAX_TOKEN_MEMORY,
            max_cell_connections: MAX_CELL_CONNECTIONS,
        }
    }
}
