//! # Arena Element Layout
//!
//! Plain-old-data element types shared bit-for-bit with the compute engine.
//!
//! All structs are `#[repr(C)]` with no implicit padding so they can be
//! uploaded with a byte cast. Indices are `u32`; ids are `u64`.
//!
//! | Type            | Size (bytes) |
//! |-----------------|--------------|
//! | `ArenaCluster`  | 56           |
//! | `ArenaCell`     | 176          |
//! | `ArenaToken`    | 264          |
//! | `ArenaParticle` | 32           |
//! | `ArenaHeader`   | 20           |

use bytemuck::{Pod, Zeroable};

use plasmid_shared::{
    Vec2, MAX_CELL_CONNECTIONS, MAX_CELL_MUTABLE_BYTES, MAX_CELL_STATIC_BYTES, MAX_TOKEN_MEMORY,
};

/// Location of a string inside the pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct StringRef {
    /// Byte offset into the pool.
    pub offset: u32,
    /// Length in bytes. Zero means "no string".
    pub len: u32,
}

impl StringRef {
    /// The empty reference.
    pub const EMPTY: Self = Self { offset: 0, len: 0 };

    /// True if this references no bytes.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }

    /// One past the last byte.
    #[inline]
    #[must_use]
    pub const fn end(self) -> u32 {
        self.offset + self.len
    }
}

/// A cluster: a rigid body owning contiguous cell and token ranges.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct ArenaCluster {
    /// Stable id.
    pub id: u64,
    /// Center position.
    pub pos: Vec2,
    /// Linear velocity.
    pub vel: Vec2,
    /// Rotation angle.
    pub angle: f32,
    /// Angular velocity.
    pub angular_vel: f32,
    /// First cell index.
    pub cell_start: u32,
    /// Number of cells.
    pub num_cells: u32,
    /// First token index.
    pub token_start: u32,
    /// Number of tokens.
    pub num_tokens: u32,
    /// Cluster name.
    pub name: StringRef,
}

impl ArenaCluster {
    /// Cell index range.
    #[inline]
    #[must_use]
    pub fn cell_range(&self) -> std::ops::Range<usize> {
        let start = self.cell_start as usize;
        start..start + self.num_cells as usize
    }

    /// Token index range.
    #[inline]
    #[must_use]
    pub fn token_range(&self) -> std::ops::Range<usize> {
        let start = self.token_start as usize;
        start..start + self.num_tokens as usize
    }
}

/// Metadata strings of one cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct CellMetadataSlot {
    /// Display color.
    pub color: u32,
    /// Cell name.
    pub name: StringRef,
    /// Free-text description.
    pub description: StringRef,
    /// Program source text.
    pub source_code: StringRef,
}

/// A cell.
///
/// `connections` and token `cell_index` values are positions in the cell
/// array and are only valid until the next compaction.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct ArenaCell {
    /// Stable id.
    pub id: u64,
    /// Position.
    pub pos: Vec2,
    /// Energy.
    pub energy: f32,
    /// Maximum connection count.
    pub max_connections: u32,
    /// Live entries in `connections`.
    pub num_connections: u32,
    /// Token branch number.
    pub branch_number: u32,
    /// Token-blocked flag (0 or 1).
    pub token_blocked: u32,
    /// Token usage counter.
    pub token_usages: u32,
    /// Connected cell indices.
    pub connections: [u32; MAX_CELL_CONNECTIONS],
    /// Feature type tag.
    pub function_type: u32,
    /// Live bytes in `static_data`.
    pub num_static_bytes: u32,
    /// Live bytes in `mutable_data`.
    pub num_mutable_bytes: u32,
    /// Constant feature payload.
    pub static_data: [u8; MAX_CELL_STATIC_BYTES],
    /// Mutable feature payload.
    pub mutable_data: [u8; MAX_CELL_MUTABLE_BYTES],
    /// Metadata strings.
    pub metadata: CellMetadataSlot,
}

impl ArenaCell {
    /// Live connection indices.
    #[inline]
    #[must_use]
    pub fn connection_indices(&self) -> &[u32] {
        &self.connections[..self.num_connections as usize]
    }

    /// Live constant feature bytes.
    #[inline]
    #[must_use]
    pub fn static_bytes(&self) -> &[u8] {
        &self.static_data[..self.num_static_bytes as usize]
    }

    /// Live mutable feature bytes.
    #[inline]
    #[must_use]
    pub fn mutable_bytes(&self) -> &[u8] {
        &self.mutable_data[..self.num_mutable_bytes as usize]
    }
}

/// A token hosted by a cell.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct ArenaToken {
    /// Energy.
    pub energy: f32,
    /// Owning cell index.
    pub cell_index: u32,
    /// Memory buffer.
    pub memory: [u8; MAX_TOKEN_MEMORY],
}

/// A free particle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct ArenaParticle {
    /// Stable id.
    pub id: u64,
    /// Position.
    pub pos: Vec2,
    /// Velocity.
    pub vel: Vec2,
    /// Energy.
    pub energy: f32,
    /// Display color.
    pub color: u32,
}

/// Live counts, uploaded ahead of the element arrays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct ArenaHeader {
    /// Live clusters.
    pub num_clusters: u32,
    /// Live cells.
    pub num_cells: u32,
    /// Live particles.
    pub num_particles: u32,
    /// Live tokens.
    pub num_tokens: u32,
    /// String pool bytes used.
    pub string_bytes: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn test_layout_sizes() {
        assert_eq!(size_of::<StringRef>(), 8);
        assert_eq!(size_of::<ArenaCluster>(), 56);
        assert_eq!(size_of::<CellMetadataSlot>(), 28);
        assert_eq!(size_of::<ArenaCell>(), 176);
        assert_eq!(size_of::<ArenaToken>(), 264);
        assert_eq!(size_of::<ArenaParticle>(), 32);
        assert_eq!(size_of::<ArenaHeader>(), 20);
    }

    #[test]
    fn test_cluster_ranges() {
        let mut cluster = ArenaCluster::zeroed();
        cluster.cell_start = 3;
        cluster.num_cells = 2;
        cluster.token_start = 1;
        cluster.num_tokens = 0;
        assert_eq!(cluster.cell_range(), 3..5);
        assert!(cluster.token_range().is_empty());
    }

    #[test]
    fn test_cell_live_slices() {
        let mut cell = ArenaCell::zeroed();
        cell.connections[0] = 4;
        cell.connections[1] = 9;
        cell.num_connections = 2;
        cell.num_static_bytes = 3;
        assert_eq!(cell.connection_indices(), &[4, 9]);
        assert_eq!(cell.static_bytes().len(), 3);
        assert!(cell.mutable_bytes().is_empty());
    }
}
