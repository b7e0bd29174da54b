//! # World Descriptions
//!
//! The graph-shaped model of the simulated world.
//!
//! ## Optional Fields
//!
//! Almost every field is an `Option`. When a description is *written*,
//! an absent field falls back to a documented default. When a description
//! is *read* back from the arena, every field is present. Cross-references
//! (cell connections) are stored as ids:
//!
//! ```text
//! GraphModel
//! ├── ClusterDescription[]
//! │   └── CellDescription[]
//! │       ├── connecting_cells: [id, id, ...]
//! │       ├── feature: type + constant bytes + mutable bytes
//! │       └── TokenDescription[]
//! └── ParticleDescription[]
//! ```

use serde::{Deserialize, Serialize};

use crate::math::Vec2;

// ============================================================================
// CELL FEATURE
// ============================================================================

/// Type tag of a cell's feature.
///
/// The byte payload that goes with it is never interpreted by this crate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CellFunction {
    /// Executes the compiled program stored in the constant block.
    #[default]
    Computer = 0,
    /// Produces thrust.
    Propulsion = 1,
    /// Reads the properties of nearby cells.
    Scanner = 2,
    /// Drains energy from nearby cells.
    Weapon = 3,
    /// Builds new cells.
    Constructor = 4,
    /// Detects cells in a direction.
    Sensor = 5,
    /// Exchanges messages with other clusters.
    Communicator = 6,
}

impl CellFunction {
    /// Decodes a stored type tag.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Computer),
            1 => Some(Self::Propulsion),
            2 => Some(Self::Scanner),
            3 => Some(Self::Weapon),
            4 => Some(Self::Constructor),
            5 => Some(Self::Sensor),
            6 => Some(Self::Communicator),
            _ => None,
        }
    }

    /// Returns the stored type tag.
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// A cell's feature: a type tag plus two opaque byte blocks.
///
/// The blocks are produced and consumed by the program compiler; here they
/// are plain payload, truncated to the configured maxima when written.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellFeatureDescription {
    /// Feature type.
    pub function: CellFunction,
    /// Constant block (e.g. compiled instructions).
    pub const_data: Vec<u8>,
    /// Mutable block (e.g. working memory).
    pub volatile_data: Vec<u8>,
}

impl CellFeatureDescription {
    /// Creates a feature of the given type with empty blocks.
    #[must_use]
    pub fn new(function: CellFunction) -> Self {
        Self {
            function,
            ..Self::default()
        }
    }

    /// Sets the constant block.
    #[must_use]
    pub fn with_const_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.const_data = data.into();
        self
    }

    /// Sets the mutable block.
    #[must_use]
    pub fn with_volatile_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.volatile_data = data.into();
        self
    }
}

// ============================================================================
// METADATA
// ============================================================================

/// Display metadata of a cell. Text fields live in the arena string pool.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellMetadata {
    /// Display color index.
    pub color: u32,
    /// Free-form name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Program source text the feature bytes were compiled from.
    pub source_code: String,
}

/// Display metadata of a cluster.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterMetadata {
    /// Free-form name.
    pub name: String,
}

/// Display metadata of a particle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticleMetadata {
    /// Display color index.
    pub color: u32,
}

// ============================================================================
// ENTITIES
// ============================================================================

/// A free energy particle.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticleDescription {
    /// Unique id, 0 = not yet assigned.
    pub id: u64,
    /// Position.
    pub pos: Option<Vec2>,
    /// Velocity.
    pub vel: Option<Vec2>,
    /// Energy.
    pub energy: Option<f32>,
    /// Metadata. Absent means default color.
    pub metadata: Option<ParticleMetadata>,
}

impl ParticleDescription {
    /// Creates an empty particle description with the given id.
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Sets the position.
    #[must_use]
    pub fn with_pos(mut self, pos: Vec2) -> Self {
        self.pos = Some(pos);
        self
    }

    /// Sets the velocity.
    #[must_use]
    pub fn with_vel(mut self, vel: Vec2) -> Self {
        self.vel = Some(vel);
        self
    }

    /// Sets the energy.
    #[must_use]
    pub fn with_energy(mut self, energy: f32) -> Self {
        self.energy = Some(energy);
        self
    }

    /// Sets the metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: ParticleMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// A mobile program-carrying unit residing in one cell.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenDescription {
    /// Energy carried by the token.
    pub energy: f32,
    /// Token memory. Written zero-padded or truncated to the configured
    /// token memory size.
    pub data: Vec<u8>,
}

impl TokenDescription {
    /// Creates a token.
    #[must_use]
    pub fn new(energy: f32, data: impl Into<Vec<u8>>) -> Self {
        Self {
            energy,
            data: data.into(),
        }
    }
}

/// A cell of a cluster.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CellDescription {
    /// Unique id, 0 = not yet assigned.
    pub id: u64,
    /// Absolute position.
    pub pos: Option<Vec2>,
    /// Energy.
    pub energy: Option<f32>,
    /// Maximum number of connections this cell may hold.
    pub max_connections: Option<u32>,
    /// Ids of connected cells of the same cluster.
    pub connecting_cells: Option<Vec<u64>>,
    /// Branch number used for token routing.
    pub token_branch_number: Option<u32>,
    /// Whether tokens are blocked from entering.
    pub token_blocked: Option<bool>,
    /// Number of token visits so far.
    pub token_usages: Option<u32>,
    /// Feature type and payload.
    pub feature: Option<CellFeatureDescription>,
    /// Display metadata.
    pub metadata: Option<CellMetadata>,
    /// Tokens currently hosted, in order.
    pub tokens: Option<Vec<TokenDescription>>,
}

impl CellDescription {
    /// Creates an empty cell description with the given id.
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Sets the position.
    #[must_use]
    pub fn with_pos(mut self, pos: Vec2) -> Self {
        self.pos = Some(pos);
        self
    }

    /// Sets the energy.
    #[must_use]
    pub fn with_energy(mut self, energy: f32) -> Self {
        self.energy = Some(energy);
        self
    }

    /// Sets the maximum connection count.
    #[must_use]
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = Some(max_connections);
        self
    }

    /// Replaces the connection list.
    #[must_use]
    pub fn with_connecting_cells(mut self, ids: impl Into<Vec<u64>>) -> Self {
        self.connecting_cells = Some(ids.into());
        self
    }

    /// Sets the token branch number.
    #[must_use]
    pub fn with_token_branch_number(mut self, branch: u32) -> Self {
        self.token_branch_number = Some(branch);
        self
    }

    /// Sets the token-blocked flag.
    #[must_use]
    pub fn with_token_blocked(mut self, blocked: bool) -> Self {
        self.token_blocked = Some(blocked);
        self
    }

    /// Sets the token usage counter.
    #[must_use]
    pub fn with_token_usages(mut self, usages: u32) -> Self {
        self.token_usages = Some(usages);
        self
    }

    /// Sets the feature.
    #[must_use]
    pub fn with_feature(mut self, feature: CellFeatureDescription) -> Self {
        self.feature = Some(feature);
        self
    }

    /// Sets the metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: CellMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Replaces the token list.
    #[must_use]
    pub fn with_tokens(mut self, tokens: Vec<TokenDescription>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Appends a connection to another cell.
    pub fn add_connection(&mut self, id: u64) -> &mut Self {
        self.connecting_cells.get_or_insert_with(Vec::new).push(id);
        self
    }

    /// Appends a token.
    pub fn add_token(&mut self, token: TokenDescription) -> &mut Self {
        self.tokens.get_or_insert_with(Vec::new).push(token);
        self
    }

    /// Inserts a token at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is greater than the current token count.
    pub fn insert_token(&mut self, index: usize, token: TokenDescription) -> &mut Self {
        self.tokens.get_or_insert_with(Vec::new).insert(index, token);
        self
    }

    /// Removes and returns the token at `index`, if any.
    pub fn remove_token(&mut self, index: usize) -> Option<TokenDescription> {
        let tokens = self.tokens.as_mut()?;
        (index < tokens.len()).then(|| tokens.remove(index))
    }

    /// Checks whether this cell lists `id` as a connection.
    #[must_use]
    pub fn is_connected_to(&self, id: u64) -> bool {
        self.connecting_cells
            .as_ref()
            .is_some_and(|ids| ids.contains(&id))
    }
}

/// A connected group of cells moving as one rigid body.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterDescription {
    /// Unique id, 0 = not yet assigned.
    pub id: u64,
    /// Position. Absent means the centroid of the cells.
    pub pos: Option<Vec2>,
    /// Velocity.
    pub vel: Option<Vec2>,
    /// Rotation angle in degrees.
    pub angle: Option<f32>,
    /// Angular velocity in degrees per step.
    pub angular_vel: Option<f32>,
    /// Display metadata.
    pub metadata: Option<ClusterMetadata>,
    /// Cells owned by the cluster, in order.
    pub cells: Vec<CellDescription>,
}

impl ClusterDescription {
    /// Creates an empty cluster description with the given id.
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Sets the position.
    #[must_use]
    pub fn with_pos(mut self, pos: Vec2) -> Self {
        self.pos = Some(pos);
        self
    }

    /// Sets the velocity.
    #[must_use]
    pub fn with_vel(mut self, vel: Vec2) -> Self {
        self.vel = Some(vel);
        self
    }

    /// Sets the angle.
    #[must_use]
    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = Some(angle);
        self
    }

    /// Sets the angular velocity.
    #[must_use]
    pub fn with_angular_vel(mut self, angular_vel: f32) -> Self {
        self.angular_vel = Some(angular_vel);
        self
    }

    /// Sets the metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: ClusterMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Appends a cell.
    #[must_use]
    pub fn with_cell(mut self, cell: CellDescription) -> Self {
        self.cells.push(cell);
        self
    }

    /// Centroid of the cell positions. Cells without a position count as
    /// the origin; an empty cluster yields zero.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn pos_from_cells(&self) -> Vec2 {
        if self.cells.is_empty() {
            return Vec2::ZERO;
        }
        let mut sum = Vec2::ZERO;
        for cell in &self.cells {
            sum += cell.pos.unwrap_or_default();
        }
        sum / self.cells.len() as f32
    }

    /// Total number of tokens over all cells.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.cells
            .iter()
            .map(|cell| cell.tokens.as_ref().map_or(0, Vec::len))
            .sum()
    }
}

// ============================================================================
// WORLD
// ============================================================================

/// The whole world: clusters and free particles.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphModel {
    /// All clusters.
    pub clusters: Vec<ClusterDescription>,
    /// All free particles.
    pub particles: Vec<ParticleDescription>,
}

impl GraphModel {
    /// Creates an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a cluster.
    pub fn add_cluster(&mut self, cluster: ClusterDescription) -> &mut Self {
        self.clusters.push(cluster);
        self
    }

    /// Appends a particle.
    pub fn add_particle(&mut self, particle: ParticleDescription) -> &mut Self {
        self.particles.push(particle);
        self
    }

    /// Total number of cells over all clusters.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.clusters.iter().map(|c| c.cells.len()).sum()
    }

    /// Total number of tokens over all cells.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.clusters.iter().map(ClusterDescription::token_count).sum()
    }

    /// Mean position of all cells and particles. Zero for an empty world.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn center(&self) -> Vec2 {
        let mut sum = Vec2::ZERO;
        let mut count = 0usize;
        for cell in self.clusters.iter().flat_map(|c| &c.cells) {
            sum += cell.pos.unwrap_or_default();
            count += 1;
        }
        for particle in &self.particles {
            sum += particle.pos.unwrap_or_default();
            count += 1;
        }
        if count == 0 {
            Vec2::ZERO
        } else {
            sum / count as f32
        }
    }

    /// Translates every positioned cluster, cell and particle by `delta`.
    pub fn shift(&mut self, delta: Vec2) {
        for cluster in &mut self.clusters {
            if let Some(pos) = cluster.pos.as_mut() {
                *pos += delta;
            }
            for cell in &mut cluster.cells {
                if let Some(pos) = cell.pos.as_mut() {
                    *pos += delta;
                }
            }
        }
        for particle in &mut self.particles {
            if let Some(pos) = particle.pos.as_mut() {
                *pos += delta;
            }
        }
    }

    /// Returns a copy with every sibling collection sorted by id.
    ///
    /// Connection lists are sorted too; token order is kept since tokens
    /// have no identity. Two models describing the same world compare equal
    /// after this, regardless of arena order.
    #[must_use]
    pub fn sorted_by_id(&self) -> Self {
        let mut sorted = self.clone();
        sorted.clusters.sort_by_key(|c| c.id);
        for cluster in &mut sorted.clusters {
            cluster.cells.sort_by_key(|c| c.id);
            for cell in &mut cluster.cells {
                if let Some(ids) = cell.connecting_cells.as_mut() {
                    ids.sort_unstable();
                }
            }
        }
        sorted.particles.sort_by_key(|p| p.id);
        sorted
    }
}
