//! # Conversion Error Types
//!
//! All errors that can occur while marshalling between the graph model and
//! the arena.

use std::fmt;

use thiserror::Error;

/// Which arena region ran out of room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapacityKind {
    /// Cluster array.
    Clusters,
    /// Cell array.
    Cells,
    /// Particle array.
    Particles,
    /// Token array.
    Tokens,
    /// String pool bytes.
    StringPool,
    /// Per-cell connection slots.
    Connections,
}

impl fmt::Display for CapacityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Clusters => "clusters",
            Self::Cells => "cells",
            Self::Particles => "particles",
            Self::Tokens => "tokens",
            Self::StringPool => "string pool",
            Self::Connections => "cell connections",
        };
        f.write_str(name)
    }
}

/// Kind of entity an id was expected to resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A cluster id.
    Cluster,
    /// A cell id.
    Cell,
    /// A particle id.
    Particle,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cluster => "cluster",
            Self::Cell => "cell",
            Self::Particle => "particle",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during conversion.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// An append would exceed a fixed arena capacity.
    #[error("capacity exceeded: {kind} (capacity {capacity})")]
    CapacityExceeded {
        /// The region that is full.
        kind: CapacityKind,
        /// Its fixed capacity.
        capacity: usize,
    },

    /// An id does not resolve to an entity where one is required.
    #[error("lookup failure: {kind} {id} not found")]
    LookupFailure {
        /// Expected entity kind.
        kind: EntityKind,
        /// The unresolved id.
        id: u64,
    },

    /// An explicit id on an added entity is already taken by a live entity
    /// of the same kind, or by an earlier addition in the same call.
    #[error("duplicate id: {kind} {id} already in use")]
    DuplicateId {
        /// Entity kind whose id space collided.
        kind: EntityKind,
        /// The colliding id.
        id: u64,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Every id prefix has been handed out.
    #[error("identity space exhausted")]
    IdentityExhausted,
}

impl ConvertError {
    /// Shorthand for [`ConvertError::CapacityExceeded`].
    #[inline]
    #[must_use]
    pub const fn capacity(kind: CapacityKind, capacity: usize) -> Self {
        Self::CapacityExceeded { kind, capacity }
    }

    /// Shorthand for [`ConvertError::LookupFailure`].
    #[inline]
    #[must_use]
    pub const fn lookup(kind: EntityKind, id: u64) -> Self {
        Self::LookupFailure { kind, id }
    }

    /// Shorthand for [`ConvertError::DuplicateId`].
    #[inline]
    #[must_use]
    pub const fn duplicate(kind: EntityKind, id: u64) -> Self {
        Self::DuplicateId { kind, id }
    }
}

/// Result type for conversion operations.
pub type ConvertResult<T> = Result<T, ConvertError>;
