//! # PLASMID Shared
//!
//! The graph-shaped vocabulary of the simulated world.
//!
//! ## CRITICAL RULE
//!
//! Everything in this crate refers to other entities by **id**, never by
//! arena index. Indices belong to `plasmid_core` and are only valid for one
//! arena snapshot; ids are assigned once and never change.
//!
//! ## Contents
//!
//! - [`math`] - `Vec2` positions and velocities
//! - [`constants`] - compile-time layout ceilings shared with the compute engine
//! - [`description`] - nested entity descriptions with optional fields
//! - [`change`] - add / modify / delete deltas applied incrementally

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod change;
pub mod constants;
pub mod description;
pub mod math;

pub use change::{CellChange, ChangeSet, ClusterChange, ParticleChange, Tracked};
pub use constants::{
    MAX_CELL_CONNECTIONS, MAX_CELL_MUTABLE_BYTES, MAX_CELL_STATIC_BYTES, MAX_TOKEN_MEMORY,
};
pub use description::{
    CellDescription, CellFeatureDescription, CellFunction, CellMetadata, ClusterDescription,
    ClusterMetadata, GraphModel, ParticleDescription, ParticleMetadata, TokenDescription,
};
pub use math::Vec2;
