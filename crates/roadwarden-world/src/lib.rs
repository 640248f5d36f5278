//! Material identification and world access for roadwarden.
//!
//! This crate owns the seam between the protection engine and the voxel
//! world: an opaque [`MaterialId`] token, a [`MaterialRegistry`] resolving
//! configured names to tokens, the [`RoadMaterials`] classifier holding the
//! set of road-eligible materials, and the read-only [`BlockReader`] trait
//! the engine uses to inspect world blocks.

pub mod classifier;
pub mod material;
pub mod reader;

pub use classifier::RoadMaterials;
pub use material::{MaterialId, MaterialRegistry, MaterialSet, AIR};
pub use reader::{BlockReader, GridWorld};
