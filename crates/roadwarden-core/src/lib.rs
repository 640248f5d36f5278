//! Core types for the roadwarden road-protection engine.
//!
//! This crate provides the foundational types used throughout the engine:
//! - Block and chunk coordinate systems
//! - World identifiers and fully-qualified block locations
//! - Engine-wide constants

pub mod coords;

pub use coords::{BlockLocation, BlockPos, ChunkPos, WorldId};

/// Engine-wide constants
pub mod constants {
    /// Bits needed to project a block coordinate onto its chunk column
    pub const CHUNK_BITS: u32 = 4;
    /// Horizontal size of a chunk column in blocks (16x16)
    pub const CHUNK_SIZE: usize = 1 << CHUNK_BITS;
    /// Depth used by road-below queries when the caller passes a
    /// non-positive depth
    pub const DEFAULT_CHECK_DEPTH: i32 = 5;
    /// Default maximum Euclidean spread distance for a road fill
    pub const DEFAULT_SPREAD_DISTANCE: i64 = 100;
    /// Default processed-node budget for a road fill
    pub const DEFAULT_FILL_BUDGET: usize = 250_000;
}
