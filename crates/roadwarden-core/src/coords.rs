//! Coordinate systems for the voxel world.

use std::fmt;
use std::sync::Arc;

use crate::constants::CHUNK_BITS;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Block position in world coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl BlockPos {
    /// Create a new block position
    #[inline]
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// Block-align a floating point position (floor semantics per axis)
    #[inline]
    pub fn from_point(point: Vec3) -> Self {
        Self::new(
            f64::from(point.x).floor() as i64,
            f64::from(point.y).floor() as i64,
            f64::from(point.z).floor() as i64,
        )
    }

    /// Get the chunk column containing this position
    #[inline]
    pub const fn chunk_pos(self) -> ChunkPos {
        ChunkPos::new((self.x >> CHUNK_BITS) as i32, (self.z >> CHUNK_BITS) as i32)
    }

    /// The four horizontally adjacent positions (y held fixed)
    #[inline]
    pub const fn horizontal_neighbors(self) -> [Self; 4] {
        [
            Self::new(self.x + 1, self.y, self.z),
            Self::new(self.x - 1, self.y, self.z),
            Self::new(self.x, self.y, self.z + 1),
            Self::new(self.x, self.y, self.z - 1),
        ]
    }

    /// The position one block down
    #[inline]
    pub const fn below(self) -> Self {
        Self::new(self.x, self.y - 1, self.z)
    }

    /// Squared Euclidean distance to another position
    #[inline]
    pub const fn distance_squared(self, other: Self) -> i64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Horizontal chunk column position, spanning full world height.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    /// Create a new chunk position
    #[inline]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.z)
    }
}

/// Interned world identifier, cheap to clone and hash.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldId(Arc<str>);

impl WorldId {
    /// Create a world identifier from a name
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    /// The world name as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorldId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Fully-qualified block location: world plus block position.
///
/// Equality and hashing cover all four underlying fields, so a
/// `BlockLocation` can serve directly as a set member or map key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockLocation {
    pub world: WorldId,
    pub pos: BlockPos,
}

impl BlockLocation {
    /// Create a new block location
    pub const fn new(world: WorldId, pos: BlockPos) -> Self {
        Self { world, pos }
    }

    /// The chunk column containing this location
    #[inline]
    pub const fn chunk_pos(&self) -> ChunkPos {
        self.pos.chunk_pos()
    }
}

impl fmt::Display for BlockLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.world, self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_point_floors_each_axis() {
        let pos = BlockPos::from_point(Vec3::new(1.9, -0.1, 3.0));
        assert_eq!(pos, BlockPos::new(1, -1, 3));
    }

    #[test]
    fn chunk_pos_shifts_by_four_bits() {
        assert_eq!(BlockPos::new(0, 64, 0).chunk_pos(), ChunkPos::new(0, 0));
        assert_eq!(BlockPos::new(16, 0, 31).chunk_pos(), ChunkPos::new(1, 1));
        assert_eq!(BlockPos::new(-1, 0, -16).chunk_pos(), ChunkPos::new(-1, -1));
    }

    #[test]
    fn distance_squared_is_symmetric() {
        let a = BlockPos::new(0, 64, 0);
        let b = BlockPos::new(3, 64, 4);
        assert_eq!(a.distance_squared(b), 25);
        assert_eq!(b.distance_squared(a), 25);
    }

    #[test]
    fn horizontal_neighbors_hold_y_fixed() {
        let pos = BlockPos::new(5, 70, -2);
        for n in pos.horizontal_neighbors() {
            assert_eq!(n.y, pos.y);
            assert_eq!(n.distance_squared(pos), 1);
        }
    }

    #[test]
    fn locations_compare_by_world_and_position() {
        let a = BlockLocation::new(WorldId::new("world"), BlockPos::new(1, 2, 3));
        let b = BlockLocation::new(WorldId::new("world"), BlockPos::new(1, 2, 3));
        let c = BlockLocation::new(WorldId::new("nether"), BlockPos::new(1, 2, 3));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
