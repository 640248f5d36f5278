//! Read-only access to world blocks.

use hashbrown::HashMap;
use roadwarden_core::{BlockLocation, BlockPos, WorldId};

use crate::material::{MaterialId, AIR};

/// Read-only view of world block materials.
///
/// The protection engine only ever inspects blocks; it never writes them.
/// Positions outside the backing world answer air.
pub trait BlockReader {
    /// The material of the block at `pos` in `world`.
    fn material_at(&self, world: &WorldId, pos: BlockPos) -> MaterialId;
}

impl<T: BlockReader + ?Sized> BlockReader for &T {
    fn material_at(&self, world: &WorldId, pos: BlockPos) -> MaterialId {
        (**self).material_at(world, pos)
    }
}

/// In-memory sparse world, used by tests and the CLI demo path.
///
/// Unset positions are air.
#[derive(Default)]
pub struct GridWorld {
    blocks: HashMap<BlockLocation, MaterialId>,
}

impl GridWorld {
    /// Create an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the material of a single block.
    pub fn set(&mut self, world: &WorldId, pos: BlockPos, material: MaterialId) {
        self.blocks
            .insert(BlockLocation::new(world.clone(), pos), material);
    }

    /// Fill an axis-aligned box of blocks with one material, bounds
    /// inclusive.
    pub fn fill_box(
        &mut self,
        world: &WorldId,
        min: BlockPos,
        max: BlockPos,
        material: MaterialId,
    ) {
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                for z in min.z..=max.z {
                    self.set(world, BlockPos::new(x, y, z), material);
                }
            }
        }
    }

    /// Number of non-air blocks set.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether no blocks are set.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl BlockReader for GridWorld {
    fn material_at(&self, world: &WorldId, pos: BlockPos) -> MaterialId {
        self.blocks
            .get(&BlockLocation::new(world.clone(), pos))
            .copied()
            .unwrap_or(AIR)
    }
}
