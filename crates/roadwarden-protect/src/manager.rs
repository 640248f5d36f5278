//! The protection manager façade.

use std::sync::Arc;

use glam::Vec3;
use roadwarden_core::constants::{DEFAULT_CHECK_DEPTH, DEFAULT_FILL_BUDGET, DEFAULT_SPREAD_DISTANCE};
use roadwarden_core::{BlockLocation, BlockPos, ChunkPos, WorldId};
use roadwarden_store::{BlockStore, Result};
use roadwarden_world::{BlockReader, RoadMaterials};
use tracing::info;

use crate::fill::{FillConfig, FillResult, RoadFill};

/// Numeric configuration for the manager.
#[derive(Clone, Copy, Debug)]
pub struct ProtectConfig {
    /// Maximum fill spread distance in blocks
    pub spread_distance: i64,
    /// Processed-node budget per fill
    pub node_budget: usize,
    /// Depth for road-below checks when the caller passes no limit
    pub check_depth: i32,
}

impl Default for ProtectConfig {
    fn default() -> Self {
        Self {
            spread_distance: DEFAULT_SPREAD_DISTANCE,
            node_budget: DEFAULT_FILL_BUDGET,
            check_depth: DEFAULT_CHECK_DEPTH,
        }
    }
}

/// Result of a protect or unprotect operation.
#[derive(Clone, Copy, Debug)]
pub struct ProtectOutcome {
    /// Block locations actually inserted or removed
    pub blocks: usize,
    /// Whether the underlying fill hit its node budget
    pub truncated: bool,
}

/// Owns the world reader, the classifier, and the store handle, and
/// exposes the protection operations the rest of the system calls.
///
/// All methods run synchronously on the calling thread. Fills are
/// blocking; latency-sensitive callers dispatch them elsewhere.
/// Concurrent fills over overlapping regions are safe because store
/// insertion is idempotent.
pub struct RoadManager<R: BlockReader> {
    reader: R,
    materials: RoadMaterials,
    store: Arc<dyn BlockStore>,
    config: ProtectConfig,
}

impl<R: BlockReader> RoadManager<R> {
    /// Create a manager over a reader, classifier, and store.
    pub fn new(
        reader: R,
        materials: RoadMaterials,
        store: Arc<dyn BlockStore>,
        config: ProtectConfig,
    ) -> Self {
        Self {
            reader,
            materials,
            store,
            config,
        }
    }

    /// The road region connected to `seed`.
    pub fn find_connected_road(&self, seed: &BlockLocation) -> FillResult {
        let fill_config = FillConfig {
            spread_distance: self.config.spread_distance,
            node_budget: self.config.node_budget,
        };
        RoadFill::new(&self.reader, &self.materials, fill_config).scan(seed)
    }

    /// Fill from `seed` and insert the region into the store.
    pub fn protect_from_seed(&self, seed: &BlockLocation) -> Result<ProtectOutcome> {
        let result = self.find_connected_road(seed);
        let blocks = self.store.insert_many(&result.locations())?;
        info!(seed = %seed, blocks, truncated = result.truncated, "road region protected");
        Ok(ProtectOutcome {
            blocks,
            truncated: result.truncated,
        })
    }

    /// Fill from `seed` and remove the region from the store.
    pub fn unprotect_from_seed(&self, seed: &BlockLocation) -> Result<ProtectOutcome> {
        let result = self.find_connected_road(seed);
        let blocks = self.store.delete_many(&result.locations())?;
        info!(seed = %seed, blocks, truncated = result.truncated, "road region unprotected");
        Ok(ProtectOutcome {
            blocks,
            truncated: result.truncated,
        })
    }

    /// Remove every stored location in one chunk column, returning the
    /// count removed. Used for bulk administrative removal.
    pub fn unprotect_chunk(&self, world: &WorldId, chunk: ChunkPos) -> Result<usize> {
        let locations = self.store.select_in_chunk(world, chunk);
        self.store.delete_many(&locations)
    }

    /// Whether a location is a protected road block: the block must be of
    /// road material and present in the store.
    pub fn is_protected(&self, loc: &BlockLocation) -> bool {
        self.materials
            .contains(self.reader.material_at(&loc.world, loc.pos))
            && self.store.is_protected(loc)
    }

    /// Whether a protected road block lies at or below `origin`, probing
    /// at most `max_depth` levels down.
    ///
    /// A non-positive `max_depth` falls back to the configured check
    /// depth. The depth is clamped to the origin's y so no probe ever
    /// goes below the world floor. Each level checks material
    /// eligibility before the store; on the per-tick hot path most
    /// probed blocks are not road material at all, so the cheap test
    /// must come first.
    pub fn is_road_below(&self, origin: &BlockLocation, max_depth: i32) -> bool {
        let requested = if max_depth <= 0 {
            self.config.check_depth
        } else {
            max_depth
        };
        let depth = i64::from(requested).min(origin.pos.y);

        let eligible = self.materials.snapshot();
        let mut pos = origin.pos;
        for _ in 0..depth {
            if eligible.contains(&self.reader.material_at(&origin.world, pos)) {
                let probe = BlockLocation::new(origin.world.clone(), pos);
                if self.store.is_protected(&probe) {
                    return true;
                }
            }
            pos = pos.below();
        }
        false
    }

    /// Road-below check from a raw float position, the movement-tick
    /// entry point. The position is block-aligned by flooring.
    pub fn is_road_below_point(&self, world: &WorldId, point: Vec3, max_depth: i32) -> bool {
        let origin = BlockLocation::new(world.clone(), BlockPos::from_point(point));
        self.is_road_below(&origin, max_depth)
    }

    /// Number of protected locations, for reporting.
    pub fn protected_count(&self) -> usize {
        self.store.count()
    }

    /// The material classifier, for reload and reporting.
    pub fn materials(&self) -> &RoadMaterials {
        &self.materials
    }

    /// The store handle, for lifecycle calls.
    pub fn store(&self) -> &Arc<dyn BlockStore> {
        &self.store
    }
}
