//! Bounded breadth-first road fill.

use std::collections::VecDeque;

use hashbrown::HashSet;
use roadwarden_core::constants::{DEFAULT_FILL_BUDGET, DEFAULT_SPREAD_DISTANCE};
use roadwarden_core::{BlockLocation, BlockPos, WorldId};
use roadwarden_world::{BlockReader, RoadMaterials};
use tracing::{debug, warn};

/// Limits for a single fill.
#[derive(Clone, Copy, Debug)]
pub struct FillConfig {
    /// Maximum straight-line distance from the seed, in blocks. A block
    /// is accepted only while its squared distance is strictly below the
    /// square of this value.
    pub spread_distance: i64,
    /// Maximum frontier dequeues before the fill fails closed with a
    /// partial result.
    pub node_budget: usize,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            spread_distance: DEFAULT_SPREAD_DISTANCE,
            node_budget: DEFAULT_FILL_BUDGET,
        }
    }
}

/// Outcome of one fill: the accepted positions, their world, and whether
/// the node budget cut the search short.
pub struct FillResult {
    pub world: WorldId,
    pub accepted: HashSet<BlockPos>,
    pub truncated: bool,
}

impl FillResult {
    /// Number of accepted positions.
    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    /// Whether nothing was accepted.
    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    /// The accepted positions as fully-qualified locations.
    pub fn locations(&self) -> HashSet<BlockLocation> {
        self.accepted
            .iter()
            .map(|&pos| BlockLocation::new(self.world.clone(), pos))
            .collect()
    }
}

/// Breadth-first flood-fill over 4-connected horizontal neighbors.
///
/// The search never moves vertically: y stays at the seed's level.
/// Neighbors of every accepted block are enqueued unconditionally and
/// re-checked on dequeue; the accepted-set membership test keeps the
/// search from looping and the distance bound keeps it finite.
pub struct RoadFill<'a, R: BlockReader> {
    reader: &'a R,
    materials: &'a RoadMaterials,
    config: FillConfig,
}

impl<'a, R: BlockReader> RoadFill<'a, R> {
    /// Create a fill over a world reader and classifier.
    pub fn new(reader: &'a R, materials: &'a RoadMaterials, config: FillConfig) -> Self {
        Self {
            reader,
            materials,
            config,
        }
    }

    /// Discover the road region connected to `seed`.
    ///
    /// A seed that fails the acceptance test yields an empty result. The
    /// material set is snapshotted once; a concurrent reload does not
    /// affect an in-flight fill.
    pub fn scan(&self, seed: &BlockLocation) -> FillResult {
        let eligible = self.materials.snapshot();
        let max_distance_sq = self.config.spread_distance * self.config.spread_distance;

        let mut accepted: HashSet<BlockPos> = HashSet::new();
        let mut frontier: VecDeque<BlockPos> = VecDeque::new();
        frontier.push_back(seed.pos);

        let mut processed = 0usize;
        let mut truncated = false;

        while let Some(pos) = frontier.pop_front() {
            if processed >= self.config.node_budget {
                truncated = true;
                warn!(
                    seed = %seed,
                    budget = self.config.node_budget,
                    accepted = accepted.len(),
                    "road fill exhausted node budget, returning partial region"
                );
                break;
            }
            processed += 1;

            if accepted.contains(&pos) {
                continue;
            }
            if !eligible.contains(&self.reader.material_at(&seed.world, pos)) {
                continue;
            }
            if pos.distance_squared(seed.pos) >= max_distance_sq {
                continue;
            }

            accepted.insert(pos);
            for neighbor in pos.horizontal_neighbors() {
                frontier.push_back(neighbor);
            }
        }

        debug!(seed = %seed, accepted = accepted.len(), processed, "road fill complete");

        FillResult {
            world: seed.world.clone(),
            accepted,
            truncated,
        }
    }
}
