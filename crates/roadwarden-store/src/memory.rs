//! Ephemeral in-memory store backend.

use hashbrown::HashSet;
use parking_lot::RwLock;
use roadwarden_core::{BlockLocation, ChunkPos, WorldId};

use crate::error::Result;
use crate::{BlockStore, StoreKind};

/// In-memory backend for tests and throwaway sessions. Nothing survives
/// the process.
#[derive(Default)]
pub struct MemoryStore {
    locations: RwLock<HashSet<BlockLocation>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlockStore for MemoryStore {
    fn is_protected(&self, loc: &BlockLocation) -> bool {
        self.locations.read().contains(loc)
    }

    fn insert_many(&self, locs: &HashSet<BlockLocation>) -> Result<usize> {
        let mut set = self.locations.write();
        let before = set.len();
        for loc in locs {
            set.insert(loc.clone());
        }
        Ok(set.len() - before)
    }

    fn insert_one(&self, loc: &BlockLocation) -> Result<bool> {
        Ok(self.locations.write().insert(loc.clone()))
    }

    fn delete_many(&self, locs: &HashSet<BlockLocation>) -> Result<usize> {
        let mut set = self.locations.write();
        let before = set.len();
        for loc in locs {
            set.remove(loc);
        }
        Ok(before - set.len())
    }

    fn delete_one(&self, loc: &BlockLocation) -> Result<bool> {
        Ok(self.locations.write().remove(loc))
    }

    fn select_all(&self) -> HashSet<BlockLocation> {
        self.locations.read().clone()
    }

    fn select_in_chunk(&self, world: &WorldId, chunk: ChunkPos) -> HashSet<BlockLocation> {
        self.locations
            .read()
            .iter()
            .filter(|loc| loc.world == *world && loc.chunk_pos() == chunk)
            .cloned()
            .collect()
    }

    fn count(&self) -> usize {
        self.locations.read().len()
    }

    fn sync(&self) -> Result<()> {
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }

    fn destroy(&self) -> Result<()> {
        self.locations.write().clear();
        Ok(())
    }

    fn exists(&self) -> bool {
        false
    }

    fn kind(&self) -> StoreKind {
        StoreKind::Memory
    }
}
