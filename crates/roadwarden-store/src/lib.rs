//! Persistence of protected block locations.
//!
//! A protected block is one whose [`BlockLocation`] is present in the
//! store; presence alone encodes protection, there is no separate flag.
//! [`BlockStore`] is the capability trait; [`MemoryStore`] and
//! [`FileStore`] are the shipped backends, selected at configuration time
//! via [`StoreKind`] and [`open_store`].

pub mod error;
pub mod file;
pub mod memory;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use hashbrown::HashSet;
use roadwarden_core::{BlockLocation, ChunkPos, WorldId};

pub use error::{Result, StoreError};
pub use file::FileStore;
pub use memory::MemoryStore;

/// Durable set of protected block locations.
///
/// Implementations are safe under concurrent `is_protected` reads
/// interleaved with writes. A caller that wants its own write visible
/// waits for the call to return; no cross-caller ordering is promised
/// beyond that. Insert of a present location and delete of an absent one
/// are not errors and change nothing.
pub trait BlockStore: Send + Sync {
    /// Whether a location is protected. Served from the resident set;
    /// never touches the backing resource.
    fn is_protected(&self, loc: &BlockLocation) -> bool;

    /// Insert locations, returning the count newly inserted.
    fn insert_many(&self, locs: &HashSet<BlockLocation>) -> Result<usize>;

    /// Insert one location, returning whether it was newly inserted.
    fn insert_one(&self, loc: &BlockLocation) -> Result<bool>;

    /// Delete locations, returning the count actually removed.
    fn delete_many(&self, locs: &HashSet<BlockLocation>) -> Result<usize>;

    /// Delete one location, returning whether it was present.
    fn delete_one(&self, loc: &BlockLocation) -> Result<bool>;

    /// All stored locations.
    fn select_all(&self) -> HashSet<BlockLocation>;

    /// Stored locations within one chunk column of one world, across all
    /// y-levels.
    fn select_in_chunk(&self, world: &WorldId, chunk: ChunkPos) -> HashSet<BlockLocation>;

    /// Number of stored locations.
    fn count(&self) -> usize;

    /// Flush buffered writes durably. No-op for write-through backends.
    fn sync(&self) -> Result<()>;

    /// Flush and release the backing resource. Further writes fail.
    fn close(&self) -> Result<()>;

    /// Remove the persisted resource entirely.
    fn destroy(&self) -> Result<()>;

    /// Whether the persisted resource exists. No side effects.
    fn exists(&self) -> bool;

    /// The backend kind, for reporting.
    fn kind(&self) -> StoreKind;
}

/// Backend selector, a configuration-time decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreKind {
    /// Ephemeral in-memory set
    Memory,
    /// Embedded binary log with snapshot compaction
    File,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::File => f.write_str("file"),
        }
    }
}

impl FromStr for StoreKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            other => Err(StoreError::Init(format!("unknown store kind: {other}"))),
        }
    }
}

/// Open a store of the given kind. The path is ignored by the memory
/// backend.
pub fn open_store(kind: StoreKind, path: &Path) -> Result<Box<dyn BlockStore>> {
    match kind {
        StoreKind::Memory => Ok(Box::new(MemoryStore::new())),
        StoreKind::File => Ok(Box::new(FileStore::open(path)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_kind_parses_case_insensitively() {
        assert_eq!("memory".parse::<StoreKind>().unwrap(), StoreKind::Memory);
        assert_eq!(" File ".parse::<StoreKind>().unwrap(), StoreKind::File);
        assert!("sqlite".parse::<StoreKind>().is_err());
    }

    #[test]
    fn open_store_memory_starts_empty() {
        let store = open_store(StoreKind::Memory, Path::new("unused")).unwrap();
        assert_eq!(store.count(), 0);
        assert_eq!(store.kind(), StoreKind::Memory);
    }
}
