//! Embedded file store backend.
//!
//! Layout: an 8-byte magic, a 4-byte format version, then a sequence of
//! length-prefixed, CRC32-framed bincode records. Mutations append
//! `Insert`/`Remove` records; compaction rewrites the file as a single
//! `Snapshot` record via a temp file and atomic rename. The authoritative
//! set stays resident in memory so `is_protected` never touches the disk.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use hashbrown::{HashMap, HashSet};
use parking_lot::{Mutex, RwLock};
use roadwarden_core::{BlockLocation, BlockPos, ChunkPos, WorldId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};
use crate::{BlockStore, StoreKind};

const MAGIC: &[u8; 8] = b"RWBLOCKS";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: u64 = 12;

/// Replay refuses records larger than this; a bigger length prefix is
/// treated as a torn tail.
const MAX_RECORD_LEN: u32 = 256 * 1024 * 1024;

/// Log records since the last snapshot before compaction triggers.
const DEFAULT_COMPACT_THRESHOLD: usize = 4096;

#[derive(Serialize, Deserialize)]
enum Record {
    Insert(WorldId, Vec<BlockPos>),
    Remove(WorldId, Vec<BlockPos>),
    Snapshot(Vec<(WorldId, Vec<BlockPos>)>),
}

#[derive(Debug)]
struct LogWriter {
    file: Option<BufWriter<File>>,
    dirty_records: usize,
}

/// Durable store backed by an append-only log with snapshot compaction.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    resident: RwLock<HashSet<BlockLocation>>,
    writer: Mutex<LogWriter>,
    compact_threshold: usize,
}

impl FileStore {
    /// Open or create the store at `path`, replaying any existing log.
    ///
    /// A torn tail (partial final record or CRC mismatch) is dropped and
    /// the valid prefix kept. A bad header fails with
    /// [`StoreError::Corrupt`].
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_threshold(path, DEFAULT_COMPACT_THRESHOLD)
    }

    /// Open with an explicit compaction threshold.
    pub fn open_with_threshold(path: &Path, compact_threshold: usize) -> Result<Self> {
        let mut resident = HashSet::new();

        let file = if path.exists() {
            let valid_len = Self::replay(path, &mut resident)?;
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .open(path)
                .map_err(|e| StoreError::Init(format!("cannot open {}: {e}", path.display())))?;
            let actual_len = file.metadata()?.len();
            if valid_len < actual_len {
                warn!(
                    path = %path.display(),
                    dropped = actual_len - valid_len,
                    "dropping torn tail from block store log"
                );
                file.set_len(valid_len)?;
            }
            let mut file = file;
            file.seek(SeekFrom::End(0))?;
            file
        } else {
            let mut file = OpenOptions::new()
                .create_new(true)
                .read(true)
                .write(true)
                .open(path)
                .map_err(|e| StoreError::Init(format!("cannot create {}: {e}", path.display())))?;
            file.write_all(MAGIC)?;
            file.write_all(&FORMAT_VERSION.to_le_bytes())?;
            file.flush()?;
            file
        };

        info!(path = %path.display(), blocks = resident.len(), "block store opened");

        Ok(Self {
            path: path.to_path_buf(),
            resident: RwLock::new(resident),
            writer: Mutex::new(LogWriter {
                file: Some(BufWriter::new(file)),
                dirty_records: 0,
            }),
            compact_threshold,
        })
    }

    /// Replay the log into `resident`, returning the byte offset of the
    /// end of the last valid record.
    fn replay(path: &Path, resident: &mut HashSet<BlockLocation>) -> Result<u64> {
        let file = File::open(path)
            .map_err(|e| StoreError::Init(format!("cannot open {}: {e}", path.display())))?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 8];
        reader
            .read_exact(&mut magic)
            .map_err(|_| StoreError::Corrupt("truncated header".into()))?;
        if &magic != MAGIC {
            return Err(StoreError::Corrupt("bad magic".into()));
        }
        let mut version_bytes = [0u8; 4];
        reader
            .read_exact(&mut version_bytes)
            .map_err(|_| StoreError::Corrupt("truncated header".into()))?;
        let version = u32::from_le_bytes(version_bytes);
        if version != FORMAT_VERSION {
            return Err(StoreError::Corrupt(format!(
                "unsupported format version {version}"
            )));
        }

        let mut valid_len = HEADER_LEN;
        loop {
            let mut len_bytes = [0u8; 4];
            if reader.read_exact(&mut len_bytes).is_err() {
                break;
            }
            let len = u32::from_le_bytes(len_bytes);
            if len > MAX_RECORD_LEN {
                break;
            }
            let mut payload = vec![0u8; len as usize];
            if reader.read_exact(&mut payload).is_err() {
                break;
            }
            let mut crc_bytes = [0u8; 4];
            if reader.read_exact(&mut crc_bytes).is_err() {
                break;
            }
            if crc32fast::hash(&payload) != u32::from_le_bytes(crc_bytes) {
                break;
            }

            let record: Record = bincode::deserialize(&payload)
                .map_err(|e| StoreError::Corrupt(format!("undecodable record: {e}")))?;
            Self::apply(record, resident);
            valid_len += 4 + u64::from(len) + 4;
        }

        Ok(valid_len)
    }

    fn apply(record: Record, resident: &mut HashSet<BlockLocation>) {
        match record {
            Record::Insert(world, positions) => {
                for pos in positions {
                    resident.insert(BlockLocation::new(world.clone(), pos));
                }
            }
            Record::Remove(world, positions) => {
                for pos in positions {
                    resident.remove(&BlockLocation::new(world.clone(), pos));
                }
            }
            Record::Snapshot(worlds) => {
                resident.clear();
                for (world, positions) in worlds {
                    for pos in positions {
                        resident.insert(BlockLocation::new(world.clone(), pos));
                    }
                }
            }
        }
    }

    fn append(log: &mut LogWriter, record: &Record) -> Result<()> {
        let file = log.file.as_mut().ok_or(StoreError::Closed)?;
        let payload =
            bincode::serialize(record).map_err(|e| StoreError::Encode(e.to_string()))?;
        let len = u32::try_from(payload.len())
            .map_err(|_| StoreError::Encode("record too large".into()))?;
        file.write_all(&len.to_le_bytes())?;
        file.write_all(&payload)?;
        file.write_all(&crc32fast::hash(&payload).to_le_bytes())?;
        file.flush()?;
        log.dirty_records += 1;
        Ok(())
    }

    /// Rewrite the file as a single snapshot record. Also triggered
    /// automatically once enough log records accumulate.
    pub fn compact(&self) -> Result<()> {
        let mut log = self.writer.lock();
        self.compact_locked(&mut log)
    }

    fn compact_locked(&self, log: &mut LogWriter) -> Result<()> {
        if log.file.is_none() {
            return Err(StoreError::Closed);
        }

        let snapshot = Record::Snapshot(group_by_world(self.resident.read().iter()));

        let tmp_path = self.path.with_extension("tmp");
        let mut tmp = BufWriter::new(
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)?,
        );
        tmp.write_all(MAGIC)?;
        tmp.write_all(&FORMAT_VERSION.to_le_bytes())?;
        let payload =
            bincode::serialize(&snapshot).map_err(|e| StoreError::Encode(e.to_string()))?;
        let len = u32::try_from(payload.len())
            .map_err(|_| StoreError::Encode("snapshot too large".into()))?;
        tmp.write_all(&len.to_le_bytes())?;
        tmp.write_all(&payload)?;
        tmp.write_all(&crc32fast::hash(&payload).to_le_bytes())?;
        tmp.flush()?;
        tmp.get_ref().sync_all()?;
        drop(tmp);

        // Release the old handle before replacing the file beneath it.
        log.file = None;
        fs::rename(&tmp_path, &self.path)?;

        let mut file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        file.seek(SeekFrom::End(0))?;
        log.file = Some(BufWriter::new(file));
        log.dirty_records = 0;

        debug!(path = %self.path.display(), blocks = self.resident.read().len(), "block store compacted");
        Ok(())
    }

    fn maybe_compact(&self, log: &mut LogWriter) -> Result<()> {
        if log.dirty_records >= self.compact_threshold {
            self.compact_locked(log)?;
        }
        Ok(())
    }

    /// The path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn group_by_world<'a, I>(locs: I) -> Vec<(WorldId, Vec<BlockPos>)>
where
    I: IntoIterator<Item = &'a BlockLocation>,
{
    let mut grouped: HashMap<WorldId, Vec<BlockPos>> = HashMap::new();
    for loc in locs {
        grouped.entry(loc.world.clone()).or_default().push(loc.pos);
    }
    grouped.into_iter().collect()
}

impl BlockStore for FileStore {
    fn is_protected(&self, loc: &BlockLocation) -> bool {
        self.resident.read().contains(loc)
    }

    fn insert_many(&self, locs: &HashSet<BlockLocation>) -> Result<usize> {
        let mut log = self.writer.lock();
        if log.file.is_none() {
            return Err(StoreError::Closed);
        }

        let fresh: Vec<BlockLocation> = {
            let mut set = self.resident.write();
            let mut fresh = Vec::new();
            for loc in locs {
                if set.insert(loc.clone()) {
                    fresh.push(loc.clone());
                }
            }
            fresh
        };

        if fresh.is_empty() {
            return Ok(0);
        }
        let inserted = fresh.len();
        for (world, positions) in group_by_world(fresh.iter()) {
            Self::append(&mut log, &Record::Insert(world, positions))?;
        }
        self.maybe_compact(&mut log)?;
        Ok(inserted)
    }

    fn insert_one(&self, loc: &BlockLocation) -> Result<bool> {
        let mut batch = HashSet::with_capacity(1);
        batch.insert(loc.clone());
        Ok(self.insert_many(&batch)? == 1)
    }

    fn delete_many(&self, locs: &HashSet<BlockLocation>) -> Result<usize> {
        let mut log = self.writer.lock();
        if log.file.is_none() {
            return Err(StoreError::Closed);
        }

        let removed: Vec<BlockLocation> = {
            let mut set = self.resident.write();
            let mut removed = Vec::new();
            for loc in locs {
                if set.remove(loc) {
                    removed.push(loc.clone());
                }
            }
            removed
        };

        if removed.is_empty() {
            return Ok(0);
        }
        let count = removed.len();
        for (world, positions) in group_by_world(removed.iter()) {
            Self::append(&mut log, &Record::Remove(world, positions))?;
        }
        self.maybe_compact(&mut log)?;
        Ok(count)
    }

    fn delete_one(&self, loc: &BlockLocation) -> Result<bool> {
        let mut batch = HashSet::with_capacity(1);
        batch.insert(loc.clone());
        Ok(self.delete_many(&batch)? == 1)
    }

    fn select_all(&self) -> HashSet<BlockLocation> {
        self.resident.read().clone()
    }

    fn select_in_chunk(&self, world: &WorldId, chunk: ChunkPos) -> HashSet<BlockLocation> {
        self.resident
            .read()
            .iter()
            .filter(|loc| loc.world == *world && loc.chunk_pos() == chunk)
            .cloned()
            .collect()
    }

    fn count(&self) -> usize {
        self.resident.read().len()
    }

    fn sync(&self) -> Result<()> {
        let mut log = self.writer.lock();
        let file = log.file.as_mut().ok_or(StoreError::Closed)?;
        file.flush()?;
        file.get_ref().sync_data()?;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let mut log = self.writer.lock();
        if let Some(mut file) = log.file.take() {
            file.flush()?;
            file.get_ref().sync_all()?;
        }
        Ok(())
    }

    fn destroy(&self) -> Result<()> {
        let mut log = self.writer.lock();
        log.file = None;
        self.resident.write().clear();
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn kind(&self) -> StoreKind {
        StoreKind::File
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        if let Some(file) = self.writer.lock().file.as_mut() {
            let _ = file.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("roadwarden-{tag}-{nanos}.rwb"))
    }

    fn loc(x: i64, y: i64, z: i64) -> BlockLocation {
        BlockLocation::new(WorldId::new("world"), BlockPos::new(x, y, z))
    }

    #[test]
    fn round_trip_across_reopen() {
        let path = temp_path("roundtrip");
        {
            let store = FileStore::open(&path).unwrap();
            store.insert_one(&loc(0, 64, 0)).unwrap();
            store.insert_one(&loc(1, 64, 0)).unwrap();
            store.delete_one(&loc(1, 64, 0)).unwrap();
            store.close().unwrap();
        }
        {
            let store = FileStore::open(&path).unwrap();
            assert!(store.is_protected(&loc(0, 64, 0)));
            assert!(!store.is_protected(&loc(1, 64, 0)));
            assert_eq!(store.count(), 1);
        }
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn chunk_query_agrees_across_reopen() {
        let path = temp_path("chunks");
        let world = WorldId::new("world");
        let before;
        {
            let store = FileStore::open(&path).unwrap();
            store.insert_one(&loc(3, 64, 3)).unwrap();
            store.insert_one(&loc(3, 10, 3)).unwrap();
            store.insert_one(&loc(20, 64, 3)).unwrap();
            before = store.select_in_chunk(&world, ChunkPos::new(0, 0));
            store.close().unwrap();
        }
        let store = FileStore::open(&path).unwrap();
        let after = store.select_in_chunk(&world, ChunkPos::new(0, 0));
        assert_eq!(before, after);
        assert_eq!(after.len(), 2);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn torn_tail_keeps_valid_prefix() {
        let path = temp_path("torn");
        {
            let store = FileStore::open(&path).unwrap();
            store.insert_one(&loc(0, 64, 0)).unwrap();
            store.insert_one(&loc(1, 64, 0)).unwrap();
            store.close().unwrap();
        }
        // Simulate a crash mid-append: a length prefix with half a payload.
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(&[16, 0, 0, 0, 0xAA, 0xBB]).unwrap();
        }
        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.count(), 2);
        assert!(store.is_protected(&loc(0, 64, 0)));
        assert!(store.is_protected(&loc(1, 64, 0)));

        // The torn bytes are gone; further appends replay cleanly.
        store.insert_one(&loc(2, 64, 0)).unwrap();
        store.close().unwrap();
        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.count(), 3);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn corrupt_header_is_an_open_error() {
        let path = temp_path("header");
        fs::write(&path, b"NOTASTORE123").unwrap();
        match FileStore::open(&path) {
            Err(StoreError::Corrupt(_)) => {}
            other => panic!("expected corrupt header error, got {other:?}"),
        }
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn compaction_preserves_the_visible_set() {
        let path = temp_path("compact");
        let store = FileStore::open(&path).unwrap();
        let mut batch = HashSet::new();
        for x in 0..50 {
            batch.insert(loc(x, 64, 0));
        }
        store.insert_many(&batch).unwrap();
        store.delete_one(&loc(0, 64, 0)).unwrap();

        let before = store.select_all();
        store.compact().unwrap();
        assert_eq!(store.select_all(), before);
        store.close().unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.select_all(), before);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn automatic_compaction_after_threshold() {
        let path = temp_path("autocompact");
        let store = FileStore::open_with_threshold(&path, 4).unwrap();
        for x in 0..10 {
            store.insert_one(&loc(x, 64, 0)).unwrap();
        }
        assert_eq!(store.count(), 10);
        store.close().unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.count(), 10);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn destroy_removes_the_file() {
        let path = temp_path("destroy");
        let store = FileStore::open(&path).unwrap();
        store.insert_one(&loc(0, 64, 0)).unwrap();
        assert!(store.exists());
        store.destroy().unwrap();
        assert!(!store.exists());

        // A fresh open starts empty.
        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.count(), 0);
        store.destroy().unwrap();
    }

    #[test]
    fn writes_after_close_fail() {
        let path = temp_path("closed");
        let store = FileStore::open(&path).unwrap();
        store.close().unwrap();
        match store.insert_one(&loc(0, 64, 0)) {
            Err(StoreError::Closed) => {}
            other => panic!("expected closed error, got {other:?}"),
        }
        fs::remove_file(&path).unwrap();
    }
}
