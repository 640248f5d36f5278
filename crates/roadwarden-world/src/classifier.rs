//! The road-material classifier.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::material::{MaterialId, MaterialRegistry, MaterialSet};

/// Holds the configured set of road-eligible materials.
///
/// The set is replaced wholesale on [`reload`](Self::reload); readers take
/// `Arc` snapshots and never observe a partially-built set. A snapshot
/// captured before a reload keeps answering by the old set.
pub struct RoadMaterials {
    set: RwLock<Arc<MaterialSet>>,
}

impl RoadMaterials {
    /// Create a classifier with an empty material set.
    pub fn new() -> Self {
        Self {
            set: RwLock::new(Arc::new(MaterialSet::new())),
        }
    }

    /// Create a classifier and load it from raw configuration entries.
    pub fn from_entries<I, S>(entries: I, registry: &MaterialRegistry) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let classifier = Self::new();
        classifier.reload(entries, registry);
        classifier
    }

    /// Whether a material is road-eligible under the current set.
    #[inline]
    pub fn contains(&self, id: MaterialId) -> bool {
        self.set.read().contains(&id)
    }

    /// Take an immutable snapshot of the current set.
    pub fn snapshot(&self) -> Arc<MaterialSet> {
        Arc::clone(&self.set.read())
    }

    /// Rebuild the material set from raw configuration entries.
    ///
    /// Each entry may carry a colon-separated qualifier; only the text
    /// before the colon is matched (qualifiers are ignored). Entries that
    /// fail to resolve are skipped with a warning. Returns the number of
    /// entries that resolved.
    pub fn reload<I, S>(&self, entries: I, registry: &MaterialRegistry) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut next = MaterialSet::new();

        for entry in entries {
            let raw = entry.as_ref().trim();
            if raw.is_empty() {
                continue;
            }
            // Only the segment before an optional colon qualifier matches.
            let name = raw.split(':').next().unwrap_or(raw).trim();
            match registry.resolve(name) {
                Some(id) => {
                    next.insert(id);
                }
                None => {
                    warn!(entry = raw, "skipping unresolvable material entry");
                }
            }
        }

        let resolved = next.len();
        *self.set.write() = Arc::new(next);
        debug!(resolved, "road material set reloaded");
        resolved
    }
}

impl Default for RoadMaterials {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualifier_after_colon_is_ignored() {
        let registry = MaterialRegistry::with_defaults();
        let classifier = RoadMaterials::new();
        let resolved = classifier.reload(["stone_bricks:top", "unknownmat"], &registry);
        assert_eq!(resolved, 1);
        let id = registry.resolve("stone_bricks").unwrap();
        assert!(classifier.contains(id));
    }

    #[test]
    fn empty_and_whitespace_entries_are_skipped() {
        let registry = MaterialRegistry::with_defaults();
        let classifier = RoadMaterials::new();
        let resolved = classifier.reload(["", "   ", "gravel", " cobblestone : top "], &registry);
        assert_eq!(resolved, 2);
    }

    #[test]
    fn upper_case_entries_resolve() {
        let registry = MaterialRegistry::with_defaults();
        let classifier = RoadMaterials::new();
        let resolved = classifier.reload(["STONE_BRICKS", "DIRT_PATH"], &registry);
        assert_eq!(resolved, 2);
    }

    #[test]
    fn reload_replaces_the_whole_set() {
        let registry = MaterialRegistry::with_defaults();
        let classifier = RoadMaterials::from_entries(["gravel"], &registry);
        let gravel = registry.resolve("gravel").unwrap();
        assert!(classifier.contains(gravel));

        classifier.reload(["cobblestone"], &registry);
        assert!(!classifier.contains(gravel));
        assert!(classifier.contains(registry.resolve("cobblestone").unwrap()));
    }

    #[test]
    fn snapshot_is_isolated_from_reload() {
        let registry = MaterialRegistry::with_defaults();
        let classifier = RoadMaterials::from_entries(["gravel"], &registry);
        let gravel = registry.resolve("gravel").unwrap();

        let before = classifier.snapshot();
        classifier.reload(["cobblestone"], &registry);

        assert!(before.contains(&gravel));
        assert!(!classifier.snapshot().contains(&gravel));
    }

    #[test]
    fn duplicate_entries_collapse() {
        let registry = MaterialRegistry::with_defaults();
        let classifier = RoadMaterials::new();
        let resolved = classifier.reload(["gravel", "gravel:0", "GRAVEL"], &registry);
        assert_eq!(resolved, 1);
    }
}
