//! Material identifiers and the name registry.

use std::fmt;

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

/// Opaque material token. `0` is reserved for air.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialId(pub u16);

/// The reserved air material.
pub const AIR: MaterialId = MaterialId(0);

impl MaterialId {
    /// Whether this is the reserved air material
    #[inline]
    pub const fn is_air(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A snapshot of road-eligible materials.
pub type MaterialSet = HashSet<MaterialId>;

/// Built-in material names, matching the road surfaces the default
/// configuration refers to. Index order assigns the ids.
const DEFAULT_NAMES: &[&str] = &[
    "air",
    "dirt_path",
    "gravel",
    "cobblestone",
    "mossy_cobblestone",
    "cobblestone_slab",
    "cobblestone_stairs",
    "stone_bricks",
    "mossy_stone_bricks",
    "cracked_stone_bricks",
    "chiseled_stone_bricks",
    "stone_brick_slab",
    "stone_brick_stairs",
    "smooth_stone",
    "smooth_stone_slab",
    "andesite",
    "polished_andesite",
];

/// Bidirectional map between canonical material names and [`MaterialId`]
/// tokens.
///
/// Resolution is a pure lookup; callers that consume free-text
/// configuration normalize and skip unresolved names themselves.
pub struct MaterialRegistry {
    by_name: HashMap<String, MaterialId>,
    names: Vec<String>,
}

impl MaterialRegistry {
    /// Create an empty registry containing only air.
    pub fn new() -> Self {
        let mut registry = Self {
            by_name: HashMap::new(),
            names: Vec::new(),
        };
        registry.register("air");
        registry
    }

    /// Create a registry preloaded with the built-in material table.
    pub fn with_defaults() -> Self {
        let mut registry = Self {
            by_name: HashMap::with_capacity(DEFAULT_NAMES.len()),
            names: Vec::with_capacity(DEFAULT_NAMES.len()),
        };
        for name in DEFAULT_NAMES {
            registry.register(name);
        }
        registry
    }

    /// Register a material name, returning its id. Re-registering an
    /// existing name returns the existing id.
    pub fn register(&mut self, name: &str) -> MaterialId {
        let normalized = name.trim().to_ascii_lowercase();
        if let Some(&id) = self.by_name.get(&normalized) {
            return id;
        }
        let id = MaterialId(u16::try_from(self.names.len()).unwrap_or(u16::MAX));
        self.by_name.insert(normalized.clone(), id);
        self.names.push(normalized);
        id
    }

    /// Resolve a canonical name to its id, if registered.
    /// Lookup is case-insensitive.
    pub fn resolve(&self, name: &str) -> Option<MaterialId> {
        self.by_name.get(&name.trim().to_ascii_lowercase()).copied()
    }

    /// The canonical name of an id, if registered.
    pub fn name_of(&self, id: MaterialId) -> Option<&str> {
        self.names.get(id.0 as usize).map(String::as_str)
    }

    /// Number of registered materials, including air.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the registry holds only air.
    pub fn is_empty(&self) -> bool {
        self.names.len() <= 1
    }

    /// Sorted canonical names for a set of ids, for reporting.
    pub fn sorted_names(&self, set: &MaterialSet) -> Vec<String> {
        let mut names: Vec<String> = set
            .iter()
            .filter_map(|&id| self.name_of(id).map(str::to_owned))
            .collect();
        names.sort_unstable();
        names
    }
}

impl Default for MaterialRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn air_is_id_zero() {
        let registry = MaterialRegistry::with_defaults();
        assert_eq!(registry.resolve("air"), Some(AIR));
        assert!(AIR.is_air());
    }

    #[test]
    fn defaults_cover_road_surfaces() {
        let registry = MaterialRegistry::with_defaults();
        assert!(registry.resolve("stone_bricks").is_some());
        assert!(registry.resolve("dirt_path").is_some());
        assert!(registry.resolve("cobblestone_stairs").is_some());
        assert!(registry.resolve("obsidian").is_none());
    }

    #[test]
    fn resolve_is_case_insensitive() {
        let registry = MaterialRegistry::with_defaults();
        assert_eq!(
            registry.resolve("STONE_BRICKS"),
            registry.resolve("stone_bricks")
        );
        assert_eq!(registry.resolve("  Gravel "), registry.resolve("gravel"));
    }

    #[test]
    fn register_is_idempotent() {
        let mut registry = MaterialRegistry::new();
        let first = registry.register("basalt");
        let second = registry.register("Basalt");
        assert_eq!(first, second);
        assert_eq!(registry.name_of(first), Some("basalt"));
    }

    #[test]
    fn sorted_names_orders_alphabetically() {
        let registry = MaterialRegistry::with_defaults();
        let mut set = MaterialSet::new();
        set.insert(registry.resolve("stone_bricks").unwrap());
        set.insert(registry.resolve("cobblestone").unwrap());
        let names = registry.sorted_names(&set);
        assert_eq!(names, vec!["cobblestone", "stone_bricks"]);
    }
}
