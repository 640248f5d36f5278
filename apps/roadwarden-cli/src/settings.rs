//! TOML settings file for the CLI.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use roadwarden_core::constants::{
    DEFAULT_CHECK_DEPTH, DEFAULT_FILL_BUDGET, DEFAULT_SPREAD_DISTANCE,
};
use roadwarden_store::StoreKind;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Store section of the settings file.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Backend kind: "file" or "memory"
    pub kind: String,
    /// Path of the backing file (file backend only)
    pub path: String,
}

/// Complete settings file.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Road-eligible material entries; an optional `:qualifier` suffix is
    /// ignored
    pub materials: Vec<String>,
    /// Maximum fill spread distance in blocks
    pub spread_distance: i64,
    /// Processed-node budget per fill
    pub fill_budget: usize,
    /// Depth of the road-below check used to block placement near roads
    pub no_place_height: i32,
    /// Depth of the road-below check used for on-road player effects
    pub on_road_height: i32,
    /// Store backend selection
    pub store: StoreSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            materials: vec![
                "dirt_path".into(),
                "gravel".into(),
                "cobblestone".into(),
                "mossy_cobblestone".into(),
                "cobblestone_slab".into(),
                "cobblestone_stairs".into(),
                "stone_bricks".into(),
                "mossy_stone_bricks".into(),
                "cracked_stone_bricks".into(),
                "stone_brick_slab".into(),
                "stone_brick_stairs".into(),
                "smooth_stone".into(),
                "smooth_stone_slab".into(),
            ],
            spread_distance: DEFAULT_SPREAD_DISTANCE,
            fill_budget: DEFAULT_FILL_BUDGET,
            no_place_height: 3,
            on_road_height: DEFAULT_CHECK_DEPTH,
            store: StoreSettings {
                kind: "file".into(),
                path: "roadwarden.rwb".into(),
            },
        }
    }
}

impl Settings {
    /// Load settings from `path`, creating the file with defaults when it
    /// does not exist.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("cannot read settings at {}", path.display()))?;
            toml::from_str(&raw)
                .with_context(|| format!("cannot parse settings at {}", path.display()))
        } else {
            let settings = Self::default();
            let raw = toml::to_string_pretty(&settings).context("cannot serialize defaults")?;
            fs::write(path, raw)
                .with_context(|| format!("cannot write settings to {}", path.display()))?;
            info!(path = %path.display(), "created default settings file");
            Ok(settings)
        }
    }

    /// The configured store kind.
    pub fn store_kind(&self) -> Result<StoreKind> {
        Ok(self.store.kind.parse()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("roadwarden-settings-{nanos}.toml"))
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let path = temp_path();
        let settings = Settings::load_or_create(&path).unwrap();
        assert!(path.exists());
        assert_eq!(settings.spread_distance, DEFAULT_SPREAD_DISTANCE);
        assert_eq!(settings.store_kind().unwrap(), StoreKind::File);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn written_defaults_round_trip() {
        let path = temp_path();
        Settings::load_or_create(&path).unwrap();
        let reloaded = Settings::load_or_create(&path).unwrap();
        assert_eq!(reloaded.materials, Settings::default().materials);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let path = temp_path();
        fs::write(&path, "spread_distance = 25\n").unwrap();
        let settings = Settings::load_or_create(&path).unwrap();
        assert_eq!(settings.spread_distance, 25);
        assert_eq!(settings.no_place_height, 3);
        fs::remove_file(&path).unwrap();
    }
}
