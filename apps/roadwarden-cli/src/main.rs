//! Store administration tool for roadwarden.
//!
//! # Usage
//!
//! ```bash
//! roadwarden-cli [--config PATH] <command>
//! ```
//!
//! Commands: `status`, `materials`, `verify`, `compact`,
//! `convert <kind> <path>`, `reset --yes`, `help`.

mod settings;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use hashbrown::HashMap;
use roadwarden_core::WorldId;
use roadwarden_store::{open_store, BlockStore, FileStore, StoreKind};
use roadwarden_world::{MaterialRegistry, RoadMaterials};
use tracing::error;
use tracing_subscriber::EnvFilter;

use settings::Settings;

/// Default settings file next to the working directory.
const DEFAULT_CONFIG: &str = "roadwarden.toml";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<()> {
    let mut config_path = PathBuf::from(DEFAULT_CONFIG);
    let mut rest: Vec<&str> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 >= args.len() {
                    bail!("--config requires a path");
                }
                config_path = PathBuf::from(&args[i + 1]);
                i += 1;
            }
            other => rest.push(other),
        }
        i += 1;
    }

    let Some(&command) = rest.first() else {
        print_help();
        return Ok(());
    };

    let settings = Settings::load_or_create(&config_path)?;

    match command {
        "status" => cmd_status(&settings),
        "materials" => cmd_materials(&settings),
        "verify" => cmd_verify(&settings),
        "compact" => cmd_compact(&settings),
        "convert" => cmd_convert(&settings, &rest[1..]),
        "reset" => cmd_reset(&settings, &rest[1..]),
        "help" => {
            print_help();
            Ok(())
        }
        other => {
            print_help();
            bail!("unknown command: {other}");
        }
    }
}

fn print_help() {
    println!("roadwarden-cli - administer the protected road block store");
    println!();
    println!("Usage: roadwarden-cli [--config PATH] <command>");
    println!();
    println!("Commands:");
    println!("  status                 show store and settings summary");
    println!("  materials              list the configured road materials");
    println!("  verify                 replay the store and report per-world counts");
    println!("  compact                rewrite the file store as one snapshot");
    println!("  convert <kind> <path>  copy all records into another store");
    println!("  reset --yes            destroy the persisted store");
    println!("  help                   show this message");
}

fn open_configured(settings: &Settings) -> Result<Box<dyn BlockStore>> {
    let kind = settings.store_kind()?;
    open_store(kind, Path::new(&settings.store.path))
        .with_context(|| format!("cannot open {kind} store at {}", settings.store.path))
}

fn cmd_status(settings: &Settings) -> Result<()> {
    let store = open_configured(settings)?;
    println!("store kind:      {}", store.kind());
    println!("store path:      {}", settings.store.path);
    println!("store exists:    {}", store.exists());
    println!("protected:       {} blocks", store.count());
    println!("spread distance: {}", settings.spread_distance);
    println!("fill budget:     {}", settings.fill_budget);
    println!("no-place height: {}", settings.no_place_height);
    println!("on-road height:  {}", settings.on_road_height);
    store.close()?;
    Ok(())
}

fn cmd_materials(settings: &Settings) -> Result<()> {
    let registry = MaterialRegistry::with_defaults();
    let classifier = RoadMaterials::from_entries(&settings.materials, &registry);
    let names = registry.sorted_names(&classifier.snapshot());
    println!("Configured materials ({}):", names.len());
    for name in names {
        println!("  {name}");
    }
    Ok(())
}

fn cmd_verify(settings: &Settings) -> Result<()> {
    let store = open_configured(settings)?;
    let mut per_world: HashMap<WorldId, usize> = HashMap::new();
    for loc in store.select_all() {
        *per_world.entry(loc.world).or_default() += 1;
    }
    println!("store verified: {} blocks", store.count());
    let mut worlds: Vec<_> = per_world.into_iter().collect();
    worlds.sort_by(|a, b| a.0.cmp(&b.0));
    for (world, count) in worlds {
        println!("  {world}: {count}");
    }
    store.close()?;
    Ok(())
}

fn cmd_compact(settings: &Settings) -> Result<()> {
    if settings.store_kind()? != StoreKind::File {
        bail!("compact only applies to the file store");
    }
    let store = FileStore::open(Path::new(&settings.store.path))?;
    let before = store.count();
    store.compact()?;
    store.close()?;
    println!("compacted {} blocks", before);
    Ok(())
}

fn cmd_convert(settings: &Settings, args: &[&str]) -> Result<()> {
    let [kind, path] = args else {
        bail!("usage: convert <kind> <path>");
    };
    let target_kind: StoreKind = kind.parse()?;
    if *path == settings.store.path {
        bail!("conversion target must differ from the current store path");
    }

    let source = open_configured(settings)?;
    let records = source.select_all();
    source.close()?;

    let target = open_store(target_kind, Path::new(path))
        .with_context(|| format!("cannot open {target_kind} store at {path}"))?;
    let copied = target.insert_many(&records)?;
    target.sync()?;
    target.close()?;

    println!("converted {copied} blocks to {target_kind} store at {path}");
    Ok(())
}

fn cmd_reset(settings: &Settings, args: &[&str]) -> Result<()> {
    if !args.contains(&"--yes") {
        bail!("reset destroys the persisted store; pass --yes to confirm");
    }
    let store = open_configured(settings)?;
    let count = store.count();
    store.destroy().context("cannot destroy store")?;
    println!("destroyed store with {count} blocks");
    Ok(())
}
