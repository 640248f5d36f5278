//! Benchmarks for the fill loop and the per-tick road-below check.

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use roadwarden_core::{BlockLocation, BlockPos, WorldId};
use roadwarden_protect::{ProtectConfig, RoadManager};
use roadwarden_store::MemoryStore;
use roadwarden_world::{GridWorld, MaterialRegistry, RoadMaterials};

fn plateau_manager(side: i64) -> (RoadManager<GridWorld>, WorldId) {
    let registry = MaterialRegistry::with_defaults();
    let stone = registry.resolve("stone_bricks").unwrap();
    let world_id = WorldId::new("world");

    let mut world = GridWorld::new();
    world.fill_box(
        &world_id,
        BlockPos::new(0, 64, 0),
        BlockPos::new(side - 1, 64, side - 1),
        stone,
    );

    let materials = RoadMaterials::from_entries(["stone_bricks"], &registry);
    let manager = RoadManager::new(
        world,
        materials,
        Arc::new(MemoryStore::new()),
        ProtectConfig::default(),
    );
    (manager, world_id)
}

fn bench_fill(c: &mut Criterion) {
    let (manager, world_id) = plateau_manager(64);
    let seed = BlockLocation::new(world_id, BlockPos::new(32, 64, 32));

    c.bench_function("fill_64x64_plateau", |b| {
        b.iter(|| manager.find_connected_road(std::hint::black_box(&seed)));
    });
}

fn bench_road_below(c: &mut Criterion) {
    let (manager, world_id) = plateau_manager(64);
    let seed = BlockLocation::new(world_id.clone(), BlockPos::new(32, 64, 32));
    manager.protect_from_seed(&seed).unwrap();

    let above_road = BlockLocation::new(world_id.clone(), BlockPos::new(32, 66, 32));
    let off_road = BlockLocation::new(world_id, BlockPos::new(200, 66, 200));

    c.bench_function("road_below_hit", |b| {
        b.iter(|| manager.is_road_below(std::hint::black_box(&above_road), 5));
    });
    c.bench_function("road_below_miss", |b| {
        b.iter(|| manager.is_road_below(std::hint::black_box(&off_road), 5));
    });
}

criterion_group!(benches, bench_fill, bench_road_below);
criterion_main!(benches);
