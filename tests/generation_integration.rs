//! Integration tests for tiered world generation
//!
//! These tests drive the generator the way a new game does:
//! - World tier determinism for a fixed seed
//! - Region and local tiers reproducible from tier RNG streams
//! - Playability of every generated local map (open borders, clear spawn)
//! - Resource nodes linked from their tiles

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use kingdom_builder::core::{GridPos, KingdomError};
use kingdom_builder::world::{
    LocalMap, LocalRequest, TerrainType, TieredWorldGenerator, LOCAL_SALT, REGION_SALT, SPAWN_RADIUS,
};

fn local_for(seed: u64, size: usize) -> LocalMap {
    let generator = TieredWorldGenerator::new(seed);
    let world = generator.generate_world_map(24, 24).unwrap();
    let start = TieredWorldGenerator::find_starting_location(&world, None, &mut ChaCha8Rng::seed_from_u64(seed));
    let tile = *world.at(start).unwrap();

    let mut region_rng = generator.tier_rng(REGION_SALT, start.x, start.y);
    let region = generator
        .generate_region_from_world_tile(&tile, 30, 30, &mut region_rng)
        .unwrap();

    let request = LocalRequest {
        chunk: GridPos::new(13, 13),
        chunk_width: 3,
        chunk_height: 3,
        width: size,
        height: size,
    };
    let mut local_rng = generator.tier_rng(LOCAL_SALT, 13, 13);
    generator.generate_local_map(&region, request, &mut local_rng).unwrap()
}

fn assert_playable(map: &LocalMap) {
    let (w, h) = (map.width(), map.height());
    for (x, y, tile) in map.tiles.cells() {
        if x == 0 || y == 0 || x == w - 1 || y == h - 1 {
            assert_ne!(tile.terrain, TerrainType::Water, "water on border at ({x}, {y})");
        }
    }

    let center = map.center();
    for dy in -SPAWN_RADIUS..=SPAWN_RADIUS {
        for dx in -SPAWN_RADIUS..=SPAWN_RADIUS {
            let pos = GridPos::new(center.x + dx, center.y + dy);
            let terrain = map.terrain_at(pos).unwrap();
            assert!(
                matches!(terrain, TerrainType::Grass | TerrainType::Dirt),
                "spawn tile {pos:?} is {terrain:?}"
            );
        }
    }
}

// ============================================================================
// World Tier
// ============================================================================

#[test]
fn test_world_tile_reproducible_for_seed() {
    let first = TieredWorldGenerator::new(12345).generate_world_map(100, 100).unwrap();
    let second = TieredWorldGenerator::new(12345).generate_world_map(100, 100).unwrap();

    let a = first.get(50, 50).unwrap();
    let b = second.get(50, 50).unwrap();
    assert_eq!(a.elevation.to_bits(), b.elevation.to_bits());
    assert_eq!(a.temperature.to_bits(), b.temperature.to_bits());
    assert_eq!(a.rainfall.to_bits(), b.rainfall.to_bits());
    assert_eq!(a.biome, b.biome);
    assert_eq!(first, second);
}

#[test]
fn test_different_seeds_differ() {
    let a = TieredWorldGenerator::new(1).generate_world_map(40, 40).unwrap();
    let b = TieredWorldGenerator::new(2).generate_world_map(40, 40).unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_zero_sized_request_is_precondition_error() {
    let generator = TieredWorldGenerator::new(5);
    assert!(matches!(
        generator.generate_world_map(0, 10),
        Err(KingdomError::InvalidRequest(_))
    ));
}

// ============================================================================
// Local Tier
// ============================================================================

#[test]
fn test_local_map_reproducible() {
    assert_eq!(local_for(777, 60), local_for(777, 60));
}

#[test]
fn test_local_map_playable_for_seed() {
    let map = local_for(12345, 100);
    assert_eq!(map.width(), 100);
    assert_playable(&map);
}

#[test]
fn test_resource_nodes_linked_and_fresh() {
    let map = local_for(4242, 80);
    for id in map.node_ids() {
        let node = map.node(id).unwrap();
        assert_eq!(map.tiles.at(node.position).and_then(|t| t.resource), Some(id));
        assert!(!node.is_depleted);
        assert!(!node.designated);
        assert_eq!(node.amount_remaining, node.max_amount);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_every_local_map_is_playable(seed in any::<u64>(), size in 20usize..60) {
        assert_playable(&local_for(seed, size));
    }
}
