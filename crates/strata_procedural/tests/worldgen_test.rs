//! # World Generation Tests
//!
//! Determinism, cave density, coordinate mapping, sparsity and biome
//! blending across whole chunks.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use strata_core::{BlockId, BlockRegistry};
use strata_procedural::{
    Biome, BiomeSelector, BiomeSettings, Chunk, ChunkPayload, ChunkPos, WorldGenConfig, WorldGenerator, WorldSeed,
};

fn assert_chunks_identical(a: &Chunk, b: &Chunk) {
    for y in 0..256 {
        for z in 0..16 {
            for x in 0..16 {
                assert_eq!(
                    a.get_block(x, y, z).unwrap(),
                    b.get_block(x, y, z).unwrap(),
                    "Mismatch at ({x}, {y}, {z})"
                );
            }
        }
    }
}

/// Test: Two independently built generators agree block for block.
#[test]
fn test_generation_is_deterministic() {
    let registry = BlockRegistry::with_defaults();

    for seed in [0, 42, -7, i64::MAX] {
        let first = WorldGenerator::with_biomes(WorldSeed::new(seed), &registry).unwrap();
        let second = WorldGenerator::with_biomes(WorldSeed::new(seed), &registry).unwrap();

        for pos in [ChunkPos::new(0, 0, 0), ChunkPos::new(-3, 0, 11), ChunkPos::new(1000, 0, -1000)] {
            assert_chunks_identical(&first.generate(pos), &second.generate(pos));
        }
    }
}

/// Test: Generation order does not change the result.
#[test]
fn test_generation_order_independent() {
    let registry = BlockRegistry::with_defaults();
    let generator = WorldGenerator::new(WorldSeed::new(42), &registry).unwrap();
    let target = ChunkPos::new(5, 0, 5);

    let fresh = generator.generate(target);
    for x in 0..4 {
        let _ = generator.generate(ChunkPos::new(x, 0, -x));
    }
    assert_chunks_identical(&fresh, &generator.generate(target));
}

/// Test: Different seeds produce different terrain.
#[test]
fn test_seeds_differ() {
    let registry = BlockRegistry::with_defaults();
    let a = WorldGenerator::new(WorldSeed::new(1), &registry).unwrap();
    let b = WorldGenerator::new(WorldSeed::new(2), &registry).unwrap();

    let heights = |g: &WorldGenerator| (0..64).map(|x| g.terrain().height(x * 16, 0)).collect::<Vec<_>>();
    assert_ne!(heights(&a), heights(&b));
}

/// Test: Seed 42 caves hollow out 20-40% of the deep band.
#[test]
fn test_cave_density_bound() {
    let registry = BlockRegistry::with_defaults();
    let generator = WorldGenerator::new(WorldSeed::new(42), &registry).unwrap();

    let mut air = 0usize;
    let mut total = 0usize;
    for cx in 0..10 {
        let chunk = generator.generate(ChunkPos::new(cx, 0, 0));
        for y in 1..8 {
            for z in 0..16 {
                for x in 0..16 {
                    total += 1;
                    if chunk.get_block(x, y, z).unwrap().is_air() {
                        air += 1;
                    }
                }
            }
        }
    }

    let fraction = air as f64 / total as f64;
    println!("Cave air fraction: {:.3}", fraction);
    assert!(
        (0.20..=0.40).contains(&fraction),
        "Cave air fraction out of bounds: {fraction:.3}"
    );
}

/// Test: Chunk coordinates survive a world-position round trip.
#[test]
fn test_chunk_pos_round_trip() {
    assert_eq!(ChunkPos::from_world_pos(-16, 0, 0).x, -1);
    assert_eq!(ChunkPos::from_world_pos(-17, 0, 0).x, -2);
    assert_eq!(ChunkPos::from_world_pos(-1, -1, -1), ChunkPos::new(-1, -1, -1));
    assert_eq!(ChunkPos::from_world_pos(15, 255, 15), ChunkPos::new(0, 0, 0));
    assert_eq!(ChunkPos::from_world_pos(16, 256, 16), ChunkPos::new(1, 1, 1));

    let mut rng = ChaCha8Rng::seed_from_u64(0x5EED);
    for _ in 0..10_000 {
        let pos = ChunkPos::new(
            rng.gen_range(-1_000_000..1_000_000),
            rng.gen_range(-1000..1000),
            rng.gen_range(-1_000_000..1_000_000),
        );
        let (wx, wy, wz) = pos.to_world_pos();
        assert_eq!(ChunkPos::from_world_pos(wx, wy, wz), pos);
        assert_eq!(ChunkPos::from_world_pos(wx + 15, wy + 255, wz + 15), pos);
    }
}

/// Test: Filling and clearing a section leaves no storage behind.
#[test]
fn test_section_sparsity() {
    let mut chunk = Chunk::new(ChunkPos::new(0, 0, 0));
    for y in 32..48 {
        for z in 0..16 {
            for x in 0..16 {
                chunk.set_block(x, y, z, BlockId::STONE).unwrap();
            }
        }
    }
    assert!(!chunk.section(2).unwrap().is_empty());

    for y in 32..48 {
        for z in 0..16 {
            for x in 0..16 {
                chunk.set_block(x, y, z, BlockId::AIR).unwrap();
            }
        }
    }
    chunk.optimize();

    assert!(chunk.section(2).unwrap().is_empty());
    assert!(chunk.is_empty());
    assert_eq!(chunk.allocated_sections(), 0);
}

/// Test: Generated chunks keep sections above the terrain unallocated.
#[test]
fn test_generated_chunks_are_sparse() {
    let registry = BlockRegistry::with_defaults();
    let generator = WorldGenerator::with_biomes(WorldSeed::new(42), &registry).unwrap();

    for x in -4..4 {
        let chunk = generator.generate(ChunkPos::new(x, 0, 3));
        assert!(chunk.allocated_sections() < 16);
        assert!(chunk.section(15).unwrap().is_empty());
        assert!(chunk.memory_usage() < 16 * 4096);
    }
}

/// Test: Adjacent columns across a biome border differ less than the
/// raw offsets of the two biomes.
#[test]
fn test_biome_blending_continuity() {
    let settings = BiomeSettings {
        scale: 1.0,
        blending: true,
        blend_radius: 8,
    };
    let selector = BiomeSelector::with_settings(WorldSeed::new(42), settings);

    let mut borders = 0;
    for x in 0..3000 {
        let (a, b) = (selector.biome_at(x, 0), selector.biome_at(x + 1, 0));
        let raw = (a.height_offset() - b.height_offset()).abs();
        if a == b || raw == 0 {
            continue;
        }
        borders += 1;

        let blended = (selector.blended_height(x, 0, 64) - selector.blended_height(x + 1, 0, 64)).abs();
        assert!(
            blended < raw,
            "Border {a} -> {b} at x={x}: blended step {blended} >= raw step {raw}"
        );
    }
    assert!(borders > 0, "No biome border crossed");
}

/// Test: A large area is not a single biome.
#[test]
fn test_biome_variety() {
    let selector = BiomeSelector::with_settings(
        WorldSeed::new(42),
        BiomeSettings {
            scale: 1.0,
            ..BiomeSettings::default()
        },
    );

    let mut seen = [false; 5];
    for z in (-2000..2000).step_by(40) {
        for x in (-2000..2000).step_by(40) {
            seen[selector.biome_at(x, z).index()] = true;
        }
    }
    let found = seen.iter().filter(|&&s| s).count();
    println!("Biomes found: {found} / {}", Biome::ALL.len());
    assert!(found >= 2, "Too little biome variety: {found}");
    assert!(seen[Biome::Plains.index()]);
}

/// Test: A config file drives the same world as the equivalent constructor.
#[test]
fn test_config_matches_constructor() {
    let registry = BlockRegistry::with_defaults();
    let config = WorldGenConfig::from_toml_str(
        r#"
        seed = 42
        enable_biomes = true
        enable_caves = true
        "#,
    )
    .unwrap();

    let from_config = WorldGenerator::from_config(&config, &registry).unwrap();
    let direct = WorldGenerator::with_biomes(WorldSeed::new(42), &registry).unwrap();
    let pos = ChunkPos::new(2, 0, -2);
    assert_chunks_identical(&from_config.generate(pos), &direct.generate(pos));
}

/// Test: A config that only sets the seed builds the default generator.
#[test]
fn test_minimal_config_matches_default_generator() {
    let registry = BlockRegistry::with_defaults();
    let config = WorldGenConfig::from_toml_str("seed = 42").unwrap();

    let from_config = WorldGenerator::from_config(&config, &registry).unwrap();
    let direct = WorldGenerator::new(WorldSeed::new(42), &registry).unwrap();
    assert_eq!(from_config.caves_enabled(), direct.caves_enabled());

    let pos = ChunkPos::new(0, 0, 0);
    let (a, b) = (from_config.generate(pos), direct.generate(pos));
    assert_eq!(a.block_count(), b.block_count());
    assert_chunks_identical(&a, &b);
}

/// Test: A generated chunk survives a compressed payload round trip.
#[test]
fn test_payload_preserves_generated_chunk() {
    let registry = BlockRegistry::with_defaults();
    let generator = WorldGenerator::with_biomes(WorldSeed::new(9), &registry).unwrap();
    let chunk = generator.generate(ChunkPos::new(-2, 0, 7));

    let payload = ChunkPayload::encode(&chunk);
    let compressed = payload.compress();
    println!("Compressed payload: {} bytes", compressed.len());

    let restored = ChunkPayload::decompress(chunk.pos(), &compressed, payload.checksum())
        .and_then(|p| p.decode())
        .unwrap();
    assert_chunks_identical(&chunk, &restored);
    assert_eq!(restored.allocated_sections(), chunk.allocated_sections());
}
