//! # Greedy Meshing Tests
//!
//! Vertex reduction, face culling and meshing of generated terrain.

use strata_core::{BlockId, BlockRegistry};
use strata_procedural::{Chunk, ChunkManager, ChunkPos, WorldGenerator, WorldSeed};
use strata_rendering::{ChunkMesher, FnLookup, MeshCache, NoNeighbors, TextureAtlas};

fn mesher() -> ChunkMesher {
    let registry = BlockRegistry::with_defaults();
    let atlas = TextureAtlas::from_registry(&registry, 256, 256, 16).unwrap();
    ChunkMesher::new(&registry, &atlas)
}

fn fill(chunk: &mut Chunk, x: std::ops::Range<i32>, y: std::ops::Range<i32>, z: std::ops::Range<i32>, id: BlockId) {
    for by in y {
        for bz in z.clone() {
            for bx in x.clone() {
                chunk.set_block(bx, by, bz, id).unwrap();
            }
        }
    }
}

/// Test: A solid 16x16x32 region needs at least 90% fewer vertices than
/// one cube per block.
#[test]
fn test_greedy_reduction_on_solid_region() {
    let mut chunk = Chunk::new(ChunkPos::default());
    fill(&mut chunk, 0..16, 0..32, 0..16, BlockId::STONE);

    let mesh = mesher().mesh_chunk(&chunk, &NoNeighbors);
    let naive = 24 * 16 * 16 * 32;
    let reduction = 1.0 - mesh.vertex_count() as f64 / f64::from(naive);

    println!("Greedy vertices: {} (naive {naive}), reduction {:.4}", mesh.vertex_count(), reduction);
    assert!(reduction >= 0.90, "Reduction only {reduction:.4}");
    // Two sections: 4 sides x 2 + top + bottom
    assert_eq!(mesh.quad_count(), 10);
}

/// Test: Two touching blocks cost fewer vertices than two apart.
#[test]
fn test_adjacent_blocks_share_no_face() {
    let mesher = mesher();

    let mut adjacent = Chunk::new(ChunkPos::default());
    adjacent.set_block(5, 5, 5, BlockId::STONE).unwrap();
    adjacent.set_block(6, 5, 5, BlockId::STONE).unwrap();

    let mut isolated = Chunk::new(ChunkPos::default());
    isolated.set_block(2, 5, 5, BlockId::STONE).unwrap();
    isolated.set_block(9, 5, 5, BlockId::STONE).unwrap();

    let adjacent = mesher.mesh_chunk(&adjacent, &NoNeighbors).vertex_count();
    let isolated = mesher.mesh_chunk(&isolated, &NoNeighbors).vertex_count();
    assert!(adjacent < isolated, "{adjacent} >= {isolated}");
    assert_eq!(isolated, 48);
}

/// Test: A checkerboard cannot merge but is still meshed correctly.
#[test]
fn test_checkerboard_worst_case() {
    let mut chunk = Chunk::new(ChunkPos::default());
    for y in 0..16 {
        for z in 0..16 {
            for x in 0..16 {
                if (x + y + z) % 2 == 0 {
                    chunk.set_block(x, y, z, BlockId::STONE).unwrap();
                }
            }
        }
    }

    let mesher = mesher();
    let mesh = mesher.mesh_chunk(&chunk, &NoNeighbors);
    assert_eq!(mesh.quad_count(), mesher.count_visible_faces(&chunk, &NoNeighbors));
    assert_eq!(mesh.quad_count(), 2048 * 6);
}

/// Test: Greedy output never exceeds one quad per visible face.
#[test]
fn test_greedy_never_worse_than_faces() {
    let registry = BlockRegistry::with_defaults();
    let generator = WorldGenerator::with_biomes(WorldSeed::new(42), &registry).unwrap();
    let mesher = mesher();

    for x in 0..4 {
        let chunk = generator.generate(ChunkPos::new(x, 0, -x));
        let mesh = mesher.mesh_chunk(&chunk, &NoNeighbors);
        let faces = mesher.count_visible_faces(&chunk, &NoNeighbors);
        assert!(mesh.quad_count() < faces, "Terrain faces should merge");
    }
}

/// Test: Loaded neighbors hide border faces, unloaded ones do not.
#[test]
fn test_cross_chunk_culling_through_manager() {
    let registry = BlockRegistry::with_defaults();
    let manager = ChunkManager::new(WorldGenerator::new(WorldSeed::new(42), &registry).unwrap().with_caves(false));
    let mesher = mesher();
    let center = ChunkPos::new(0, 0, 0);

    manager.load_chunk(center);
    let alone = mesher.mesh_loaded(&manager, center).unwrap();

    for neighbor in center.face_neighbors() {
        manager.load_chunk(neighbor);
    }
    let surrounded = mesher.mesh_loaded(&manager, center).unwrap();

    println!("Vertices alone: {}, surrounded: {}", alone.vertex_count(), surrounded.vertex_count());
    assert!(surrounded.vertex_count() < alone.vertex_count());
    assert!(mesher.mesh_loaded(&manager, ChunkPos::new(9, 0, 9)).is_none());
}

/// Test: Hand-placed blocks in a manager without a generator cull across
/// the chunk border.
#[test]
fn test_hand_built_chunks_cull_across_border() {
    let manager = ChunkManager::empty();
    let mesher = mesher();
    let west = ChunkPos::new(0, 0, 0);
    let east = ChunkPos::new(1, 0, 0);

    manager.set_block(15, 10, 8, BlockId::STONE);
    // Neighbor not loaded: its face is drawn
    assert_eq!(mesher.mesh_loaded(&manager, west).unwrap().quad_count(), 6);

    manager.load_chunk(east);
    assert!(manager.get_chunk(east).unwrap().read().is_empty());
    assert_eq!(mesher.mesh_loaded(&manager, west).unwrap().quad_count(), 6);

    manager.set_block(16, 10, 8, BlockId::STONE);
    assert_eq!(mesher.mesh_loaded(&manager, west).unwrap().quad_count(), 5);
    assert_eq!(mesher.mesh_loaded(&manager, east).unwrap().quad_count(), 5);

    let mut dirty = manager.take_dirty();
    dirty.sort();
    assert_eq!(dirty, vec![west, east]);
}

/// Test: Glass next to stone shows both faces; glass next to glass none.
#[test]
fn test_transparent_neighbors() {
    let mesher = mesher();

    let mut mixed = Chunk::new(ChunkPos::default());
    mixed.set_block(4, 4, 4, BlockId::GLASS).unwrap();
    mixed.set_block(5, 4, 4, BlockId::STONE).unwrap();
    // Both sides of the shared face are drawn
    assert_eq!(mesher.count_visible_faces(&mixed, &NoNeighbors), 12);

    let mut panes = Chunk::new(ChunkPos::default());
    panes.set_block(4, 4, 4, BlockId::GLASS).unwrap();
    panes.set_block(5, 4, 4, BlockId::GLASS).unwrap();
    assert_eq!(mesher.count_visible_faces(&panes, &NoNeighbors), 10);
}

/// Test: Chunks stacked vertically cull against each other.
#[test]
fn test_vertical_neighbor_lookup() {
    let mut chunk = Chunk::new(ChunkPos::new(0, 1, 0));
    chunk.set_block(3, 0, 3, BlockId::DIRT).unwrap();

    let below_is_solid = FnLookup(|_: i32, y: i32, _: i32| Some(if y < 256 { BlockId::STONE } else { BlockId::AIR }));
    let mesh = mesher().mesh_chunk(&chunk, &below_is_solid);
    assert_eq!(mesh.quad_count(), 5);
}

/// Test: Editing a chunk and invalidating rebuilds its mesh.
#[test]
fn test_cache_invalidation_after_edit() {
    let registry = BlockRegistry::with_defaults();
    let manager = ChunkManager::new(WorldGenerator::new(WorldSeed::new(5), &registry).unwrap());
    let mesher = mesher();
    let cache = MeshCache::new();
    let pos = ChunkPos::new(0, 0, 0);
    manager.load_chunk(pos);

    let build = || mesher.mesh_loaded(&manager, pos).unwrap_or_default();
    let before = cache.get_or_build(pos, build);

    manager.set_block(8, 200, 8, BlockId::GLASS);
    for dirty in manager.take_dirty() {
        cache.invalidate_with_neighbors(dirty);
    }
    let after = cache.get_or_build(pos, build);

    assert_eq!(after.quad_count(), before.quad_count() + 6);
    assert_eq!(cache.misses(), 2);
}
