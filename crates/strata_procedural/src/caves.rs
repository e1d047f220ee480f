//! # Cave Carving
//!
//! Removes blocks where 3D noise exceeds a threshold, inside a fixed
//! height band. Runs after terrain fill; it only ever turns solid blocks
//! into air.

use serde::{Deserialize, Serialize};
use strata_core::BlockId;

use crate::chunk::{Chunk, CHUNK_HEIGHT, CHUNK_SIZE};
use crate::noise::{NoiseKind, NoiseSource, WorldSeed};
use crate::octave::{OctaveNoise, OctaveSettings};

/// Seed offset of the cave noise relative to the world seed.
pub const CAVE_SEED_OFFSET: i64 = 1;

/// Cave parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaveSettings {
    /// Cave noise algorithm.
    pub noise: NoiseKind,
    /// Density above which a block is carved, in [0, 1].
    pub threshold: f64,
    /// Lowest carved world Y (never below 1).
    pub min_height: i32,
    /// Highest carved world Y.
    pub max_height: i32,
    /// Cave noise octaves.
    pub octaves: OctaveSettings,
}

impl Default for CaveSettings {
    fn default() -> Self {
        Self {
            noise: NoiseKind::Simplex,
            threshold: 0.6,
            min_height: 1,
            max_height: 120,
            octaves: OctaveSettings::new(3, 0.05, 1.0, 2.0, 0.5),
        }
    }
}

/// 3D noise cave carver.
#[derive(Clone)]
pub struct CaveGenerator {
    noise: OctaveNoise<NoiseSource>,
    settings: CaveSettings,
}

impl CaveGenerator {
    /// Creates a carver with default settings.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self::with_settings(seed, CaveSettings::default())
    }

    /// Creates a carver.
    #[must_use]
    pub fn with_settings(seed: WorldSeed, settings: CaveSettings) -> Self {
        Self {
            noise: OctaveNoise::new(settings.noise.build(seed), settings.octaves),
            settings,
        }
    }

    /// Lowest world Y that can be carved. World Y 0 is the floor.
    #[inline]
    fn lowest(&self) -> i32 {
        self.settings.min_height.max(1)
    }

    /// Cave density at a world position, in [0, 1].
    #[inline]
    #[must_use]
    pub fn density(&self, world_x: i32, world_y: i32, world_z: i32) -> f64 {
        let noise = self
            .noise
            .sample_3d(f64::from(world_x), f64::from(world_y), f64::from(world_z));
        (noise + 1.0) * 0.5
    }

    /// Whether the block at a world position is carved.
    #[must_use]
    pub fn should_carve(&self, world_x: i32, world_y: i32, world_z: i32) -> bool {
        if world_y < self.lowest() || world_y > self.settings.max_height {
            return false;
        }
        self.density(world_x, world_y, world_z) > self.settings.threshold
    }

    /// Carves the chunk.
    ///
    /// Visits only the part of the cave band inside the chunk, Y innermost.
    /// Air is skipped without sampling noise.
    ///
    /// # Returns
    ///
    /// Number of blocks turned into air.
    pub fn carve_caves(&self, chunk: &mut Chunk) -> usize {
        let (chunk_x, chunk_y, chunk_z) = chunk.pos().to_world_pos();

        let y_start = (self.lowest() - chunk_y).max(0);
        let y_end = (self.settings.max_height - chunk_y).min(CHUNK_HEIGHT as i32 - 1);
        if y_end < y_start {
            return 0;
        }

        let mut carved = 0;
        for x in 0..CHUNK_SIZE {
            for z in 0..CHUNK_SIZE {
                let world_x = chunk_x + x as i32;
                let world_z = chunk_z + z as i32;
                for y in y_start..=y_end {
                    let ly = y as usize;
                    if chunk.get_local_or_air(x, ly, z).is_air() {
                        continue;
                    }
                    if self.density(world_x, chunk_y + y, world_z) > self.settings.threshold {
                        chunk.set_local(x, ly, z, BlockId::AIR);
                        carved += 1;
                    }
                }
            }
        }

        carved
    }

    /// Cave parameters.
    #[must_use]
    pub const fn settings(&self) -> &CaveSettings {
        &self.settings
    }

    /// Cave noise seed.
    #[must_use]
    pub fn seed(&self) -> WorldSeed {
        self.noise.seed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkPos;

    fn solid_chunk(pos: ChunkPos, top: usize) -> Chunk {
        let mut chunk = Chunk::new(pos);
        for y in 0..top {
            for z in 0..16 {
                for x in 0..16 {
                    chunk.set_local(x, y, z, BlockId::STONE);
                }
            }
        }
        chunk
    }

    #[test]
    fn test_band_limits() {
        let caves = CaveGenerator::new(WorldSeed::new(42));
        for x in 0..32 {
            for z in 0..32 {
                assert!(!caves.should_carve(x, 0, z), "World floor is never carved");
                assert!(!caves.should_carve(x, 121, z));
                assert!(!caves.should_carve(x, -5, z));
            }
        }
    }

    #[test]
    fn test_density_range() {
        let caves = CaveGenerator::new(WorldSeed::new(7));
        for i in 0..2000 {
            let d = caves.density(i, i % 120, -i);
            assert!((0.0..=1.0).contains(&d));
        }
    }

    #[test]
    fn test_carve_matches_should_carve() {
        let caves = CaveGenerator::new(WorldSeed::new(42));
        let mut chunk = solid_chunk(ChunkPos::new(1, 0, 1), 130);
        let before = chunk.block_count();
        let carved = caves.carve_caves(&mut chunk);

        assert!(carved > 0);
        assert_eq!(before - carved, chunk.block_count());

        let (cx, _, cz) = chunk.pos().to_world_pos();
        for x in 0..16 {
            for z in 0..16 {
                assert_eq!(chunk.get_block(x, 0, z).unwrap(), BlockId::STONE);
                for y in [1, 30, 60, 120, 125] {
                    let expected = if caves.should_carve(cx + x, y, cz + z) {
                        BlockId::AIR
                    } else {
                        BlockId::STONE
                    };
                    assert_eq!(chunk.get_block(x, y, z).unwrap(), expected);
                }
            }
        }
    }

    #[test]
    fn test_air_is_never_filled() {
        let caves = CaveGenerator::new(WorldSeed::new(3));
        let mut chunk = Chunk::new(ChunkPos::default());
        assert_eq!(caves.carve_caves(&mut chunk), 0);
        assert!(chunk.is_empty());
    }

    #[test]
    fn test_chunk_outside_band() {
        let caves = CaveGenerator::new(WorldSeed::new(3));
        let mut chunk = solid_chunk(ChunkPos::new(0, 1, 0), 16);
        assert_eq!(caves.carve_caves(&mut chunk), 0);
    }
}
