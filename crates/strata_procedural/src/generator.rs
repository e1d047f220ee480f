//! # World Generator
//!
//! Runs the per-chunk pipeline: terrain fill, cave carving, compaction.
//!
//! The generator is immutable after construction; one instance can be
//! shared by every generation thread.

use strata_core::{BlockRegistry, StrataResult};
use tracing::trace;

use crate::biome::BiomeSelector;
use crate::caves::{CaveGenerator, CAVE_SEED_OFFSET};
use crate::chunk::{Chunk, ChunkPos};
use crate::config::WorldGenConfig;
use crate::noise::WorldSeed;
use crate::terrain::TerrainGenerator;

/// What one `generate_chunk` call did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GenerationStats {
    /// Blocks written by terrain fill.
    pub placed: usize,
    /// Blocks removed by cave carving.
    pub carved: usize,
    /// Sections released by compaction.
    pub freed_sections: usize,
}

/// Deterministic chunk generator.
///
/// # Example
///
/// ```rust,ignore
/// let registry = BlockRegistry::with_defaults();
/// let generator = WorldGenerator::new(WorldSeed::new(42), &registry)?;
///
/// let chunk = generator.generate(ChunkPos::new(0, 0, 0));
/// assert!(!chunk.is_empty());
/// ```
#[derive(Clone)]
pub struct WorldGenerator {
    seed: WorldSeed,
    terrain: TerrainGenerator,
    caves: CaveGenerator,
    caves_enabled: bool,
}

impl WorldGenerator {
    /// Creates a generator with caves and without biomes.
    ///
    /// # Errors
    ///
    /// Returns an error if the default terrain blocks are not registered.
    pub fn new(seed: WorldSeed, registry: &BlockRegistry) -> StrataResult<Self> {
        Ok(Self {
            seed,
            terrain: TerrainGenerator::new(seed, registry)?,
            caves: CaveGenerator::new(seed.offset(CAVE_SEED_OFFSET)),
            caves_enabled: true,
        })
    }

    /// Creates a generator with caves and biomes.
    ///
    /// # Errors
    ///
    /// Returns an error if any biome block is not registered.
    pub fn with_biomes(seed: WorldSeed, registry: &BlockRegistry) -> StrataResult<Self> {
        Ok(Self {
            seed,
            terrain: TerrainGenerator::with_biomes(seed, registry)?,
            caves: CaveGenerator::new(seed.offset(CAVE_SEED_OFFSET)),
            caves_enabled: true,
        })
    }

    /// Creates a generator from a config.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the config does not validate, or the
    /// registry errors of the terrain generator.
    pub fn from_config(config: &WorldGenConfig, registry: &BlockRegistry) -> StrataResult<Self> {
        config.validate()?;
        let seed = config.seed;
        let biomes = config.enable_biomes.then_some(config.biomes);
        Ok(Self {
            seed,
            terrain: TerrainGenerator::with_settings(seed, config.terrain, biomes, registry)?,
            caves: CaveGenerator::with_settings(seed.offset(CAVE_SEED_OFFSET), config.caves),
            caves_enabled: config.enable_caves,
        })
    }

    /// Enables or disables cave carving.
    #[must_use]
    pub fn with_caves(mut self, enabled: bool) -> Self {
        self.caves_enabled = enabled;
        self
    }

    /// Generates into an existing chunk (normally empty).
    pub fn generate_chunk(&self, chunk: &mut Chunk) -> GenerationStats {
        let placed = self.terrain.generate_terrain(chunk);
        let carved = if self.caves_enabled {
            self.caves.carve_caves(chunk)
        } else {
            0
        };
        let freed_sections = chunk.optimize();

        trace!(
            pos = %chunk.pos(),
            placed,
            carved,
            freed_sections,
            sections = chunk.allocated_sections(),
            "chunk generated"
        );

        GenerationStats {
            placed,
            carved,
            freed_sections,
        }
    }

    /// Generates a new chunk.
    #[must_use]
    pub fn generate(&self, pos: ChunkPos) -> Chunk {
        let mut chunk = Chunk::new(pos);
        self.generate_chunk(&mut chunk);
        chunk
    }

    /// World seed.
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// Whether caves are carved.
    #[must_use]
    pub const fn caves_enabled(&self) -> bool {
        self.caves_enabled
    }

    /// Terrain stage.
    #[must_use]
    pub const fn terrain(&self) -> &TerrainGenerator {
        &self.terrain
    }

    /// Cave stage.
    #[must_use]
    pub const fn caves(&self) -> &CaveGenerator {
        &self.caves
    }

    /// Biome selector, if biomes are enabled.
    #[must_use]
    pub const fn biome_selector(&self) -> Option<&BiomeSelector> {
        self.terrain.biome_selector()
    }
}
