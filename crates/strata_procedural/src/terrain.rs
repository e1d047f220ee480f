//! # Terrain Generation
//!
//! Turns a 2D height field into filled block columns.
//!
//! ## Column Layout
//!
//! For a column of height `h` (world Y of the first air block):
//!
//! | World Y | Block |
//! |---------|-------|
//! | `h - 1` | surface |
//! | `h - 4 .. h - 1` | subsurface |
//! | `0 .. h - 4` | stone |
//!
//! Only the part of the column inside the chunk's vertical span is
//! visited; the air above the surface is never touched.

use serde::{Deserialize, Serialize};
use strata_core::{BlockId, BlockRegistry, StrataResult};

use crate::biome::{Biome, BiomeSelector, BiomeSettings};
use crate::chunk::{Chunk, CHUNK_HEIGHT, CHUNK_SIZE};
use crate::noise::{NoiseKind, NoiseSource, WorldSeed};
use crate::octave::{OctaveNoise, OctaveSettings};

/// Lowest column height.
pub const MIN_HEIGHT: i32 = 1;

/// Highest column height.
pub const MAX_HEIGHT: i32 = CHUNK_HEIGHT as i32;

/// Seed offset of the biome selector relative to the world seed.
pub const BIOME_SEED_OFFSET: i64 = 300;

/// Terrain parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainSettings {
    /// Height noise algorithm.
    pub noise: NoiseKind,
    /// Height at noise value 0.
    pub base_height: i32,
    /// Height change at noise value +-1.
    pub height_variation: i32,
    /// Nominal sea level (informational; no water is placed).
    pub sea_level: i32,
    /// Height noise octaves.
    pub octaves: OctaveSettings,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            noise: NoiseKind::Perlin,
            base_height: 64,
            height_variation: 32,
            sea_level: 62,
            octaves: OctaveSettings::default(),
        }
    }
}

/// Blocks used to fill one column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnPalette {
    /// Top block.
    pub surface: BlockId,
    /// Three blocks under the top.
    pub subsurface: BlockId,
    /// Everything below.
    pub stone: BlockId,
}

impl ColumnPalette {
    /// Palette of a biome.
    #[must_use]
    pub const fn of_biome(biome: Biome) -> Self {
        Self {
            surface: biome.surface_block(),
            subsurface: biome.subsurface_block(),
            stone: biome.stone_block(),
        }
    }

    /// Block at world Y in a column of the given height.
    #[inline]
    #[must_use]
    pub const fn block_at(&self, world_y: i32, height: i32) -> BlockId {
        if world_y < height - 4 {
            self.stone
        } else if world_y < height - 1 {
            self.subsurface
        } else {
            self.surface
        }
    }
}

/// Height-field terrain generator.
#[derive(Clone)]
pub struct TerrainGenerator {
    noise: OctaveNoise<NoiseSource>,
    settings: TerrainSettings,
    biomes: Option<BiomeSelector>,
    /// Palette used when biomes are disabled.
    default_palette: ColumnPalette,
}

impl TerrainGenerator {
    /// Creates a generator without biomes, with default settings.
    ///
    /// # Errors
    ///
    /// Returns `UnknownBlock` if `grass`, `dirt` or `stone` is not registered.
    pub fn new(seed: WorldSeed, registry: &BlockRegistry) -> StrataResult<Self> {
        Self::with_settings(seed, TerrainSettings::default(), None, registry)
    }

    /// Creates a biome-aware generator with default settings.
    ///
    /// The biome selector uses `seed + 300`.
    ///
    /// # Errors
    ///
    /// Returns an error if any biome block is not registered.
    pub fn with_biomes(seed: WorldSeed, registry: &BlockRegistry) -> StrataResult<Self> {
        Self::with_settings(
            seed,
            TerrainSettings::default(),
            Some(BiomeSettings::default()),
            registry,
        )
    }

    /// Creates a generator.
    ///
    /// # Arguments
    ///
    /// * `seed` - Height noise seed
    /// * `settings` - Terrain parameters
    /// * `biomes` - Biome selector parameters, or `None` to disable biomes
    /// * `registry` - Registry the palette blocks are checked against
    ///
    /// # Errors
    ///
    /// - `UnknownBlock` if the default palette names are not registered
    /// - `UnknownBlockId` if biomes are enabled and a biome block is not registered
    pub fn with_settings(
        seed: WorldSeed,
        settings: TerrainSettings,
        biomes: Option<BiomeSettings>,
        registry: &BlockRegistry,
    ) -> StrataResult<Self> {
        let default_palette = ColumnPalette {
            surface: registry.id_of("grass")?,
            subsurface: registry.id_of("dirt")?,
            stone: registry.id_of("stone")?,
        };

        if biomes.is_some() {
            for biome in Biome::ALL {
                registry.require(biome.surface_block())?;
                registry.require(biome.subsurface_block())?;
                registry.require(biome.stone_block())?;
            }
        }

        Ok(Self {
            noise: OctaveNoise::new(settings.noise.build(seed), settings.octaves),
            settings,
            biomes: biomes.map(|b| BiomeSelector::with_settings(seed.offset(BIOME_SEED_OFFSET), b)),
            default_palette,
        })
    }

    /// Column height at a world position: the world Y of the first air block.
    ///
    /// Always within `[1, 256]`.
    #[must_use]
    pub fn height(&self, world_x: i32, world_z: i32) -> i32 {
        let noise = self.noise.sample_2d(f64::from(world_x), f64::from(world_z));
        let mut height = (f64::from(self.settings.base_height)
            + noise * f64::from(self.settings.height_variation)) as i32;

        if let Some(biomes) = &self.biomes {
            height = biomes.blended_height(world_x, world_z, height);
        }

        height.clamp(MIN_HEIGHT, MAX_HEIGHT)
    }

    /// Biome at a world column, if biomes are enabled.
    #[must_use]
    pub fn biome_at(&self, world_x: i32, world_z: i32) -> Option<Biome> {
        self.biomes.as_ref().map(|b| b.biome_at(world_x, world_z))
    }

    /// Column palette at a world column.
    #[must_use]
    pub fn palette_at(&self, world_x: i32, world_z: i32) -> ColumnPalette {
        self.biome_at(world_x, world_z)
            .map_or(self.default_palette, ColumnPalette::of_biome)
    }

    /// Fills the chunk's columns up to the terrain height.
    ///
    /// # Returns
    ///
    /// Number of blocks written.
    pub fn generate_terrain(&self, chunk: &mut Chunk) -> usize {
        let (chunk_x, chunk_y, chunk_z) = chunk.pos().to_world_pos();
        let mut written = 0;

        for x in 0..CHUNK_SIZE {
            for z in 0..CHUNK_SIZE {
                let world_x = chunk_x + x as i32;
                let world_z = chunk_z + z as i32;
                let height = self.height(world_x, world_z);

                // World floor is Y 0; nothing at or above `height`
                let y_start = (-chunk_y).max(0);
                let y_end = (height - 1 - chunk_y).min(CHUNK_HEIGHT as i32 - 1);
                if y_end < y_start {
                    continue;
                }

                let palette = self.palette_at(world_x, world_z);
                for y in y_start..=y_end {
                    let block = palette.block_at(chunk_y + y, height);
                    chunk.set_local(x, y as usize, z, block);
                    written += 1;
                }
            }
        }

        written
    }

    /// Terrain parameters.
    #[must_use]
    pub const fn settings(&self) -> &TerrainSettings {
        &self.settings
    }

    /// Nominal sea level.
    #[must_use]
    pub const fn sea_level(&self) -> i32 {
        self.settings.sea_level
    }

    /// Biome selector, if biomes are enabled.
    #[must_use]
    pub const fn biome_selector(&self) -> Option<&BiomeSelector> {
        self.biomes.as_ref()
    }

    /// Height noise seed.
    #[must_use]
    pub fn seed(&self) -> WorldSeed {
        self.noise.seed()
    }
}
