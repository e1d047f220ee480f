//! # Biome Classification
//!
//! Determines terrain type from a two-channel climate model:
//! - Temperature (Perlin, seed + 100)
//! - Humidity (Perlin, seed + 200)
//!
//! Each biome sits at a fixed point in temperature-humidity space. A
//! location belongs to the biome nearest to its sampled climate.

use std::fmt;

use serde::{Deserialize, Serialize};
use strata_core::BlockId;

use crate::noise::{PerlinNoise, WorldSeed};
use crate::octave::OctaveNoise;

/// Biome types in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Biome {
    /// Temperate grassland
    Plains = 0,
    /// Hot and dry, sunk slightly below base height
    Desert = 1,
    /// Cold, slightly raised
    Snow = 2,
    /// Hot and humid
    Jungle = 3,
    /// Cool, high and rugged
    Mountains = 4,
}

impl Biome {
    /// All biomes in declaration order. Selection ties go to the earlier one.
    pub const ALL: [Self; 5] = [
        Self::Plains,
        Self::Desert,
        Self::Snow,
        Self::Jungle,
        Self::Mountains,
    ];

    /// Climate point `(temperature, humidity)` of this biome.
    #[must_use]
    pub const fn climate(self) -> (f64, f64) {
        match self {
            Self::Plains => (0.5, 0.5),
            Self::Desert => (0.9, 0.1),
            Self::Snow => (0.1, 0.5),
            Self::Jungle => (0.9, 0.9),
            Self::Mountains => (0.3, 0.4),
        }
    }

    /// Offset added to the base terrain height.
    #[must_use]
    pub const fn height_offset(self) -> i32 {
        match self {
            Self::Plains | Self::Jungle => 0,
            Self::Desert => -5,
            Self::Snow => 5,
            Self::Mountains => 20,
        }
    }

    /// Nominal height variation of the biome.
    #[must_use]
    pub const fn height_variation(self) -> i32 {
        match self {
            Self::Plains => 20,
            Self::Desert => 15,
            Self::Snow => 25,
            Self::Jungle => 30,
            Self::Mountains => 40,
        }
    }

    /// Block at the top of a column.
    #[must_use]
    pub const fn surface_block(self) -> BlockId {
        match self {
            Self::Plains => BlockId::GRASS,
            Self::Desert => BlockId::SAND,
            Self::Snow => BlockId::SNOW_BLOCK,
            Self::Jungle => BlockId::JUNGLE_GRASS,
            Self::Mountains => BlockId::STONE,
        }
    }

    /// Block in the three layers under the surface.
    #[must_use]
    pub const fn subsurface_block(self) -> BlockId {
        match self {
            Self::Plains | Self::Snow | Self::Jungle => BlockId::DIRT,
            Self::Desert => BlockId::SAND,
            Self::Mountains => BlockId::STONE,
        }
    }

    /// Block filling the rest of the column.
    #[must_use]
    pub const fn stone_block(self) -> BlockId {
        match self {
            Self::Desert => BlockId::SANDSTONE,
            _ => BlockId::STONE,
        }
    }

    /// Human readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Plains => "Plains",
            Self::Desert => "Desert",
            Self::Snow => "Snow",
            Self::Jungle => "Jungle",
            Self::Mountains => "Mountains",
        }
    }

    /// Stable index into [`Biome::ALL`].
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Biome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returns the biome nearest to a climate point.
///
/// Distance is Euclidean in temperature-humidity space. On an exact tie
/// the biome declared first wins.
#[must_use]
pub fn select_biome(temperature: f64, humidity: f64) -> Biome {
    let mut best = Biome::Plains;
    let mut best_distance = f64::MAX;

    for biome in Biome::ALL {
        let (t, h) = biome.climate();
        let dt = temperature - t;
        let dh = humidity - h;
        let distance = (dt * dt + dh * dh).sqrt();
        if distance < best_distance {
            best_distance = distance;
            best = biome;
        }
    }

    best
}

/// Biome selector parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomeSettings {
    /// Multiplier applied to world coordinates before climate sampling.
    pub scale: f64,
    /// Whether heights are smoothed across biome borders.
    pub blending: bool,
    /// Distance to the four blend samples.
    pub blend_radius: i32,
}

impl Default for BiomeSettings {
    fn default() -> Self {
        Self {
            scale: 0.002,
            blending: true,
            blend_radius: 8,
        }
    }
}

/// Biome selector that determines biome from world coordinates.
#[derive(Clone)]
pub struct BiomeSelector {
    seed: WorldSeed,
    temperature: OctaveNoise<PerlinNoise>,
    humidity: OctaveNoise<PerlinNoise>,
    settings: BiomeSettings,
}

impl BiomeSelector {
    /// Creates a selector with the default settings.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self::with_settings(seed, BiomeSettings::default())
    }

    /// Creates a selector.
    ///
    /// # Arguments
    ///
    /// * `seed` - Selector seed; climate channels use `seed + 100` and `seed + 200`
    /// * `settings` - Scale and blending parameters
    #[must_use]
    pub fn with_settings(seed: WorldSeed, settings: BiomeSettings) -> Self {
        Self {
            seed,
            temperature: OctaveNoise::with_defaults(PerlinNoise::new(seed.offset(100))),
            humidity: OctaveNoise::with_defaults(PerlinNoise::new(seed.offset(200))),
            settings,
        }
    }

    /// Temperature at a world column, in [0, 1].
    #[must_use]
    pub fn temperature(&self, world_x: i32, world_z: i32) -> f64 {
        let scale = self.settings.scale;
        let noise = self
            .temperature
            .sample_2d(f64::from(world_x) * scale, f64::from(world_z) * scale);
        (noise + 1.0) * 0.5
    }

    /// Humidity at a world column, in [0, 1].
    #[must_use]
    pub fn humidity(&self, world_x: i32, world_z: i32) -> f64 {
        let scale = self.settings.scale;
        let noise = self
            .humidity
            .sample_2d(f64::from(world_x) * scale, f64::from(world_z) * scale);
        (noise + 1.0) * 0.5
    }

    /// Biome at a world column.
    #[must_use]
    pub fn biome_at(&self, world_x: i32, world_z: i32) -> Biome {
        select_biome(self.temperature(world_x, world_z), self.humidity(world_x, world_z))
    }

    /// Terrain height adjusted for the local biome.
    ///
    /// Without blending this is `base + offset(center)`. With blending the
    /// center sample has weight 2 and the four samples at `blend_radius`
    /// along each axis have weight 1; the mean is rounded half-up.
    #[must_use]
    pub fn blended_height(&self, world_x: i32, world_z: i32, base_height: i32) -> i32 {
        let height = |x: i32, z: i32| base_height + self.biome_at(x, z).height_offset();

        if !self.settings.blending {
            return height(world_x, world_z);
        }

        let r = self.settings.blend_radius;
        let weighted = 2 * height(world_x, world_z)
            + height(world_x, world_z.saturating_add(r))
            + height(world_x, world_z.saturating_sub(r))
            + height(world_x.saturating_add(r), world_z)
            + height(world_x.saturating_sub(r), world_z);

        (f64::from(weighted) / 6.0 + 0.5).floor() as i32
    }

    /// Selector seed.
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// Selector parameters.
    #[must_use]
    pub const fn settings(&self) -> &BiomeSettings {
        &self.settings
    }
}
