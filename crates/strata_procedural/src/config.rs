//! # World Generation Config
//!
//! TOML-backed parameters for [`WorldGenerator`](crate::WorldGenerator).
//! Every section is optional; missing values take the defaults.
//!
//! ```toml
//! seed = 42
//! enable_biomes = true
//! enable_caves = true
//!
//! [terrain]
//! noise = "perlin"
//! base_height = 64
//! height_variation = 32
//!
//! [caves]
//! threshold = 0.6
//! min_height = 1
//! max_height = 120
//!
//! [biomes]
//! scale = 0.002
//! blend_radius = 8
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use strata_core::{StrataError, StrataResult};

use crate::biome::BiomeSettings;
use crate::caves::CaveSettings;
use crate::noise::WorldSeed;
use crate::terrain::{TerrainSettings, MAX_HEIGHT};

/// World generation parameters.
///
/// Defaults match [`WorldGenerator::new`](crate::WorldGenerator::new):
/// caves on, biomes off.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldGenConfig {
    /// World seed.
    pub seed: WorldSeed,
    /// Biome-aware terrain.
    pub enable_biomes: bool,
    /// Cave carving.
    pub enable_caves: bool,
    /// Height field.
    pub terrain: TerrainSettings,
    /// Cave carving.
    pub caves: CaveSettings,
    /// Biome selection (used when `enable_biomes` is set).
    pub biomes: BiomeSettings,
}

impl Default for WorldGenConfig {
    fn default() -> Self {
        Self {
            seed: WorldSeed::default(),
            enable_biomes: false,
            enable_caves: true,
            terrain: TerrainSettings::default(),
            caves: CaveSettings::default(),
            biomes: BiomeSettings::default(),
        }
    }
}

impl WorldGenConfig {
    /// Default parameters with the given seed.
    #[must_use]
    pub fn with_seed(seed: WorldSeed) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` on malformed TOML or invalid values.
    pub fn from_toml_str(source: &str) -> StrataResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| StrataError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigIo` if the file cannot be read, otherwise the errors
    /// of [`from_toml_str`](Self::from_toml_str).
    pub fn load<P: AsRef<Path>>(path: P) -> StrataResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| StrataError::ConfigIo(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&contents)
    }

    /// Serializes to TOML.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a value cannot be represented in TOML.
    pub fn to_toml_string(&self) -> StrataResult<String> {
        toml::to_string(self).map_err(|e| StrataError::InvalidConfig(e.to_string()))
    }

    /// Checks every value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` naming the first bad value.
    pub fn validate(&self) -> StrataResult<()> {
        let invalid = |msg: &str| Err(StrataError::InvalidConfig(msg.to_owned()));

        if let Some(problem) = self.terrain.octaves.problem() {
            return invalid(&format!("terrain: {problem}"));
        }
        if self.terrain.height_variation < 0 {
            return invalid("terrain: height_variation must not be negative");
        }
        if !(0..=MAX_HEIGHT).contains(&self.terrain.base_height) {
            return invalid("terrain: base_height must be within 0..=256");
        }

        if let Some(problem) = self.caves.octaves.problem() {
            return invalid(&format!("caves: {problem}"));
        }
        if !(0.0..=1.0).contains(&self.caves.threshold) {
            return invalid("caves: threshold must be within 0..=1");
        }
        if self.caves.min_height > self.caves.max_height {
            return invalid("caves: min_height must not exceed max_height");
        }

        if !(self.biomes.scale.is_finite() && self.biomes.scale > 0.0) {
            return invalid("biomes: scale must be positive");
        }
        if self.biomes.blend_radius < 0 {
            return invalid("biomes: blend_radius must not be negative");
        }

        Ok(())
    }
}
