//! # Application Config
//!
//! Top-level TOML file read by `strata_gen`. World generation lives under
//! `[worldgen]` in the same layout as [`WorldGenConfig`].
//!
//! ```toml
//! [logging]
//! level = "info"
//!
//! [pipeline]
//! workers = 0      # 0 = one per available core
//! radius = 4
//!
//! [worldgen]
//! seed = 42
//! enable_biomes = true
//! enable_caves = true
//! ```

use std::num::NonZeroUsize;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strata_core::{StrataError, StrataResult};
use strata_procedural::WorldGenConfig;

/// Largest accepted generation radius, in chunks.
pub const MAX_RADIUS: u32 = 64;

/// Largest accepted worker count.
pub const MAX_WORKERS: usize = 256;

/// Logging settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
        }
    }
}

/// Worker pool and area settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Worker threads; 0 picks one per available core.
    pub workers: usize,
    /// Half-width of the generated square, in chunks.
    pub radius: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { workers: 0, radius: 4 }
    }
}

impl PipelineConfig {
    /// Worker count with `0` resolved against the machine.
    #[must_use]
    pub fn resolved_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism().map_or(4, NonZeroUsize::get)
    }
}

/// Everything `strata_gen` reads from its config file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Logging.
    pub logging: LoggingConfig,
    /// Worker pool.
    pub pipeline: PipelineConfig,
    /// World generation.
    pub worldgen: WorldGenConfig,
}

impl AppConfig {
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

    /// Checks every value, including the world generation section.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` naming the first bad value.
    pub fn validate(&self) -> StrataResult<()> {
        if self.logging.level.trim().is_empty() {
            return Err(StrataError::InvalidConfig("logging: level must not be empty".to_owned()));
        }
        if self.pipeline.workers > MAX_WORKERS {
            return Err(StrataError::InvalidConfig(format!(
                "pipeline: workers must be at most {MAX_WORKERS}"
            )));
        }
        if self.pipeline.radius > MAX_RADIUS {
            return Err(StrataError::InvalidConfig(format!(
                "pipeline: radius must be at most {MAX_RADIUS}"
            )));
        }
        self.worldgen.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.pipeline.radius, 4);
        assert!(config.worldgen.enable_caves);
    }

    #[test]
    fn test_sections() {
        let config = AppConfig::from_toml_str(
            r#"
            [logging]
            level = "strata=debug"

            [pipeline]
            workers = 3
            radius = 2

            [worldgen]
            seed = 7
            enable_biomes = true
            "#,
        )
        .unwrap();

        assert_eq!(config.logging.level, "strata=debug");
        assert_eq!(config.pipeline.resolved_workers(), 3);
        assert_eq!(config.pipeline.radius, 2);
        assert_eq!(config.worldgen.seed.value(), 7);
        assert!(config.worldgen.enable_biomes);
    }

    #[test]
    fn test_auto_workers() {
        assert!(PipelineConfig::default().resolved_workers() >= 1);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(AppConfig::from_toml_str("[pipeline]\nradius = 65").is_err());
        assert!(AppConfig::from_toml_str("[pipeline]\nworkers = 1000").is_err());
        assert!(AppConfig::from_toml_str("[logging]\nlevel = \"\"").is_err());
        assert!(AppConfig::from_toml_str("[worldgen.caves]\nthreshold = 3.0").is_err());
        assert!(matches!(
            AppConfig::from_toml_str("[pipeline\nradius = 1"),
            Err(StrataError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            AppConfig::load("/nonexistent/strata.toml"),
            Err(StrataError::ConfigIo(_))
        ));
    }
}
