//! # Octave Noise
//!
//! Fractal layering of a base noise generator.
//!
//! Each octave samples the base noise at `lacunarity` times the previous
//! frequency and `persistence` times the previous amplitude. The sum is
//! divided by the total amplitude so the result stays in [-1, 1].

use serde::{Deserialize, Serialize};

use crate::noise::{NoiseGenerator, NoiseSource, WorldSeed};

/// Octave parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctaveSettings {
    /// Number of layers.
    pub octaves: u32,
    /// Frequency of the first layer.
    pub frequency: f64,
    /// Amplitude of the first layer.
    pub amplitude: f64,
    /// Frequency multiplier per layer.
    pub lacunarity: f64,
    /// Amplitude multiplier per layer.
    pub persistence: f64,
}

impl OctaveSettings {
    /// Creates a parameter set.
    #[must_use]
    pub const fn new(
        octaves: u32,
        frequency: f64,
        amplitude: f64,
        lacunarity: f64,
        persistence: f64,
    ) -> Self {
        Self {
            octaves,
            frequency,
            amplitude,
            lacunarity,
            persistence,
        }
    }

    /// Sum of the layer amplitudes.
    #[must_use]
    pub fn amplitude_sum(&self) -> f64 {
        let mut sum = 0.0;
        let mut amplitude = self.amplitude;
        for _ in 0..self.octaves {
            sum += amplitude;
            amplitude *= self.persistence;
        }
        sum
    }

    /// Returns a description of the first invalid parameter, if any.
    #[must_use]
    pub fn problem(&self) -> Option<&'static str> {
        if self.octaves == 0 {
            Some("octaves must be at least 1")
        } else if !(self.frequency.is_finite() && self.frequency > 0.0) {
            Some("frequency must be positive")
        } else if !(self.amplitude.is_finite() && self.amplitude > 0.0) {
            Some("amplitude must be positive")
        } else if !(self.lacunarity.is_finite() && self.lacunarity > 0.0) {
            Some("lacunarity must be positive")
        } else if !(self.persistence.is_finite() && self.persistence > 0.0) {
            Some("persistence must be positive")
        } else {
            None
        }
    }
}

impl Default for OctaveSettings {
    fn default() -> Self {
        Self::new(4, 0.01, 1.0, 2.0, 0.5)
    }
}

/// Fractal sum over a base noise generator.
///
/// # Example
///
/// ```rust,ignore
/// let base = NoiseKind::Perlin.build(WorldSeed::new(42));
/// let terrain = OctaveNoise::with_defaults(base);
/// let h = terrain.sample_2d(1024.0, -512.0);
/// ```
#[derive(Clone)]
pub struct OctaveNoise<N = NoiseSource> {
    base: N,
    settings: OctaveSettings,
    /// Precomputed `settings.amplitude_sum()`.
    normalization: f64,
}

impl<N: NoiseGenerator> OctaveNoise<N> {
    /// Layers `base` with the given parameters.
    ///
    /// # Arguments
    ///
    /// * `base` - The noise to layer
    /// * `settings` - Octave parameters
    #[must_use]
    pub fn new(base: N, settings: OctaveSettings) -> Self {
        let sum = settings.amplitude_sum();
        // Zero octaves yield zero, not NaN
        let normalization = if sum == 0.0 { 1.0 } else { sum };
        Self {
            base,
            settings,
            normalization,
        }
    }

    /// Layers `base` with the default parameters
    /// (4 octaves, frequency 0.01, amplitude 1, lacunarity 2, persistence 0.5).
    #[must_use]
    pub fn with_defaults(base: N) -> Self {
        Self::new(base, OctaveSettings::default())
    }

    /// Samples the 2D fractal sum.
    #[must_use]
    pub fn sample_2d(&self, x: f64, z: f64) -> f64 {
        let mut total = 0.0;
        let mut frequency = self.settings.frequency;
        let mut amplitude = self.settings.amplitude;

        for _ in 0..self.settings.octaves {
            total += self.base.noise_2d(x * frequency, z * frequency) * amplitude;
            frequency *= self.settings.lacunarity;
            amplitude *= self.settings.persistence;
        }

        total / self.normalization
    }

    /// Samples the 3D fractal sum.
    #[must_use]
    pub fn sample_3d(&self, x: f64, y: f64, z: f64) -> f64 {
        let mut total = 0.0;
        let mut frequency = self.settings.frequency;
        let mut amplitude = self.settings.amplitude;

        for _ in 0..self.settings.octaves {
            total += self.base.noise_3d(x * frequency, y * frequency, z * frequency) * amplitude;
            frequency *= self.settings.lacunarity;
            amplitude *= self.settings.persistence;
        }

        total / self.normalization
    }

    /// The base generator.
    #[must_use]
    pub const fn base(&self) -> &N {
        &self.base
    }

    /// Octave parameters.
    #[must_use]
    pub const fn settings(&self) -> &OctaveSettings {
        &self.settings
    }

    /// Seed of the base generator.
    #[must_use]
    pub fn seed(&self) -> WorldSeed {
        self.base.seed()
    }
}
