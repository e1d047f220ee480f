//! # STRATA Procedural Generation
//!
//! Deterministic world generation for infinite, reproducible worlds.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed always produces the same world
//! 2. **Chunked**: The world is generated in 16x256x16 chunks
//! 3. **Sparse**: A chunk is 16 sections; all-air sections own no storage
//! 4. **Shareable**: Generators are immutable and used from any thread
//!
//! ## Core Components
//!
//! - `PerlinNoise` / `SimplexNoise`: seeded 2D/3D gradient noise
//! - `OctaveNoise`: fractal sum of one base noise
//! - `BiomeSelector`: temperature/humidity climate and height blending
//! - `TerrainGenerator` / `CaveGenerator`: the two generation stages
//! - `WorldGenerator`: terrain, caves, compaction per chunk
//! - `ChunkManager`: sparse table of loaded chunks
//! - `ChunkPayload`: byte codec for external storage
//!
//! ## Example
//!
//! ```rust,ignore
//! use strata_core::BlockRegistry;
//! use strata_procedural::{ChunkManager, ChunkPos, WorldGenerator, WorldSeed};
//!
//! let registry = BlockRegistry::with_defaults();
//! let generator = WorldGenerator::with_biomes(WorldSeed::new(12345), &registry)?;
//! let manager = ChunkManager::new(generator);
//!
//! manager.load_chunk(ChunkPos::new(0, 0, 0));
//! assert!(!manager.get_block(8, 0, 8).is_air());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod biome;
pub mod caves;
pub mod chunk;
pub mod chunk_manager;
pub mod chunk_persistence;
pub mod config;
pub mod generator;
pub mod noise;
pub mod octave;
pub mod terrain;

pub use biome::{select_biome, Biome, BiomeSelector, BiomeSettings};
pub use caves::{CaveGenerator, CaveSettings};
pub use chunk::{
    Chunk, ChunkPos, ChunkSection, SectionBuffer, BLOCKS_PER_CHUNK, CHUNK_HEIGHT, CHUNK_SIZE, SECTION_COUNT,
    SECTION_SIZE,
};
pub use chunk_manager::{ChunkManager, SharedChunk};
pub use chunk_persistence::{ChunkPayload, PAYLOAD_SIZE};
pub use config::WorldGenConfig;
pub use generator::{GenerationStats, WorldGenerator};
pub use noise::{NoiseGenerator, NoiseKind, NoiseSource, PerlinNoise, SimplexNoise, WorldSeed};
pub use octave::{OctaveNoise, OctaveSettings};
pub use terrain::{ColumnPalette, TerrainGenerator, TerrainSettings};
