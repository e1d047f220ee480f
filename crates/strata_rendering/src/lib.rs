//! # STRATA Rendering
//!
//! CPU side of voxel rendering: turns chunks into vertex and index
//! buffers an external renderer uploads as-is.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Chunk + NeighborLookup → ChunkMesher → ChunkMesh → MeshCache │
//! │                              ↑                                │
//! │              BlockRegistry + TextureAtlas (snapshot)          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//!
//! - The mesher only sees fully generated chunks
//! - Unloaded neighbors are unknown: faces toward them are drawn
//! - Shading is a fixed per-direction multiplier, not lighting

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod voxel;

pub use voxel::{
    face_shade, AtlasRegion, ChunkMesh, ChunkMesher, FnLookup, MeshCache, NeighborLookup, NoNeighbors, TerrainVertex,
    TextureAtlas, VertexAttribute,
};
