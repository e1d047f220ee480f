//! Voxel meshing.
//!
//! Chunks in, vertex and index buffers out. Nothing here talks to a GPU.

mod atlas;
mod greedy_mesh;
mod mesh;
mod mesh_cache;
mod neighbors;

pub use atlas::{AtlasRegion, TextureAtlas};
pub use greedy_mesh::{face_shade, ChunkMesher};
pub use mesh::{ChunkMesh, TerrainVertex, VertexAttribute};
pub use mesh_cache::MeshCache;
pub use neighbors::{FnLookup, NeighborLookup, NoNeighbors};
