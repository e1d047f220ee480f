//! Mesh output - vertex and index buffers for the renderer.

use bytemuck::{Pod, Zeroable};
use strata_procedural::ChunkPos;

// =============================================================================
// VERTEX FORMAT - Standard vertex buffer layout
// =============================================================================

/// One vertex of a terrain quad, in world space.
///
/// Greedy quads span several blocks, so the atlas tile is repeated in the
/// shader: `uv_origin + fract(face_uv) * tile_span`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct TerrainVertex {
    /// Position in world space [x, y, z]
    pub position: [f32; 3],
    /// Face shade as RGB
    pub color: [f32; 3],
    /// Atlas UV of this corner [u, v]
    pub uv: [f32; 2],
    /// Quad-local UV in blocks (0..width, 0..height)
    pub face_uv: [f32; 2],
    /// Size of one atlas tile in UV units
    pub tile_span: [f32; 2],
}

/// Location, byte offset and component count of one vertex attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Shader location.
    pub location: u32,
    /// Byte offset inside the vertex.
    pub offset: usize,
    /// Number of `f32` components.
    pub components: usize,
}

impl TerrainVertex {
    /// Bytes per vertex.
    pub const STRIDE: usize = std::mem::size_of::<Self>();

    /// Attribute layout for the external renderer.
    pub const ATTRIBUTES: [VertexAttribute; 5] = [
        VertexAttribute { location: 0, offset: 0, components: 3 },  // position
        VertexAttribute { location: 1, offset: 12, components: 3 }, // color
        VertexAttribute { location: 2, offset: 24, components: 2 }, // uv
        VertexAttribute { location: 3, offset: 32, components: 2 }, // face_uv
        VertexAttribute { location: 4, offset: 40, components: 2 }, // tile_span
    ];
}

// =============================================================================
// MESH OUTPUT - Final mesh ready for upload
// =============================================================================

/// Complete mesh of one chunk (vertices + indices).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkMesh {
    /// Chunk the mesh was built from.
    pub pos: ChunkPos,
    /// Vertex buffer data
    pub vertices: Vec<TerrainVertex>,
    /// Index buffer data, six per quad
    pub indices: Vec<u32>,
}

impl ChunkMesh {
    /// Creates an empty mesh.
    #[must_use]
    pub fn new(pos: ChunkPos) -> Self {
        Self {
            pos,
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Appends one quad. Corners must be in winding order.
    #[inline]
    pub fn push_quad(&mut self, corners: [TerrainVertex; 4]) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&corners);
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Check if mesh is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertex count
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Triangle count
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Quad count
    #[must_use]
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    /// Vertex buffer as raw bytes.
    #[must_use]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index buffer as raw bytes.
    #[must_use]
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Bytes held by both buffers.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.vertices.len() * TerrainVertex::STRIDE + self.indices.len() * std::mem::size_of::<u32>()
    }
}
