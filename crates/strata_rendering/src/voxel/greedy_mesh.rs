//! Greedy Meshing algorithm for voxel optimization.
//!
//! Reduces polygon count by merging adjacent faces with the same block.
//!
//! ## Algorithm
//!
//! 1. For each non-empty section and each of the six face directions:
//! 2. Sweep the 16 slices perpendicular to that direction
//! 3. Build a 16x16 mask of visible faces
//! 4. Greedily merge runs of the same block into rectangles
//! 5. Emit one quad (4 vertices, 6 indices) per rectangle
//!
//! ## Visibility
//!
//! A face is emitted when its block is solid and the block in front of it
//! is unloaded, non-solid, or differs in transparency. Two transparent
//! blocks hide each other only when they are the same block.

use std::time::Instant;

use strata_core::{BlockFace, BlockId, BlockProperties, BlockRegistry};
use strata_procedural::{Chunk, ChunkManager, ChunkPos, SectionBuffer, CHUNK_HEIGHT, CHUNK_SIZE, SECTION_COUNT, SECTION_SIZE};
use tracing::{trace, warn};

use super::atlas::{AtlasRegion, TextureAtlas};
use super::mesh::{ChunkMesh, TerrainVertex};
use super::neighbors::NeighborLookup;

const S: usize = SECTION_SIZE;

/// Meshing a single chunk slower than this is logged.
const SLOW_MESH_MS: u128 = 10;

/// One slice of face visibility; `AIR` marks no face.
type FaceMask = [[BlockId; S]; S];

/// Brightness multiplier of a face direction.
#[must_use]
pub const fn face_shade(face: BlockFace) -> f32 {
    match face {
        BlockFace::Top => 1.0,
        BlockFace::Bottom => 0.5,
        BlockFace::North => 0.7,
        BlockFace::South => 0.75,
        BlockFace::East => 0.8,
        BlockFace::West => 0.85,
    }
}

/// Axes of a face direction as indices into `[x, y, z]`: `d` is the
/// sweep axis, `u` and `v` span the slice.
#[derive(Clone, Copy)]
struct FaceAxes {
    d: usize,
    u: usize,
    v: usize,
    positive: bool,
}

impl FaceAxes {
    const fn of(face: BlockFace) -> Self {
        match face {
            BlockFace::North => Self { d: 2, u: 0, v: 1, positive: false },
            BlockFace::South => Self { d: 2, u: 0, v: 1, positive: true },
            BlockFace::West => Self { d: 0, u: 2, v: 1, positive: false },
            BlockFace::East => Self { d: 0, u: 2, v: 1, positive: true },
            BlockFace::Bottom => Self { d: 1, u: 0, v: 2, positive: false },
            BlockFace::Top => Self { d: 1, u: 0, v: 2, positive: true },
        }
    }
}

/// Quad corners `(cu, cv)` in emission order. Every face winds clockwise
/// seen from outside.
const fn corner_order(face: BlockFace) -> [(f32, f32); 4] {
    match face {
        BlockFace::North | BlockFace::East | BlockFace::Top => [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)],
        BlockFace::South | BlockFace::West | BlockFace::Bottom => [(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)],
    }
}

/// The section being meshed and how to see past it.
struct SectionView<'a, N: ?Sized> {
    chunk: &'a Chunk,
    buffer: &'a SectionBuffer,
    /// Chunk-local Y of the section's first layer.
    base_y: usize,
    /// World position of the chunk origin.
    origin: (i32, i32, i32),
    neighbors: &'a N,
}

impl<N: NeighborLookup + ?Sized> SectionView<'_, N> {
    /// Block one step from section-local `p` along `face`.
    #[inline]
    fn neighbor(&self, p: [usize; 3], face: BlockFace) -> Option<BlockId> {
        let (dx, dy, dz) = face.offset();
        let x = p[0] as i32 + dx;
        let local_y = p[1] as i32 + dy;
        let z = p[2] as i32 + dz;
        let s = S as i32;

        if (0..s).contains(&x) && (0..s).contains(&local_y) && (0..s).contains(&z) {
            return Some(self.buffer.get(x as usize, local_y as usize, z as usize));
        }

        let y = self.base_y as i32 + local_y;
        if (0..CHUNK_SIZE as i32).contains(&x)
            && (0..CHUNK_HEIGHT as i32).contains(&y)
            && (0..CHUNK_SIZE as i32).contains(&z)
        {
            return Some(self.chunk.get_local_or_air(x as usize, y as usize, z as usize));
        }

        let (ox, oy, oz) = self.origin;
        self.neighbors.block_at(ox + x, oy + y, oz + z)
    }

    /// World-space corner of the section.
    fn world_origin(&self) -> [f32; 3] {
        let (ox, oy, oz) = self.origin;
        [ox as f32, (oy + self.base_y as i32) as f32, oz as f32]
    }
}

/// Greedy chunk mesher.
///
/// Holds a snapshot of block properties and per-face atlas regions taken
/// at construction, so it can be cloned into worker threads and shared
/// freely. Rebuild it if the registry or atlas changes.
#[derive(Clone)]
pub struct ChunkMesher {
    /// Indexed by block id.
    properties: Vec<BlockProperties>,
    /// Indexed by block id, then `BlockFace::index`.
    regions: Vec<[AtlasRegion; 6]>,
}

impl ChunkMesher {
    /// Creates a mesher for the given blocks and texture layout.
    #[must_use]
    pub fn new(registry: &BlockRegistry, atlas: &TextureAtlas) -> Self {
        let mut properties = Vec::with_capacity(BlockRegistry::CAPACITY);
        let mut regions = Vec::with_capacity(BlockRegistry::CAPACITY);

        for raw in 0..=u8::MAX {
            let block = registry.get(BlockId::new(raw));
            properties.push(block.properties());
            regions.push(BlockFace::ALL.map(|face| atlas.region(block.texture(face))));
        }

        Self { properties, regions }
    }

    #[inline]
    fn properties(&self, id: BlockId) -> BlockProperties {
        self.properties[usize::from(id.raw())]
    }

    /// Whether a face of `own` toward `neighbor` is drawn.
    ///
    /// `neighbor` is `None` when the adjacent chunk is not loaded; such
    /// faces are drawn.
    #[must_use]
    pub fn is_face_visible(&self, own: BlockId, neighbor: Option<BlockId>) -> bool {
        let own_props = self.properties(own);
        if !own_props.is_solid() {
            return false;
        }
        let Some(neighbor) = neighbor else {
            return true;
        };
        let neighbor_props = self.properties(neighbor);
        if !neighbor_props.is_solid() {
            return true;
        }
        match (own_props.is_transparent(), neighbor_props.is_transparent()) {
            (true, true) => own != neighbor,
            (false, false) => false,
            _ => true,
        }
    }

    /// Meshes a chunk.
    ///
    /// Blocks outside the chunk are resolved through `neighbors`. The
    /// chunk must be fully generated.
    pub fn mesh_chunk<N: NeighborLookup + ?Sized>(&self, chunk: &Chunk, neighbors: &N) -> ChunkMesh {
        let start = Instant::now();
        let pos = chunk.pos();
        let mut mesh = ChunkMesh::new(pos);

        // Skip empty chunks entirely
        if chunk.is_empty() {
            return mesh;
        }

        let mut mask: FaceMask = [[BlockId::AIR; S]; S];
        for index in 0..SECTION_COUNT {
            let Some(buffer) = chunk.section_buffer(index) else {
                continue;
            };
            let view = SectionView {
                chunk,
                buffer,
                base_y: index * S,
                origin: pos.to_world_pos(),
                neighbors,
            };

            for face in BlockFace::ALL {
                let axes = FaceAxes::of(face);
                for d in 0..S {
                    self.build_mask(&view, face, axes, d, &mut mask);
                    self.extract_quads(&view, face, axes, d, &mut mask, &mut mesh);
                }
            }
        }

        let elapsed = start.elapsed();
        trace!(
            %pos,
            quads = mesh.quad_count(),
            micros = elapsed.as_micros() as u64,
            "chunk meshed"
        );
        if elapsed.as_millis() > SLOW_MESH_MS {
            warn!(%pos, millis = elapsed.as_millis() as u64, "slow mesh generation");
        }

        mesh
    }

    /// Meshes a loaded chunk, looking up neighbors in the manager.
    ///
    /// Returns `None` if the chunk is not loaded.
    pub fn mesh_loaded(&self, manager: &ChunkManager, pos: ChunkPos) -> Option<ChunkMesh> {
        let chunk = manager.get_chunk(pos)?;
        let guard = chunk.read();
        Some(self.mesh_chunk(&guard, manager))
    }

    /// Number of visible block faces, i.e. the quad count without merging.
    #[must_use]
    pub fn count_visible_faces<N: NeighborLookup + ?Sized>(&self, chunk: &Chunk, neighbors: &N) -> usize {
        let mut mask: FaceMask = [[BlockId::AIR; S]; S];
        let mut faces = 0;
        for index in 0..SECTION_COUNT {
            let Some(buffer) = chunk.section_buffer(index) else {
                continue;
            };
            let view = SectionView {
                chunk,
                buffer,
                base_y: index * S,
                origin: chunk.pos().to_world_pos(),
                neighbors,
            };
            for face in BlockFace::ALL {
                for d in 0..S {
                    self.build_mask(&view, face, FaceAxes::of(face), d, &mut mask);
                    faces += mask.iter().flatten().filter(|b| !b.is_air()).count();
                }
            }
        }
        faces
    }

    /// Builds a 2D mask of visible faces at a slice.
    fn build_mask<N: NeighborLookup + ?Sized>(
        &self,
        view: &SectionView<'_, N>,
        face: BlockFace,
        axes: FaceAxes,
        d: usize,
        mask: &mut FaceMask,
    ) {
        for (v, row) in mask.iter_mut().enumerate() {
            for (u, cell) in row.iter_mut().enumerate() {
                *cell = BlockId::AIR;

                let mut p = [0usize; 3];
                p[axes.d] = d;
                p[axes.u] = u;
                p[axes.v] = v;

                let own = view.buffer.get(p[0], p[1], p[2]);
                if !self.properties(own).is_solid() {
                    continue;
                }
                if self.is_face_visible(own, view.neighbor(p, face)) {
                    *cell = own;
                }
            }
        }
    }

    /// Greedily extracts quads from the mask, clearing consumed cells.
    fn extract_quads<N: NeighborLookup + ?Sized>(
        &self,
        view: &SectionView<'_, N>,
        face: BlockFace,
        axes: FaceAxes,
        d: usize,
        mask: &mut FaceMask,
        mesh: &mut ChunkMesh,
    ) {
        for v in 0..S {
            let mut u = 0;
            while u < S {
                let block = mask[v][u];
                if block.is_air() {
                    u += 1;
                    continue;
                }

                // Find width - extend as far as possible with the same block
                let mut width = 1;
                while u + width < S && mask[v][u + width] == block {
                    width += 1;
                }

                // Find height - extend rows with a matching run
                let mut height = 1;
                'height: while v + height < S {
                    for du in 0..width {
                        if mask[v + height][u + du] != block {
                            break 'height;
                        }
                    }
                    height += 1;
                }

                let origin = view.world_origin();
                mesh.push_quad(self.quad(origin, face, axes, [d, u, v], [width, height], block));

                for row in &mut mask[v..v + height] {
                    row[u..u + width].fill(BlockId::AIR);
                }

                u += width;
            }
        }
    }

    /// Builds the four vertices of a merged rectangle.
    fn quad(
        &self,
        section_origin: [f32; 3],
        face: BlockFace,
        axes: FaceAxes,
        [d, u, v]: [usize; 3],
        [width, height]: [usize; 2],
        block: BlockId,
    ) -> [TerrainVertex; 4] {
        let region = self.regions[usize::from(block.raw())][face.index()];
        let shade = face_shade(face);
        let (w, h) = (width as f32, height as f32);

        let mut base = section_origin;
        base[axes.d] += d as f32 + if axes.positive { 1.0 } else { 0.0 };
        base[axes.u] += u as f32;
        base[axes.v] += v as f32;

        corner_order(face).map(|(cu, cv)| {
            let mut position = base;
            position[axes.u] += cu * w;
            position[axes.v] += cv * h;
            TerrainVertex {
                position,
                color: [shade; 3],
                uv: region.corner(cu, cv),
                face_uv: [cu * w, cv * h],
                tile_span: region.span(),
            }
        })
    }
}

impl std::fmt::Debug for ChunkMesher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let solid = self.properties.iter().filter(|p| p.is_solid()).count();
        f.debug_struct("ChunkMesher").field("solid_blocks", &solid).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::neighbors::{FnLookup, NoNeighbors};

    fn mesher() -> ChunkMesher {
        let registry = BlockRegistry::with_defaults();
        let atlas = TextureAtlas::from_registry(&registry, 256, 256, 16).unwrap();
        ChunkMesher::new(&registry, &atlas)
    }

    fn chunk_with(blocks: &[(i32, i32, i32, BlockId)]) -> Chunk {
        let mut chunk = Chunk::new(ChunkPos::default());
        for &(x, y, z, id) in blocks {
            chunk.set_block(x, y, z, id).unwrap();
        }
        chunk
    }

    #[test]
    fn test_empty_chunk() {
        let mesh = mesher().mesh_chunk(&Chunk::new(ChunkPos::default()), &NoNeighbors);
        assert!(mesh.is_empty());
    }

    #[test]
    fn test_single_block() {
        let mesh = mesher().mesh_chunk(&chunk_with(&[(4, 4, 4, BlockId::STONE)]), &NoNeighbors);
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.indices.len(), 36);
        assert_eq!(&mesh.indices[..6], &[0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_greedy_merging() {
        // 2x2x1 slab: top and bottom merge to one quad each, sides to one each
        let mut blocks = Vec::new();
        for x in 0..2 {
            for z in 0..2 {
                blocks.push((x + 3, 5, z + 3, BlockId::DIRT));
            }
        }
        let mesh = mesher().mesh_chunk(&chunk_with(&blocks), &NoNeighbors);
        assert_eq!(mesh.quad_count(), 6);
    }

    #[test]
    fn test_different_blocks_do_not_merge() {
        let chunk = chunk_with(&[(3, 3, 3, BlockId::STONE), (4, 3, 3, BlockId::DIRT)]);
        let mesh = mesher().mesh_chunk(&chunk, &NoNeighbors);
        // Shared face culled; the other four directions cannot merge
        assert_eq!(mesh.quad_count(), 10);
    }

    #[test]
    fn test_transparency_rules() {
        let mesher = mesher();
        assert!(!mesher.is_face_visible(BlockId::AIR, Some(BlockId::AIR)));
        assert!(mesher.is_face_visible(BlockId::STONE, None));
        assert!(mesher.is_face_visible(BlockId::STONE, Some(BlockId::AIR)));
        assert!(!mesher.is_face_visible(BlockId::STONE, Some(BlockId::DIRT)));
        assert!(mesher.is_face_visible(BlockId::STONE, Some(BlockId::GLASS)));
        assert!(mesher.is_face_visible(BlockId::GLASS, Some(BlockId::STONE)));
        assert!(!mesher.is_face_visible(BlockId::GLASS, Some(BlockId::GLASS)));
        // Unregistered ids read as air
        assert!(!mesher.is_face_visible(BlockId::new(200), None));
        assert!(mesher.is_face_visible(BlockId::STONE, Some(BlockId::new(200))));
    }

    #[test]
    fn test_glass_pane_interior_culled() {
        let chunk = chunk_with(&[(3, 3, 3, BlockId::GLASS), (4, 3, 3, BlockId::GLASS)]);
        assert_eq!(mesher().mesh_chunk(&chunk, &NoNeighbors).quad_count(), 6);
    }

    #[test]
    fn test_top_face_geometry() {
        let chunk = chunk_with(&[(0, 0, 0, BlockId::STONE)]);
        let mesh = mesher().mesh_chunk(&chunk, &NoNeighbors);

        let top: Vec<&TerrainVertex> = mesh.vertices.iter().filter(|v| v.color == [1.0; 3]).collect();
        assert_eq!(top.len(), 4);
        let positions: Vec<[f32; 3]> = top.iter().map(|v| v.position).collect();
        assert_eq!(
            positions,
            vec![[0.0, 1.0, 0.0], [1.0, 1.0, 0.0], [1.0, 1.0, 1.0], [0.0, 1.0, 1.0]]
        );
        assert_eq!(top[2].face_uv, [1.0, 1.0]);
    }

    #[test]
    fn test_face_shades() {
        let chunk = chunk_with(&[(8, 8, 8, BlockId::STONE)]);
        let mesh = mesher().mesh_chunk(&chunk, &NoNeighbors);
        let mut shades: Vec<f32> = mesh.vertices.iter().step_by(4).map(|v| v.color[0]).collect();
        shades.sort_by(f32::total_cmp);
        assert_eq!(shades, vec![0.5, 0.7, 0.75, 0.8, 0.85, 1.0]);
    }

    #[test]
    fn test_world_space_positions() {
        let mut chunk = Chunk::new(ChunkPos::new(-2, 1, 3));
        chunk.set_block(0, 0, 0, BlockId::STONE).unwrap();
        let mesh = mesher().mesh_chunk(&chunk, &NoNeighbors);

        let min = mesh.vertices.iter().fold([f32::MAX; 3], |acc, v| {
            [acc[0].min(v.position[0]), acc[1].min(v.position[1]), acc[2].min(v.position[2])]
        });
        assert_eq!(min, [-32.0, 256.0, 48.0]);
    }

    #[test]
    fn test_cross_chunk_culling() {
        let chunk = chunk_with(&[(15, 10, 7, BlockId::STONE)]);
        let mesher = mesher();

        let open = mesher.mesh_chunk(&chunk, &NoNeighbors);
        let walled = FnLookup(|x: i32, _: i32, _: i32| Some(if x == 16 { BlockId::STONE } else { BlockId::AIR }));
        let closed = mesher.mesh_chunk(&chunk, &walled);

        assert_eq!(open.quad_count(), 6);
        assert_eq!(closed.quad_count(), 5);
    }

    #[test]
    fn test_section_boundary_culling() {
        // y 15 and 16 live in different sections
        let chunk = chunk_with(&[(2, 15, 2, BlockId::STONE), (2, 16, 2, BlockId::STONE)]);
        let mesh = mesher().mesh_chunk(&chunk, &NoNeighbors);
        assert_eq!(mesh.quad_count(), 10);
    }

    #[test]
    fn test_tiled_uvs() {
        let registry = BlockRegistry::with_defaults();
        let atlas = TextureAtlas::from_registry(&registry, 256, 256, 16).unwrap();
        let mesher = ChunkMesher::new(&registry, &atlas);

        let mut blocks = Vec::new();
        for x in 0..3 {
            blocks.push((x, 0, 0, BlockId::STONE));
        }
        let mesh = mesher.mesh_chunk(&chunk_with(&blocks), &NoNeighbors);
        let stone = atlas.region("stone");
        let top: Vec<&TerrainVertex> = mesh.vertices.iter().filter(|v| v.color == [1.0; 3]).collect();

        assert_eq!(top[2].face_uv, [3.0, 1.0]);
        assert_eq!(top[2].uv, [stone.u1, stone.v1]);
        assert_eq!(top[0].tile_span, stone.span());
    }
}
