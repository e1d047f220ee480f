//! # Chunk System
//!
//! World data is organized into fixed-size chunks for:
//! - Memory efficiency (only load nearby chunks)
//! - Fast streaming (generate/discard on demand)
//! - Sparse storage (all-air sections cost nothing)
//!
//! ## Chunk Format
//!
//! Chunks are 16x256x16 blocks (width x height x depth), split into 16
//! vertical sections of 16x16x16. Each block is one byte ([`BlockId`]).
//!
//! ## Storage
//!
//! Every chunk owns a [`BufferArena`] of 4 KiB section buffers. A section
//! holds an `Option<BufferHandle>` into that arena: `None` means every
//! block is air. Buffers are allocated on the first non-air write and
//! released by [`Chunk::optimize`] once a section is all air again.

use std::fmt;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use strata_core::{BlockFace, BlockId, BufferArena, BufferHandle, StrataError, StrataResult};

/// Section edge length in blocks.
pub const SECTION_SIZE: usize = 16;

/// Blocks per section.
pub const SECTION_VOLUME: usize = SECTION_SIZE * SECTION_SIZE * SECTION_SIZE;

/// Chunk width/depth in blocks.
pub const CHUNK_SIZE: usize = 16;

/// Chunk height in blocks.
pub const CHUNK_HEIGHT: usize = 256;

/// Sections per chunk.
pub const SECTION_COUNT: usize = CHUNK_HEIGHT / SECTION_SIZE;

/// Total blocks per chunk.
pub const BLOCKS_PER_CHUNK: usize = CHUNK_SIZE * CHUNK_SIZE * CHUNK_HEIGHT;

/// Chunk coordinate (identifies a chunk in the world grid).
///
/// One chunk spans 16 blocks on X and Z and 256 blocks on Y.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkPos {
    /// X coordinate (in chunks, not blocks).
    pub x: i32,
    /// Y coordinate (in chunks, not blocks).
    pub y: i32,
    /// Z coordinate (in chunks, not blocks).
    pub z: i32,
}

impl ChunkPos {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Converts world block coordinates to the owning chunk.
    ///
    /// Uses floor division: world X `-1` is in chunk `-1`, world X `-17`
    /// in chunk `-2`.
    #[inline]
    #[must_use]
    pub const fn from_world_pos(world_x: i32, world_y: i32, world_z: i32) -> Self {
        Self {
            x: world_x.div_euclid(CHUNK_SIZE as i32),
            y: world_y.div_euclid(CHUNK_HEIGHT as i32),
            z: world_z.div_euclid(CHUNK_SIZE as i32),
        }
    }

    /// World coordinates of the chunk's origin (minimum corner).
    #[inline]
    #[must_use]
    pub const fn to_world_pos(self) -> (i32, i32, i32) {
        (
            self.x * CHUNK_SIZE as i32,
            self.y * CHUNK_HEIGHT as i32,
            self.z * CHUNK_SIZE as i32,
        )
    }

    /// Returns the chunk `(dx, dy, dz)` chunks away.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }

    /// Returns the chunk across a face.
    #[inline]
    #[must_use]
    pub const fn neighbor(self, face: BlockFace) -> Self {
        let (dx, dy, dz) = face.offset();
        self.offset(dx, dy, dz)
    }

    /// The six face-adjacent chunks, in [`BlockFace::ALL`] order.
    #[must_use]
    pub fn face_neighbors(self) -> [Self; 6] {
        BlockFace::ALL.map(|face| self.neighbor(face))
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkPos({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Dense block storage of one section, `(y << 8) | (z << 4) | x`.
#[derive(Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(transparent)]
pub struct SectionBuffer([BlockId; SECTION_VOLUME]);

impl SectionBuffer {
    /// An all-air buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self([BlockId::AIR; SECTION_VOLUME])
    }

    /// Linear index of a local coordinate.
    #[inline]
    #[must_use]
    pub const fn index(x: usize, y: usize, z: usize) -> usize {
        (y << 8) | (z << 4) | x
    }

    /// Reads a block. Coordinates must be below 16.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize, z: usize) -> BlockId {
        self.0[Self::index(x, y, z)]
    }

    /// Writes a block. Coordinates must be below 16.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, id: BlockId) {
        self.0[Self::index(x, y, z)] = id;
    }

    /// All blocks in index order.
    #[inline]
    #[must_use]
    pub fn blocks(&self) -> &[BlockId; SECTION_VOLUME] {
        &self.0
    }

    /// Raw bytes in index order.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.0)
    }

    /// Mutable raw bytes in index order.
    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.0)
    }

    /// Number of non-air blocks.
    #[must_use]
    pub fn count_non_air(&self) -> usize {
        self.0.iter().filter(|id| !id.is_air()).count()
    }
}

impl Default for SectionBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SectionBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectionBuffer")
            .field("non_air", &self.count_non_air())
            .finish()
    }
}

/// Arena holding the section buffers of one chunk.
pub type SectionArena = BufferArena<SectionBuffer>;

/// One 16x16x16 slot of a chunk.
///
/// The block data lives in the owning chunk's [`SectionArena`]; every
/// operation that touches blocks takes that arena.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChunkSection {
    /// Storage handle; `None` when every block is air.
    handle: Option<BufferHandle>,
    /// Non-air blocks in the buffer.
    non_air: u16,
}

impl ChunkSection {
    /// An empty (all air, unallocated) section.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            handle: None,
            non_air: 0,
        }
    }

    #[inline]
    fn check_bounds(x: i32, y: i32, z: i32) -> StrataResult<(usize, usize, usize)> {
        let range = 0..SECTION_SIZE as i32;
        if range.contains(&x) && range.contains(&y) && range.contains(&z) {
            Ok((x as usize, y as usize, z as usize))
        } else {
            Err(StrataError::SectionOutOfBounds { x, y, z })
        }
    }

    /// Reads a block.
    ///
    /// # Errors
    ///
    /// Returns `SectionOutOfBounds` if any coordinate is outside `0..16`.
    pub fn get_block(&self, arena: &SectionArena, x: i32, y: i32, z: i32) -> StrataResult<BlockId> {
        let (x, y, z) = Self::check_bounds(x, y, z)?;
        Ok(self.get_unchecked(arena, x, y, z))
    }

    /// Writes a block, allocating storage on the first non-air write.
    ///
    /// Writing air into an empty section does nothing.
    ///
    /// # Errors
    ///
    /// Returns `SectionOutOfBounds` if any coordinate is outside `0..16`.
    pub fn set_block(
        &mut self,
        arena: &mut SectionArena,
        x: i32,
        y: i32,
        z: i32,
        id: BlockId,
    ) -> StrataResult<()> {
        let (x, y, z) = Self::check_bounds(x, y, z)?;
        self.set_unchecked(arena, x, y, z, id);
        Ok(())
    }

    #[inline]
    pub(crate) fn get_unchecked(&self, arena: &SectionArena, x: usize, y: usize, z: usize) -> BlockId {
        self.buffer(arena).map_or(BlockId::AIR, |buffer| buffer.get(x, y, z))
    }

    pub(crate) fn set_unchecked(
        &mut self,
        arena: &mut SectionArena,
        x: usize,
        y: usize,
        z: usize,
        id: BlockId,
    ) {
        let handle = match self.handle {
            Some(handle) => handle,
            None if id.is_air() => return,
            None => {
                let handle = arena.allocate(SectionBuffer::new());
                self.handle = Some(handle);
                handle
            }
        };

        let Some(buffer) = arena.get_mut(handle) else {
            // Stale handle: the arena was cleared under us
            self.handle = None;
            self.non_air = 0;
            return self.set_unchecked(arena, x, y, z, id);
        };

        let old = buffer.get(x, y, z);
        buffer.set(x, y, z, id);
        match (old.is_air(), id.is_air()) {
            (true, false) => self.non_air += 1,
            (false, true) => self.non_air -= 1,
            _ => {}
        }
    }

    /// Installs a filled buffer, replacing any existing storage.
    pub(crate) fn install(&mut self, arena: &mut SectionArena, buffer: Box<SectionBuffer>) {
        if let Some(handle) = self.handle.take() {
            arena.free(handle);
        }
        self.non_air = buffer.count_non_air() as u16;
        self.handle = Some(arena.allocate_boxed(buffer));
    }

    /// The storage buffer, if allocated.
    #[inline]
    #[must_use]
    pub fn buffer<'a>(&self, arena: &'a SectionArena) -> Option<&'a SectionBuffer> {
        arena.get(self.handle?)
    }

    /// Number of non-air blocks.
    #[inline]
    #[must_use]
    pub const fn block_count(&self) -> usize {
        self.non_air as usize
    }

    /// True when no storage is allocated.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.handle.is_none()
    }

    /// Releases storage if every block is air.
    ///
    /// # Returns
    ///
    /// True if storage was released.
    pub fn optimize(&mut self, arena: &mut SectionArena) -> bool {
        match self.handle {
            Some(handle) if self.non_air == 0 => {
                arena.free(handle);
                self.handle = None;
                true
            }
            _ => false,
        }
    }
}

/// A chunk of world data.
///
/// Contains a 16x256x16 grid of blocks in 16 lazily allocated sections.
///
/// # Example
///
/// ```rust,ignore
/// let mut chunk = Chunk::new(ChunkPos::new(0, 0, 0));
/// chunk.set_block(3, 70, 9, BlockId::STONE)?;
/// assert_eq!(chunk.allocated_sections(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct Chunk {
    pos: ChunkPos,
    arena: SectionArena,
    sections: [ChunkSection; SECTION_COUNT],
}

impl Chunk {
    /// Creates an empty chunk. Nothing is allocated.
    #[must_use]
    pub fn new(pos: ChunkPos) -> Self {
        Self {
            pos,
            arena: SectionArena::new(),
            sections: [ChunkSection::new(); SECTION_COUNT],
        }
    }

    /// The chunk's position.
    #[inline]
    #[must_use]
    pub const fn pos(&self) -> ChunkPos {
        self.pos
    }

    #[inline]
    fn check_bounds(x: i32, y: i32, z: i32) -> StrataResult<(usize, usize, usize)> {
        let xz = 0..CHUNK_SIZE as i32;
        if xz.contains(&x) && xz.contains(&z) && (0..CHUNK_HEIGHT as i32).contains(&y) {
            Ok((x as usize, y as usize, z as usize))
        } else {
            Err(StrataError::ChunkOutOfBounds { x, y, z })
        }
    }

    /// Reads a block at local coordinates.
    ///
    /// # Errors
    ///
    /// Returns `ChunkOutOfBounds` unless `x, z` are in `0..16` and `y` in `0..256`.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> StrataResult<BlockId> {
        let (x, y, z) = Self::check_bounds(x, y, z)?;
        Ok(self.get_local_or_air(x, y, z))
    }

    /// Writes a block at local coordinates.
    ///
    /// # Errors
    ///
    /// Returns `ChunkOutOfBounds` unless `x, z` are in `0..16` and `y` in `0..256`.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, id: BlockId) -> StrataResult<()> {
        let (x, y, z) = Self::check_bounds(x, y, z)?;
        self.set_local(x, y, z, id);
        Ok(())
    }

    /// Unchecked local read for hot loops that already clip to the chunk.
    ///
    /// Out-of-range coordinates read as air instead of failing; use
    /// [`get_block`](Self::get_block) for a checked read.
    #[inline]
    #[must_use]
    pub fn get_local_or_air(&self, x: usize, y: usize, z: usize) -> BlockId {
        if x >= CHUNK_SIZE || z >= CHUNK_SIZE || y >= CHUNK_HEIGHT {
            return BlockId::AIR;
        }
        self.sections[y >> 4].get_unchecked(&self.arena, x, y & 15, z)
    }

    #[inline]
    pub(crate) fn set_local(&mut self, x: usize, y: usize, z: usize, id: BlockId) {
        self.sections[y >> 4].set_unchecked(&mut self.arena, x, y & 15, z, id);
    }

    /// Reads a block at world coordinates, wrapped into this chunk.
    #[must_use]
    pub fn get_block_world(&self, world_x: i32, world_y: i32, world_z: i32) -> BlockId {
        let (x, y, z) = Self::world_to_local(world_x, world_y, world_z);
        self.get_local_or_air(x, y, z)
    }

    /// Writes a block at world coordinates, wrapped into this chunk.
    pub fn set_block_world(&mut self, world_x: i32, world_y: i32, world_z: i32, id: BlockId) {
        let (x, y, z) = Self::world_to_local(world_x, world_y, world_z);
        self.set_local(x, y, z, id);
    }

    /// Floor-modulo of world coordinates into local coordinates.
    #[inline]
    #[must_use]
    pub const fn world_to_local(world_x: i32, world_y: i32, world_z: i32) -> (usize, usize, usize) {
        (
            world_x.rem_euclid(CHUNK_SIZE as i32) as usize,
            world_y.rem_euclid(CHUNK_HEIGHT as i32) as usize,
            world_z.rem_euclid(CHUNK_SIZE as i32) as usize,
        )
    }

    /// A section slot.
    ///
    /// # Errors
    ///
    /// Returns `SectionIndexOutOfRange` if `index >= 16`.
    pub fn section(&self, index: usize) -> StrataResult<&ChunkSection> {
        self.sections
            .get(index)
            .ok_or(StrataError::SectionIndexOutOfRange(index))
    }

    /// Block storage of a section, if allocated.
    #[inline]
    #[must_use]
    pub fn section_buffer(&self, index: usize) -> Option<&SectionBuffer> {
        self.sections.get(index)?.buffer(&self.arena)
    }

    /// Replaces a section's storage with a filled buffer.
    pub(crate) fn install_section(&mut self, index: usize, buffer: Box<SectionBuffer>) -> StrataResult<()> {
        let section = self
            .sections
            .get_mut(index)
            .ok_or(StrataError::SectionIndexOutOfRange(index))?;
        section.install(&mut self.arena, buffer);
        Ok(())
    }

    /// True when no section has storage.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(ChunkSection::is_empty)
    }

    /// Releases the storage of all-air sections.
    ///
    /// # Returns
    ///
    /// Number of sections released.
    pub fn optimize(&mut self) -> usize {
        let mut freed = 0;
        for section in &mut self.sections {
            if section.optimize(&mut self.arena) {
                freed += 1;
            }
        }
        freed
    }

    /// Number of non-air blocks.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.sections.iter().map(ChunkSection::block_count).sum()
    }

    /// Number of sections with storage.
    #[must_use]
    pub fn allocated_sections(&self) -> usize {
        self.sections.iter().filter(|s| !s.is_empty()).count()
    }

    /// Approximate heap bytes held by section storage.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.arena.live_count() * SECTION_VOLUME
    }
}
