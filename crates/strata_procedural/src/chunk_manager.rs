//! # Chunk Manager
//!
//! Sparse table of loaded chunks with world-coordinate block access.
//!
//! ## Loading
//!
//! Each position owns a once-cell. The first `load_chunk` for a position
//! builds the chunk inside that cell (generated if the manager has a
//! generator, empty otherwise); concurrent callers for the same position
//! wait for it, callers for other positions generate in parallel. The
//! table lock is never held while generating, and a chunk becomes visible
//! only after generation completes.
//!
//! Unloading skips cells that are still being filled, so a chunk is never
//! generated twice for one position.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, RwLock};
use strata_core::BlockId;
use tracing::{debug, info};

use crate::chunk::{Chunk, ChunkPos};
use crate::generator::WorldGenerator;

/// Pre-allocated table capacity.
const INITIAL_CAPACITY: usize = 1024;

/// A loaded chunk shared between the manager, generators and meshers.
pub type SharedChunk = Arc<RwLock<Chunk>>;

/// Once-cell holding the chunk of one position.
type ChunkSlot = Arc<OnceLock<SharedChunk>>;

/// Sparse chunk table, optionally backed by a world generator.
///
/// Thread-safe: every method except [`set_generator`](Self::set_generator)
/// takes `&self`.
///
/// # Example
///
/// ```rust,ignore
/// let registry = BlockRegistry::with_defaults();
/// let manager = ChunkManager::new(WorldGenerator::new(WorldSeed::new(42), &registry)?);
///
/// manager.load_chunk(ChunkPos::new(0, 0, 0));
/// let ground = manager.get_block(8, 10, 8);
/// ```
pub struct ChunkManager {
    generator: Option<Arc<WorldGenerator>>,
    chunks: RwLock<HashMap<ChunkPos, ChunkSlot>>,
    /// Positions edited since the last `take_dirty`.
    dirty: Mutex<Vec<ChunkPos>>,
}

impl ChunkManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new(generator: WorldGenerator) -> Self {
        Self::with_shared_generator(Arc::new(generator))
    }

    /// Creates an empty manager sharing an existing generator.
    #[must_use]
    pub fn with_shared_generator(generator: Arc<WorldGenerator>) -> Self {
        Self::build(Some(generator))
    }

    /// Creates a manager without a generator; loaded chunks start as air.
    #[must_use]
    pub fn empty() -> Self {
        Self::build(None)
    }

    fn build(generator: Option<Arc<WorldGenerator>>) -> Self {
        Self {
            generator,
            chunks: RwLock::new(HashMap::with_capacity(INITIAL_CAPACITY)),
            dirty: Mutex::new(Vec::with_capacity(64)),
        }
    }

    /// Replaces the generator. Chunks already loaded are kept as they are.
    pub fn set_generator(&mut self, generator: Option<Arc<WorldGenerator>>) {
        self.generator = generator;
    }

    /// The generator used for new chunks, if any.
    #[must_use]
    pub fn generator(&self) -> Option<&Arc<WorldGenerator>> {
        self.generator.as_ref()
    }

    /// Returns the chunk at `pos`, creating it if needed.
    ///
    /// A new chunk is generated when a generator is set and left empty
    /// otherwise. Creation happens at most once per position, even under
    /// concurrent calls.
    pub fn load_chunk(&self, pos: ChunkPos) -> SharedChunk {
        let existing = self.chunks.read().get(&pos).cloned();
        let slot = existing.unwrap_or_else(|| Arc::clone(self.chunks.write().entry(pos).or_default()));

        Arc::clone(slot.get_or_init(|| {
            let chunk = self
                .generator
                .as_ref()
                .map_or_else(|| Chunk::new(pos), |generator| generator.generate(pos));
            debug!(
                %pos,
                blocks = chunk.block_count(),
                sections = chunk.allocated_sections(),
                "chunk loaded"
            );
            Arc::new(RwLock::new(chunk))
        }))
    }

    /// Removes a loaded chunk from the table.
    ///
    /// A chunk still being generated stays in the table and `None` is
    /// returned. Holders of the returned handle keep the chunk alive.
    pub fn unload_chunk(&self, pos: ChunkPos) -> Option<SharedChunk> {
        let mut chunks = self.chunks.write();
        let chunk = chunks.get(&pos)?.get().cloned()?;
        chunks.remove(&pos);
        drop(chunks);

        debug!(%pos, "chunk unloaded");
        Some(chunk)
    }

    /// Removes every loaded chunk. Chunks still being generated stay.
    ///
    /// # Returns
    ///
    /// Number of chunks removed.
    pub fn unload_all(&self) -> usize {
        let mut chunks = self.chunks.write();
        let before = chunks.len();
        chunks.retain(|_, slot| slot.get().is_none());
        let count = before - chunks.len();
        drop(chunks);

        self.dirty.lock().clear();
        info!(count, "all chunks unloaded");
        count
    }

    /// The chunk at `pos`, if fully loaded.
    #[must_use]
    pub fn get_chunk(&self, pos: ChunkPos) -> Option<SharedChunk> {
        self.chunks.read().get(&pos)?.get().cloned()
    }

    /// The chunk containing a world position, if loaded.
    #[must_use]
    pub fn get_chunk_at(&self, world_x: i32, world_y: i32, world_z: i32) -> Option<SharedChunk> {
        self.get_chunk(ChunkPos::from_world_pos(world_x, world_y, world_z))
    }

    /// Whether the chunk at `pos` is fully loaded.
    #[must_use]
    pub fn is_loaded(&self, pos: ChunkPos) -> bool {
        self.chunks
            .read()
            .get(&pos)
            .is_some_and(|slot| slot.get().is_some())
    }

    /// Number of fully loaded chunks.
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.chunks
            .read()
            .values()
            .filter(|slot| slot.get().is_some())
            .count()
    }

    /// Positions of all fully loaded chunks (unordered).
    #[must_use]
    pub fn loaded_positions(&self) -> Vec<ChunkPos> {
        self.chunks
            .read()
            .iter()
            .filter(|(_, slot)| slot.get().is_some())
            .map(|(pos, _)| *pos)
            .collect()
    }

    /// Block at a world position. Unloaded chunks read as air; nothing
    /// is loaded.
    #[must_use]
    pub fn get_block(&self, world_x: i32, world_y: i32, world_z: i32) -> BlockId {
        self.get_chunk_at(world_x, world_y, world_z)
            // Recursive read: callers may already hold another chunk's read lock
            .map_or(BlockId::AIR, |chunk| {
                chunk.read_recursive().get_block_world(world_x, world_y, world_z)
            })
    }

    /// Writes a block at a world position, loading the owning chunk, and
    /// records the chunk as dirty.
    pub fn set_block(&self, world_x: i32, world_y: i32, world_z: i32, id: BlockId) {
        let pos = ChunkPos::from_world_pos(world_x, world_y, world_z);
        let chunk = self.load_chunk(pos);
        chunk.write().set_block_world(world_x, world_y, world_z, id);

        let mut dirty = self.dirty.lock();
        if !dirty.contains(&pos) {
            dirty.push(pos);
        }
    }

    /// Returns and clears the positions edited since the last call.
    pub fn take_dirty(&self) -> Vec<ChunkPos> {
        std::mem::take(&mut *self.dirty.lock())
    }

    /// The loaded chunk `(dx, dy, dz)` chunks away from `pos`.
    #[must_use]
    pub fn get_neighbor(&self, pos: ChunkPos, dx: i32, dy: i32, dz: i32) -> Option<SharedChunk> {
        self.get_chunk(pos.offset(dx, dy, dz))
    }

    /// Loaded face-adjacent chunks of `pos`.
    #[must_use]
    pub fn get_neighbors(&self, pos: ChunkPos) -> Vec<(ChunkPos, SharedChunk)> {
        pos.face_neighbors()
            .into_iter()
            .filter_map(|n| self.get_chunk(n).map(|chunk| (n, chunk)))
            .collect()
    }
}

impl Default for ChunkManager {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for ChunkManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkManager")
            .field("seed", &self.generator.as_ref().map(|g| g.seed()))
            .field("loaded", &self.loaded_count())
            .finish_non_exhaustive()
    }
}
