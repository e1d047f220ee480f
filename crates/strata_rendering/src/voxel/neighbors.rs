//! Cross-chunk block lookup used by the mesher.
//!
//! The mesher never sees the chunk manager. It asks a [`NeighborLookup`]
//! for blocks outside the chunk being meshed; `None` means the owning
//! chunk is not loaded, and faces toward it are emitted.

use strata_core::BlockId;
use strata_procedural::ChunkManager;

/// Read-only block access at world coordinates.
pub trait NeighborLookup {
    /// Block at a world position, or `None` if its chunk is not loaded.
    fn block_at(&self, world_x: i32, world_y: i32, world_z: i32) -> Option<BlockId>;
}

/// Treats every neighbor as unloaded.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoNeighbors;

impl NeighborLookup for NoNeighbors {
    #[inline]
    fn block_at(&self, _: i32, _: i32, _: i32) -> Option<BlockId> {
        None
    }
}

/// Adapts a closure into a lookup.
///
/// ```rust,ignore
/// let floor = FnLookup(|_: i32, y: i32, _: i32| Some(if y < 0 { BlockId::STONE } else { BlockId::AIR }));
/// let mesh = mesher.mesh_chunk(&chunk, &floor);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct FnLookup<F>(pub F);

impl<F> NeighborLookup for FnLookup<F>
where
    F: Fn(i32, i32, i32) -> Option<BlockId>,
{
    #[inline]
    fn block_at(&self, world_x: i32, world_y: i32, world_z: i32) -> Option<BlockId> {
        (self.0)(world_x, world_y, world_z)
    }
}

impl NeighborLookup for ChunkManager {
    fn block_at(&self, world_x: i32, world_y: i32, world_z: i32) -> Option<BlockId> {
        let chunk = self.get_chunk_at(world_x, world_y, world_z)?;
        // The mesher may already hold the center chunk's read lock
        let block = chunk.read_recursive().get_block_world(world_x, world_y, world_z);
        Some(block)
    }
}

impl<T: NeighborLookup + ?Sized> NeighborLookup for &T {
    #[inline]
    fn block_at(&self, world_x: i32, world_y: i32, world_z: i32) -> Option<BlockId> {
        (**self).block_at(world_x, world_y, world_z)
    }
}
