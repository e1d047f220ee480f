//! Mesh cache keyed by chunk position.
//!
//! The cache never checks whether a mesh is stale. Whoever edits a chunk
//! calls [`MeshCache::invalidate_with_neighbors`] (border edits change
//! neighbor faces too) before the next lookup.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use strata_procedural::ChunkPos;
use tracing::trace;

use super::mesh::ChunkMesh;

/// Thread-safe mesh cache.
#[derive(Debug, Default)]
pub struct MeshCache {
    meshes: RwLock<HashMap<ChunkPos, Arc<ChunkMesh>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MeshCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached mesh of a chunk.
    pub fn get(&self, pos: ChunkPos) -> Option<Arc<ChunkMesh>> {
        let mesh = self.meshes.read().get(&pos).cloned();
        let counter = if mesh.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        mesh
    }

    /// Stores a mesh, replacing any previous one.
    pub fn insert(&self, pos: ChunkPos, mesh: ChunkMesh) -> Arc<ChunkMesh> {
        let mesh = Arc::new(mesh);
        self.meshes.write().insert(pos, Arc::clone(&mesh));
        mesh
    }

    /// Cached mesh, or the result of `build` stored for next time.
    ///
    /// `build` runs without the cache locked.
    pub fn get_or_build(&self, pos: ChunkPos, build: impl FnOnce() -> ChunkMesh) -> Arc<ChunkMesh> {
        if let Some(mesh) = self.get(pos) {
            return mesh;
        }
        self.insert(pos, build())
    }

    /// Drops the mesh of one chunk. Returns whether one was cached.
    pub fn invalidate(&self, pos: ChunkPos) -> bool {
        let removed = self.meshes.write().remove(&pos).is_some();
        if removed {
            trace!(%pos, "mesh invalidated");
        }
        removed
    }

    /// Drops the meshes of a chunk and its six face neighbors.
    ///
    /// # Returns
    ///
    /// Number of meshes dropped.
    pub fn invalidate_with_neighbors(&self, pos: ChunkPos) -> usize {
        let mut meshes = self.meshes.write();
        std::iter::once(pos)
            .chain(pos.face_neighbors())
            .filter(|p| meshes.remove(p).is_some())
            .count()
    }

    /// Drops every mesh. Counters are kept.
    pub fn clear(&self) {
        self.meshes.write().clear();
    }

    /// Whether a mesh is cached, without touching the counters.
    #[must_use]
    pub fn contains(&self, pos: ChunkPos) -> bool {
        self.meshes.read().contains_key(&pos)
    }

    /// Number of cached meshes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.meshes.read().len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.meshes.read().is_empty()
    }

    /// Lookups that found a mesh.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Lookups that found nothing.
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Total vertices across cached meshes.
    #[must_use]
    pub fn total_vertices(&self) -> usize {
        self.meshes.read().values().map(|m| m.vertex_count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_build_counts() {
        let cache = MeshCache::new();
        let pos = ChunkPos::new(1, 0, 1);

        let mut builds = 0;
        for _ in 0..3 {
            cache.get_or_build(pos, || {
                builds += 1;
                ChunkMesh::new(pos)
            });
        }
        assert_eq!(builds, 1);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 2);
    }

    #[test]
    fn test_invalidate() {
        let cache = MeshCache::new();
        let pos = ChunkPos::new(0, 0, 0);
        cache.insert(pos, ChunkMesh::new(pos));

        assert!(cache.invalidate(pos));
        assert!(!cache.invalidate(pos));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_with_neighbors() {
        let cache = MeshCache::new();
        let center = ChunkPos::new(0, 0, 0);
        for pos in [center, ChunkPos::new(1, 0, 0), ChunkPos::new(0, 0, -1), ChunkPos::new(5, 0, 5)] {
            cache.insert(pos, ChunkMesh::new(pos));
        }

        assert_eq!(cache.invalidate_with_neighbors(center), 3);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(ChunkPos::new(5, 0, 5)));
    }

    #[test]
    fn test_clear_keeps_counters() {
        let cache = MeshCache::new();
        let pos = ChunkPos::new(0, 0, 0);
        cache.insert(pos, ChunkMesh::new(pos));
        let _ = cache.get(pos);
        cache.clear();
        assert!(cache.get(pos).is_none());
        assert_eq!((cache.hits(), cache.misses()), (1, 1));
    }
}
