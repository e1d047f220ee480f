//! # World Pipeline
//!
//! Generates and meshes areas of the world on a fixed pool of worker
//! threads.
//!
//! ## Phases
//!
//! ```text
//! positions ──> [generate] ──> ChunkManager
//!                                  │  (all chunks of the area loaded)
//!                                  v
//! positions ──> [mesh] ──────> MeshCache
//! ```
//!
//! Meshing starts only after the whole area is generated, so interior
//! borders are culled against real neighbors. Faces on the outer rim of
//! the area stay visible until the next ring is loaded.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::bounded;
use parking_lot::Mutex;
use strata_core::{BlockRegistry, StrataError, StrataResult};
use strata_procedural::{ChunkManager, ChunkPos, WorldGenerator};
use strata_rendering::{ChunkMesh, ChunkMesher, MeshCache, TextureAtlas};
use tracing::{debug, info, trace};

use crate::config::{AppConfig, MAX_WORKERS};

/// Totals of one pipeline run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Chunks present after the generation phase.
    pub chunks: usize,
    /// Non-air blocks across those chunks.
    pub blocks: usize,
    /// Allocated sections across those chunks.
    pub sections: usize,
    /// Meshes built or taken from the cache.
    pub meshes: usize,
    /// Quads across those meshes.
    pub quads: usize,
    /// Vertices across those meshes.
    pub vertices: usize,
    /// Heap bytes of those meshes.
    pub mesh_bytes: usize,
    /// Wall time of the generation phase.
    pub generate_time: Duration,
    /// Wall time of the mesh phase.
    pub mesh_time: Duration,
}

impl PipelineStats {
    /// Adds another run's totals.
    pub fn merge(&mut self, other: &Self) {
        self.chunks += other.chunks;
        self.blocks += other.blocks;
        self.sections += other.sections;
        self.meshes += other.meshes;
        self.quads += other.quads;
        self.vertices += other.vertices;
        self.mesh_bytes += other.mesh_bytes;
        self.generate_time += other.generate_time;
        self.mesh_time += other.mesh_time;
    }
}

/// Per-chunk result of the generation phase.
#[derive(Clone, Copy)]
struct GenerateResult {
    blocks: usize,
    sections: usize,
}

/// Chunk manager, mesher and mesh cache driven by a worker pool.
///
/// # Example
///
/// ```rust,ignore
/// let registry = BlockRegistry::with_defaults();
/// let generator = WorldGenerator::with_biomes(WorldSeed::new(42), &registry)?;
/// let pipeline = WorldPipeline::new(generator, &registry, 4)?;
///
/// let stats = pipeline.build_area(ChunkPos::new(0, 0, 0), 2);
/// assert_eq!(stats.chunks, 25);
/// ```
pub struct WorldPipeline {
    manager: Arc<ChunkManager>,
    mesher: ChunkMesher,
    cache: MeshCache,
    workers: usize,
    totals: Mutex<PipelineStats>,
}

impl WorldPipeline {
    /// Creates a pipeline with a texture atlas built from the registry.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if `workers` is 0 or above the limit
    /// - `AtlasFull` if the registry has more textures than the default atlas holds
    pub fn new(generator: WorldGenerator, registry: &BlockRegistry, workers: usize) -> StrataResult<Self> {
        Self::with_manager(Arc::new(ChunkManager::new(generator)), registry, workers)
    }

    /// Creates a pipeline over an existing chunk manager.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn with_manager(manager: Arc<ChunkManager>, registry: &BlockRegistry, workers: usize) -> StrataResult<Self> {
        if workers == 0 || workers > MAX_WORKERS {
            return Err(StrataError::InvalidConfig(format!(
                "pipeline: workers must be within 1..={MAX_WORKERS}"
            )));
        }
        let atlas = TextureAtlas::from_registry(
            registry,
            TextureAtlas::DEFAULT_SIZE,
            TextureAtlas::DEFAULT_SIZE,
            TextureAtlas::DEFAULT_TILE,
        )?;

        info!(
            workers,
            seed = ?manager.generator().map(|g| g.seed().value()),
            textures = atlas.len(),
            "world pipeline ready"
        );

        Ok(Self {
            mesher: ChunkMesher::new(registry, &atlas),
            manager,
            cache: MeshCache::new(),
            workers,
            totals: Mutex::new(PipelineStats::default()),
        })
    }

    /// Creates a pipeline from an application config.
    ///
    /// # Errors
    ///
    /// Returns config validation errors and the errors of
    /// [`WorldGenerator::from_config`] and [`new`](Self::new).
    pub fn from_config(config: &AppConfig, registry: &BlockRegistry) -> StrataResult<Self> {
        config.validate()?;
        let generator = WorldGenerator::from_config(&config.worldgen, registry)?;
        Self::new(generator, registry, config.pipeline.resolved_workers())
    }

    /// Positions of the `(2r + 1)²` chunk square around `center`, row by row.
    #[must_use]
    pub fn area(center: ChunkPos, radius: u32) -> Vec<ChunkPos> {
        let r = radius as i32;
        (-r..=r)
            .flat_map(|dz| (-r..=r).map(move |dx| center.offset(dx, 0, dz)))
            .collect()
    }

    /// Loads every position in parallel.
    pub fn generate(&self, positions: &[ChunkPos]) -> PipelineStats {
        let start = Instant::now();
        let results = self.run_jobs(positions.to_vec(), |pos| {
            let chunk = self.manager.load_chunk(pos);
            let chunk = chunk.read();
            GenerateResult {
                blocks: chunk.block_count(),
                sections: chunk.allocated_sections(),
            }
        });

        let mut stats = PipelineStats {
            chunks: results.len(),
            generate_time: start.elapsed(),
            ..PipelineStats::default()
        };
        for result in &results {
            stats.blocks += result.blocks;
            stats.sections += result.sections;
        }

        debug!(
            chunks = stats.chunks,
            blocks = stats.blocks,
            sections = stats.sections,
            elapsed_ms = stats.generate_time.as_millis(),
            "generation phase done"
        );
        stats
    }

    /// Meshes every loaded position in parallel, reusing cached meshes.
    ///
    /// Positions that are not loaded are skipped.
    pub fn mesh(&self, positions: &[ChunkPos]) -> PipelineStats {
        let start = Instant::now();
        let meshes = self.run_jobs(positions.to_vec(), |pos| self.mesh_chunk(pos));

        let mut stats = PipelineStats::default();
        for mesh in meshes.iter().flatten() {
            stats.meshes += 1;
            stats.quads += mesh.quad_count();
            stats.vertices += mesh.vertex_count();
            stats.mesh_bytes += mesh.memory_usage();
        }
        stats.mesh_time = start.elapsed();

        debug!(
            meshes = stats.meshes,
            quads = stats.quads,
            vertices = stats.vertices,
            elapsed_ms = stats.mesh_time.as_millis(),
            "mesh phase done"
        );
        stats
    }

    /// Generates, then meshes, the square of chunks around `center`.
    pub fn build_area(&self, center: ChunkPos, radius: u32) -> PipelineStats {
        let positions = Self::area(center, radius);
        let mut stats = self.generate(&positions);
        stats.merge(&self.mesh(&positions));

        self.totals.lock().merge(&stats);
        info!(
            %center,
            radius,
            chunks = stats.chunks,
            blocks = stats.blocks,
            quads = stats.quads,
            vertices = stats.vertices,
            "area built"
        );
        stats
    }

    /// Mesh of one loaded chunk, from the cache or freshly built.
    pub fn mesh_chunk(&self, pos: ChunkPos) -> Option<Arc<ChunkMesh>> {
        if let Some(mesh) = self.cache.get(pos) {
            return Some(mesh);
        }
        let mesh = self.mesher.mesh_loaded(&self.manager, pos)?;
        Some(self.cache.insert(pos, mesh))
    }

    /// Rebuilds meshes touched by edits since the last call.
    ///
    /// Every dirty chunk and its loaded face neighbors are evicted and
    /// re-meshed.
    ///
    /// # Returns
    ///
    /// Number of meshes rebuilt.
    pub fn apply_edits(&self) -> usize {
        let dirty = self.manager.take_dirty();
        if dirty.is_empty() {
            return 0;
        }

        let mut stale: Vec<ChunkPos> = Vec::with_capacity(dirty.len() * 7);
        for pos in &dirty {
            self.cache.invalidate_with_neighbors(*pos);
            stale.push(*pos);
            stale.extend(pos.face_neighbors());
        }
        stale.sort_unstable();
        stale.dedup();
        stale.retain(|pos| self.manager.is_loaded(*pos));

        let rebuilt = self.mesh(&stale).meshes;
        trace!(dirty = dirty.len(), rebuilt, "edits applied");
        rebuilt
    }

    /// Runs `work` over `jobs` on the worker pool and collects the results
    /// in completion order.
    fn run_jobs<T, R, F>(&self, jobs: Vec<T>, work: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Sync,
    {
        if jobs.is_empty() {
            return Vec::new();
        }

        // Both channels hold every job, so no send ever blocks
        let (job_tx, job_rx) = bounded::<T>(jobs.len());
        let (result_tx, result_rx) = bounded::<R>(jobs.len());
        let workers = self.workers.min(jobs.len());

        for job in jobs {
            if job_tx.send(job).is_err() {
                break;
            }
        }
        drop(job_tx);

        let work = &work;
        thread::scope(|scope| {
            for worker in 0..workers {
                let jobs = job_rx.clone();
                let results = result_tx.clone();
                scope.spawn(move || {
                    let mut done = 0usize;
                    for job in &jobs {
                        if results.send(work(job)).is_err() {
                            break;
                        }
                        done += 1;
                    }
                    trace!(worker, done, "worker idle");
                });
            }
        });
        drop(result_tx);

        result_rx.try_iter().collect()
    }

    /// The chunk manager.
    #[must_use]
    pub fn manager(&self) -> &Arc<ChunkManager> {
        &self.manager
    }

    /// The mesher.
    #[must_use]
    pub const fn mesher(&self) -> &ChunkMesher {
        &self.mesher
    }

    /// The mesh cache.
    #[must_use]
    pub const fn cache(&self) -> &MeshCache {
        &self.cache
    }

    /// Worker thread count.
    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers
    }

    /// Totals of every `build_area` call so far.
    #[must_use]
    pub fn totals(&self) -> PipelineStats {
        *self.totals.lock()
    }
}

impl std::fmt::Debug for WorldPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorldPipeline")
            .field("manager", &self.manager)
            .field("cached_meshes", &self.cache.len())
            .field("workers", &self.workers)
            .finish_non_exhaustive()
    }
}
