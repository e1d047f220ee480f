//! # strata_gen
//!
//! Headless world generator. Builds the chunk square around the origin on
//! a worker pool, meshes it and logs block/section/vertex statistics.
//!
//! ```bash
//! # Defaults, 9x9 chunks
//! strata_gen
//!
//! # From a config file, with overrides
//! strata_gen --config config/strata.toml --seed 7 --radius 8 --workers 4
//!
//! # Write compressed chunk payloads
//! strata_gen --biomes --export out/
//! RUST_LOG=strata=trace strata_gen --radius 1
//! ```
//!
//! ## Export Layout
//!
//! One `chunk_<x>_<y>_<z>.lz4` per chunk (size-prefixed LZ4 of the
//! 65 536-byte payload) plus `index.toml` listing every chunk with the
//! CRC32 of its uncompressed payload.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use strata::core::{BlockRegistry, StrataError, StrataResult};
use strata::procedural::{ChunkPayload, ChunkPos, WorldSeed};
use strata::{AppConfig, PipelineStats, WorldPipeline};
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Command line arguments. Flags override the config file.
#[derive(Debug, Parser)]
#[command(name = "strata_gen", version, about = "Generate and mesh a square of STRATA chunks")]
struct Args {
    /// TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// World seed.
    #[arg(short, long)]
    seed: Option<i64>,

    /// Half-width of the chunk square.
    #[arg(short, long)]
    radius: Option<u32>,

    /// Worker threads (0 = one per core).
    #[arg(short, long)]
    workers: Option<usize>,

    /// Enable biome-aware terrain.
    #[arg(long)]
    biomes: bool,

    /// Disable cave carving.
    #[arg(long)]
    no_caves: bool,

    /// Directory to write compressed chunk payloads into.
    #[arg(long, value_name = "DIR")]
    export: Option<PathBuf>,
}

/// Failures of a generation run.
#[derive(Debug, Error)]
enum GenError {
    #[error(transparent)]
    World(#[from] StrataError),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("export index: {0}")]
    Index(#[from] toml::ser::Error),
}

impl GenError {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// One entry of `index.toml`.
#[derive(Serialize)]
struct IndexEntry {
    x: i32,
    y: i32,
    z: i32,
    file: String,
    checksum: u32,
    compressed_bytes: usize,
}

#[derive(Serialize)]
struct ExportIndex {
    seed: i64,
    chunks: Vec<IndexEntry>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match resolve_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("strata_gen: {e}");
            return ExitCode::FAILURE;
        }
    };

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();

    match run(&config, args.export.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "generation failed");
            ExitCode::FAILURE
        }
    }
}

/// Loads the config file (or defaults) and applies the flags.
fn resolve_config(args: &Args) -> StrataResult<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    if let Some(seed) = args.seed {
        config.worldgen.seed = WorldSeed::new(seed);
    }
    if let Some(radius) = args.radius {
        config.pipeline.radius = radius;
    }
    if let Some(workers) = args.workers {
        config.pipeline.workers = workers;
    }
    if args.biomes {
        config.worldgen.enable_biomes = true;
    }
    if args.no_caves {
        config.worldgen.enable_caves = false;
    }

    config.validate()?;
    Ok(config)
}

fn run(config: &AppConfig, export: Option<&Path>) -> Result<(), GenError> {
    let registry = BlockRegistry::with_defaults();
    let pipeline = WorldPipeline::from_config(config, &registry)?;

    info!(
        seed = config.worldgen.seed.value(),
        radius = config.pipeline.radius,
        workers = pipeline.workers(),
        biomes = config.worldgen.enable_biomes,
        caves = config.worldgen.enable_caves,
        "generating"
    );

    let origin = ChunkPos::new(0, 0, 0);
    let stats = pipeline.build_area(origin, config.pipeline.radius);
    report(&stats);

    if let Some(dir) = export {
        let positions = WorldPipeline::area(origin, config.pipeline.radius);
        let written = export_chunks(&pipeline, &positions, dir, config.worldgen.seed)?;
        info!(chunks = written, dir = %dir.display(), "payloads exported");
    }
    Ok(())
}

fn report(stats: &PipelineStats) {
    let sections_per_chunk = stats.sections as f64 / stats.chunks.max(1) as f64;
    info!(
        chunks = stats.chunks,
        blocks = stats.blocks,
        sections = stats.sections,
        sections_per_chunk,
        generate_ms = stats.generate_time.as_millis(),
        "generation"
    );
    info!(
        meshes = stats.meshes,
        quads = stats.quads,
        vertices = stats.vertices,
        mesh_kib = stats.mesh_bytes / 1024,
        mesh_ms = stats.mesh_time.as_millis(),
        "meshing"
    );
    if stats.meshes < stats.chunks {
        warn!(missing = stats.chunks - stats.meshes, "some chunks were not meshed");
    }
}

/// Writes one compressed payload per loaded chunk plus `index.toml`.
fn export_chunks(
    pipeline: &WorldPipeline,
    positions: &[ChunkPos],
    dir: &Path,
    seed: WorldSeed,
) -> Result<usize, GenError> {
    fs::create_dir_all(dir).map_err(GenError::io(dir))?;

    let mut index = ExportIndex {
        seed: seed.value(),
        chunks: Vec::with_capacity(positions.len()),
    };
    for &pos in positions {
        let Some(chunk) = pipeline.manager().get_chunk(pos) else {
            continue;
        };
        let payload = ChunkPayload::encode(&chunk.read());
        let compressed = payload.compress();

        let file = format!("chunk_{}_{}_{}.lz4", pos.x, pos.y, pos.z);
        let path = dir.join(&file);
        fs::write(&path, &compressed).map_err(GenError::io(&path))?;

        index.chunks.push(IndexEntry {
            x: pos.x,
            y: pos.y,
            z: pos.z,
            file,
            checksum: payload.checksum(),
            compressed_bytes: compressed.len(),
        });
    }

    let index_path = dir.join("index.toml");
    fs::write(&index_path, toml::to_string(&index)?).map_err(GenError::io(&index_path))?;

    Ok(index.chunks.len())
}
