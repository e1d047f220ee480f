//! # STRATA
//!
//! The world pipeline: generation, chunk storage and meshing wired
//! together behind one handle.
//!
//! ## Crates
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                         strata                           │
//! │        WorldPipeline · AppConfig · strata_gen            │
//! ├────────────────────────────┬─────────────────────────────┤
//! │     strata_procedural      │      strata_rendering       │
//! │  noise · biomes · terrain  │  greedy mesher · atlas      │
//! │  caves · chunks · manager  │  mesh cache · vertices      │
//! ├────────────────────────────┴─────────────────────────────┤
//! │                       strata_core                        │
//! │          block registry · errors · buffer arena          │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: TOML application config
//! - `pipeline`: Worker-pool generation and meshing

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod pipeline;

pub use config::{AppConfig, LoggingConfig, PipelineConfig, MAX_RADIUS, MAX_WORKERS};
pub use pipeline::{PipelineStats, WorldPipeline};

/// Re-export of the core types.
pub use strata_core as core;
/// Re-export of world generation and chunk storage.
pub use strata_procedural as procedural;
/// Re-export of meshing.
pub use strata_rendering as rendering;
