//! # STRATA Core
//!
//! Shared foundations of the STRATA voxel world core:
//! - Block ids, faces, properties and the block registry
//! - The error taxonomy used by every crate
//! - Slot arenas backing lazily allocated chunk sections
//!
//! ## Architecture Rules
//!
//! 1. **No global state** - registries are passed explicitly
//! 2. **Empty costs nothing** - storage is allocated on first write
//! 3. **Explicit errors** - out-of-range access returns `StrataError`

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod block;
pub mod error;
pub mod memory;

pub use block::{BlockDefinition, BlockFace, BlockId, BlockProperties, BlockRegistry};
pub use error::{StrataError, StrataResult};
pub use memory::{BufferArena, BufferHandle};
