//! # Memory Management
//!
//! Growable slot arenas for large, individually freed buffers.
//!
//! Chunk sections store their 4 KiB block buffers here. A buffer that is
//! freed is dropped immediately, so an emptied section costs nothing
//! beyond its handle.

mod arena;

pub use arena::{BufferArena, BufferHandle};
