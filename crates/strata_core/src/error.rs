//! # Error Types
//!
//! All errors that can occur in the STRATA world core.
//!
//! Reads of unloaded chunks and missing neighbors during meshing are
//! *not* errors; they have defined values (air, and "render the face").

use thiserror::Error;

/// Errors that can occur in the world core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StrataError {
    /// Local coordinate outside a section (0..16 on every axis).
    #[error("section coordinate out of bounds: ({x}, {y}, {z})")]
    SectionOutOfBounds {
        /// Local X.
        x: i32,
        /// Local Y.
        y: i32,
        /// Local Z.
        z: i32,
    },

    /// Local coordinate outside a chunk (x,z in 0..16, y in 0..256).
    #[error("chunk coordinate out of bounds: ({x}, {y}, {z})")]
    ChunkOutOfBounds {
        /// Local X.
        x: i32,
        /// Local Y.
        y: i32,
        /// Local Z.
        z: i32,
    },

    /// Section index outside 0..16.
    #[error("section index out of range: {0}")]
    SectionIndexOutOfRange(usize),

    /// A block with this id is already registered.
    #[error("block id {id} is already registered as '{existing}'")]
    DuplicateBlockId {
        /// The contested id.
        id: u8,
        /// Name of the block already holding the id.
        existing: String,
    },

    /// A block with this name is already registered.
    #[error("block name '{0}' is already registered")]
    DuplicateBlockName(String),

    /// Registration attempted after the registry was locked.
    #[error("cannot register blocks after the registry is locked")]
    RegistryLocked,

    /// No block with this name is registered.
    #[error("unknown block name: {0}")]
    UnknownBlock(String),

    /// No block with this id is registered.
    #[error("unknown block id: {0}")]
    UnknownBlockId(u8),

    /// The texture atlas has no free tile left.
    #[error("texture atlas is full ({capacity} tiles), cannot fit '{texture}'")]
    AtlasFull {
        /// Tile capacity of the atlas.
        capacity: usize,
        /// Texture that did not fit.
        texture: String,
    },

    /// Invalid configuration value or file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read or written.
    #[error("configuration i/o failed: {0}")]
    ConfigIo(String),

    /// Chunk payload has the wrong length.
    #[error("chunk payload size mismatch: expected {expected} bytes, got {actual}")]
    PayloadSize {
        /// Required length.
        expected: usize,
        /// Provided length.
        actual: usize,
    },

    /// Chunk payload failed its integrity check.
    #[error("chunk payload checksum mismatch: expected {expected:#010x}, computed {actual:#010x}")]
    ChecksumMismatch {
        /// Checksum supplied by the storage collaborator.
        expected: u32,
        /// Checksum computed over the payload.
        actual: u32,
    },

    /// Compressed chunk payload could not be decompressed.
    #[error("chunk payload decompression failed: {0}")]
    Decompress(String),
}

/// Result type for world core operations.
pub type StrataResult<T> = Result<T, StrataError>;
