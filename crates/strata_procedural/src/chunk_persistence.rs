//! # Chunk Payloads
//!
//! Whole-chunk byte blobs for an external storage layer.
//!
//! ## Format
//!
//! A payload is exactly 65 536 bytes: sections 0..16 in order, each the
//! 4096 bytes of its buffer. The byte of block `(x, y, z)` is therefore at
//! `(y << 8) | (z << 4) | x`. Empty sections are written as zeros.
//!
//! The CRC32 is computed over the uncompressed blob. LZ4 compression is
//! optional and size-prefixed. No file I/O happens here.

use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use strata_core::{StrataError, StrataResult};

use crate::chunk::{Chunk, ChunkPos, SectionBuffer, BLOCKS_PER_CHUNK, SECTION_COUNT, SECTION_VOLUME};

/// Payload length in bytes.
pub const PAYLOAD_SIZE: usize = BLOCKS_PER_CHUNK;

/// CRC32 of a byte slice.
#[inline]
#[must_use]
pub fn checksum(bytes: &[u8]) -> u32 {
    crc32fast::hash(bytes)
}

/// A serialized chunk with its checksum.
#[derive(Clone, PartialEq, Eq)]
pub struct ChunkPayload {
    pos: ChunkPos,
    bytes: Vec<u8>,
    checksum: u32,
}

impl ChunkPayload {
    /// Serializes a chunk.
    #[must_use]
    pub fn encode(chunk: &Chunk) -> Self {
        let mut bytes = vec![0u8; PAYLOAD_SIZE];
        for (index, dst) in bytes.chunks_exact_mut(SECTION_VOLUME).enumerate() {
            if let Some(buffer) = chunk.section_buffer(index) {
                dst.copy_from_slice(buffer.as_bytes());
            }
        }
        let checksum = checksum(&bytes);
        Self {
            pos: chunk.pos(),
            bytes,
            checksum,
        }
    }

    /// Wraps bytes handed back by storage, checking length and checksum.
    ///
    /// # Errors
    ///
    /// - `PayloadSize` if `bytes` is not exactly [`PAYLOAD_SIZE`] long
    /// - `ChecksumMismatch` if the CRC32 differs from `expected_checksum`
    pub fn from_bytes(pos: ChunkPos, bytes: Vec<u8>, expected_checksum: u32) -> StrataResult<Self> {
        if bytes.len() != PAYLOAD_SIZE {
            return Err(StrataError::PayloadSize {
                expected: PAYLOAD_SIZE,
                actual: bytes.len(),
            });
        }
        let actual = checksum(&bytes);
        if actual != expected_checksum {
            return Err(StrataError::ChecksumMismatch {
                expected: expected_checksum,
                actual,
            });
        }
        Ok(Self {
            pos,
            bytes,
            checksum: actual,
        })
    }

    /// Rebuilds the chunk. All-air sections get no storage.
    ///
    /// # Errors
    ///
    /// Returns `SectionIndexOutOfRange` only if the payload layout and the
    /// chunk layout disagree.
    pub fn decode(&self) -> StrataResult<Chunk> {
        let mut chunk = Chunk::new(self.pos);
        for (index, src) in self.bytes.chunks_exact(SECTION_VOLUME).enumerate().take(SECTION_COUNT) {
            if src.iter().all(|&b| b == 0) {
                continue;
            }
            let mut buffer = Box::new(SectionBuffer::new());
            buffer.as_bytes_mut().copy_from_slice(src);
            chunk.install_section(index, buffer)?;
        }
        chunk.optimize();
        Ok(chunk)
    }

    /// LZ4-compresses the payload bytes (size-prefixed).
    #[must_use]
    pub fn compress(&self) -> Vec<u8> {
        compress_prepend_size(&self.bytes)
    }

    /// Decompresses and verifies bytes produced by [`compress`](Self::compress).
    ///
    /// # Errors
    ///
    /// - `Decompress` if the LZ4 data is corrupt
    /// - the errors of [`from_bytes`](Self::from_bytes)
    pub fn decompress(pos: ChunkPos, data: &[u8], expected_checksum: u32) -> StrataResult<Self> {
        let bytes = decompress_size_prepended(data).map_err(|e| StrataError::Decompress(e.to_string()))?;
        Self::from_bytes(pos, bytes, expected_checksum)
    }

    /// Chunk position.
    #[must_use]
    pub const fn pos(&self) -> ChunkPos {
        self.pos
    }

    /// Raw payload bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// CRC32 of the bytes.
    #[must_use]
    pub const fn checksum(&self) -> u32 {
        self.checksum
    }

    /// Consumes the payload, returning the bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl std::fmt::Debug for ChunkPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkPayload")
            .field("pos", &self.pos)
            .field("len", &self.bytes.len())
            .field("checksum", &format_args!("{:#010x}", self.checksum))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::BlockId;

    fn sample_chunk() -> Chunk {
        let mut chunk = Chunk::new(ChunkPos::new(4, 0, -2));
        chunk.set_block(1, 2, 3, BlockId::STONE).unwrap();
        chunk.set_block(15, 255, 15, BlockId::GLASS).unwrap();
        chunk.set_block(0, 100, 0, BlockId::SAND).unwrap();
        chunk
    }

    #[test]
    fn test_layout() {
        let payload = ChunkPayload::encode(&sample_chunk());
        assert_eq!(payload.bytes().len(), PAYLOAD_SIZE);
        assert_eq!(payload.bytes()[(2 << 8) | (3 << 4) | 1], 1);
        assert_eq!(payload.bytes()[(255 << 8) | (15 << 4) | 15], 5);
        assert_eq!(payload.bytes()[100 << 8], 4);
    }

    #[test]
    fn test_decode_restores_blocks_and_sparsity() {
        let original = sample_chunk();
        let decoded = ChunkPayload::encode(&original).decode().unwrap();

        assert_eq!(decoded.pos(), original.pos());
        assert_eq!(decoded.block_count(), 3);
        assert_eq!(decoded.allocated_sections(), 3);
        assert_eq!(decoded.get_block(15, 255, 15).unwrap(), BlockId::GLASS);
        assert_eq!(decoded.get_block(0, 100, 0).unwrap(), BlockId::SAND);
    }

    #[test]
    fn test_size_mismatch() {
        let err = ChunkPayload::from_bytes(ChunkPos::default(), vec![0; 100], 0).unwrap_err();
        assert_eq!(
            err,
            StrataError::PayloadSize {
                expected: PAYLOAD_SIZE,
                actual: 100
            }
        );
    }

    #[test]
    fn test_checksum_mismatch() {
        let payload = ChunkPayload::encode(&sample_chunk());
        let mut bytes = payload.bytes().to_vec();
        bytes[0] ^= 0xFF;
        assert!(matches!(
            ChunkPayload::from_bytes(payload.pos(), bytes, payload.checksum()),
            Err(StrataError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_compression() {
        let payload = ChunkPayload::encode(&sample_chunk());
        let compressed = payload.compress();
        assert!(compressed.len() < PAYLOAD_SIZE / 10);

        let restored = ChunkPayload::decompress(payload.pos(), &compressed, payload.checksum()).unwrap();
        assert_eq!(restored, payload);

        assert!(matches!(
            ChunkPayload::decompress(payload.pos(), &compressed[..8], payload.checksum()),
            Err(StrataError::Decompress(_))
        ));
    }
}
