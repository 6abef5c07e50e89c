//! Error types for the codec crate.

use thiserror::Error;

use crate::chunk::ChunkType;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Ways a LEB128 sequence can be malformed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarintError {
    /// Input ended before a byte without the continuation bit was seen.
    #[error("failed to find end of LEB")]
    Truncated,

    /// The terminal byte carries no information a shorter encoding lacks.
    #[error("overly long LEB")]
    Overlong,

    /// The value does not fit in 64 bits.
    #[error("LEB > 64-bit")]
    Overflow,
}

/// Hard errors from strict chunk validation and the chunk transforms.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A varint could not be decoded.
    #[error("malformed varint: {0}")]
    MalformedVarint(#[from] VarintError),

    /// Fewer bytes than the fixed chunk header requires.
    #[error("not a valid chunk (too short: {len} bytes)")]
    TooShort {
        /// Bytes available.
        len: usize,
    },

    /// The first four bytes are not the chunk magic.
    #[error("not a valid chunk (invalid magic bytes)")]
    InvalidMagic,

    /// The chunk type byte is not the one the operation needs.
    #[error("wrong chunk type (type = {actual}, expected = {})", .expected.as_byte())]
    InvalidChunkType {
        /// Type byte found in the chunk.
        actual: u8,
        /// Type the operation requires.
        expected: ChunkType,
    },

    /// The type byte names no known chunk type.
    #[error("not a valid chunk (unknown type {0})")]
    UnknownChunkType(u8),

    /// Compression was requested on an already compressed chunk.
    #[error("already compressed")]
    AlreadyCompressed,

    /// Decompression was requested on a chunk that is not compressed.
    #[error("already decompressed")]
    AlreadyDecompressed,

    /// The declared body length exceeds the bytes available.
    #[error("not a valid chunk (declared length {declared} exceeds {available} available bytes)")]
    TruncatedChunk {
        /// Length from the chunk header.
        declared: u64,
        /// Bytes actually present after the header.
        available: usize,
    },

    /// Bytes remain after the declared body.
    #[error("not a valid chunk (trailing data: declared length {declared}, {available} bytes present)")]
    TrailingData {
        /// Length from the chunk header.
        declared: u64,
        /// Bytes actually present after the header.
        available: usize,
    },

    /// The DEFLATE encoder failed.
    #[error("failed to compress: {message}")]
    CompressionFailed {
        /// Description of the failure.
        message: String,
    },

    /// The DEFLATE stream could not be inflated.
    #[error("failed to decompress: {message}")]
    DecompressionFailed {
        /// Description of the failure.
        message: String,
    },

    /// The transform does not apply to this chunk.
    #[error("unsupported transform: {message}")]
    UnsupportedTransform {
        /// Why the transform was refused.
        message: String,
    },
}

impl CodecError {
    /// Create a compression failed error.
    pub fn compression_failed(message: impl Into<String>) -> Self {
        Self::CompressionFailed {
            message: message.into(),
        }
    }

    /// Create a decompression failed error.
    pub fn decompression_failed(message: impl Into<String>) -> Self {
        Self::DecompressionFailed {
            message: message.into(),
        }
    }

    /// Create an unsupported transform error.
    pub fn unsupported_transform(message: impl Into<String>) -> Self {
        Self::UnsupportedTransform {
            message: message.into(),
        }
    }
}
