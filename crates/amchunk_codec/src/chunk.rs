//! Chunk framing.
//!
//! ```text
//! | magic (4) | checksum (4) | type (1) | length (ULEB128) | body (length) |
//! ```
//!
//! The checksum is the first four bytes of SHA-256 over everything after it:
//! the type byte, the encoded length and the body. Compressed chunks carry
//! the checksum of the change they were made from, so it cannot be checked
//! against their own bytes.

use std::fmt;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::diagnostic::{Diagnostic, DiagnosticKind, Field};
use crate::error::{CodecError, CodecResult};
use crate::leb128::{read_uleb, uleb_field, write_uleb_into};

/// Magic bytes every chunk starts with.
pub const MAGIC_BYTES: [u8; 4] = [0x85, 0x6f, 0x4a, 0x83];

/// Length of the checksum field.
pub const CHECKSUM_LEN: usize = 4;

/// Smallest possible chunk: magic, checksum, type and a one-byte length.
pub const MIN_CHUNK_LEN: usize = 10;

const CHECKSUM_OFFSET: usize = 4;
const TYPE_OFFSET: usize = 8;
const LENGTH_OFFSET: usize = 9;

/// Type of chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ChunkType {
    /// A whole document.
    Document = 0,
    /// A single change.
    Change = 1,
    /// A DEFLATE-compressed change.
    Compressed = 2,
}

impl ChunkType {
    /// Converts a byte to a chunk type.
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Document),
            1 => Some(Self::Change),
            2 => Some(Self::Compressed),
            _ => None,
        }
    }

    /// Converts the chunk type to a byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Upper-case name used in listings.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Document => "DOCUMENT",
            Self::Change => "CHANGE",
            Self::Compressed => "COMPRESSED",
        }
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of comparing a chunk's stored checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumStatus {
    /// Stored and computed checksums agree.
    Valid,
    /// They differ; `expected` is the computed value.
    Mismatch {
        /// The checksum the bytes should carry.
        expected: [u8; 4],
    },
    /// No comparison was made (compressed chunks).
    NotValidated,
}

/// A chunk envelope sliced out of a byte stream.
///
/// Every part of the header is kept as a [`Field`] so that a listing can
/// reproduce the input bytes exactly, even when the header is malformed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkView<'a> {
    /// Magic bytes; the value is whether they are valid.
    pub magic: Field<'a, bool>,
    /// Stored checksum bytes and their status.
    pub checksum: Field<'a, ChecksumStatus>,
    /// Raw type byte.
    pub chunk_type: Field<'a, u8>,
    /// Declared body length.
    pub length: Field<'a, u64>,
    /// Body bytes: `length` of them, or fewer if the input ran out.
    pub body: &'a [u8],
}

impl<'a> ChunkView<'a> {
    /// Returns the chunk type, if the type byte is known.
    pub fn kind(&self) -> Option<ChunkType> {
        ChunkType::from_byte(self.chunk_type.value)
    }

    /// Returns the checksum bytes stored in the header.
    pub fn stored_checksum(&self) -> [u8; 4] {
        let mut sum = [0u8; 4];
        sum.copy_from_slice(self.checksum.bytes);
        sum
    }

    /// Number of input bytes this chunk occupies.
    pub fn encoded_len(&self) -> usize {
        self.magic.bytes.len()
            + self.checksum.bytes.len()
            + self.chunk_type.bytes.len()
            + self.length.bytes.len()
            + self.body.len()
    }

    /// Iterates over all header diagnostics.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.magic
            .diagnostics
            .iter()
            .chain(&self.checksum.diagnostics)
            .chain(&self.chunk_type.diagnostics)
            .chain(&self.length.diagnostics)
    }
}

/// Computes the chunk checksum of `payload` (type, encoded length and body).
pub fn checksum(payload: &[u8]) -> [u8; 4] {
    let hash = Sha256::digest(payload);
    let mut sum = [0u8; 4];
    sum.copy_from_slice(&hash[..CHECKSUM_LEN]);
    sum
}

/// Slices one chunk off the front of `input`.
///
/// Only an input shorter than [`MIN_CHUNK_LEN`] is an error. Every other
/// problem (bad magic, checksum mismatch, unknown type, malformed or
/// excessive length) is recorded on the corresponding field and the chunk is
/// cut at whatever bytes are available.
///
/// # Errors
///
/// Returns [`CodecError::TooShort`] if `input` cannot hold a chunk header.
pub fn parse_chunk(input: &[u8]) -> CodecResult<(ChunkView<'_>, &[u8])> {
    if input.len() < MIN_CHUNK_LEN {
        return Err(CodecError::TooShort { len: input.len() });
    }

    let magic_ok = input[..CHECKSUM_OFFSET] == MAGIC_BYTES;
    let mut magic = Field::new(&input[..CHECKSUM_OFFSET], magic_ok);
    if !magic_ok {
        magic.push(Diagnostic::error(DiagnosticKind::InvalidMagic));
    }

    let type_byte = input[TYPE_OFFSET];
    let mut chunk_type = Field::new(&input[TYPE_OFFSET..LENGTH_OFFSET], type_byte);
    if ChunkType::from_byte(type_byte).is_none() {
        chunk_type.push(Diagnostic::error(DiagnosticKind::InvalidChunkType(type_byte)));
    }

    let (mut length, after_length) = uleb_field(&input[LENGTH_OFFSET..], None);
    let available = after_length.len();
    let body_len = match usize::try_from(length.value) {
        Ok(len) if len <= available => len,
        _ => {
            length.push(Diagnostic::error(DiagnosticKind::TruncatedChunk {
                declared: length.value,
                available,
            }));
            available
        }
    };
    let header_len = LENGTH_OFFSET + length.bytes.len();
    let chunk_end = header_len + body_len;
    let body = &input[header_len..chunk_end];

    let status = if type_byte == ChunkType::Compressed.as_byte() {
        ChecksumStatus::NotValidated
    } else {
        let expected = checksum(&input[TYPE_OFFSET..chunk_end]);
        if input[CHECKSUM_OFFSET..TYPE_OFFSET] == expected {
            ChecksumStatus::Valid
        } else {
            ChecksumStatus::Mismatch { expected }
        }
    };
    let mut checksum_field = Field::new(&input[CHECKSUM_OFFSET..TYPE_OFFSET], status);
    if let ChecksumStatus::Mismatch { expected } = status {
        checksum_field.push(Diagnostic::error(DiagnosticKind::ChecksumMismatch { expected }));
    }

    debug!(
        chunk_type = type_byte,
        declared = length.value,
        body_len,
        "parsed chunk header"
    );

    let view = ChunkView {
        magic,
        checksum: checksum_field,
        chunk_type,
        length,
        body,
    };
    Ok((view, &input[chunk_end..]))
}

/// Iterator over back-to-back chunks.
///
/// Yields an error once for a trailing fragment too short to be a chunk and
/// then stops.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    remaining: &'a [u8],
}

impl<'a> Chunks<'a> {
    /// Creates an iterator over the chunks in `input`.
    pub fn new(input: &'a [u8]) -> Self {
        Self { remaining: input }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        self.remaining
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = CodecResult<ChunkView<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining.is_empty() {
            return None;
        }
        match parse_chunk(self.remaining) {
            Ok((view, rest)) => {
                self.remaining = rest;
                Some(Ok(view))
            }
            Err(err) => {
                self.remaining = &[];
                Some(Err(err))
            }
        }
    }
}

/// Splits `input` into its chunks.
pub fn split_chunks(input: &[u8]) -> Chunks<'_> {
    Chunks::new(input)
}

/// Frames `body` as a chunk of type `chunk_type` with a correct checksum.
pub fn build_chunk(chunk_type: ChunkType, body: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(body.len() + 11);
    payload.push(chunk_type.as_byte());
    write_uleb_into(&mut payload, body.len() as u64);
    payload.extend_from_slice(body);

    let sum = checksum(&payload);
    let mut out = Vec::with_capacity(MAGIC_BYTES.len() + CHECKSUM_LEN + payload.len());
    out.extend_from_slice(&MAGIC_BYTES);
    out.extend_from_slice(&sum);
    out.extend_from_slice(&payload);
    out
}

/// Prefixes a bare document or change body with a valid header.
pub fn add_header(body: &[u8], chunk_type: ChunkType) -> Vec<u8> {
    build_chunk(chunk_type, body)
}

/// Strictly validates a single chunk and returns its body.
///
/// With `expected` set, the chunk must have that type; otherwise any known
/// type is accepted. The declared length must match the remaining bytes
/// exactly.
///
/// # Errors
///
/// Returns an error describing the first violation found.
pub fn validate_chunk(input: &[u8], expected: Option<ChunkType>) -> CodecResult<&[u8]> {
    if input.len() < MIN_CHUNK_LEN {
        return Err(CodecError::TooShort { len: input.len() });
    }
    if input[..CHECKSUM_OFFSET] != MAGIC_BYTES {
        return Err(CodecError::InvalidMagic);
    }

    let actual = input[TYPE_OFFSET];
    match expected {
        Some(expected) if actual != expected.as_byte() => {
            return Err(match (ChunkType::from_byte(actual), expected) {
                (Some(ChunkType::Change), ChunkType::Compressed) => CodecError::AlreadyDecompressed,
                (Some(ChunkType::Compressed), ChunkType::Change) => CodecError::AlreadyCompressed,
                _ => CodecError::InvalidChunkType { actual, expected },
            });
        }
        None if ChunkType::from_byte(actual).is_none() => {
            return Err(CodecError::UnknownChunkType(actual));
        }
        _ => {}
    }

    let (declared, body) = read_uleb(&input[LENGTH_OFFSET..])?;
    let available = body.len();
    if declared > available as u64 {
        return Err(CodecError::TruncatedChunk {
            declared,
            available,
        });
    }
    if declared < available as u64 {
        return Err(CodecError::TrailingData {
            declared,
            available,
        });
    }
    Ok(body)
}
