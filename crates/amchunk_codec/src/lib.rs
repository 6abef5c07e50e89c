//! # amchunk codec
//!
//! Low-level pieces of the chunk format: LEB128 varints, chunk framing with
//! SHA-256 checksums and DEFLATE chunk compression.
//!
//! ## Chunk Format
//!
//! ```text
//! | magic 85 6f 4a 83 | checksum (4) | type (1) | length (ULEB128) | body |
//! ```
//!
//! - type `0` is a document, `1` a change, `2` a compressed change
//! - the checksum is SHA-256 over type, length and body, truncated to 4 bytes
//! - `length` accounts for exactly the body; chunks may be concatenated
//!
//! ## Usage
//!
//! ```
//! use amchunk_codec::{build_chunk, parse_chunk, ChecksumStatus, ChunkType};
//!
//! let bytes = build_chunk(ChunkType::Document, &[]);
//! let (chunk, rest) = parse_chunk(&bytes).unwrap();
//! assert!(rest.is_empty());
//! assert_eq!(chunk.kind(), Some(ChunkType::Document));
//! assert_eq!(chunk.checksum.value, ChecksumStatus::Valid);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod chunk;
mod compress;
mod diagnostic;
mod error;
pub mod leb128;

pub use chunk::{
    add_header, build_chunk, checksum, parse_chunk, split_chunks, validate_chunk,
    ChecksumStatus, ChunkType, ChunkView, Chunks, CHECKSUM_LEN, MAGIC_BYTES, MIN_CHUNK_LEN,
};
pub use compress::{
    compress_chunk, decompress_chunk, deflate, fix_checksum, inflate, inflated_checksum,
};
pub use diagnostic::{Diagnostic, DiagnosticKind, Field, Severity};
pub use error::{CodecError, CodecResult, VarintError};
pub use leb128::{read_sleb, read_uleb, scan_sleb, scan_uleb, write_sleb, write_uleb, Scan};

/// Formats bytes as a decimal list, e.g. `[1, 2, 3]`.
pub fn format_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 4 + 2);
    out.push('[');
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&b.to_string());
    }
    out.push(']');
    out
}

/// Encodes bytes as lowercase hex.
pub fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0x0f) as usize] as char);
    }
    out
}
