//! Chunk transforms: compress, decompress and checksum repair.
//!
//! These produce new binary chunks and therefore fail hard on any problem;
//! none of them attempts best-effort output.

use std::io::{Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use tracing::{debug, warn};

use crate::chunk::{checksum, validate_chunk, ChunkType};
use crate::error::{CodecError, CodecResult};
use crate::leb128::write_uleb_into;

/// Magic plus checksum: the header prefix carried through every transform.
const CARRIED_PREFIX: usize = 8;

/// DEFLATEs `data` at maximum compression.
///
/// # Errors
///
/// Returns [`CodecError::CompressionFailed`] if the encoder fails.
pub fn deflate(data: &[u8]) -> CodecResult<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(data)
        .map_err(|e| CodecError::compression_failed(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| CodecError::compression_failed(e.to_string()))
}

/// Inflates a raw DEFLATE stream.
///
/// # Errors
///
/// Returns [`CodecError::DecompressionFailed`] if the stream is invalid.
pub fn inflate(data: &[u8]) -> CodecResult<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| CodecError::decompression_failed(e.to_string()))?;
    Ok(out)
}

/// Re-frames with the magic and checksum of `original` but a new type and body.
fn reframe(original: &[u8], chunk_type: ChunkType, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(CARRIED_PREFIX + 11 + body.len());
    out.extend_from_slice(&original[..CARRIED_PREFIX]);
    out.push(chunk_type.as_byte());
    write_uleb_into(&mut out, body.len() as u64);
    out.extend_from_slice(body);
    out
}

/// Compresses a change chunk.
///
/// The checksum bytes are copied verbatim: they keep protecting the
/// uncompressed change.
///
/// # Errors
///
/// Fails if `input` is not a valid change chunk or compression fails.
pub fn compress_chunk(input: &[u8]) -> CodecResult<Vec<u8>> {
    let body = validate_chunk(input, Some(ChunkType::Change))?;
    let deflated = deflate(body)?;
    debug!(
        uncompressed = body.len(),
        compressed = deflated.len(),
        "compressed change chunk"
    );
    Ok(reframe(input, ChunkType::Compressed, &deflated))
}

/// Decompresses a compressed chunk back into a change chunk.
///
/// # Errors
///
/// Fails if `input` is not a valid compressed chunk or its DEFLATE stream
/// is invalid.
pub fn decompress_chunk(input: &[u8]) -> CodecResult<Vec<u8>> {
    let body = validate_chunk(input, Some(ChunkType::Compressed))?;
    let inflated = inflate(body)?;
    debug!(
        compressed = body.len(),
        uncompressed = inflated.len(),
        "decompressed change chunk"
    );
    Ok(reframe(input, ChunkType::Change, &inflated))
}

/// Computes the checksum a compressed chunk's body should carry: that of
/// the change chunk it inflates to.
///
/// # Errors
///
/// Returns [`CodecError::DecompressionFailed`] if `body` does not inflate.
pub fn inflated_checksum(body: &[u8]) -> CodecResult<[u8; 4]> {
    let inflated = inflate(body)?;
    let mut payload = Vec::with_capacity(inflated.len() + 11);
    payload.push(ChunkType::Change.as_byte());
    write_uleb_into(&mut payload, inflated.len() as u64);
    payload.extend_from_slice(&inflated);
    Ok(checksum(&payload))
}

/// Rewrites the checksum of a change or compressed chunk.
///
/// Compressed chunks are inflated, re-summed and compressed again.
/// Document chunks are refused: their embedded change hashes would be stale
/// as well, and those are not rewritten here.
///
/// # Errors
///
/// Returns [`CodecError::UnsupportedTransform`] for document chunks and the
/// usual validation or codec errors otherwise.
pub fn fix_checksum(input: &[u8]) -> CodecResult<Vec<u8>> {
    validate_chunk(input, None)?;
    let compressed = input[CARRIED_PREFIX] == ChunkType::Compressed.as_byte();

    let mut chunk = if compressed {
        decompress_chunk(input)?
    } else {
        input.to_vec()
    };

    if chunk[CARRIED_PREFIX] == ChunkType::Document.as_byte() {
        warn!("refusing to fix checksum of document chunk");
        return Err(CodecError::unsupported_transform(
            "refusing to fix checksum of document chunk - your change hashes are probably wrong too",
        ));
    }

    let sum = checksum(&chunk[CARRIED_PREFIX..]);
    chunk[4..CARRIED_PREFIX].copy_from_slice(&sum);
    debug!(?sum, compressed, "rewrote chunk checksum");

    if compressed {
        compress_chunk(&chunk)
    } else {
        Ok(chunk)
    }
}
