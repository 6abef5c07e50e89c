//! Fuzz testing harnesses.
//!
//! Each target takes arbitrary bytes and asserts the decoders' contracts:
//! nothing panics, and every listing accounts for every input byte exactly
//! once. They can be driven by cargo-fuzz or by proptest.

use amchunk_codec::leb128::{scan_sleb, scan_uleb, write_sleb, write_uleb};
use amchunk_codec::{compress_chunk, decompress_chunk, parse_chunk, split_chunks};
use amchunk_columnar::{ChangeChunk, DecodeConfig, DecodeContext, DocumentChunk};
use amchunk_inspect::{annotate, InspectConfig};

/// Fuzz target for the annotator.
///
/// The reassembled listing must equal the input.
pub fn fuzz_annotate(data: &[u8]) {
    let transcript = annotate(data, &InspectConfig::default());
    assert_eq!(transcript.reassemble(), data, "listing lost or duplicated bytes");
}

/// Fuzz target for the annotator with a small expansion limit.
pub fn fuzz_annotate_limited(data: &[u8]) {
    let config = InspectConfig::new().with_decode(DecodeConfig::new().with_max_expanded_values(8));
    let transcript = annotate(data, &config);
    assert_eq!(transcript.reassemble(), data, "listing lost or duplicated bytes");
}

/// Fuzz target for the varint scanners.
///
/// Values decoded without error must re-encode to the bytes they came
/// from.
pub fn fuzz_leb128(data: &[u8]) {
    let scan = scan_uleb(data);
    if scan.error.is_none() {
        let used = data.len() - scan.rest.len();
        assert_eq!(write_uleb(scan.value), &data[..used], "uleb not canonical");
    }

    let scan = scan_sleb(data);
    if scan.error.is_none() {
        let used = data.len() - scan.rest.len();
        assert_eq!(write_sleb(scan.value), &data[..used], "sleb not canonical");
    }
}

/// Fuzz target for chunk splitting.
///
/// Parsed chunks and the trailing fragment must tile the input.
pub fn fuzz_split_chunks(data: &[u8]) {
    let mut chunks = split_chunks(data);
    let mut total = 0;
    loop {
        let before = chunks.remaining().len();
        match chunks.next() {
            Some(Ok(view)) => total += view.encoded_len(),
            // a trailing fragment ends the walk
            Some(Err(_)) => total += before,
            None => break,
        }
    }
    assert_eq!(total, data.len(), "chunks do not tile the input");
}

/// Fuzz target for body decoding.
///
/// Decodes the bytes as both a document and a change body.
pub fn fuzz_bodies(data: &[u8]) {
    let mut ctx = DecodeContext::default();
    let _ = DocumentChunk::decode(data, &mut ctx);
    let _ = ChangeChunk::decode(data, &mut ctx);
}

/// Fuzz target for chunk compression.
///
/// Compressing a change chunk and decompressing it again must restore it.
pub fn fuzz_compress_roundtrip(data: &[u8]) {
    if let Ok(compressed) = compress_chunk(data) {
        let restored = decompress_chunk(&compressed).expect("decompress what was compressed");
        assert_eq!(restored, data, "compression roundtrip mismatch");
    }
    if parse_chunk(data).is_ok() {
        let _ = decompress_chunk(data);
    }
}
