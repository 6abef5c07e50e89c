//! Hex test vectors for the chunk format.
//!
//! Each vector pairs encoded bytes with the value they decode to, or the
//! error they must produce. They can be exported as JSON for other
//! implementations of the format.

use serde::{Deserialize, Serialize};

/// A test vector that can be shared across implementations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// Input data (hex-encoded).
    pub input_hex: String,
    /// Expected decoding, rendered as text.
    pub expected: String,
    /// Expected error message (if this should fail).
    pub expected_error: Option<String>,
}

impl TestVector {
    fn ok(id: &str, description: &str, input_hex: &str, expected: &str) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            input_hex: input_hex.into(),
            expected: expected.into(),
            expected_error: None,
        }
    }

    fn err(id: &str, description: &str, input_hex: &str, error: &str) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            input_hex: input_hex.into(),
            expected: String::new(),
            expected_error: Some(error.into()),
        }
    }
}

/// Unsigned LEB128 vectors.
pub fn uleb_vectors() -> Vec<TestVector> {
    vec![
        TestVector::ok("uleb_0", "zero", "00", "0"),
        TestVector::ok("uleb_127", "largest 1-byte", "7f", "127"),
        TestVector::ok("uleb_128", "smallest 2-byte", "8001", "128"),
        TestVector::ok("uleb_300", "300", "ac02", "300"),
        TestVector::ok(
            "uleb_max",
            "u64::MAX",
            "ffffffffffffffffff01",
            "18446744073709551615",
        ),
        TestVector::err("uleb_truncated", "continuation at end", "80", "failed to find end of LEB"),
        TestVector::err("uleb_overlong", "trailing zero group", "8000", "overly long LEB"),
        TestVector::err(
            "uleb_overflow",
            "tenth group above 1",
            "ffffffffffffffffff02",
            "LEB > 64-bit",
        ),
    ]
}

/// Signed LEB128 vectors.
pub fn sleb_vectors() -> Vec<TestVector> {
    vec![
        TestVector::ok("sleb_neg1", "minus one", "7f", "-1"),
        TestVector::ok("sleb_63", "largest positive 1-byte", "3f", "63"),
        TestVector::ok("sleb_64", "smallest positive 2-byte", "c000", "64"),
        TestVector::ok("sleb_neg64", "smallest negative 1-byte", "40", "-64"),
        TestVector::ok("sleb_neg65", "largest negative 2-byte", "bf7f", "-65"),
        TestVector::err("sleb_overlong", "redundant sign group", "ff7f", "overly long LEB"),
        TestVector::err("sleb_truncated", "continuation at end", "ff", "failed to find end of LEB"),
    ]
}

/// Chunk envelope vectors. `expected` is the checksum status.
pub fn chunk_vectors() -> Vec<TestVector> {
    vec![
        TestVector::ok("chunk_empty_document", "document with no body", "856f4a8396a296d20000", "valid"),
        TestVector::ok(
            "chunk_bare_document",
            "document with zero counts",
            "856f4a83b81a9544000400000000",
            "valid",
        ),
        TestVector::ok(
            "chunk_minimal_change",
            "change with no ops",
            "856f4a83bf4a61e601090001aa010100000000",
            "valid",
        ),
        TestVector::ok(
            "chunk_bad_checksum",
            "zeroed checksum",
            "856f4a83000000000000",
            "mismatch 96a296d2",
        ),
        TestVector::ok(
            "chunk_compressed",
            "compressed checksums are not validated",
            "856f4a830000000002020300",
            "not validated",
        ),
        TestVector::err(
            "chunk_invalid_magic",
            "magic bytes zeroed",
            "0000000096a296d20000",
            "not a valid chunk (invalid magic bytes)",
        ),
        TestVector::err(
            "chunk_truncated",
            "declared length beyond input",
            "856f4a8396a296d2000500",
            "not a valid chunk (declared length 5 exceeds 1 available bytes)",
        ),
        TestVector::err(
            "chunk_unknown_type",
            "type byte 7",
            "856f4a8396a296d20700",
            "not a valid chunk (unknown type 7)",
        ),
    ]
}

/// Run-length column vectors. `expected` is the expanded column.
///
/// The id prefix names the column decoder: `uint`, `delta` or `bool`.
pub fn rle_vectors() -> Vec<TestVector> {
    vec![
        TestVector::ok("uint_repeat", "one repeat run", "0305", "5,5,5"),
        TestVector::ok("uint_literals", "two literals", "7e0102", "1,2"),
        TestVector::ok("uint_nulls", "null run", "0002", "null,null"),
        TestVector::ok("uint_mixed", "repeat, null, literal", "02070001 7f09", "7,7,null,9"),
        TestVector::ok("delta_literals", "two literal deltas", "7e0502", "5,7"),
        TestVector::ok("delta_repeat", "repeated step", "0302", "2,4,6"),
        TestVector::ok("delta_negative", "decreasing run", "7e0a7d", "10,7"),
        TestVector::ok("bool_runs", "false then true", "0302", "false,false,false,true,true"),
        TestVector::ok("bool_leading_true", "empty false run", "0002", "true,true"),
    ]
}

/// Generate all test vectors as JSON for cross-implementation use.
pub fn all_vectors_json() -> String {
    let vectors = AllTestVectors {
        uleb: uleb_vectors(),
        sleb: sleb_vectors(),
        chunk: chunk_vectors(),
        rle: rle_vectors(),
    };

    serde_json::to_string_pretty(&vectors).expect("Failed to serialize vectors")
}

#[derive(Debug, Serialize, Deserialize)]
struct AllTestVectors {
    uleb: Vec<TestVector>,
    sleb: Vec<TestVector>,
    chunk: Vec<TestVector>,
    rle: Vec<TestVector>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::golden::hex_decode;
    use amchunk_codec::leb128::{read_sleb, read_uleb};
    use amchunk_codec::{hex_encode, parse_chunk, validate_chunk, ChecksumStatus};
    use amchunk_columnar::rle::{decode_bool_runs, decode_delta_runs, decode_uleb_runs, expand_bools};
    use amchunk_columnar::{DecodeConfig, Run};

    fn check<T: ToString, E: ToString>(vector: &TestVector, result: Result<T, E>) {
        match (&vector.expected_error, result) {
            (None, Ok(v)) => assert_eq!(v.to_string(), vector.expected, "Vector {}", vector.id),
            (Some(want), Err(e)) => assert_eq!(&e.to_string(), want, "Vector {}", vector.id),
            (None, Err(e)) => panic!("Vector {} failed: {}", vector.id, e.to_string()),
            (Some(_), Ok(v)) => panic!("Vector {} decoded to {}", vector.id, v.to_string()),
        }
    }

    #[test]
    fn test_uleb_vectors() {
        for vector in uleb_vectors() {
            let input = hex_decode(&vector.input_hex);
            check(&vector, read_uleb(&input).map(|(v, _)| v));
        }
    }

    #[test]
    fn test_sleb_vectors() {
        for vector in sleb_vectors() {
            let input = hex_decode(&vector.input_hex);
            check(&vector, read_sleb(&input).map(|(v, _)| v));
        }
    }

    #[test]
    fn test_chunk_vectors() {
        for vector in chunk_vectors() {
            let input = hex_decode(&vector.input_hex);
            if vector.expected_error.is_some() {
                check(&vector, validate_chunk(&input, None).map(|_| ""));
                continue;
            }
            let (view, rest) = parse_chunk(&input).unwrap();
            assert!(rest.is_empty(), "Vector {}", vector.id);
            let status = match view.checksum.value {
                ChecksumStatus::Valid => "valid".to_string(),
                ChecksumStatus::NotValidated => "not validated".to_string(),
                ChecksumStatus::Mismatch { expected } => format!("mismatch {}", hex_encode(&expected)),
            };
            assert_eq!(status, vector.expected, "Vector {}", vector.id);
        }
    }

    fn expand_uints(input: &[u8]) -> Vec<String> {
        let mut out = Vec::new();
        for run in decode_uleb_runs(input, &DecodeConfig::default()) {
            match run {
                Run::Null(n) => out.extend((0..n.value).map(|_| "null".to_string())),
                Run::Repeat(r) => {
                    out.extend((0..r.value.count).map(|_| r.value.value.to_string()));
                }
                Run::Literal { items, .. } => {
                    out.extend(items.iter().map(|i| i.value.to_string()));
                }
            }
        }
        out
    }

    fn expand_deltas(input: &[u8]) -> Vec<String> {
        let mut out = Vec::new();
        for run in decode_delta_runs(input, &DecodeConfig::default()) {
            match run {
                Run::Null(n) => out.extend((0..n.value).map(|_| "null".to_string())),
                Run::Repeat(r) => {
                    let step = r.value.value;
                    out.extend(
                        (0..r.value.count as i64).map(|i| (step.first + i * step.delta).to_string()),
                    );
                }
                Run::Literal { items, .. } => {
                    out.extend(items.iter().map(|i| i.value.value.to_string()));
                }
            }
        }
        out
    }

    #[test]
    fn test_rle_vectors() {
        for vector in rle_vectors() {
            let input = hex_decode(&vector.input_hex);
            let values = if vector.id.starts_with("uint") {
                expand_uints(&input)
            } else if vector.id.starts_with("delta") {
                expand_deltas(&input)
            } else {
                let runs = decode_bool_runs(&input);
                expand_bools(&runs, usize::MAX)
                    .iter()
                    .map(bool::to_string)
                    .collect()
            };
            assert_eq!(values.join(","), vector.expected, "Vector {}", vector.id);
        }
    }

    #[test]
    fn test_all_vectors_json() {
        let json = all_vectors_json();
        assert!(json.contains("\"uleb_300\""));
        assert!(json.contains("\"chunk_empty_document\""));
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["rle"].as_array().map(Vec::len), Some(rle_vectors().len()));
    }
}
