//! Transform step: header prefixing, checksum repair and (de)compression.

use amchunk_codec::{add_header, compress_chunk, decompress_chunk, fix_checksum, ChunkType};
use tracing::info;

/// Header to add to bare body bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    /// Document chunk.
    Document,
    /// Change chunk.
    Change,
}

/// The requested transforms.
#[derive(Debug, Clone, Copy, Default)]
pub struct Transform {
    /// Frame the input as a chunk of this type.
    pub prefix: Option<Prefix>,
    /// Recompute the checksum. Ignored when a prefix is added, as the new
    /// header is already correct.
    pub fix_checksum: bool,
    /// Compress a change chunk.
    pub compress: bool,
    /// Decompress a compressed chunk.
    pub decompress: bool,
}

/// Applies the transforms in order and returns the resulting bytes.
pub fn run(input: Vec<u8>, transform: &Transform) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut bytes = match transform.prefix {
        Some(Prefix::Document) => add_header(&input, ChunkType::Document),
        Some(Prefix::Change) => add_header(&input, ChunkType::Change),
        None if transform.fix_checksum => {
            let fixed = fix_checksum(&input)?;
            info!(len = fixed.len(), "fixed checksum");
            fixed
        }
        None => input,
    };

    if transform.compress {
        bytes = compress_chunk(&bytes)?;
    } else if transform.decompress {
        bytes = decompress_chunk(&bytes)?;
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use amchunk_codec::{build_chunk, CodecError};

    #[test]
    fn prefix_then_compress() {
        let body = vec![0u8; 64];
        let out = run(
            body.clone(),
            &Transform {
                prefix: Some(Prefix::Change),
                compress: true,
                ..Transform::default()
            },
        )
        .unwrap();
        assert_eq!(out[8], ChunkType::Compressed.as_byte());
        assert_eq!(decompress_chunk(&out).unwrap(), build_chunk(ChunkType::Change, &body));
    }

    #[test]
    fn fix_checksum_on_document_fails() {
        let doc = build_chunk(ChunkType::Document, &[]);
        let err = run(
            doc,
            &Transform {
                fix_checksum: true,
                ..Transform::default()
            },
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CodecError>(),
            Some(CodecError::UnsupportedTransform { .. })
        ));
    }

    #[test]
    fn no_transform_is_identity() {
        let input = vec![1, 2, 3];
        assert_eq!(run(input.clone(), &Transform::default()).unwrap(), input);
    }
}
