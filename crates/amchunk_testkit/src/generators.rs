//! Property-based test generators using proptest.
//!
//! Provides strategies for well-formed chunks and for the ways they get
//! mangled in practice.

use amchunk_codec::ChunkType;
use amchunk_columnar::encoder::{encode_bools, encode_values, ColumnEncoder};
use amchunk_columnar::Value;
use proptest::prelude::*;

use crate::fixtures::{ChangeBuilder, DocumentBuilder};

/// Strategy for generating actor ids.
pub fn actor_id_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..=16)
}

/// Strategy for generating head hashes.
pub fn head_hash_strategy() -> impl Strategy<Value = [u8; 32]> {
    prop::array::uniform32(any::<u8>())
}

/// Strategy for generating values that have an encoding.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<u64>().prop_map(Value::Uint),
        any::<i64>().prop_map(Value::Int),
        any::<f64>().prop_map(Value::Float),
        "[a-z ]{0,12}".prop_map(Value::Str),
        prop::collection::vec(any::<u8>(), 0..12).prop_map(Value::Bytes),
        any::<i64>().prop_map(Value::Counter),
        any::<i64>().prop_map(Value::Timestamp),
    ]
}

/// Strategy for generating chunk types.
pub fn chunk_type_strategy() -> impl Strategy<Value = ChunkType> {
    prop_oneof![
        Just(ChunkType::Document),
        Just(ChunkType::Change),
        Just(ChunkType::Compressed),
    ]
}

/// Strategy for generating well-formed document chunks.
pub fn document_strategy() -> impl Strategy<Value = Vec<u8>> {
    (
        prop::collection::vec(actor_id_strategy(), 0..4),
        prop::collection::vec(head_hash_strategy(), 0..3),
        prop::collection::vec(any::<u64>(), 1..8),
        prop::collection::vec(any::<bool>(), 0..16),
        prop::collection::vec(value_strategy(), 0..8),
    )
        .prop_map(|(actors, heads, counters, flags, values)| {
            let (meta, data) = encode_values(&values);
            let mut doc = DocumentBuilder::new()
                .change_column(1, ColumnEncoder::new().uint_literals(&counters).finish())
                .op_column(52, encode_bools(&flags))
                .op_column(86, meta)
                .op_column(87, data);
            for actor in actors {
                doc = doc.actor(actor);
            }
            let indexes = (0..heads.len() as u64).collect();
            for head in heads {
                doc = doc.head(head);
            }
            doc.head_indexes(indexes).build()
        })
}

/// Strategy for generating well-formed change chunks.
pub fn change_strategy() -> impl Strategy<Value = Vec<u8>> {
    (
        actor_id_strategy(),
        prop::collection::vec(head_hash_strategy(), 0..3),
        1..1_000u64,
        any::<i64>(),
        "[ -~]{0,24}",
        prop::collection::vec(value_strategy(), 0..8),
    )
        .prop_map(|(actor, deps, seq, time, message, values)| {
            let (meta, data) = encode_values(&values);
            let mut change = ChangeBuilder::new(actor)
                .seq(seq)
                .time(time)
                .message(message)
                .op_column(86, meta)
                .op_column(87, data);
            for dep in deps {
                change = change.dep(dep);
            }
            change.build()
        })
}

/// Strategy for generating a well-formed chunk followed by a flipped byte.
///
/// Yields `(chunk, index)` with the byte at `index` already inverted.
pub fn corrupted_chunk_strategy() -> impl Strategy<Value = (Vec<u8>, usize)> {
    prop_oneof![document_strategy(), change_strategy()].prop_flat_map(|chunk| {
        let len = chunk.len();
        (Just(chunk), 0..len).prop_map(|(mut chunk, index)| {
            chunk[index] ^= 0xff;
            (chunk, index)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use amchunk_codec::validate_chunk;
    use amchunk_inspect::{annotate, InspectConfig};

    proptest! {
        #[test]
        fn test_document_strategy_valid(chunk in document_strategy()) {
            prop_assert!(validate_chunk(&chunk, Some(ChunkType::Document)).is_ok());
            let t = annotate(&chunk, &InspectConfig::default());
            prop_assert!(!t.has_errors(), "{}", t.to_text(4));
        }

        #[test]
        fn test_change_strategy_valid(chunk in change_strategy()) {
            prop_assert!(validate_chunk(&chunk, Some(ChunkType::Change)).is_ok());
            let t = annotate(&chunk, &InspectConfig::default());
            prop_assert!(!t.has_errors(), "{}", t.to_text(4));
        }

        #[test]
        fn test_value_strategy_encodes(value in value_strategy()) {
            prop_assert!(value.encode().is_some());
        }
    }
}
