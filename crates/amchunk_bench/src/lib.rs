//! Benchmark utilities.

use amchunk_columnar::encoder::{encode_bools, encode_values, ColumnEncoder};
use amchunk_columnar::Value;
use amchunk_testkit::{ChangeBuilder, DocumentBuilder};
use rand::Rng;

/// Generate random bytes of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate `count` random values of mixed types.
pub fn random_values(count: usize) -> Vec<Value> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| match rng.gen_range(0..5) {
            0 => Value::Null,
            1 => Value::Uint(rng.gen()),
            2 => Value::Int(rng.gen()),
            3 => Value::Str(format!("value_{i}")),
            _ => Value::Bool(rng.gen()),
        })
        .collect()
}

/// Generate a document whose operation columns hold `ops` entries.
pub fn document_with_ops(ops: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    let counters: Vec<u64> = (0..ops as u64).collect();
    let flags: Vec<bool> = (0..ops).map(|_| rng.gen_bool(0.1)).collect();
    let (meta, data) = encode_values(&random_values(ops));

    DocumentBuilder::new()
        .actor(random_data(16))
        .head(rng.gen())
        .change_column(1, ColumnEncoder::new().uint_run(0, 1).finish())
        .op_column(2, ColumnEncoder::new().uint_literals(&counters).finish())
        .op_column(19, ColumnEncoder::new().delta_run(1, ops as i64).finish())
        .op_column(52, encode_bools(&flags))
        .op_column(86, meta)
        .op_column(87, data)
        .head_indexes(vec![0])
        .build()
}

/// Generate a change chunk with `ops` values and a random message.
pub fn change_with_ops(ops: usize) -> Vec<u8> {
    let (meta, data) = encode_values(&random_values(ops));
    ChangeBuilder::new(random_data(16))
        .seq(1)
        .time(1_700_000_000_000)
        .message("benchmark change")
        .op_column(86, meta)
        .op_column(87, data)
        .build()
}
