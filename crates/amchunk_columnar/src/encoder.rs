//! Column encoders.
//!
//! The inverse of the decoders: builds RLE column bodies and column groups
//! byte for byte, so fixtures can construct well-formed (or deliberately
//! broken) documents and changes.

use amchunk_codec::leb128::{write_sleb_into, write_uleb_into};

use crate::value::{MetaEntry, Value};

/// Builds one RLE column body run by run.
#[derive(Debug, Clone, Default)]
pub struct ColumnEncoder {
    buf: Vec<u8>,
}

impl ColumnEncoder {
    /// Creates an empty encoder.
    pub fn new() -> Self {
        Self::default()
    }

    fn header(&mut self, count: i64) {
        write_sleb_into(&mut self.buf, count);
    }

    fn literal_header(&mut self, len: usize) {
        // literal counts are negative
        self.header(-(len as i64));
    }

    /// Appends `count` nulls.
    pub fn null_run(&mut self, count: u64) -> &mut Self {
        self.header(0);
        write_uleb_into(&mut self.buf, count);
        self
    }

    /// Appends `value` repeated `count` times.
    pub fn uint_run(&mut self, value: u64, count: i64) -> &mut Self {
        self.header(count);
        write_uleb_into(&mut self.buf, value);
        self
    }

    /// Appends literal unsigned values.
    pub fn uint_literals(&mut self, values: &[u64]) -> &mut Self {
        self.literal_header(values.len());
        for &v in values {
            write_uleb_into(&mut self.buf, v);
        }
        self
    }

    /// Appends `count` steps of `delta`.
    pub fn delta_run(&mut self, delta: i64, count: i64) -> &mut Self {
        self.header(count);
        write_sleb_into(&mut self.buf, delta);
        self
    }

    /// Appends literal deltas.
    pub fn delta_literals(&mut self, deltas: &[i64]) -> &mut Self {
        self.literal_header(deltas.len());
        for &d in deltas {
            write_sleb_into(&mut self.buf, d);
        }
        self
    }

    fn string(&mut self, s: &str) {
        write_uleb_into(&mut self.buf, s.len() as u64);
        self.buf.extend_from_slice(s.as_bytes());
    }

    /// Appends `value` repeated `count` times.
    pub fn string_run(&mut self, value: &str, count: i64) -> &mut Self {
        self.header(count);
        self.string(value);
        self
    }

    /// Appends literal strings.
    pub fn string_literals(&mut self, values: &[&str]) -> &mut Self {
        self.literal_header(values.len());
        for s in values {
            self.string(s);
        }
        self
    }

    /// Appends a meta entry repeated `count` times.
    pub fn meta_run(&mut self, entry: MetaEntry, count: i64) -> &mut Self {
        self.header(count);
        write_uleb_into(&mut self.buf, entry.spec());
        self
    }

    /// Appends literal meta entries.
    pub fn meta_literals(&mut self, entries: &[MetaEntry]) -> &mut Self {
        self.literal_header(entries.len());
        for e in entries {
            write_uleb_into(&mut self.buf, e.spec());
        }
        self
    }

    /// Appends raw bytes, for building malformed bodies.
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Returns the encoded body.
    pub fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

/// Encodes a boolean column from individual values.
pub fn encode_bools(values: &[bool]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut current = false;
    let mut count = 0u64;
    for &v in values {
        if v == current {
            count += 1;
        } else {
            write_uleb_into(&mut out, count);
            current = v;
            count = 1;
        }
    }
    if count > 0 {
        write_uleb_into(&mut out, count);
    }
    out
}

/// Encodes values into a value-meta body and a value body.
///
/// Consecutive values with identical meta entries share one repeat run;
/// everything else is written as single literals. Values that have no
/// encoding are skipped.
pub fn encode_values(values: &[Value]) -> (Vec<u8>, Vec<u8>) {
    let mut meta = ColumnEncoder::new();
    let mut data = Vec::new();
    let mut pending: Option<(MetaEntry, i64)> = None;

    for (entry, bytes) in values.iter().filter_map(Value::encode) {
        data.extend_from_slice(&bytes);
        pending = match pending {
            Some((prev, n)) if prev == entry => Some((prev, n + 1)),
            Some((prev, 1)) => {
                meta.meta_literals(&[prev]);
                Some((entry, 1))
            }
            Some((prev, n)) => {
                meta.meta_run(prev, n);
                Some((entry, 1))
            }
            None => Some((entry, 1)),
        };
    }
    match pending {
        Some((prev, 1)) => {
            meta.meta_literals(&[prev]);
        }
        Some((prev, n)) => {
            meta.meta_run(prev, n);
        }
        None => {}
    }

    (meta.finish(), data)
}

/// Builds the descriptors and concatenated bodies of one column group.
#[derive(Debug, Clone, Default)]
pub struct ColumnGroupEncoder {
    columns: Vec<(u64, Vec<u8>)>,
}

impl ColumnGroupEncoder {
    /// Creates an empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column with the given spec and body.
    pub fn column(&mut self, spec: u64, body: Vec<u8>) -> &mut Self {
        self.columns.push((spec, body));
        self
    }

    /// Returns `(descriptors, bodies)`.
    ///
    /// Columns are written in the order they were added.
    pub fn finish(&self) -> (Vec<u8>, Vec<u8>) {
        let mut descriptors = Vec::new();
        let mut bodies = Vec::new();
        write_uleb_into(&mut descriptors, self.columns.len() as u64);
        for (spec, body) in &self.columns {
            write_uleb_into(&mut descriptors, *spec);
            write_uleb_into(&mut descriptors, body.len() as u64);
            bodies.extend_from_slice(body);
        }
        (descriptors, bodies)
    }
}
