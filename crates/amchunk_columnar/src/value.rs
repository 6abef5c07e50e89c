//! The value model shared by value-meta and value columns.
//!
//! A value-meta entry packs the byte length and kind of one value:
//!
//! ```text
//! spec = length << 4 | type
//! ```
//!
//! The value column then holds the concatenated value bytes, which are
//! sliced using the lengths from the meta entries.

use std::fmt;

use amchunk_codec::leb128::{scan_sleb, scan_uleb};
use amchunk_codec::{format_bytes, Diagnostic, DiagnosticKind, Field, VarintError};
use chrono::{DateTime, SecondsFormat};

/// The kind of a value, from the low four bits of its meta spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueKind {
    /// No value.
    Null = 0,
    /// Boolean false.
    False = 1,
    /// Boolean true.
    True = 2,
    /// ULEB128 unsigned integer.
    Uint = 3,
    /// SLEB128 signed integer.
    Int = 4,
    /// Little-endian IEEE 754 double.
    Float = 5,
    /// UTF-8 string.
    String = 6,
    /// Opaque bytes.
    Bytes = 7,
    /// SLEB128 counter.
    Counter = 8,
    /// SLEB128 milliseconds since the Unix epoch.
    Timestamp = 9,
}

impl ValueKind {
    /// Decodes a type code; codes 10..=15 are unassigned.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Null),
            1 => Some(Self::False),
            2 => Some(Self::True),
            3 => Some(Self::Uint),
            4 => Some(Self::Int),
            5 => Some(Self::Float),
            6 => Some(Self::String),
            7 => Some(Self::Bytes),
            8 => Some(Self::Counter),
            9 => Some(Self::Timestamp),
            _ => None,
        }
    }

    /// Converts the kind to its type code.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// One value-meta entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaEntry {
    /// Byte length of the value.
    pub length: u64,
    /// Raw type code (low four bits of the spec).
    pub type_code: u8,
}

impl MetaEntry {
    /// Unpacks a meta spec.
    pub fn from_spec(spec: u64) -> Self {
        Self {
            length: spec >> 4,
            type_code: (spec & 0x0f) as u8,
        }
    }

    /// Creates an entry for a known kind.
    pub fn new(kind: ValueKind, length: u64) -> Self {
        Self {
            length,
            type_code: kind.code(),
        }
    }

    /// The kind, if the type code is assigned.
    pub fn kind(&self) -> Option<ValueKind> {
        ValueKind::from_code(self.type_code)
    }

    /// Re-packs the entry into a spec.
    pub fn spec(&self) -> u64 {
        (self.length << 4) | u64::from(self.type_code & 0x0f)
    }
}

impl fmt::Display for MetaEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (length = {}, type = {})",
            self.spec(),
            self.length,
            self.type_code
        )
    }
}

/// A decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `null`
    Null,
    /// `true` or `false`
    Bool(bool),
    /// An unsigned integer.
    Uint(u64),
    /// A signed integer.
    Int(i64),
    /// A double.
    Float(f64),
    /// A string.
    Str(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// A counter.
    Counter(i64),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
    /// A value with an unassigned type code.
    Unknown(u8),
    /// A value whose bytes are too short to decode at all.
    Truncated(ValueKind),
}

impl Value {
    /// The meta entry describing this value, with its encoding.
    ///
    /// Returns `None` for values that cannot be encoded.
    pub fn encode(&self) -> Option<(MetaEntry, Vec<u8>)> {
        let (kind, bytes) = match self {
            Self::Null => (ValueKind::Null, Vec::new()),
            Self::Bool(false) => (ValueKind::False, Vec::new()),
            Self::Bool(true) => (ValueKind::True, Vec::new()),
            Self::Uint(v) => (ValueKind::Uint, amchunk_codec::write_uleb(*v)),
            Self::Int(v) => (ValueKind::Int, amchunk_codec::write_sleb(*v)),
            Self::Float(v) => (ValueKind::Float, v.to_le_bytes().to_vec()),
            Self::Str(s) => (ValueKind::String, s.as_bytes().to_vec()),
            Self::Bytes(b) => (ValueKind::Bytes, b.clone()),
            Self::Counter(v) => (ValueKind::Counter, amchunk_codec::write_sleb(*v)),
            Self::Timestamp(v) => (ValueKind::Timestamp, amchunk_codec::write_sleb(*v)),
            Self::Unknown(_) | Self::Truncated(_) => return None,
        };
        Some((MetaEntry::new(kind, bytes.len() as u64), bytes))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Uint(v) => write!(f, "uint {v}"),
            Self::Int(v) => write!(f, "int {v}"),
            Self::Float(v) => write!(f, "float {v}"),
            Self::Str(s) => write!(f, "string {s:?}"),
            Self::Bytes(b) => write!(f, "bytes {}", format_bytes(b)),
            Self::Counter(v) => write!(f, "counter {v}"),
            Self::Timestamp(ms) => write!(f, "time = {}", format_timestamp(*ms)),
            Self::Unknown(code) => write!(f, "unknown value type {code}"),
            Self::Truncated(kind) => write!(f, "truncated value (type = {})", kind.code()),
        }
    }
}

/// Renders milliseconds since the epoch as RFC 3339 UTC.
///
/// Zero is the "no timestamp" marker and renders as `0`.
pub fn format_timestamp(ms: i64) -> String {
    if ms == 0 {
        return "0".to_string();
    }
    match DateTime::from_timestamp_millis(ms) {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        None => format!("{ms} (out of range)"),
    }
}

/// The value column decoded against its meta entries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedValues<'a> {
    /// One field per decoded meta entry.
    pub values: Vec<Field<'a, Value>>,
    /// Bytes left after the last meta entry.
    pub extra: &'a [u8],
}

fn varint_diag(err: Option<VarintError>, context: &'static str) -> Option<Diagnostic> {
    err.map(|e| Diagnostic::varint(e).in_field(context))
}

/// Decodes one value from exactly the bytes its meta entry declares.
fn decode_value(bytes: &[u8], meta: MetaEntry) -> (Value, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let Some(kind) = meta.kind() else {
        diagnostics.push(Diagnostic::error(DiagnosticKind::UnknownValueType(
            meta.type_code,
        )));
        return (Value::Unknown(meta.type_code), diagnostics);
    };

    // bytes the encoding itself accounts for, when checkable
    let mut used = None;
    let value = match kind {
        ValueKind::Null => {
            used = Some(0);
            Value::Null
        }
        ValueKind::False | ValueKind::True => {
            used = Some(0);
            Value::Bool(kind == ValueKind::True)
        }
        ValueKind::Uint => {
            let scan = scan_uleb(bytes);
            diagnostics.extend(varint_diag(scan.error, "uleb"));
            used = Some(bytes.len() - scan.rest.len());
            Value::Uint(scan.value)
        }
        ValueKind::Int | ValueKind::Counter | ValueKind::Timestamp => {
            let scan = scan_sleb(bytes);
            diagnostics.extend(varint_diag(scan.error, "sleb"));
            used = Some(bytes.len() - scan.rest.len());
            match kind {
                ValueKind::Int => Value::Int(scan.value),
                ValueKind::Counter => Value::Counter(scan.value),
                _ => Value::Timestamp(scan.value),
            }
        }
        ValueKind::Float => {
            if meta.length != 8 {
                diagnostics.push(Diagnostic::error(DiagnosticKind::ValueLengthMismatch {
                    decoded: 8,
                    declared: meta.length,
                }));
            }
            match bytes.get(..8).and_then(|b| <[u8; 8]>::try_from(b).ok()) {
                Some(raw) => Value::Float(f64::from_le_bytes(raw)),
                None => Value::Truncated(ValueKind::Float),
            }
        }
        ValueKind::String => match std::str::from_utf8(bytes) {
            Ok(s) => Value::Str(s.to_string()),
            Err(_) => {
                diagnostics.push(Diagnostic::error(DiagnosticKind::InvalidUtf8).in_field("utf8"));
                Value::Str(String::from_utf8_lossy(bytes).into_owned())
            }
        },
        ValueKind::Bytes => Value::Bytes(bytes.to_vec()),
    };

    if let Some(decoded) = used {
        if decoded as u64 != meta.length {
            diagnostics.push(Diagnostic::error(DiagnosticKind::ValueLengthMismatch {
                decoded,
                declared: meta.length,
            }));
        }
    }

    (value, diagnostics)
}

/// Decodes a value column body using the meta entries of its value-meta
/// column.
///
/// Each value's field spans exactly its declared bytes. A value that runs
/// past the end of the column is decoded from the bytes present and ends
/// the walk.
pub fn decode_values<'a>(input: &'a [u8], metas: &[MetaEntry]) -> DecodedValues<'a> {
    let mut values = Vec::with_capacity(metas.len().min(input.len() + 1));
    let mut rest = input;

    for (i, meta) in metas.iter().enumerate() {
        let available = rest.len();
        let (take, short) = match usize::try_from(meta.length) {
            Ok(n) if n <= available => (n, false),
            _ => (available, true),
        };
        let (bytes, after) = rest.split_at(take);
        let (value, diagnostics) = decode_value(bytes, *meta);

        let mut field = Field::new(bytes, value);
        if short {
            field.push(Diagnostic::error(DiagnosticKind::NotEnoughBytes {
                needed: meta.length,
                available,
            }));
        }
        field.extend(diagnostics);
        rest = after;

        if short {
            let remaining = (metas.len() - i - 1) as u64;
            if remaining > 0 {
                field.push(Diagnostic::error(DiagnosticKind::MissingItems { remaining }));
            }
            values.push(field);
            break;
        }
        values.push(field);
    }

    DecodedValues {
        values,
        extra: rest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_spec_unpacking() {
        let m = MetaEntry::from_spec(0x85);
        assert_eq!(m.length, 8);
        assert_eq!(m.kind(), Some(ValueKind::Float));
        assert_eq!(m.spec(), 0x85);
        assert_eq!(m.to_string(), "133 (length = 8, type = 5)");
        assert_eq!(MetaEntry::from_spec(0x1a).kind(), None);
    }

    #[test]
    fn timestamp_formatting() {
        assert_eq!(format_timestamp(0), "0");
        assert_eq!(format_timestamp(1_000), "1970-01-01T00:00:01Z");
        assert_eq!(format_timestamp(1_500), "1970-01-01T00:00:01.500Z");
        assert_eq!(Value::Timestamp(0).to_string(), "time = 0");
        assert!(format_timestamp(i64::MAX).ends_with("(out of range)"));
    }

    #[test]
    fn display_labels() {
        assert_eq!(Value::Int(-3).to_string(), "int -3");
        assert_eq!(Value::Uint(3).to_string(), "uint 3");
        assert_eq!(Value::Counter(4).to_string(), "counter 4");
        assert_eq!(Value::Str("a\"b".into()).to_string(), "string \"a\\\"b\"");
        assert_eq!(Value::Bytes(vec![1, 2]).to_string(), "bytes [1, 2]");
        assert_eq!(Value::Float(1.5).to_string(), "float 1.5");
    }

    #[test]
    fn decode_mixed_values() {
        let values = [
            Value::Null,
            Value::Bool(true),
            Value::Uint(300),
            Value::Int(-2),
            Value::Float(0.25),
            Value::Str("hé".into()),
            Value::Bytes(vec![9, 9]),
            Value::Counter(7),
            Value::Timestamp(1_700_000_000_000),
        ];
        let mut metas = Vec::new();
        let mut body = Vec::new();
        for v in &values {
            let (meta, bytes) = v.encode().unwrap();
            metas.push(meta);
            body.extend(bytes);
        }

        let decoded = decode_values(&body, &metas);
        assert!(decoded.extra.is_empty());
        let got: Vec<Value> = decoded.values.iter().map(|f| f.value.clone()).collect();
        assert_eq!(got, values);
        assert!(decoded.values.iter().all(Field::is_clean));
    }

    #[test]
    fn varint_shorter_than_declared() {
        let metas = [MetaEntry::new(ValueKind::Uint, 2)];
        let decoded = decode_values(&[5, 0xaa], &metas);
        let field = &decoded.values[0];
        assert_eq!(field.value, Value::Uint(5));
        assert_eq!(field.bytes, &[5, 0xaa]);
        assert_eq!(
            field.diagnostics[0].kind,
            DiagnosticKind::ValueLengthMismatch {
                decoded: 1,
                declared: 2
            }
        );
    }

    #[test]
    fn short_float_keeps_bytes() {
        let metas = [
            MetaEntry::new(ValueKind::Float, 8),
            MetaEntry::new(ValueKind::Null, 0),
        ];
        let decoded = decode_values(&[1, 2, 3], &metas);
        assert_eq!(decoded.values.len(), 1);
        let field = &decoded.values[0];
        assert_eq!(field.value, Value::Truncated(ValueKind::Float));
        assert_eq!(field.bytes, &[1, 2, 3]);
        assert_eq!(
            field.diagnostics[0].kind,
            DiagnosticKind::NotEnoughBytes {
                needed: 8,
                available: 3
            }
        );
        assert_eq!(
            field.diagnostics.last().map(|d| d.kind.clone()),
            Some(DiagnosticKind::MissingItems { remaining: 1 })
        );
    }

    #[test]
    fn unknown_type_and_extra_bytes() {
        let metas = [MetaEntry::from_spec(0x1c)];
        let decoded = decode_values(&[4, 5, 6], &metas);
        assert_eq!(decoded.values[0].value, Value::Unknown(12));
        assert_eq!(decoded.values[0].bytes, &[4]);
        assert_eq!(decoded.extra, &[5, 6]);
    }

    #[test]
    fn invalid_utf8_string() {
        let metas = [MetaEntry::new(ValueKind::String, 1)];
        let decoded = decode_values(&[0xc3], &metas);
        assert_eq!(decoded.values[0].annotations(), "(utf8 error: invalid utf-8)");
    }
}
