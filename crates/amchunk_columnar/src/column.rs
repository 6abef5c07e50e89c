//! Column descriptors.
//!
//! A column group starts with a ULEB128 count followed by that many
//! `(spec, length)` pairs. The bodies follow all descriptors of the group,
//! in the same order, each exactly `length` bytes long.
//!
//! ```text
//! spec = id << 4 | deflate << 3 | type
//! ```

use std::fmt;

use amchunk_codec::leb128::{scan_uleb, uleb_field};
use amchunk_codec::{Diagnostic, DiagnosticKind, Field};

/// Which set of columns a descriptor list belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnGroup {
    /// Per-change metadata columns of a document.
    Change,
    /// Operation columns of a document or change.
    Operation,
}

impl ColumnGroup {
    /// Lower-case name used in listings.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Change => "change",
            Self::Operation => "operation",
        }
    }

    /// Returns the well-known name of the column with this spec.
    pub fn column_name(self, spec: u64) -> Option<&'static str> {
        match self {
            Self::Change => match spec {
                1 => Some("actor"),
                3 => Some("sequence number"),
                19 => Some("maxOp"),
                35 => Some("time"),
                53 => Some("message"),
                64 => Some("dependencies group"),
                67 => Some("dependencies index"),
                86 => Some("extra metadata"),
                87 => Some("extra data"),
                _ => None,
            },
            Self::Operation => match spec {
                1 => Some("object actor id"),
                2 => Some("object counter"),
                17 => Some("key actor id"),
                19 => Some("key counter"),
                21 => Some("key string"),
                33 => Some("actor id"),
                35 => Some("counter"),
                52 => Some("insert"),
                66 => Some("action"),
                86 => Some("value meta"),
                87 => Some("value"),
                112 => Some("predecessor group"),
                113 => Some("predecessor actor id"),
                115 => Some("predecessor counter"),
                128 => Some("successor group"),
                129 => Some("successor actor id"),
                131 => Some("successor counter"),
                _ => None,
            },
        }
    }
}

impl fmt::Display for ColumnGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Encoding of a column body, from the low three bits of its spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ColumnType {
    /// Group cardinalities (ULEB128 RLE).
    Group = 0,
    /// Actor indexes (ULEB128 RLE).
    Actor = 1,
    /// Plain unsigned integers (ULEB128 RLE).
    Uleb = 2,
    /// Delta-encoded integers.
    Delta = 3,
    /// Alternating boolean runs.
    Boolean = 4,
    /// UTF-8 strings (RLE).
    String = 5,
    /// Value length/type metadata (ULEB128 RLE).
    ValueMeta = 6,
    /// Raw value bytes described by a value-meta column.
    Value = 7,
}

impl ColumnType {
    /// Decodes the type from the low three bits of `bits`.
    ///
    /// All eight codes are assigned, so every spec has a column type.
    pub fn from_bits(bits: u64) -> Self {
        match bits & 0x07 {
            0 => Self::Group,
            1 => Self::Actor,
            2 => Self::Uleb,
            3 => Self::Delta,
            4 => Self::Boolean,
            5 => Self::String,
            6 => Self::ValueMeta,
            _ => Self::Value,
        }
    }

    /// Converts the type to its numeric code.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// One column descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// The full spec value.
    pub spec: u64,
    /// Column id (`spec >> 4`).
    pub id: u64,
    /// Body encoding (`spec & 0x7`).
    pub column_type: ColumnType,
    /// Whether the body is DEFLATE-compressed (bit 3).
    pub deflate: bool,
    /// Declared body length in bytes.
    pub length: u64,
}

impl Column {
    /// Unpacks a spec and length into a descriptor.
    pub fn from_spec(spec: u64, length: u64) -> Self {
        Self {
            spec,
            id: spec >> 4,
            column_type: ColumnType::from_bits(spec),
            deflate: spec & 0x08 != 0,
            length,
        }
    }

    /// Human readable title within `group`.
    pub fn title(&self, group: ColumnGroup) -> String {
        match group.column_name(self.spec) {
            Some(name) => name.to_string(),
            None => format!(
                "Unknown (id={}, type={})",
                self.id,
                self.column_type.as_u8()
            ),
        }
    }
}

/// The descriptor list of one column group.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptors<'a> {
    /// Which group this is.
    pub group: ColumnGroup,
    /// The column count.
    pub count: Field<'a, u64>,
    /// Each descriptor, spanning its spec and length bytes.
    pub columns: Vec<Field<'a, Column>>,
}

impl<'a> ColumnDescriptors<'a> {
    /// A group with no columns and no bytes.
    pub fn empty(group: ColumnGroup) -> Self {
        Self {
            group,
            count: Field::new(&[], 0),
            columns: Vec::new(),
        }
    }

    /// Iterates over the decoded descriptors.
    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().map(|field| &field.value)
    }
}

/// Reads the descriptor list of a column group.
///
/// Column bodies are not consumed; they follow once every descriptor of
/// the group is known.
pub fn parse_columns(input: &[u8], group: ColumnGroup) -> (ColumnDescriptors<'_>, &[u8]) {
    let (mut count, mut rest) = uleb_field(input, None);
    let mut columns = Vec::new();
    let mut remaining = count.value;

    while remaining > 0 {
        if rest.is_empty() {
            count.push(Diagnostic::error(DiagnosticKind::MissingItems { remaining }));
            break;
        }
        let start = rest;
        let spec = scan_uleb(start);
        let length = scan_uleb(spec.rest);
        let bytes = &start[..start.len() - length.rest.len()];

        let mut field = Field::new(bytes, Column::from_spec(spec.value, length.value));
        match spec.error {
            Some(err) => field.push(Diagnostic::varint(err).in_field("spec")),
            None if spec.value > u64::from(u32::MAX) => {
                field.push(Diagnostic::error(DiagnosticKind::SpecTooLarge));
            }
            None => {}
        }
        match length.error {
            Some(err) => field.push(Diagnostic::varint(err).in_field("length")),
            None if usize::try_from(length.value).is_err() => {
                field.push(Diagnostic::error(DiagnosticKind::LengthTooLarge));
            }
            None => {}
        }

        columns.push(field);
        rest = length.rest;
        remaining -= 1;
    }

    (
        ColumnDescriptors {
            group,
            count,
            columns,
        },
        rest,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use amchunk_codec::VarintError;

    #[test]
    fn spec_unpacking() {
        let c = Column::from_spec(87, 12);
        assert_eq!(c.id, 5);
        assert_eq!(c.column_type, ColumnType::Value);
        assert!(!c.deflate);

        let d = Column::from_spec(0x5e, 3);
        assert_eq!(d.id, 5);
        assert_eq!(d.column_type, ColumnType::ValueMeta);
        assert!(d.deflate);
    }

    #[test]
    fn titles() {
        let value = Column::from_spec(87, 0);
        assert_eq!(value.title(ColumnGroup::Operation), "value");
        assert_eq!(value.title(ColumnGroup::Change), "extra data");
        assert_eq!(
            Column::from_spec(0x92, 0).title(ColumnGroup::Operation),
            "Unknown (id=9, type=2)"
        );
    }

    #[test]
    fn parse_two_columns() {
        let input = [2, 1, 4, 0xd3, 0x01, 2, 0xaa];
        let (cols, rest) = parse_columns(&input, ColumnGroup::Change);
        assert_eq!(cols.count.value, 2);
        assert_eq!(cols.columns.len(), 2);
        assert_eq!(cols.columns[0].bytes, &[1, 4]);
        assert_eq!(cols.columns[1].bytes, &[0xd3, 0x01, 2]);
        assert_eq!(cols.columns[1].value.spec, 211);
        assert_eq!(rest, &[0xaa]);
    }

    #[test]
    fn count_beyond_input_stops() {
        let input = [200, 1, 4];
        let (cols, rest) = parse_columns(&input, ColumnGroup::Operation);
        assert_eq!(cols.columns.len(), 1);
        assert!(rest.is_empty());
        assert_eq!(
            cols.count.diagnostics[0].kind,
            DiagnosticKind::MissingItems { remaining: 199 }
        );
    }

    #[test]
    fn malformed_length_annotated() {
        let input = [1, 1, 0x80];
        let (cols, _) = parse_columns(&input, ColumnGroup::Operation);
        let diag = &cols.columns[0].diagnostics[0];
        assert_eq!(diag.context, Some("length"));
        assert_eq!(diag.kind, DiagnosticKind::MalformedVarint(VarintError::Truncated));
    }

    #[test]
    fn oversized_spec_flagged() {
        let mut input = vec![1];
        input.extend(amchunk_codec::write_uleb(u64::from(u32::MAX) + 1));
        input.push(0);
        let (cols, _) = parse_columns(&input, ColumnGroup::Operation);
        assert_eq!(cols.columns[0].diagnostics[0].kind, DiagnosticKind::SpecTooLarge);
    }
}
