//! Column body decoding.
//!
//! Bodies are dispatched on the descriptor's `{type, deflate}` pair. Value
//! columns depend on the value-meta column with the same id that precedes
//! them, so decoding threads a [`DecodeContext`] that caches meta entries.

use std::collections::HashMap;

use amchunk_codec::leb128::uleb_field;
use amchunk_codec::{Diagnostic, DiagnosticKind, Field};
use tracing::debug;

use crate::column::{Column, ColumnDescriptors, ColumnGroup, ColumnType};
use crate::config::DecodeConfig;
use crate::rle::{
    decode_bool_runs, decode_delta_runs, decode_runs, decode_string_runs, decode_uleb_runs,
    BoolRun, DeltaStep, DeltaValue, Plain, Run,
};
use crate::value::{decode_values, DecodedValues, MetaEntry};

/// State shared by every column decoded from one chunk body.
#[derive(Debug, Clone, Default)]
pub struct DecodeContext {
    /// Limits in force.
    pub config: DecodeConfig,
    meta: HashMap<(ColumnGroup, u64), Vec<MetaEntry>>,
}

impl DecodeContext {
    /// Creates a context with the given limits.
    pub fn new(config: DecodeConfig) -> Self {
        Self {
            config,
            meta: HashMap::new(),
        }
    }

    /// Meta entries remembered for a column id.
    pub fn meta(&self, group: ColumnGroup, id: u64) -> Option<&[MetaEntry]> {
        self.meta.get(&(group, id)).map(Vec::as_slice)
    }

    /// Forgets all remembered meta entries.
    pub fn reset(&mut self) {
        self.meta.clear();
    }
}

/// A decoded column body.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnBody<'a> {
    /// A DEFLATE-compressed body, left opaque.
    Compressed(&'a [u8]),
    /// Group, actor or plain integer runs.
    Integers(Vec<Run<'a, u64>>),
    /// Delta runs.
    Deltas(Vec<Run<'a, DeltaStep, DeltaValue>>),
    /// Boolean runs.
    Booleans(Vec<Field<'a, BoolRun>>),
    /// String runs.
    Strings(Vec<Run<'a, String>>),
    /// Value-meta runs.
    ValueMeta(Vec<Run<'a, MetaEntry>>),
    /// Values decoded against the matching meta column.
    Values(DecodedValues<'a>),
    /// A value column with no meta column to interpret it.
    MissingMeta(Field<'a, ()>),
}

/// One column with its body.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnData<'a> {
    /// Which group the column belongs to.
    pub group: ColumnGroup,
    /// The descriptor.
    pub column: Column,
    /// The body bytes, `column.length` long unless the input ran out.
    pub bytes: &'a [u8],
    /// The decoded body.
    pub body: ColumnBody<'a>,
    /// Problems with the column as a whole.
    pub diagnostics: Vec<Diagnostic>,
}

impl ColumnData<'_> {
    /// Human readable column title.
    pub fn title(&self) -> String {
        self.column.title(self.group)
    }
}

fn meta_entry_field(input: &[u8]) -> (Field<'_, MetaEntry>, &[u8]) {
    let (field, rest) = uleb_field(input, Some("meta"));
    (field.map(MetaEntry::from_spec), rest)
}

/// Expands value-meta runs into one entry per value.
///
/// Null runs contribute no entries.
fn expand_meta(
    runs: &[Run<'_, MetaEntry>],
    limit: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<MetaEntry> {
    let mut entries = Vec::new();
    for run in runs {
        match run {
            Run::Null(_) => {}
            Run::Repeat(field) => {
                let room = limit - entries.len();
                let count = usize::try_from(field.value.count).unwrap_or(usize::MAX);
                if count > room {
                    entries.extend(std::iter::repeat(field.value.value).take(room));
                    diagnostics.push(Diagnostic::error(DiagnosticKind::TooManyValues { limit }));
                    return entries;
                }
                entries.extend(std::iter::repeat(field.value.value).take(count));
            }
            Run::Literal { items, .. } => {
                for item in items {
                    if entries.len() == limit {
                        diagnostics
                            .push(Diagnostic::error(DiagnosticKind::TooManyValues { limit }));
                        return entries;
                    }
                    entries.push(item.value);
                }
            }
        }
    }
    entries
}

/// Decodes one column body.
///
/// Value-meta columns record their entries in `ctx`; value columns read
/// them back.
pub fn decode_column<'a>(
    ctx: &mut DecodeContext,
    group: ColumnGroup,
    column: &Column,
    body: &'a [u8],
) -> (ColumnBody<'a>, Vec<Diagnostic>) {
    let config = ctx.config;
    let mut diagnostics = Vec::new();

    if column.deflate {
        if column.column_type == ColumnType::ValueMeta {
            ctx.meta.remove(&(group, column.id));
        }
        return (ColumnBody::Compressed(body), diagnostics);
    }

    let decoded = match column.column_type {
        ColumnType::Group | ColumnType::Actor | ColumnType::Uleb => {
            ColumnBody::Integers(decode_uleb_runs(body, &config))
        }
        ColumnType::Delta => ColumnBody::Deltas(decode_delta_runs(body, &config)),
        ColumnType::Boolean => ColumnBody::Booleans(decode_bool_runs(body)),
        ColumnType::String => ColumnBody::Strings(decode_string_runs(body, &config)),
        ColumnType::ValueMeta => {
            let runs = decode_runs(body, &config, &mut Plain(meta_entry_field));
            let entries = expand_meta(&runs, config.max_expanded_values, &mut diagnostics);
            debug!(id = column.id, entries = entries.len(), "recorded value metadata");
            ctx.meta.insert((group, column.id), entries);
            ColumnBody::ValueMeta(runs)
        }
        ColumnType::Value => match ctx.meta(group, column.id) {
            Some(entries) => ColumnBody::Values(decode_values(body, entries)),
            None => ColumnBody::MissingMeta(
                Field::new(body, ()).with(Diagnostic::error(DiagnosticKind::MissingValueMeta)),
            ),
        },
    };

    (decoded, diagnostics)
}

/// Decodes the bodies of every column in `descriptors`, in order.
///
/// A body shorter than its declared length is reported and decoded from
/// the bytes present.
pub fn decode_column_section<'a>(
    ctx: &mut DecodeContext,
    descriptors: &ColumnDescriptors<'_>,
    input: &'a [u8],
) -> (Vec<ColumnData<'a>>, &'a [u8]) {
    let mut columns = Vec::with_capacity(descriptors.columns.len());
    let mut rest = input;

    for column in descriptors.iter() {
        let available = rest.len();
        let (take, short) = match usize::try_from(column.length) {
            Ok(n) if n <= available => (n, false),
            _ => (available, true),
        };
        let (bytes, after) = rest.split_at(take);
        rest = after;

        let (body, mut diagnostics) = decode_column(ctx, descriptors.group, column, bytes);
        if short {
            debug!(
                spec = column.spec,
                declared = column.length,
                available,
                "column body truncated"
            );
            diagnostics.insert(
                0,
                Diagnostic::error(DiagnosticKind::NotEnoughBytes {
                    needed: column.length,
                    available,
                }),
            );
        }

        columns.push(ColumnData {
            group: descriptors.group,
            column: *column,
            bytes,
            body,
            diagnostics,
        });
    }

    (columns, rest)
}

/// Wraps bytes left over after a body's last section.
///
/// Leftovers are a warning: the sections before them decoded fine.
pub(crate) fn trailing_field(bytes: &[u8]) -> Field<'_, ()> {
    let field = Field::new(bytes, ());
    if bytes.is_empty() {
        field
    } else {
        field.with(Diagnostic::warning(DiagnosticKind::TrailingData {
            extra: bytes.len(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::parse_columns;
    use crate::value::{Value, ValueKind};
    use amchunk_codec::write_sleb;

    fn column(spec: u64, length: usize) -> Column {
        Column::from_spec(spec, length as u64)
    }

    #[test]
    fn bool_column_example() {
        let mut ctx = DecodeContext::default();
        let (body, diags) = decode_column(&mut ctx, ColumnGroup::Operation, &column(52, 2), &[3, 2]);
        assert!(diags.is_empty());
        match body {
            ColumnBody::Booleans(runs) => {
                assert_eq!(
                    crate::rle::expand_bools(&runs, 100),
                    vec![false, false, false, true, true]
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn value_column_uses_meta_with_same_id() {
        let mut ctx = DecodeContext::default();
        let mut meta = write_sleb(2);
        meta.push(0x13); // length 1, uint
        let (_, diags) = decode_column(&mut ctx, ColumnGroup::Operation, &column(86, 2), &meta);
        assert!(diags.is_empty());
        assert_eq!(
            ctx.meta(ColumnGroup::Operation, 5),
            Some(&[MetaEntry::new(ValueKind::Uint, 1); 2][..])
        );

        let (body, _) = decode_column(&mut ctx, ColumnGroup::Operation, &column(87, 2), &[4, 9]);
        match body {
            ColumnBody::Values(decoded) => {
                let values: Vec<Value> = decoded.values.into_iter().map(|f| f.value).collect();
                assert_eq!(values, vec![Value::Uint(4), Value::Uint(9)]);
            }
            other => panic!("unexpected {other:?}"),
        }

        // a different group or id finds nothing
        let (body, _) = decode_column(&mut ctx, ColumnGroup::Change, &column(87, 2), &[4, 9]);
        assert!(matches!(body, ColumnBody::MissingMeta(f) if f.bytes == [4, 9]));
    }

    #[test]
    fn meta_expansion_capped() {
        let mut ctx = DecodeContext::new(DecodeConfig::new().with_max_expanded_values(3));
        let mut meta = write_sleb(1_000_000);
        meta.push(0x00);
        let (_, diags) = decode_column(&mut ctx, ColumnGroup::Operation, &column(86, 0), &meta);
        assert_eq!(diags[0].kind, DiagnosticKind::TooManyValues { limit: 3 });
        assert_eq!(ctx.meta(ColumnGroup::Operation, 5).map(<[_]>::len), Some(3));
    }

    #[test]
    fn compressed_columns_are_opaque() {
        let mut ctx = DecodeContext::default();
        let spec = 87 | 0x08;
        let (body, _) = decode_column(&mut ctx, ColumnGroup::Operation, &column(spec, 3), &[1, 2, 3]);
        assert_eq!(body, ColumnBody::Compressed(&[1, 2, 3]));
    }

    #[test]
    fn section_reports_short_bodies() {
        // two columns: actor (len 2), insert (len 4); only 3 body bytes
        let descriptors = [2, 1, 2, 52, 4];
        let (cols, rest) = parse_columns(&descriptors, ColumnGroup::Operation);
        assert!(rest.is_empty());

        let mut ctx = DecodeContext::default();
        let body = [1, 7, 3];
        let (data, rest) = decode_column_section(&mut ctx, &cols, &body);
        assert!(rest.is_empty());
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].bytes, &[1, 7]);
        assert!(data[0].diagnostics.is_empty());
        assert_eq!(data[1].bytes, &[3]);
        assert_eq!(
            data[1].diagnostics[0].kind,
            DiagnosticKind::NotEnoughBytes {
                needed: 4,
                available: 1
            }
        );
        assert_eq!(data[1].title(), "insert");
    }
}
