//! Change chunk bodies.
//!
//! ```text
//! heads | actor | seq | start op | time | message | other actors
//!       | operation column descriptors | operation column bodies
//! ```

use amchunk_codec::leb128::{sleb_field, uleb_field};
use amchunk_codec::{Diagnostic, DiagnosticKind, Field};
use tracing::debug;

use crate::column::{parse_columns, ColumnDescriptors, ColumnGroup};
use crate::decoder::{decode_column_section, trailing_field, ColumnData, DecodeContext};
use crate::tables::{ActorEntry, ActorTable, Heads};

/// Everything after the commit message.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeTail<'a> {
    /// Actors other than the author.
    pub other_actors: ActorTable<'a>,
    /// Operation column descriptors.
    pub op_columns: ColumnDescriptors<'a>,
    /// Operation column bodies.
    pub op_data: Vec<ColumnData<'a>>,
    /// Bytes after the last column.
    pub extra: Field<'a, ()>,
}

/// A decoded change body.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeChunk<'a> {
    /// Dependencies of this change.
    pub heads: Heads<'a>,
    /// The author.
    pub actor: ActorEntry<'a>,
    /// Sequence number.
    pub seq: Field<'a, u64>,
    /// First operation counter.
    pub start_op: Field<'a, u64>,
    /// Milliseconds since the epoch.
    pub time: Field<'a, i64>,
    /// Message length.
    pub message_len: Field<'a, u64>,
    /// The message, or the truncated bytes that remained.
    pub message: Field<'a, String>,
    /// The rest of the change; absent when the message ran out of bytes.
    pub tail: Option<ChangeTail<'a>>,
}

impl ChangeChunk<'_> {
    /// Returns true if the message length exceeded the body.
    pub fn is_truncated(&self) -> bool {
        self.tail.is_none()
    }
}

impl<'a> ChangeChunk<'a> {
    /// Decodes a change body.
    pub fn decode(body: &'a [u8], ctx: &mut DecodeContext) -> Self {
        ctx.reset();

        let (heads, rest) = Heads::parse(body);
        let (actor, rest) = ActorEntry::parse(rest);
        let (seq, rest) = uleb_field(rest, None);
        let (start_op, rest) = uleb_field(rest, None);
        let (time, rest) = sleb_field(rest, None);
        let (mut message_len, rest) = uleb_field(rest, None);

        let fits = usize::try_from(message_len.value)
            .ok()
            .filter(|&n| n <= rest.len());
        let Some(len) = fits else {
            message_len.push(Diagnostic::error(DiagnosticKind::MessageTooLong));
            debug!(declared = message_len.value, available = rest.len(), "change message truncated");
            return Self {
                heads,
                actor,
                seq,
                start_op,
                time,
                message_len,
                message: Field::new(rest, String::from_utf8_lossy(rest).into_owned()),
                tail: None,
            };
        };

        let (text, rest) = rest.split_at(len);
        let message = match std::str::from_utf8(text) {
            Ok(s) => Field::new(text, s.to_string()),
            Err(_) => Field::new(text, String::from_utf8_lossy(text).into_owned())
                .with(Diagnostic::error(DiagnosticKind::InvalidUtf8).in_field("utf8")),
        };

        let (other_actors, rest) = ActorTable::parse(rest);
        let (op_columns, rest) = parse_columns(rest, ColumnGroup::Operation);
        let (op_data, extra) = decode_column_section(ctx, &op_columns, rest);

        debug!(
            seq = seq.value,
            op_columns = op_data.len(),
            extra = extra.len(),
            "decoded change body"
        );

        Self {
            heads,
            actor,
            seq,
            start_op,
            time,
            message_len,
            message,
            tail: Some(ChangeTail {
                other_actors,
                op_columns,
                op_data,
                extra: trailing_field(extra),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::ColumnBody;
    use crate::encoder::{encode_values, ColumnGroupEncoder};
    use crate::value::Value;
    use amchunk_codec::write_sleb;

    fn header(message: &[u8], declared: u8) -> Vec<u8> {
        let mut body = vec![0]; // no heads
        body.extend([2, 0x01, 0x02]); // actor
        body.push(3); // seq
        body.push(10); // start op
        body.extend(write_sleb(0)); // time
        body.push(declared);
        body.extend(message);
        body
    }

    #[test]
    fn change_with_values() {
        let (meta, data) = encode_values(&[Value::Str("x".into()), Value::Int(-1)]);
        let (desc, bodies) = ColumnGroupEncoder::new()
            .column(86, meta)
            .column(87, data)
            .finish();

        let mut body = header(b"hi", 2);
        body.push(0); // other actors
        body.extend(desc);
        body.extend(bodies);
        body.push(0xff);

        let mut ctx = DecodeContext::default();
        let change = ChangeChunk::decode(&body, &mut ctx);
        assert_eq!(change.seq.value, 3);
        assert_eq!(change.start_op.value, 10);
        assert_eq!(change.time.value, 0);
        assert_eq!(change.message.value, "hi");

        let tail = change.tail.expect("tail");
        assert_eq!(tail.extra.bytes, &[0xff]);
        assert_eq!(
            tail.extra.diagnostics,
            vec![Diagnostic::warning(DiagnosticKind::TrailingData { extra: 1 })]
        );
        match &tail.op_data[1].body {
            ColumnBody::Values(decoded) => {
                assert_eq!(decoded.values[0].value, Value::Str("x".into()));
                assert_eq!(decoded.values[1].value, Value::Int(-1));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn message_too_long() {
        let body = header(b"abc", 9);
        let mut ctx = DecodeContext::default();
        let change = ChangeChunk::decode(&body, &mut ctx);
        assert!(change.is_truncated());
        assert_eq!(change.message.bytes, b"abc");
        assert_eq!(
            change.message_len.diagnostics[0].kind,
            DiagnosticKind::MessageTooLong
        );
    }
}
