//! Document chunk bodies.
//!
//! ```text
//! actors | heads | change column descriptors | operation column descriptors
//!        | change column bodies | operation column bodies | head indexes
//! ```

use amchunk_codec::leb128::uleb_field;
use amchunk_codec::Field;
use tracing::debug;

use crate::column::{parse_columns, ColumnDescriptors, ColumnGroup};
use crate::decoder::{decode_column_section, trailing_field, ColumnData, DecodeContext};
use crate::tables::{ActorTable, Heads, HASH_LEN};

/// The head index section that closes a document.
#[derive(Debug, Clone, PartialEq)]
pub enum HeadIndexes<'a> {
    /// No bytes remained for it.
    Omitted,
    /// One change index per complete head.
    Present(Vec<(HeadHash, Field<'a, u64>)>),
}

/// A head hash as stored in the document.
pub type HeadHash = [u8; HASH_LEN];

/// A decoded document body.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChunk<'a> {
    /// Actor ids referenced by the columns.
    pub actors: ActorTable<'a>,
    /// Heads of the document.
    pub heads: Heads<'a>,
    /// Change column descriptors.
    pub change_columns: ColumnDescriptors<'a>,
    /// Operation column descriptors.
    pub op_columns: ColumnDescriptors<'a>,
    /// Change column bodies.
    pub change_data: Vec<ColumnData<'a>>,
    /// Operation column bodies.
    pub op_data: Vec<ColumnData<'a>>,
    /// The head index.
    pub head_indexes: HeadIndexes<'a>,
    /// Bytes after the head index.
    pub trailing: Field<'a, ()>,
}

impl<'a> DocumentChunk<'a> {
    /// A document with no actors, heads or columns.
    pub fn empty() -> Self {
        Self {
            actors: ActorTable::empty(),
            heads: Heads::empty(),
            change_columns: ColumnDescriptors::empty(ColumnGroup::Change),
            op_columns: ColumnDescriptors::empty(ColumnGroup::Operation),
            change_data: Vec::new(),
            op_data: Vec::new(),
            head_indexes: HeadIndexes::Omitted,
            trailing: Field::new(&[], ()),
        }
    }

    /// Returns true if the body held nothing at all.
    pub fn is_empty(&self) -> bool {
        self.actors.count.bytes.is_empty()
            && self.heads.count.bytes.is_empty()
            && self.change_columns.count.bytes.is_empty()
            && self.op_columns.count.bytes.is_empty()
    }

    /// Decodes a document body.
    ///
    /// An empty body is an empty document.
    pub fn decode(body: &'a [u8], ctx: &mut DecodeContext) -> Self {
        ctx.reset();
        if body.is_empty() {
            return Self::empty();
        }

        let (actors, rest) = ActorTable::parse(body);
        let (heads, rest) = Heads::parse(rest);
        let (change_columns, rest) = parse_columns(rest, ColumnGroup::Change);
        let (op_columns, rest) = parse_columns(rest, ColumnGroup::Operation);
        let (change_data, rest) = decode_column_section(ctx, &change_columns, rest);
        let (op_data, rest) = decode_column_section(ctx, &op_columns, rest);

        let (head_indexes, trailing) = if rest.is_empty() {
            (HeadIndexes::Omitted, rest)
        } else {
            let mut indexes = Vec::new();
            let mut rest = rest;
            for hash in heads.complete() {
                let (index, after) = uleb_field(rest, None);
                indexes.push((*hash, index));
                rest = after;
            }
            (HeadIndexes::Present(indexes), rest)
        };
        let trailing = trailing_field(trailing);

        debug!(
            actors = actors.actors.len(),
            heads = heads.hashes.len(),
            change_columns = change_data.len(),
            op_columns = op_data.len(),
            trailing = trailing.bytes.len(),
            "decoded document body"
        );

        Self {
            actors,
            heads,
            change_columns,
            op_columns,
            change_data,
            op_data,
            head_indexes,
            trailing,
        }
    }
}
