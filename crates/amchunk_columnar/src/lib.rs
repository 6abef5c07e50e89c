//! # amchunk columnar
//!
//! Decoders for the columnar bodies of document and change chunks.
//!
//! A body is a handful of fixed fields (actors, heads, ...) followed by one
//! or two column groups. Each group lists its column descriptors first and
//! then the column bodies, in descriptor order. Bodies are run-length
//! encoded in one of several ways chosen by the column type.
//!
//! Decoding never fails: every step returns a [`Field`](amchunk_codec::Field)
//! carrying the bytes it consumed together with any diagnostics.
//!
//! ## Usage
//!
//! ```
//! use amchunk_columnar::{DecodeContext, DocumentChunk};
//!
//! let mut ctx = DecodeContext::default();
//! let doc = DocumentChunk::decode(&[0, 0, 0, 0], &mut ctx);
//! assert!(doc.actors.actors.is_empty());
//! assert!(doc.change_data.is_empty());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod change;
mod column;
mod config;
mod decoder;
mod document;
pub mod encoder;
pub mod rle;
mod tables;
mod value;

pub use change::{ChangeChunk, ChangeTail};
pub use column::{parse_columns, Column, ColumnDescriptors, ColumnGroup, ColumnType};
pub use config::{DecodeConfig, DEFAULT_MAX_EXPANDED_VALUES};
pub use decoder::{decode_column, decode_column_section, ColumnBody, ColumnData, DecodeContext};
pub use document::{DocumentChunk, HeadHash, HeadIndexes};
pub use rle::{BoolRun, DeltaStep, DeltaValue, Repeated, Run};
pub use tables::{ActorEntry, ActorTable, Heads, HASH_LEN};
pub use value::{
    decode_values, format_timestamp, DecodedValues, MetaEntry, Value, ValueKind,
};
