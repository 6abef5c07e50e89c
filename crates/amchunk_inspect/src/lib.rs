//! # amchunk inspect
//!
//! Annotated, byte-exact listings of document, change and compressed
//! chunks.
//!
//! Each listing line holds a run of input bytes and a comment saying what
//! they are. Concatenating the bytes of all lines gives back the input,
//! whether or not it was well formed: problems are reported inline.
//!
//! ## Usage
//!
//! ```
//! use amchunk_codec::{build_chunk, ChunkType};
//! use amchunk_inspect::{annotate, InspectConfig};
//!
//! let input = build_chunk(ChunkType::Document, &[]);
//! let transcript = annotate(&input, &InspectConfig::default());
//! assert_eq!(transcript.reassemble(), input);
//! assert!(transcript.to_text(4).starts_with("[]byte{\n133, 111, 74, 131, // magic bytes (valid)"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod annotate;
mod config;
mod transcript;

pub use annotate::{annotate, Annotator};
pub use config::{InspectConfig, DEFAULT_INDENT_WIDTH};
pub use transcript::{Line, Transcript};
