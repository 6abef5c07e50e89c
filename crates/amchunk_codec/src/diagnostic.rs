//! Inline diagnostics and byte-span fields.
//!
//! Forensic decoding never aborts on bad content. Each step instead yields a
//! [`Field`]: the exact bytes it consumed, the decoded (or partial) value and
//! whatever [`Diagnostic`]s apply. Callers decide whether to keep walking.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::error::VarintError;
use crate::format_bytes;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Suspicious but not necessarily invalid.
    Warning,
    /// The bytes violate the format.
    Error,
}

/// What a diagnostic reports.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A varint was truncated, overlong or too large.
    #[error(transparent)]
    MalformedVarint(#[from] VarintError),

    /// The chunk does not start with the magic bytes.
    #[error("invalid magic bytes")]
    InvalidMagic,

    /// The stored checksum differs from the computed one.
    #[error("checksum mis-match (should be {})", format_bytes(.expected))]
    ChecksumMismatch {
        /// The checksum the bytes should carry.
        expected: [u8; 4],
    },

    /// The chunk type byte is not 0, 1 or 2.
    #[error("invalid chunk type {0} (should be 0, 1 or 2)")]
    InvalidChunkType(u8),

    /// The chunk declares more bytes than remain.
    #[error("longer than remaining data: {available}")]
    TruncatedChunk {
        /// Declared body length.
        declared: u64,
        /// Bytes actually available.
        available: usize,
    },

    /// A region is shorter than its declared length.
    #[error("not enough bytes: need {needed}, have {available}")]
    NotEnoughBytes {
        /// Declared length.
        needed: u64,
        /// Bytes actually available.
        available: usize,
    },

    /// A value consumed a different number of bytes than its metadata declared.
    #[error("value length {decoded} != {declared} from metadata")]
    ValueLengthMismatch {
        /// Bytes the value encoding actually used.
        decoded: usize,
        /// Length from the value metadata.
        declared: u64,
    },

    /// Bytes that should be UTF-8 are not.
    #[error("invalid utf-8")]
    InvalidUtf8,

    /// A value column has no preceding value-meta column.
    #[error("value column with no metadata")]
    MissingValueMeta,

    /// A value-meta entry names a type outside 0..=9.
    #[error("unknown value type = {0}")]
    UnknownValueType(u8),

    /// A running value went below zero.
    #[error("i < 0")]
    NegativeRunningValue,

    /// A running value left the 64-bit range.
    #[error("running value overflows 64 bits")]
    RunningValueOverflow,

    /// A column spec does not fit in 32 bits.
    #[error("spec is too large")]
    SpecTooLarge,

    /// A length cannot be addressed on this platform.
    #[error("length is too long")]
    LengthTooLarge,

    /// A declared head hash is absent.
    #[error("missing head")]
    MissingHead,

    /// Fewer than 32 bytes remain for a head hash.
    #[error("incomplete head")]
    IncompleteHead,

    /// An actor id is longer than the remaining input.
    #[error("actor id length greater than remains in document")]
    ActorIdTooLong,

    /// A commit message is longer than the remaining input.
    #[error("too long")]
    MessageTooLong,

    /// A count promised more items than the input holds.
    #[error("{remaining} more items declared but no bytes remain")]
    MissingItems {
        /// Items that could not be read.
        remaining: u64,
    },

    /// Bytes remain after the last section of a body.
    #[error("{extra} bytes after the last section")]
    TrailingData {
        /// Number of leftover bytes.
        extra: usize,
    },

    /// A column expands to more values than the configured limit.
    #[error("more than {limit} values")]
    TooManyValues {
        /// The configured limit.
        limit: usize,
    },
}

/// A problem found while decoding, attached to the bytes it concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// What went wrong.
    pub kind: DiagnosticKind,
    /// How serious it is.
    pub severity: Severity,
    /// The part of the field it concerns (`length`, `delta`, ...).
    pub context: Option<&'static str>,
}

impl Diagnostic {
    /// Creates an error-level diagnostic.
    pub fn error(kind: DiagnosticKind) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            context: None,
        }
    }

    /// Creates a warning-level diagnostic.
    pub fn warning(kind: DiagnosticKind) -> Self {
        Self {
            kind,
            severity: Severity::Warning,
            context: None,
        }
    }

    /// Creates an error for a malformed varint.
    pub fn varint(err: VarintError) -> Self {
        Self::error(DiagnosticKind::MalformedVarint(err))
    }

    /// Names the part of the field this diagnostic concerns.
    #[must_use]
    pub fn in_field(mut self, context: &'static str) -> Self {
        self.context = Some(context);
        self
    }

    /// Returns true for error-level diagnostics.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        match self.context {
            Some(ctx) => write!(f, "({ctx} {level}: {})", self.kind),
            None => write!(f, "({level}: {})", self.kind),
        }
    }
}

/// A decoded value together with the bytes it came from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Field<'a, T> {
    /// The exact input bytes this field consumed.
    pub bytes: &'a [u8],
    /// The decoded, possibly partial, value.
    pub value: T,
    /// Problems found while decoding it.
    pub diagnostics: Vec<Diagnostic>,
}

impl<'a, T> Field<'a, T> {
    /// Creates a field without diagnostics.
    pub fn new(bytes: &'a [u8], value: T) -> Self {
        Self {
            bytes,
            value,
            diagnostics: Vec::new(),
        }
    }

    /// Adds a diagnostic, builder style.
    #[must_use]
    pub fn with(mut self, diagnostic: Diagnostic) -> Self {
        self.diagnostics.push(diagnostic);
        self
    }

    /// Adds a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Adds every diagnostic from `other`.
    pub fn extend(&mut self, other: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(other);
    }

    /// Returns true if no diagnostics were recorded.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Maps the value, keeping bytes and diagnostics.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<'a, U> {
        Field {
            bytes: self.bytes,
            value: f(self.value),
            diagnostics: self.diagnostics,
        }
    }

    /// Renders all diagnostics in their inline form, space separated.
    pub fn annotations(&self) -> String {
        let mut out = String::new();
        for (i, diagnostic) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            out.push_str(&diagnostic.to_string());
        }
        out
    }
}
