//! Listing configuration.

use amchunk_columnar::DecodeConfig;

/// Default number of spaces per nesting level.
pub const DEFAULT_INDENT_WIDTH: usize = 4;

/// Options for annotating chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InspectConfig {
    /// Spaces per nesting level in text output.
    pub indent_width: usize,
    /// Limits for column decoding.
    pub decode: DecodeConfig,
    /// Inflate compressed chunks to check their checksum.
    ///
    /// A mismatch is only a warning: the stored checksum belongs to the
    /// uncompressed change and may legitimately have been carried over.
    pub verify_compressed_checksums: bool,
}

impl InspectConfig {
    /// Creates a configuration with default settings.
    pub fn new() -> Self {
        Self {
            indent_width: DEFAULT_INDENT_WIDTH,
            decode: DecodeConfig::default(),
            verify_compressed_checksums: false,
        }
    }

    /// Sets the indent width.
    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent_width = width;
        self
    }

    /// Sets the column decoding limits.
    pub fn with_decode(mut self, decode: DecodeConfig) -> Self {
        self.decode = decode;
        self
    }

    /// Enables or disables checksum verification of compressed chunks.
    pub fn with_verify_compressed_checksums(mut self, verify: bool) -> Self {
        self.verify_compressed_checksums = verify;
        self
    }
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self::new()
    }
}
