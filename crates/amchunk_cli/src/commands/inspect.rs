//! Inspect step: renders the listing or writes raw bytes.

use std::io::{self, Write};

use amchunk_codec::Severity;
use amchunk_inspect::{annotate, InspectConfig};
use tracing::{info, warn};

/// Listing format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Go byte-slice literal with comments.
    Text,
    /// JSON array of lines.
    Json,
}

/// Writes `bytes` unmodified to stdout.
pub fn write_raw(bytes: &[u8]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    out.write_all(bytes)?;
    out.flush()
}

/// Prints the listing of `bytes` and returns whether it contains errors.
pub fn run(
    bytes: &[u8],
    config: &InspectConfig,
    format: OutputFormat,
) -> Result<bool, Box<dyn std::error::Error>> {
    let transcript = annotate(bytes, config);

    let mut out = io::stdout().lock();
    match format {
        OutputFormat::Text => transcript.write_text(&mut out, config.indent_width)?,
        OutputFormat::Json => writeln!(out, "{}", transcript.to_json()?)?,
    }
    out.flush()?;

    let errors = transcript.count(Severity::Error);
    let warnings = transcript.count(Severity::Warning);
    if errors > 0 {
        warn!(errors, warnings, "input is malformed");
    } else if warnings > 0 {
        info!(warnings, "input has warnings");
    }

    Ok(transcript.has_errors())
}
