//! The annotated listing and its renderers.
//!
//! Text output is a Go byte-slice literal: every input byte appears once,
//! in order, followed by a comment describing the field it belongs to.
//!
//! ```text
//! []byte{
//! 133, 111, 74, 131, // magic bytes (valid)
//! ...
//! }
//! ```

use std::io::{self, Write};

use amchunk_codec::Severity;
use serde::Serialize;

/// One listing line: a run of input bytes and what they mean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Line {
    /// Nesting level.
    pub depth: usize,
    /// The input bytes, possibly none.
    pub bytes: Vec<u8>,
    /// Human readable gloss, including inline diagnostics.
    pub comment: String,
    /// Most serious diagnostic on this line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

/// An annotated listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    lines: Vec<Line>,
}

impl Transcript {
    /// Creates an empty listing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a line.
    pub fn push(&mut self, line: Line) {
        self.lines.push(line);
    }

    /// The lines, in order.
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Concatenates the bytes of every line.
    ///
    /// For any input this reproduces it exactly.
    pub fn reassemble(&self) -> Vec<u8> {
        self.lines.iter().flat_map(|l| l.bytes.iter().copied()).collect()
    }

    /// Returns true if any line carries an error-level diagnostic.
    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    /// Number of lines whose most serious diagnostic is `severity`.
    pub fn count(&self, severity: Severity) -> usize {
        self.lines
            .iter()
            .filter(|l| l.severity == Some(severity))
            .count()
    }

    /// Writes the text form.
    pub fn write_text<W: Write>(&self, out: &mut W, indent_width: usize) -> io::Result<()> {
        out.write_all(b"[]byte{\n")?;
        for line in &self.lines {
            let indent = " ".repeat(line.depth * indent_width);
            out.write_all(indent.as_bytes())?;
            for b in &line.bytes {
                write!(out, "{b}, ")?;
            }
            writeln!(out, "// {}", line.comment)?;
        }
        out.write_all(b"}\n")
    }

    /// Renders the text form.
    pub fn to_text(&self, indent_width: usize) -> String {
        let mut out = Vec::new();
        self.write_text(&mut out, indent_width)
            .expect("writing to a Vec cannot fail");
        String::from_utf8_lossy(&out).into_owned()
    }

    /// Renders the lines as a pretty-printed JSON array.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transcript {
        let mut t = Transcript::new();
        t.push(Line {
            depth: 0,
            bytes: vec![133, 111],
            comment: "magic".into(),
            severity: None,
        });
        t.push(Line {
            depth: 1,
            bytes: vec![],
            comment: "title".into(),
            severity: Some(Severity::Warning),
        });
        t.push(Line {
            depth: 1,
            bytes: vec![7],
            comment: "seven (error: bad)".into(),
            severity: Some(Severity::Error),
        });
        t
    }

    #[test]
    fn text_layout() {
        assert_eq!(
            sample().to_text(2),
            "[]byte{\n133, 111, // magic\n  // title\n  7, // seven (error: bad)\n}\n"
        );
    }

    #[test]
    fn reassemble_and_counts() {
        let t = sample();
        assert_eq!(t.reassemble(), vec![133, 111, 7]);
        assert!(t.has_errors());
        assert_eq!(t.count(Severity::Warning), 1);
    }

    #[test]
    fn json_form() {
        let json = sample().to_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["bytes"], serde_json::json!([133, 111]));
        assert!(parsed[0].get("severity").is_none());
        assert_eq!(parsed[2]["severity"], "error");
        assert_eq!(parsed[1]["depth"], 1);
    }
}
