//! Golden listing comparisons.
//!
//! A golden file holds the exact text listing of one input. Set
//! `UPDATE_GOLDEN` to rewrite the files from the current output.

use std::fs;
use std::path::{Path, PathBuf};

use amchunk_codec::hex_encode;
use amchunk_inspect::{annotate, InspectConfig};

/// A golden test that compares listings against expected files.
pub struct GoldenTest {
    name: String,
    golden_dir: PathBuf,
    update_mode: bool,
}

impl GoldenTest {
    /// Creates a new golden test.
    ///
    /// # Arguments
    ///
    /// * `name` - Name of the test (used for file naming)
    /// * `golden_dir` - Directory containing golden files
    pub fn new(name: impl Into<String>, golden_dir: impl AsRef<Path>) -> Self {
        Self {
            name: name.into(),
            golden_dir: golden_dir.as_ref().to_path_buf(),
            update_mode: std::env::var("UPDATE_GOLDEN").is_ok(),
        }
    }

    /// Creates a golden test using this crate's `golden` directory.
    pub fn with_default_dir(name: impl Into<String>) -> Self {
        let golden_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("golden");
        Self::new(name, golden_dir)
    }

    /// Asserts that the text listing of `input` matches the golden file.
    pub fn assert_listing(&self, input: &[u8], config: &InspectConfig) {
        let transcript = annotate(input, config);
        assert_eq!(
            transcript.reassemble(),
            input,
            "listing of '{}' lost bytes: {}",
            self.name,
            hex_encode(input)
        );
        self.assert_text(&transcript.to_text(config.indent_width));
    }

    /// Asserts that `actual` matches the golden file.
    pub fn assert_text(&self, actual: &str) {
        let path = self.file_path();

        if self.update_mode {
            self.update_golden_file(&path, actual.as_bytes());
            return;
        }

        if !path.exists() {
            panic!(
                "Golden file not found: {:?}\n\
                 Run with UPDATE_GOLDEN=1 to create it.\n\
                 Actual:\n{}",
                path, actual
            );
        }

        let expected = fs::read_to_string(&path).expect("Failed to read golden file");

        if actual != expected {
            panic!(
                "Golden test '{}' failed:\n\
                 --- Expected ---\n{}\n\
                 --- Actual ---\n{}\n\
                 Run with UPDATE_GOLDEN=1 to update.",
                self.name, expected, actual
            );
        }
    }

    fn file_path(&self) -> PathBuf {
        self.golden_dir.join(format!("{}.txt", self.name))
    }

    fn update_golden_file(&self, path: &Path, data: &[u8]) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create golden directory");
        }
        fs::write(path, data).expect("Failed to write golden file");
        println!("Updated golden file: {:?}", path);
    }
}

/// Decodes a hexadecimal string to bytes, ignoring whitespace.
pub fn hex_decode(hex: &str) -> Vec<u8> {
    let hex = hex.replace([' ', '\n', '\r'], "");
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).expect("Invalid hex"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_hex_decode() {
        assert_eq!(hex_decode("00 01ff\nab"), vec![0x00, 0x01, 0xff, 0xab]);
        assert_eq!(hex_encode(&hex_decode("856f4a83")), "856f4a83");
    }

    #[test]
    fn test_assert_text_matches_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("sample.txt"), "[]byte{\n}\n").unwrap();
        GoldenTest::new("sample", dir.path()).assert_text("[]byte{\n}\n");
    }

    #[test]
    #[should_panic(expected = "Golden test 'sample' failed")]
    fn test_assert_text_mismatch() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("sample.txt"), "[]byte{\n}\n").unwrap();
        let golden = GoldenTest {
            name: "sample".into(),
            golden_dir: dir.path().to_path_buf(),
            update_mode: false,
        };
        golden.assert_text("[]byte{\n0, // x\n}\n");
    }
}
