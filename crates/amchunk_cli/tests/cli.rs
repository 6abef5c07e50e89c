//! End-to-end tests of the amchunk-debug binary.

use std::io::Write;
use std::process::{Command, Output, Stdio};

use amchunk_codec::{build_chunk, compress_chunk, ChunkType};
use tempfile::NamedTempFile;

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_amchunk-debug"))
}

fn with_stdin(mut cmd: Command, input: &[u8]) -> Output {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn");
    child.stdin.take().expect("stdin").write_all(input).expect("write");
    child.wait_with_output().expect("wait")
}

fn input_file(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("tempfile");
    file.write_all(bytes).expect("write");
    file.flush().expect("flush");
    file
}

fn change() -> Vec<u8> {
    let mut body = vec![0, 1, 0xaa, 1, 1, 0, 0, 0, 0];
    body.extend([0u8; 40]);
    build_chunk(ChunkType::Change, &body)
}

#[test]
fn listing_from_file() {
    let file = input_file(&build_chunk(ChunkType::Document, &[]));
    let out = bin().arg(file.path()).output().expect("run");
    assert!(out.status.success());
    let text = String::from_utf8(out.stdout).unwrap();
    assert!(text.starts_with("[]byte{\n133, 111, 74, 131, // magic bytes (valid)\n"));
    assert!(text.ends_with("}\n"));
}

#[test]
fn listing_from_stdin_with_prefix() {
    let mut cmd = bin();
    cmd.args(["--prefix", "doc"]);
    let out = with_stdin(cmd, &[0, 0, 0, 0]);
    assert!(out.status.success());
    let text = String::from_utf8(out.stdout).unwrap();
    assert!(text.contains("// checksum (valid)"));
    assert!(text.contains("// head index omitted"));
}

#[test]
fn raw_compress_then_decompress() {
    let original = change();
    let file = input_file(&original);
    let compressed = bin()
        .args(["--compress", "--raw"])
        .arg(file.path())
        .output()
        .expect("run");
    assert!(compressed.status.success());
    assert_eq!(compressed.stdout, compress_chunk(&original).unwrap());

    let mut cmd = bin();
    cmd.args(["--decompress", "--raw"]);
    let restored = with_stdin(cmd, &compressed.stdout);
    assert!(restored.status.success());
    assert_eq!(restored.stdout, original);
}

#[test]
fn fix_checksum_raw() {
    let good = change();
    let mut broken = good.clone();
    broken[4] ^= 0xff;
    let file = input_file(&broken);
    let out = bin()
        .args(["--fix-checksum", "--raw"])
        .arg(file.path())
        .output()
        .expect("run");
    assert!(out.status.success());
    assert_eq!(out.stdout, good);
}

#[test]
fn fix_checksum_refuses_document() {
    let file = input_file(&build_chunk(ChunkType::Document, &[]));
    let out = bin()
        .arg("--fix-checksum")
        .arg(file.path())
        .output()
        .expect("run");
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("refusing to fix checksum of document chunk"));
}

#[test]
fn already_compressed() {
    let compressed = compress_chunk(&change()).unwrap();
    let mut cmd = bin();
    cmd.arg("--compress");
    let out = with_stdin(cmd, &compressed);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("already compressed"));
}

#[test]
fn check_mode_exit_status() {
    let mut broken = build_chunk(ChunkType::Document, &[]);
    broken[0] = 0;
    let file = input_file(&broken);

    let lenient = bin().arg(file.path()).output().expect("run");
    assert!(lenient.status.success());

    let strict = bin().arg("--check").arg(file.path()).output().expect("run");
    assert_eq!(strict.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&strict.stdout).contains("ERROR: invalid magic bytes"));
}

#[test]
fn json_format() {
    let file = input_file(&build_chunk(ChunkType::Document, &[]));
    let out = bin()
        .args(["--format", "json"])
        .arg(file.path())
        .output()
        .expect("run");
    assert!(out.status.success());
    let text = String::from_utf8(out.stdout).unwrap();
    assert!(text.trim_start().starts_with('['));
    assert!(text.contains("\"comment\": \"magic bytes (valid)\""));
}

#[test]
fn compress_conflicts_with_decompress() {
    let out = bin()
        .args(["--compress", "--decompress"])
        .output()
        .expect("run");
    assert!(!out.status.success());
}
