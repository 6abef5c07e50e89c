//! Golden listings of small chunks.

use amchunk_inspect::InspectConfig;
use amchunk_testkit::{hex_decode, ChangeBuilder, DocumentBuilder, GoldenTest};

#[test]
fn empty_document() {
    let chunk = hex_decode("856f4a83 96a296d2 00 00");
    GoldenTest::with_default_dir("empty_document").assert_listing(&chunk, &InspectConfig::default());
}

#[test]
fn bare_document() {
    let chunk = DocumentBuilder::new().build();
    assert_eq!(chunk, hex_decode("856f4a83 b81a9544 00 04 00000000"));
    GoldenTest::with_default_dir("bare_document").assert_listing(&chunk, &InspectConfig::default());
}

#[test]
fn minimal_change() {
    let chunk = ChangeBuilder::new(vec![0xaa]).build();
    GoldenTest::with_default_dir("minimal_change").assert_listing(&chunk, &InspectConfig::default());
}
