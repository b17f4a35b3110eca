//! Segmentation edge cases against files on disk

use phi_scan::config::SegmenterConfig;
use phi_scan::core::{CategoryPass, PassStatus, Pipeline, RecordSegmenter};
use phi_scan::detector::{OffsetCorrection, PatternCompiler};
use phi_scan::domain::{Record, ScanError};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use test_case::test_case;

fn write_input(dir: &TempDir, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join("id.text");
    std::fs::write(&path, bytes).unwrap();
    path
}

fn segment(bytes: &[u8], config: &SegmenterConfig) -> (Vec<Record>, Option<ScanError>) {
    let dir = TempDir::new().unwrap();
    let path = write_input(&dir, bytes);
    let mut records = Vec::new();
    for item in RecordSegmenter::open(&path, config).unwrap() {
        match item {
            Ok(record) => records.push(record),
            Err(e) => return (records, Some(e)),
        }
    }
    (records, None)
}

fn lenient() -> SegmenterConfig {
    SegmenterConfig {
        strict: false,
        ..SegmenterConfig::default()
    }
}

#[test_case(b"start_of_record=1||||1||||\nbody\n||||END_OF_RECORD\n" ; "lf")]
#[test_case(b"start_of_record=1||||1||||\r\nbody\r\n||||END_OF_RECORD\r\n" ; "crlf")]
#[test_case(b"\xef\xbb\xbfstart_of_record=1||||1||||\nbody\n||||END_OF_RECORD" ; "bom without final newline")]
fn test_line_ending_variants(input: &[u8]) {
    let (records, error) = segment(input, &SegmenterConfig::default());
    assert!(error.is_none());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].header_len, 27);
    assert_eq!(records[0].body(), "body\n||||END_OF_RECORD");
}

#[test]
fn test_strict_mode_rejects_orphan_end() {
    let input = b"start_of_record=1||||1||||\na\n||||END_OF_RECORD\nstray\n||||END_OF_RECORD\n";
    let (records, error) = segment(input, &SegmenterConfig::default());
    assert_eq!(records.len(), 1);
    match error {
        Some(ScanError::MalformedInput { line, .. }) => assert_eq!(line, 5),
        other => panic!("expected malformed input, got {other:?}"),
    }
}

#[test]
fn test_lenient_mode_reuses_last_id() {
    let input = b"start_of_record=7||||3||||\na\n||||END_OF_RECORD\nstray\n||||END_OF_RECORD\n";
    let (records, error) = segment(input, &lenient());
    assert!(error.is_none());
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].id, records[0].id);
    assert_eq!(records[1].header_len, 0);
    assert_eq!(records[1].text, "stray\n||||END_OF_RECORD");
}

#[test]
fn test_end_before_any_start_is_malformed_even_when_lenient() {
    let (records, error) = segment(b"||||END_OF_RECORD\n", &lenient());
    assert!(records.is_empty());
    assert!(matches!(error, Some(ScanError::MalformedInput { line: 1, .. })));
}

#[test]
fn test_invalid_utf8_line_falls_back() {
    let input = b"start_of_record=1||||1||||\nSeen in Montr\xe9al\n||||END_OF_RECORD\n";
    let (records, error) = segment(input, &SegmenterConfig::default());
    assert!(error.is_none());
    assert!(records[0].body().starts_with("Seen in Montréal"));
}

#[test]
fn test_configured_encoding() {
    let config = SegmenterConfig {
        input_encoding: Some("windows-1252".to_string()),
        ..SegmenterConfig::default()
    };
    let input = b"start_of_record=1||||1||||\nQu\xe9bec\n||||END_OF_RECORD\n";
    let (records, _) = segment(input, &config);
    assert!(records[0].body().starts_with("Québec"));
}

#[test]
fn test_unknown_encoding_label_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = write_input(&dir, b"");
    let config = SegmenterConfig {
        input_encoding: Some("klingon-8".to_string()),
        ..SegmenterConfig::default()
    };
    let err = RecordSegmenter::open(&path, &config).err().unwrap();
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_malformed_input_keeps_reports_written_so_far() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        b"start_of_record=1||||1||||\ncall 555-123-4567\n||||END_OF_RECORD\n||||END_OF_RECORD\n",
    );
    let output = dir.path().join("phone.phi");
    let pass = CategoryPass::create(
        Arc::new(PatternCompiler::new().phone(OffsetCorrection::Structural).unwrap()),
        &output,
    )
    .unwrap();

    let summaries = Pipeline::new(vec![pass]).run_file(&input, &SegmenterConfig::default());

    assert_eq!(summaries[0].status, PassStatus::Failed);
    assert_eq!(summaries[0].records, 1);
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "Patient 1\tNote 1\n5 5 17\n"
    );
}

#[test]
fn test_non_ascii_offsets_are_characters() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        "start_of_record=1||||1||||\nZoë née Müller, 555-123-4567\n||||END_OF_RECORD\n".as_bytes(),
    );
    let output = dir.path().join("phone.phi");
    let pass = CategoryPass::create(
        Arc::new(PatternCompiler::new().phone(OffsetCorrection::Structural).unwrap()),
        &output,
    )
    .unwrap();

    Pipeline::new(vec![pass]).run_file(&input, &SegmenterConfig::default());

    let start = "Zoë née Müller, ".chars().count();
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        format!("Patient 1\tNote 1\n{start} {start} {}\n", start + 12)
    );
}

#[test]
fn test_nested_start_keeps_earlier_body_text() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        b"start_of_record=1||||1||||\ncall 555-123-4567\nstart_of_record=1||||2||||\nbody\n||||END_OF_RECORD\n",
    );
    let output = dir.path().join("phone.phi");
    let pass = CategoryPass::create(
        Arc::new(PatternCompiler::new().phone(OffsetCorrection::Structural).unwrap()),
        &output,
    )
    .unwrap();

    let summaries = Pipeline::new(vec![pass]).run_file(&input, &SegmenterConfig::default());

    assert_eq!(summaries[0].status, PassStatus::Completed);
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "Patient 1\tNote 2\n5 5 17\n"
    );
}

#[test_case(&SegmenterConfig::default() ; "strict")]
#[test_case(&lenient() ; "lenient")]
fn test_preamble_lines_lead_the_next_record(config: &SegmenterConfig) {
    let input = b"export 2021\nstart_of_record=2||||4||||\nbody\n||||END_OF_RECORD\nafter\n";
    let (records, error) = segment(input, config);

    assert!(error.is_none());
    assert_eq!(records.len(), 1);
    assert!(records[0].text.starts_with("export 2021\n"));
    assert_eq!(records[0].body(), "body\n||||END_OF_RECORD");
}
