//! Integration test: text dump of a written file.

use chrono::{NaiveDate, NaiveDateTime};
use esptrace_io::{
    EnsembleFile, EnsembleProperties, ReaderConfig, Trace, UnitConversion, WriterConfig,
};

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(h, 0, 0))
        .expect("valid timestamp")
}

fn write_sample(
    dir: &tempfile::TempDir,
    start: NaiveDateTime,
    interval: u32,
    values: usize,
) -> std::path::PathBuf {
    let traces = (0..3)
        .map(|i| {
            Trace::from_values(1995 + i, start, interval, vec![2.0; values])
                .expect("valid trace")
                .with_location_id("FTSC1")
        })
        .collect();
    let ensemble =
        EnsembleFile::from_traces(traces, &EnsembleProperties::default()).expect("build ensemble");
    let path = dir.path().join("dump.cs");
    ensemble
        .write(&path, &WriterConfig::default())
        .expect("write succeeds");
    path
}

#[test]
fn dump_counts_header_blocks() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = write_sample(&dir, at(2002, 5, 1, 6), 6, 4);
    let mut ensemble = EnsembleFile::open(&path, &ReaderConfig::default()).expect("open succeeds");

    let mut out = Vec::new();
    let summary = ensemble
        .dump(&mut out, UnitConversion::new(10.0, 1.0))
        .expect("dump succeeds");
    assert_eq!(summary.blocks, 3);
    assert!(summary.matches_header());

    let text = String::from_utf8(out).expect("utf-8 output");
    assert!(text.contains("location            FTSC1"));
    assert!(text.contains("# block 2: trace 2 1997-05"));
    let first_row = text
        .lines()
        .find(|l| l.starts_with("  0 1995 05 01"))
        .expect("first day row");
    let fields: Vec<&str> = first_row.split_whitespace().collect();
    assert_eq!(&fields[4..], &["21.0000"; 4]);
    let second_row = text
        .lines()
        .find(|l| l.starts_with("  0 1995 05 02"))
        .expect("second day row");
    assert!(second_row.ends_with("-999.0000"));
}

#[test]
fn dump_separates_record_padding_from_blocks() {
    // Daily values give 31-word blocks; three of them leave one more
    // all-missing block of padding in the 124-word record.
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = write_sample(&dir, at(2002, 5, 2, 0), 24, 1);
    let config = ReaderConfig::default().with_keep_open(true);
    let mut ensemble = EnsembleFile::open(&path, &config).expect("open succeeds");

    let mut out = Vec::new();
    let summary = ensemble
        .dump(&mut out, UnitConversion::default())
        .expect("dump succeeds");
    assert_eq!(summary.expected_blocks, 3);
    assert_eq!(summary.blocks, 3);
    assert_eq!(summary.padding_blocks, 1);
    assert!(summary.matches_header());
    assert!(ensemble.is_open());

    // The kept handle is reusable.
    let again = ensemble
        .dump(&mut Vec::new(), UnitConversion::default())
        .expect("second dump succeeds");
    assert_eq!(again, summary);
}
