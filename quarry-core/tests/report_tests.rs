// Tests for report generation functionality

use quarry_core::persist::write_records;
use quarry_core::report::{
    MANIFEST_FILE, gather_report_data, generate_json_report,
    generate_text_report, write_manifest,
};
use quarry_scanner::{CaptureStore, CapturedRecord, CrawlOutcome, CrawlStats};
use tempfile::TempDir;

fn outcome() -> CrawlOutcome {
    let mut records = CaptureStore::new();
    records.push(CapturedRecord::page("https://example.com/".into(), "<html></html>".into()));
    records.push(CapturedRecord::resource("https://example.com/site.css".into(), "a{}".into()));
    records.push(CapturedRecord::resource("https://example.com/gone.png".into(), String::new()));

    CrawlOutcome {
        records,
        stats: CrawlStats {
            pages_captured: 1,
            pages_failed: 2,
            pages_empty: 1,
            resources_captured: 1,
            resources_failed: 1,
            resources_skipped: 0,
            links_queued: 2,
            out_of_scope: 4,
        },
        timed_out: false,
    }
}

#[test]
fn test_text_report_summary() {
    let data = gather_report_data("https://example.com/", 1_700_000_000, 1_700_000_042, &outcome(), None);
    let report = generate_text_report(&data);

    assert!(report.contains("Target: https://example.com/"));
    assert!(report.contains("Duration: 42 seconds"));
    assert!(report.contains("Pages captured: 1"));
    assert!(report.contains("Pages failed: 2"));
    assert!(report.contains("Empty pages: 1"));
    assert!(report.contains("Out-of-scope references: 4"));
    assert!(report.contains("/site.css"));
    assert!(report.contains("text/css"));
    assert!(!report.contains("Files written"));
}

#[test]
fn test_json_report_lists_records_with_files() {
    let temp = TempDir::new().unwrap();
    let outcome = outcome();
    let summary = write_records(temp.path(), outcome.records.records());
    let data = gather_report_data(
        "https://example.com/",
        1_700_000_000,
        1_700_000_010,
        &outcome,
        Some((temp.path(), &summary)),
    );

    assert_eq!(data.files_written, 2);
    assert!(data.records[0].file_name.is_some());
    assert!(data.records[2].file_name.is_none());

    let json: serde_json::Value = serde_json::from_str(&generate_json_report(&data).unwrap()).unwrap();
    assert_eq!(json["metadata"]["generator"], "Quarry");
    assert_eq!(json["crawl"]["stats"]["links_queued"], 2);
    assert_eq!(json["records"].as_array().unwrap().len(), 3);
    assert_eq!(json["records"][1]["kind"], "resource");
}

#[test]
fn test_write_manifest() {
    let temp = TempDir::new().unwrap();
    let data = gather_report_data("https://example.com/", 0, 1, &outcome(), None);
    write_manifest(temp.path(), &data).unwrap();

    let content = std::fs::read_to_string(temp.path().join(MANIFEST_FILE)).unwrap();
    assert!(content.contains("\"target\": \"https://example.com/\""));
}
