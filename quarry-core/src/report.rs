// Crawl summary reports and the JSON manifest

use crate::crawl::extract_url_path;
use crate::persist::PersistSummary;
use colored::Colorize;
use quarry_scanner::{CrawlOutcome, CrawlStats, RecordKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub const MANIFEST_FILE: &str = "manifest.json";

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSummary {
    pub url: String,
    pub kind: RecordKind,
    pub mime_type: String,
    pub bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub target: String,
    pub started_at: i64,
    pub finished_at: i64,
    pub timed_out: bool,
    pub stats: CrawlStats,
    pub records: Vec<RecordSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    pub files_written: usize,
}

/// Assemble report data from a finished crawl and, if it was written to
/// disk, the persistence summary.
pub fn gather_report_data(
    target: &str,
    started_at: i64,
    finished_at: i64,
    outcome: &CrawlOutcome,
    persisted: Option<(&Path, &PersistSummary)>,
) -> ReportData {
    let file_names: HashMap<usize, &str> = persisted
        .map(|(_, summary)| {
            summary
                .files
                .iter()
                .map(|f| (f.index, f.file_name.as_str()))
                .collect()
        })
        .unwrap_or_default();

    let records = outcome
        .records
        .records()
        .iter()
        .enumerate()
        .map(|(i, r)| RecordSummary {
            url: r.url.clone(),
            kind: r.kind,
            mime_type: r.mime_type.clone(),
            bytes: r.body.len(),
            file_name: file_names.get(&(i + 1)).map(|s| s.to_string()),
        })
        .collect();

    ReportData {
        target: target.to_string(),
        started_at,
        finished_at,
        timed_out: outcome.timed_out,
        stats: outcome.stats.clone(),
        records,
        output_dir: persisted.map(|(dir, _)| dir.display().to_string()),
        files_written: persisted.map(|(_, s)| s.files.len()).unwrap_or(0),
    }
}

pub fn generate_text_report(data: &ReportData) -> String {
    let mut report = String::new();
    report.push_str(RULE);
    report.push_str("\n\n# Summary:\n");
    report.push_str(&format!("  Target: {}\n", data.target));
    report.push_str(&format!("  Started: {}\n", format_timestamp(data.started_at)));
    report.push_str(&format!(
        "  Duration: {} seconds\n",
        (data.finished_at - data.started_at).max(0)
    ));
    if data.timed_out {
        report.push_str(&format!("  {}\n", "Deadline reached, crawl incomplete".yellow()));
    }

    let stats = &data.stats;
    report.push_str(&format!("  Pages captured: {}\n", stats.pages_captured));
    report.push_str(&format!("  Pages failed: {}\n", stats.pages_failed));
    if stats.pages_empty > 0 {
        report.push_str(&format!("  Empty pages: {}\n", stats.pages_empty));
    }
    report.push_str(&format!("  Resources captured: {}\n", stats.resources_captured));
    report.push_str(&format!("  Resources failed: {}\n", stats.resources_failed));
    report.push_str(&format!("  Duplicate resources skipped: {}\n", stats.resources_skipped));
    report.push_str(&format!("  Out-of-scope references: {}\n", stats.out_of_scope));
    if let Some(ref dir) = data.output_dir {
        report.push_str(&format!("  Files written: {} to {}\n", data.files_written, dir));
    }

    report.push('\n');
    report.push_str(RULE);
    report.push_str("\n\n");

    for record in &data.records {
        let kind = match record.kind {
            RecordKind::Page => "page".green(),
            RecordKind::Resource => "res ".cyan(),
        };
        let mut line = format!("  {} {}", kind, extract_url_path(&record.url));
        if record.bytes == 0 {
            line.push_str(&format!(" {}", "(empty)".red()));
        } else {
            line.push_str(&format!(" {} bytes", record.bytes));
        }
        if record.mime_type != "text/html" {
            line.push_str(&format!(" {}", record.mime_type.bright_black()));
        }
        report.push_str(&line);
        report.push('\n');
    }

    report
}

pub fn generate_json_report(data: &ReportData) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "metadata": {
            "generator": "Quarry",
            "version": env!("CARGO_PKG_VERSION"),
            "generated_at": chrono::Utc::now().to_rfc3339(),
        },
        "crawl": {
            "target": data.target,
            "started_at": format_iso8601_timestamp(data.started_at),
            "finished_at": format_iso8601_timestamp(data.finished_at),
            "timed_out": data.timed_out,
            "stats": data.stats,
        },
        "output_dir": data.output_dir,
        "files_written": data.files_written,
        "records": data.records,
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Write the JSON report as `manifest.json` inside `dir`.
pub fn write_manifest(dir: &Path, data: &ReportData) -> std::io::Result<()> {
    let json = generate_json_report(data).map_err(std::io::Error::other)?;
    save_report(&json, &dir.join(MANIFEST_FILE))
}

fn format_timestamp(timestamp: i64) -> String {
    use chrono::{DateTime, Utc};
    let datetime = DateTime::<Utc>::from_timestamp(timestamp, 0).unwrap_or_else(Utc::now);
    datetime.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn format_iso8601_timestamp(timestamp: i64) -> String {
    use chrono::{DateTime, Utc};
    let datetime = DateTime::<Utc>::from_timestamp(timestamp, 0).unwrap_or_else(Utc::now);
    datetime.to_rfc3339()
}
