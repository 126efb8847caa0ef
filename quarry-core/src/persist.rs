// Writes captured records to the output directory, one file per record

use quarry_scanner::{CapturedRecord, RecordKind};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const MAX_NAME_LEN: usize = 100;
pub const FINAL_PAGE_FILE: &str = "final_page.html";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrittenFile {
    pub index: usize,
    pub url: String,
    pub file_name: String,
    pub mime_type: String,
    pub bytes: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistSummary {
    pub files: Vec<WrittenFile>,
    pub skipped_empty: usize,
    pub failed: usize,
}

/// Create the output directory (and parents) if needed.
pub fn prepare_output_dir(path: &Path) -> std::io::Result<PathBuf> {
    fs::create_dir_all(path)?;
    Ok(path.to_path_buf())
}

/// Flatten a URL into something usable as a file name, at most 100 bytes.
pub fn safe_file_name(url: &str) -> String {
    let mut safe = url.replace("://", "_");
    for ch in ['/', '?', '&', '='] {
        safe = safe.replace(ch, "_");
    }

    if safe.len() > MAX_NAME_LEN {
        let mut end = MAX_NAME_LEN;
        while !safe.is_char_boundary(end) {
            end -= 1;
        }
        safe.truncate(end);
    }
    safe
}

/// Pick a file extension from the MIME type, sniffing the body when the
/// type says nothing useful.
pub fn file_extension(mime_type: &str, body: &str) -> &'static str {
    let mime = mime_type.to_lowercase();

    let by_mime = [
        ("html", ".html"),
        ("json", ".json"),
        ("svg", ".svg"),
        ("xml", ".xml"),
        ("javascript", ".js"),
        ("js", ".js"),
        ("css", ".css"),
        ("png", ".png"),
        ("jpeg", ".jpg"),
        ("jpg", ".jpg"),
        ("gif", ".gif"),
        ("pdf", ".pdf"),
        ("text/plain", ".txt"),
    ];
    if let Some((_, ext)) = by_mime.iter().find(|(needle, _)| mime.contains(needle)) {
        return *ext;
    }

    let lowered = body.to_lowercase();
    let trimmed = lowered.trim();
    if lowered.contains("<html") || lowered.contains("<!doctype") {
        ".html"
    } else if trimmed.starts_with('{') || trimmed.starts_with('[') {
        ".json"
    } else if lowered.contains("<?xml") || trimmed.starts_with('<') {
        ".xml"
    } else {
        ".txt"
    }
}

/// File name for the record at 1-based position `index`.
pub fn record_file_name(index: usize, record: &CapturedRecord) -> String {
    format!(
        "{}_{}{}",
        index,
        safe_file_name(&record.url),
        file_extension(&record.mime_type, &record.body)
    )
}

/// Write every non-empty record. Individual write failures are logged and
/// counted, never fatal.
pub fn write_records(dir: &Path, records: &[CapturedRecord]) -> PersistSummary {
    let mut summary = PersistSummary::default();

    for (i, record) in records.iter().enumerate() {
        let index = i + 1;
        if record.body.is_empty() {
            summary.skipped_empty += 1;
            continue;
        }

        let file_name = record_file_name(index, record);
        match fs::write(dir.join(&file_name), record.body.as_bytes()) {
            Ok(()) => summary.files.push(WrittenFile {
                index,
                url: record.url.clone(),
                file_name,
                mime_type: record.mime_type.clone(),
                bytes: record.body.len(),
            }),
            Err(e) => {
                warn!("Failed to write content file {}: {}", index, e);
                summary.failed += 1;
            }
        }
    }

    summary
}

/// Write the seed page, if captured, as `final_page.html`.
pub fn write_final_page(dir: &Path, records: &[CapturedRecord]) -> std::io::Result<Option<PathBuf>> {
    let Some(seed) = records
        .iter()
        .find(|r| r.kind == RecordKind::Page && !r.body.is_empty())
    else {
        return Ok(None);
    };

    let path = dir.join(FINAL_PAGE_FILE);
    fs::write(&path, seed.body.as_bytes())?;
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_file_name_replaces_separators() {
        assert_eq!(
            safe_file_name("https://example.com/a/b?x=1&y=2"),
            "https_example.com_a_b_x_1_y_2"
        );
    }

    #[test]
    fn test_safe_file_name_truncates_on_char_boundary() {
        let long = format!("https://example.com/{}", "é".repeat(80));
        let name = safe_file_name(&long);
        assert!(name.len() <= 100);
        assert!(name.starts_with("https_example.com_"));
    }

    #[test]
    fn test_extension_from_mime() {
        assert_eq!(file_extension("text/html", ""), ".html");
        assert_eq!(file_extension("application/javascript", ""), ".js");
        assert_eq!(file_extension("text/javascript", ""), ".js");
        assert_eq!(file_extension("image/jpeg", ""), ".jpg");
        assert_eq!(file_extension("image/svg+xml", ""), ".svg");
        assert_eq!(file_extension("application/pdf", ""), ".pdf");
    }

    #[test]
    fn test_extension_sniffed_from_body() {
        assert_eq!(file_extension("", "<!DOCTYPE html><html></html>"), ".html");
        assert_eq!(file_extension("application/octet-stream", "  {\"a\": 1}"), ".json");
        assert_eq!(file_extension("", "<?xml version=\"1.0\"?><r/>"), ".xml");
        assert_eq!(file_extension("", "just words"), ".txt");
    }
}
