use serde::{Deserialize, Serialize};
use url::Url;

/// Whether a record came from a traversed page or a leaf resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Page,
    Resource,
}

/// The result of one fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedRecord {
    pub url: String,
    pub body: String,
    pub mime_type: String,
    pub kind: RecordKind,
}

impl CapturedRecord {
    pub fn page(url: String, body: String) -> Self {
        Self {
            url,
            body,
            mime_type: "text/html".to_string(),
            kind: RecordKind::Page,
        }
    }

    pub fn resource(url: String, body: String) -> Self {
        let mime_type = mime_from_url(&url);
        Self {
            url,
            body,
            mime_type,
            kind: RecordKind::Resource,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Infer a MIME type from the extension of the URL's path.
pub fn mime_from_url(url: &str) -> String {
    let path = Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());

    mime_guess::from_path(path.to_lowercase())
        .first_raw()
        .unwrap_or("text/plain")
        .to_string()
}

/// Append-only record collection, ordered by fetch completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureStore {
    records: Vec<CapturedRecord>,
}

impl CaptureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: CapturedRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[CapturedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn pages(&self) -> impl Iterator<Item = &CapturedRecord> {
        self.records.iter().filter(|r| r.kind == RecordKind::Page)
    }

    pub fn resources(&self) -> impl Iterator<Item = &CapturedRecord> {
        self.records.iter().filter(|r| r.kind == RecordKind::Resource)
    }

    pub fn into_records(self) -> Vec<CapturedRecord> {
        self.records
    }
}
