pub mod capture;
pub mod config;
pub mod crawler;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod frontier;
pub mod render;
pub mod resolve;
pub mod scope;

pub use capture::{CaptureStore, CapturedRecord, RecordKind};
pub use config::CrawlConfig;
pub use crawler::{CrawlOutcome, CrawlStats, Crawler, ProgressCallback};
pub use error::CrawlError;
pub use frontier::{FetchJob, Frontier};
pub use render::{Headers, HttpSession, MemorySession, RenderService};
pub use scope::{ScopeHost, ScopePolicy, normalize_host};
