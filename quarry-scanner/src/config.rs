use crate::render::Headers;
use crate::scope::ScopePolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MAX_DEPTH: usize = 5;
pub const DEFAULT_MAX_RETRIES: usize = 3;

/// Tunables for a single crawl.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Headers applied to every navigation.
    pub headers: Headers,
    pub max_depth: usize,
    /// Attempts per page fetch, including the first one.
    pub max_retries: usize,
    pub retry_delay: Duration,
    /// Wait after a page navigation before capturing its content.
    pub settle_delay: Duration,
    pub resource_settle_delay: Duration,
    /// Bound on a single page attempt.
    pub page_timeout: Duration,
    /// Bound on a whole resource fetch.
    pub resource_timeout: Duration,
    /// Sleep between consecutive job completions.
    pub politeness_delay: Duration,
    /// Overall deadline for the crawl.
    pub crawl_timeout: Duration,
    pub scope: ScopePolicy,
    /// Fetch each resource URL at most once per crawl.
    pub dedupe_resources: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            headers: Headers::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_secs(1),
            settle_delay: Duration::from_secs(1),
            resource_settle_delay: Duration::from_millis(500),
            page_timeout: Duration::from_secs(60),
            resource_timeout: Duration::from_secs(30),
            politeness_delay: Duration::from_millis(500),
            crawl_timeout: Duration::from_secs(300),
            scope: ScopePolicy::SameHost,
            dedupe_resources: true,
        }
    }
}

impl CrawlConfig {
    /// Zero every delay. Handy for tests and offline replays.
    pub fn without_delays(mut self) -> Self {
        self.retry_delay = Duration::ZERO;
        self.settle_delay = Duration::ZERO;
        self.resource_settle_delay = Duration::ZERO;
        self.politeness_delay = Duration::ZERO;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_max_retries(mut self, retries: usize) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_crawl_timeout(mut self, timeout: Duration) -> Self {
        self.crawl_timeout = timeout;
        self
    }

    pub fn with_scope(mut self, scope: ScopePolicy) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_dedupe_resources(mut self, dedupe: bool) -> Self {
        self.dedupe_resources = dedupe;
        self
    }
}
