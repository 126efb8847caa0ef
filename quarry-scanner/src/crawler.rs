use crate::capture::{CaptureStore, CapturedRecord};
use crate::config::CrawlConfig;
use crate::error::{CrawlError, Result};
use crate::extract::extract_page;
use crate::fetcher::Fetcher;
use crate::frontier::{FetchJob, Frontier, visit_key};
use crate::render::RenderService;
use crate::scope::ScopeHost;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};
use url::Url;

pub type ProgressCallback = Arc<dyn Fn(&FetchJob) + Send + Sync>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlStats {
    pub pages_captured: usize,
    pub pages_failed: usize,
    /// Pages that loaded but rendered no markup; neither recorded nor expanded.
    pub pages_empty: usize,
    pub resources_captured: usize,
    pub resources_failed: usize,
    /// Resource references skipped because that URL was already fetched.
    pub resources_skipped: usize,
    pub links_queued: usize,
    pub out_of_scope: usize,
}

#[derive(Debug)]
pub struct CrawlOutcome {
    pub records: CaptureStore,
    pub stats: CrawlStats,
    /// The overall deadline expired before the frontier drained.
    pub timed_out: bool,
}

/// Mutable traversal state. Kept outside the crawl future so that whatever
/// was captured survives a deadline expiry.
struct CrawlState {
    frontier: Frontier,
    records: CaptureStore,
    stats: CrawlStats,
    fetched_resources: HashSet<String>,
}

pub struct Crawler {
    config: CrawlConfig,
    fetcher: Fetcher,
    progress_callback: Option<ProgressCallback>,
}

impl Crawler {
    pub fn new(config: CrawlConfig) -> Self {
        let fetcher = Fetcher::new(&config);
        Self {
            config,
            fetcher,
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Crawl breadth-first from `seed` through `session`.
    ///
    /// Fails only when the seed itself is unusable. Per-page failures are
    /// logged and skipped; on deadline expiry the records captured so far
    /// are returned with `timed_out` set.
    pub async fn crawl<S>(&self, session: &mut S, seed: &str) -> Result<CrawlOutcome>
    where
        S: RenderService + ?Sized,
    {
        let seed_url = Url::parse(seed)
            .map_err(|e| CrawlError::InvalidUrl(format!("{}: {}", seed, e)))?;
        let scope = ScopeHost::from_url(&seed_url)
            .ok_or_else(|| CrawlError::InvalidUrl(format!("{} has no host", seed)))?;

        info!(
            "Starting crawl of {} (scope: {}, max depth: {})",
            seed_url, scope, self.config.max_depth
        );

        let mut state = CrawlState {
            frontier: Frontier::new(self.config.max_depth),
            records: CaptureStore::new(),
            stats: CrawlStats::default(),
            fetched_resources: HashSet::new(),
        };
        state.frontier.seed(FetchJob::seed(seed_url.as_str()));

        let timed_out = timeout(
            self.config.crawl_timeout,
            self.run(session, &scope, &mut state),
        )
        .await
        .is_err();

        if timed_out {
            warn!(
                "Crawl deadline of {:?} reached, abandoning {} pending job(s)",
                self.config.crawl_timeout,
                state.frontier.pending()
            );
        }

        info!(
            "Crawl complete. Visited {} pages, captured {} records",
            state.frontier.visited_count(),
            state.records.len()
        );

        Ok(CrawlOutcome {
            records: state.records,
            stats: state.stats,
            timed_out,
        })
    }

    async fn run<S>(&self, session: &mut S, scope: &ScopeHost, state: &mut CrawlState)
    where
        S: RenderService + ?Sized,
    {
        while let Some(job) = state.frontier.next_job() {
            if let Some(ref callback) = self.progress_callback {
                callback(&job);
            }

            info!(
                "Crawling [{}/{}]: {}",
                job.depth + 1,
                self.config.max_depth + 1,
                job.url
            );
            if !job.is_seed() {
                debug!("  From: {} ({}[{}])", job.source, job.tag, job.attribute);
            }

            match self.fetcher.fetch_page(session, &job).await {
                Ok(html) => self.process_page(session, scope, state, &job, html).await,
                Err(e) => {
                    warn!("Failed to load {}: {}", job.url, e);
                    state.stats.pages_failed += 1;
                }
            }

            if !self.config.politeness_delay.is_zero() && !state.frontier.is_empty() {
                sleep(self.config.politeness_delay).await;
            }
        }
    }

    async fn process_page<S>(
        &self,
        session: &mut S,
        scope: &ScopeHost,
        state: &mut CrawlState,
        job: &FetchJob,
        html: String,
    ) where
        S: RenderService + ?Sized,
    {
        if html.is_empty() {
            debug!("Empty page at {}, nothing to record", job.url);
            state.stats.pages_empty += 1;
            return;
        }

        let refs = extract_page(&html, &job.url);

        debug!("Page saved ({} bytes)", html.len());
        state.records.push(CapturedRecord::page(job.url.clone(), html));
        state.stats.pages_captured += 1;

        // Resources are leaves: fetched right away, never queued
        for resource in refs.resources {
            if !scope.contains(&resource, self.config.scope) {
                debug!("  -> Resource out of scope: {}", resource);
                state.stats.out_of_scope += 1;
                continue;
            }
            if self.config.dedupe_resources && !state.fetched_resources.insert(visit_key(&resource)) {
                debug!("  -> Resource already fetched: {}", resource);
                state.stats.resources_skipped += 1;
                continue;
            }

            let fetched = self.fetcher.fetch_resource(session, &resource).await;
            if fetched.error.is_some() {
                state.stats.resources_failed += 1;
            } else {
                state.stats.resources_captured += 1;
            }
            state.records.push(fetched.record);
        }

        if !state.frontier.can_expand(job.depth) {
            return;
        }

        let mut queued = 0;
        for link in refs.links {
            if !scope.contains(&link.url, self.config.scope) {
                debug!("  -> Out of scope, skipping {}", link.url);
                state.stats.out_of_scope += 1;
                continue;
            }

            let child = FetchJob::discovered(
                link.url,
                job.depth + 1,
                job.url.as_str(),
                link.tag,
                link.attribute,
            );
            match state.frontier.admit(child) {
                Ok(()) => queued += 1,
                Err(reason) => debug!("  -> Not queued: {:?}", reason),
            }
        }

        if queued > 0 {
            info!("Queued {} new URLs for crawling", queued);
        }
        state.stats.links_queued += queued;
    }
}

impl Default for Crawler {
    fn default() -> Self {
        Self::new(CrawlConfig::default())
    }
}
