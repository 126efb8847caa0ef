use crate::capture::CapturedRecord;
use crate::config::CrawlConfig;
use crate::error::{CrawlError, Result};
use crate::frontier::FetchJob;
use crate::render::{Headers, RenderService};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// Outcome of a resource fetch. The record is always produced; `error` says
/// why its body is empty.
#[derive(Debug)]
pub struct ResourceFetch {
    pub record: CapturedRecord,
    pub error: Option<CrawlError>,
}

/// Wraps render session calls with bounded retry and fixed backoff.
#[derive(Debug, Clone)]
pub struct Fetcher {
    headers: Headers,
    max_retries: usize,
    retry_delay: Duration,
    settle_delay: Duration,
    resource_settle_delay: Duration,
    page_timeout: Duration,
    resource_timeout: Duration,
}

impl Fetcher {
    pub fn new(config: &CrawlConfig) -> Self {
        Self {
            headers: config.headers.clone(),
            max_retries: config.max_retries.max(1),
            retry_delay: config.retry_delay,
            settle_delay: config.settle_delay,
            resource_settle_delay: config.resource_settle_delay,
            page_timeout: config.page_timeout,
            resource_timeout: config.resource_timeout,
        }
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    /// Crawl-wide headers with the job's overlay applied on top.
    fn headers_for(&self, job: &FetchJob) -> Headers {
        let mut headers = self.headers.clone();
        if let Some(overlay) = &job.headers {
            headers.extend(overlay.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        headers
    }

    async fn render_page<S>(&self, session: &mut S, url: &str, headers: &Headers) -> Result<String>
    where
        S: RenderService + ?Sized,
    {
        session.navigate(url, headers).await?;
        if !self.settle_delay.is_zero() {
            sleep(self.settle_delay).await;
        }
        session.page_content().await
    }

    /// Render a page, retrying up to `max_retries` attempts in total.
    ///
    /// Returns the markup of the first successful attempt, or the error of
    /// the last one.
    pub async fn fetch_page<S>(&self, session: &mut S, job: &FetchJob) -> Result<String>
    where
        S: RenderService + ?Sized,
    {
        let headers = self.headers_for(job);
        let mut last_error = None;

        for attempt in 1..=self.max_retries {
            if attempt > 1 {
                info!("Retry {}/{} for {}", attempt, self.max_retries, job.url);
                if !self.retry_delay.is_zero() {
                    sleep(self.retry_delay).await;
                }
            }

            let error = match timeout(self.page_timeout, self.render_page(session, &job.url, &headers)).await
            {
                Ok(Ok(html)) => return Ok(html),
                Ok(Err(e)) => e,
                Err(_) => CrawlError::Timeout(self.page_timeout),
            };

            debug!("Attempt {} for {} failed: {}", attempt, job.url, error);
            last_error = Some(error);
        }

        Err(last_error.unwrap_or_else(|| CrawlError::Other(format!("no attempt made for {}", job.url))))
    }

    async fn render_resource<S>(&self, session: &mut S, url: &str) -> Result<String>
    where
        S: RenderService + ?Sized,
    {
        session.navigate(url, &self.headers).await?;
        if !self.resource_settle_delay.is_zero() {
            sleep(self.resource_settle_delay).await;
        }
        match session.page_content().await {
            Ok(body) => Ok(body),
            Err(e) => {
                debug!("No markup for {} ({}), falling back to text", url, e);
                session.text_content().await
            }
        }
    }

    /// Fetch a leaf resource in a single attempt under the resource timeout.
    ///
    /// A failed fetch still yields a record, with an empty body.
    pub async fn fetch_resource<S>(&self, session: &mut S, url: &str) -> ResourceFetch
    where
        S: RenderService + ?Sized,
    {
        let result = match timeout(self.resource_timeout, self.render_resource(session, url)).await {
            Ok(result) => result,
            Err(_) => Err(CrawlError::Timeout(self.resource_timeout)),
        };

        match result {
            Ok(body) => ResourceFetch {
                record: CapturedRecord::resource(url.to_string(), body),
                error: None,
            },
            Err(e) => {
                warn!("Failed to fetch resource {}: {}", url, e);
                ResourceFetch {
                    record: CapturedRecord::resource(url.to_string(), String::new()),
                    error: Some(e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::MemorySession;
    use async_trait::async_trait;

    const PAGE: &str = "https://example.com/";

    fn fetcher(retries: usize) -> Fetcher {
        Fetcher::new(&CrawlConfig::default().without_delays().with_max_retries(retries))
    }

    #[tokio::test]
    async fn test_always_failing_session_exhausts_retries() {
        let mut session = MemorySession::new()
            .with_page(PAGE, "<html></html>")
            .failing(PAGE, usize::MAX);

        let result = fetcher(3).fetch_page(&mut session, &FetchJob::seed(PAGE)).await;
        assert!(result.is_err());
        assert_eq!(session.navigation_count(PAGE), 3);
    }

    #[tokio::test]
    async fn test_recovers_on_later_attempt() {
        let mut session = MemorySession::new()
            .with_page(PAGE, "<html>ok</html>")
            .failing(PAGE, 2);

        let html = fetcher(3)
            .fetch_page(&mut session, &FetchJob::seed(PAGE))
            .await
            .unwrap();
        assert_eq!(html, "<html>ok</html>");
        assert_eq!(session.navigation_count(PAGE), 3);
    }

    #[tokio::test]
    async fn test_zero_retries_still_attempts_once() {
        let mut session = MemorySession::new().failing(PAGE, usize::MAX);
        let fetcher = fetcher(0);
        assert_eq!(fetcher.max_retries(), 1);
        assert!(fetcher.fetch_page(&mut session, &FetchJob::seed(PAGE)).await.is_err());
        assert_eq!(session.navigation_count(PAGE), 1);
    }

    #[tokio::test]
    async fn test_markup_failure_counts_as_failed_attempt() {
        let mut session = MemorySession::new().with_text(PAGE, "plain");
        let result = fetcher(2).fetch_page(&mut session, &FetchJob::seed(PAGE)).await;
        assert!(matches!(result, Err(CrawlError::Render(_))));
        assert_eq!(session.navigation_count(PAGE), 2);
    }

    #[tokio::test]
    async fn test_headers_overlay_on_crawl_headers() {
        let config = CrawlConfig::default()
            .without_delays()
            .with_header("User-Agent", "QuarryTest")
            .with_header("X-Env", "base");
        let fetcher = Fetcher::new(&config);

        let mut overlay = Headers::new();
        overlay.insert("X-Env".to_string(), "job".to_string());
        let job = FetchJob::seed(PAGE).with_headers(overlay);

        let mut session = MemorySession::new().with_page(PAGE, "<html></html>");
        fetcher.fetch_page(&mut session, &job).await.unwrap();

        let (_, sent) = &session.navigations()[0];
        assert_eq!(sent.get("User-Agent").map(String::as_str), Some("QuarryTest"));
        assert_eq!(sent.get("X-Env").map(String::as_str), Some("job"));
    }

    #[tokio::test]
    async fn test_resource_text_fallback() {
        let url = "https://example.com/app.js";
        let mut session = MemorySession::new().with_text(url, "run();");

        let fetched = fetcher(3).fetch_resource(&mut session, url).await;
        assert!(fetched.error.is_none());
        assert_eq!(fetched.record.body, "run();");
        assert_eq!(session.navigation_count(url), 1);
    }

    #[tokio::test]
    async fn test_failed_resource_records_empty_body() {
        let url = "https://example.com/style.css";
        let mut session = MemorySession::new();

        let fetched = fetcher(3).fetch_resource(&mut session, url).await;
        assert!(fetched.error.is_some());
        assert!(fetched.record.body.is_empty());
        assert_eq!(fetched.record.mime_type, "text/css");
        assert_eq!(session.navigation_count(url), 1);
    }

    struct StalledSession;

    #[async_trait]
    impl RenderService for StalledSession {
        async fn navigate(&mut self, _url: &str, _headers: &Headers) -> Result<()> {
            sleep(Duration::from_secs(3600)).await;
            Ok(())
        }

        async fn page_content(&mut self) -> Result<String> {
            Ok(String::new())
        }

        async fn text_content(&mut self) -> Result<String> {
            Ok(String::new())
        }
    }

    struct BrokenSession {
        navigations: usize,
    }

    #[async_trait]
    impl RenderService for BrokenSession {
        async fn navigate(&mut self, url: &str, _headers: &Headers) -> Result<()> {
            self.navigations += 1;
            Err(CrawlError::Other(format!("session lost while loading {}", url)))
        }

        async fn page_content(&mut self) -> Result<String> {
            Err(CrawlError::NoPage)
        }

        async fn text_content(&mut self) -> Result<String> {
            Err(CrawlError::NoPage)
        }
    }

    #[tokio::test]
    async fn test_every_render_error_is_retried() {
        let mut session = BrokenSession { navigations: 0 };
        let result = fetcher(3).fetch_page(&mut session, &FetchJob::seed(PAGE)).await;
        assert!(matches!(result, Err(CrawlError::Other(_))));
        assert_eq!(session.navigations, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_page_times_out_per_attempt() {
        let mut config = CrawlConfig::default().without_delays().with_max_retries(2);
        config.page_timeout = Duration::from_secs(5);
        let fetcher = Fetcher::new(&config);

        let result = fetcher.fetch_page(&mut StalledSession, &FetchJob::seed(PAGE)).await;
        assert!(matches!(result, Err(CrawlError::Timeout(_))));
    }
}
