use indicatif::{ProgressBar, ProgressStyle};
use quarry_scanner::{
    CrawlConfig, CrawlOutcome, Crawler, FetchJob, HttpSession, ProgressCallback, RenderService,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Which render session drives the crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderBackend {
    /// Plain HTTP requests, no script execution
    Http,
    /// Headless Chrome (requires the `js-rendering` feature)
    Browser { headless: bool, sandbox: bool },
}

/// Options for configuring a crawl operation
pub struct CrawlOptions {
    pub url: String,
    pub config: CrawlConfig,
    pub backend: RenderBackend,
    pub show_progress_bars: bool,
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Validate a seed URL before any session is opened.
pub fn validate_target(url: &str) -> Result<Url, String> {
    let parsed = Url::parse(url).map_err(|e| format!("Invalid URL '{}': {}", url, e))?;
    if parsed.host_str().is_none() {
        return Err(format!("Invalid URL '{}': no host", url));
    }
    Ok(parsed)
}

async fn crawl_with_session<S>(
    crawler: &Crawler,
    session: &mut S,
    url: &str,
) -> Result<CrawlOutcome, String>
where
    S: RenderService + ?Sized,
{
    let outcome = crawler.crawl(session, url).await.map_err(|e| e.to_string());
    if let Err(e) = session.close().await {
        warn!("Failed to close render session: {}", e);
    }
    outcome
}

#[cfg(feature = "js-rendering")]
async fn crawl_in_browser(
    crawler: &Crawler,
    url: &str,
    headless: bool,
    sandbox: bool,
) -> Result<CrawlOutcome, String> {
    let mut session = quarry_scanner::render::BrowserSession::launch(headless, sandbox)
        .await
        .map_err(|e| e.to_string())?;
    crawl_with_session(crawler, &mut session, url).await
}

#[cfg(not(feature = "js-rendering"))]
async fn crawl_in_browser(
    _crawler: &Crawler,
    url: &str,
    _headless: bool,
    _sandbox: bool,
) -> Result<CrawlOutcome, String> {
    Err(format!(
        "Browser rendering not available for {}. \
         Compile with --features js-rendering to enable headless browser support.",
        url
    ))
}

/// Execute a crawl with the given options
/// Returns the crawl outcome
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<CrawlOutcome, String> {
    let CrawlOptions {
        url,
        config,
        backend,
        show_progress_bars,
    } = options;

    validate_target(&url)?;

    // Set up single progress bar for overall crawl progress (only if enabled)
    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting crawl...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let processed_count = Arc::new(AtomicUsize::new(0));

    let internal_progress_callback: ProgressCallback = {
        let pb_clone = progress_bar.clone();
        let count_clone = processed_count.clone();
        let max_depth = config.max_depth;
        Arc::new(move |job: &FetchJob| {
            let count = count_clone.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref pb) = pb_clone {
                pb.set_message(format!(
                    "Crawling [{}/{}] {} ({} processed)",
                    job.depth + 1,
                    max_depth + 1,
                    extract_url_path(&job.url),
                    count
                ));
            }
        })
    };

    let page_timeout_secs = config.page_timeout.as_secs().max(1);
    let crawler = Crawler::new(config).with_progress_callback(internal_progress_callback);

    let result = match backend {
        RenderBackend::Http => match HttpSession::with_timeout(page_timeout_secs) {
            Ok(mut session) => crawl_with_session(&crawler, &mut session, &url).await,
            Err(e) => Err(format!("Failed to create HTTP session: {}", e)),
        },
        RenderBackend::Browser { headless, sandbox } => {
            crawl_in_browser(&crawler, &url, headless, sandbox).await
        }
    };

    if let Some(ref pb) = progress_bar {
        let total = processed_count.load(Ordering::Relaxed);
        pb.finish_with_message(format!("Crawl complete! {} URLs processed", total));
    }

    if let (Some(callback), Ok(outcome)) = (&progress_callback, &result)
        && outcome.timed_out
    {
        callback(format!(
            "[!] Deadline reached, keeping {} captured records",
            outcome.records.len()
        ));
    }

    result
}
