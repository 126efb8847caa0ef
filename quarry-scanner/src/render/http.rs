use super::{Headers, RenderService};
use crate::error::{CrawlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

#[derive(Debug)]
struct LoadedPage {
    content_type: Option<String>,
    body: String,
}

impl LoadedPage {
    fn is_markup(&self) -> bool {
        match &self.content_type {
            Some(ct) => {
                let ct = ct.to_ascii_lowercase();
                ct.contains("text/html") || ct.contains("xhtml")
            }
            None => {
                let head = self.body.trim_start().to_ascii_lowercase();
                head.starts_with("<!doctype html") || head.starts_with("<html")
            }
        }
    }
}

/// Render session backed by plain HTTP requests.
///
/// The response to the last navigation is the current page. Markup capture
/// only succeeds for HTML responses; anything else goes through the text
/// fallback.
pub struct HttpSession {
    client: Client,
    current: Option<LoadedPage>,
}

impl HttpSession {
    pub fn new() -> Result<Self> {
        Self::with_timeout(30)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("Quarry/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs((timeout_secs / 2).max(1)))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            current: None,
        })
    }

    fn current(&self) -> Result<&LoadedPage> {
        self.current.as_ref().ok_or(CrawlError::NoPage)
    }
}

#[async_trait]
impl RenderService for HttpSession {
    async fn navigate(&mut self, url: &str, headers: &Headers) -> Result<()> {
        self.current = None;
        debug!("Fetching {}", url);

        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(|e| CrawlError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Navigation {
                url: url.to_string(),
                reason: format!("HTTP {}", status),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        // Lossy for binary bodies; the session contract is text
        let body = response.text().await.map_err(|e| CrawlError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        self.current = Some(LoadedPage { content_type, body });
        Ok(())
    }

    async fn page_content(&mut self) -> Result<String> {
        let page = self.current()?;
        if !page.is_markup() {
            return Err(CrawlError::Render(format!(
                "current page is not markup ({})",
                page.content_type.as_deref().unwrap_or("unknown type")
            )));
        }
        Ok(page.body.clone())
    }

    async fn text_content(&mut self) -> Result<String> {
        Ok(self.current()?.body.clone())
    }
}
