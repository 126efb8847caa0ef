//! Headless Chrome render session.
//!
//! Uses Chrome DevTools Protocol via chromiumoxide. One tab is opened at
//! launch and reused for every navigation, so the session's current page is
//! the tab's page.

use super::{Headers, RenderService};
use crate::error::{CrawlError, Result};
use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    Headers as NetworkHeaders, SetExtraHttpHeadersParams,
};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler: Option<JoinHandle<()>>,
    applied_headers: Option<Headers>,
}

impl BrowserSession {
    /// Launch a browser and open the tab used as the current page.
    pub async fn launch(headless: bool, sandbox: bool) -> Result<Self> {
        info!("Launching headless Chrome browser...");

        let mut builder = BrowserConfig::builder();
        if !headless {
            builder = builder.with_head();
        }
        if !sandbox {
            builder = builder.no_sandbox();
        }
        builder = builder
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--disable-extensions");

        let config = builder
            .build()
            .map_err(|e| CrawlError::Other(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| CrawlError::Other(format!("Failed to launch browser: {}", e)))?;

        let handle = tokio::spawn(async move {
            while let Some(result) = handler.next().await {
                if result.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| CrawlError::Other(format!("Failed to open tab: {}", e)))?;

        Ok(Self {
            browser,
            page,
            handler: Some(handle),
            applied_headers: None,
        })
    }

    async fn apply_headers(&mut self, headers: &Headers) -> Result<()> {
        if self.applied_headers.as_ref() == Some(headers) {
            return Ok(());
        }
        let value = serde_json::to_value(headers)
            .map_err(|e| CrawlError::Other(format!("Invalid header overlay: {}", e)))?;
        self.page
            .execute(SetExtraHttpHeadersParams::new(NetworkHeaders::new(value)))
            .await
            .map_err(|e| CrawlError::Render(format!("Failed to set headers: {}", e)))?;
        self.applied_headers = Some(headers.clone());
        Ok(())
    }
}

#[async_trait]
impl RenderService for BrowserSession {
    async fn navigate(&mut self, url: &str, headers: &Headers) -> Result<()> {
        if let Err(e) = self.apply_headers(headers).await {
            warn!("{}", e);
        }

        debug!("Navigating browser to {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| CrawlError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn page_content(&mut self) -> Result<String> {
        self.page
            .content()
            .await
            .map_err(|e| CrawlError::Render(format!("Failed to get content: {}", e)))
    }

    async fn text_content(&mut self) -> Result<String> {
        self.page
            .evaluate("document.body ? document.body.innerText : ''")
            .await
            .map_err(|e| CrawlError::Render(format!("Failed to get text: {}", e)))?
            .into_value::<String>()
            .map_err(|e| CrawlError::Render(format!("Unexpected text value: {}", e)))
    }

    async fn close(&mut self) -> Result<()> {
        self.browser
            .close()
            .await
            .map_err(|e| CrawlError::Other(format!("Failed to close browser: {}", e)))?;
        if let Some(handle) = self.handler.take() {
            handle.abort();
        }
        Ok(())
    }
}
