use super::{Headers, RenderService};
use crate::error::{CrawlError, Result};
use async_trait::async_trait;
use std::collections::HashMap;

#[derive(Debug, Clone)]
enum StoredPage {
    Markup(String),
    Text(String),
}

/// Render session that serves pages from memory.
///
/// Useful for replaying a known site offline and for exercising the crawl
/// loop without a network. Navigation failures can be scripted per URL.
#[derive(Debug, Default)]
pub struct MemorySession {
    pages: HashMap<String, StoredPage>,
    failures: HashMap<String, usize>,
    current: Option<String>,
    navigations: Vec<(String, Headers)>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` as markup at `url`.
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages
            .insert(url.to_string(), StoredPage::Markup(html.to_string()));
        self
    }

    /// Serve `text` at `url`; markup capture fails for it.
    pub fn with_text(mut self, url: &str, text: &str) -> Self {
        self.pages
            .insert(url.to_string(), StoredPage::Text(text.to_string()));
        self
    }

    /// Fail the next `times` navigations to `url`.
    pub fn failing(mut self, url: &str, times: usize) -> Self {
        self.failures.insert(url.to_string(), times);
        self
    }

    /// Every navigation made so far, with the headers it carried.
    pub fn navigations(&self) -> &[(String, Headers)] {
        &self.navigations
    }

    pub fn navigation_count(&self, url: &str) -> usize {
        self.navigations.iter().filter(|(u, _)| u == url).count()
    }

    fn current(&self) -> Result<&StoredPage> {
        self.current
            .as_ref()
            .and_then(|url| self.pages.get(url))
            .ok_or(CrawlError::NoPage)
    }
}

#[async_trait]
impl RenderService for MemorySession {
    async fn navigate(&mut self, url: &str, headers: &Headers) -> Result<()> {
        self.navigations.push((url.to_string(), headers.clone()));
        self.current = None;

        if let Some(remaining) = self.failures.get_mut(url)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(CrawlError::Navigation {
                url: url.to_string(),
                reason: "scripted failure".to_string(),
            });
        }

        if !self.pages.contains_key(url) {
            return Err(CrawlError::Navigation {
                url: url.to_string(),
                reason: "no such page".to_string(),
            });
        }

        self.current = Some(url.to_string());
        Ok(())
    }

    async fn page_content(&mut self) -> Result<String> {
        match self.current()? {
            StoredPage::Markup(html) => Ok(html.clone()),
            StoredPage::Text(_) => Err(CrawlError::Render("not markup".to_string())),
        }
    }

    async fn text_content(&mut self) -> Result<String> {
        match self.current()? {
            StoredPage::Markup(body) | StoredPage::Text(body) => Ok(body.clone()),
        }
    }
}
