//! The render session contract.
//!
//! A session is one stateful browsing context with a single "current page".
//! It is handed to the fetcher as an explicit `&mut` capability, so only one
//! navigation can be in flight against it at a time. Running several
//! sessions in parallel means owning several of these.

mod http;
mod memory;
#[cfg(feature = "js-rendering")]
mod browser;

pub use http::HttpSession;
pub use memory::MemorySession;
#[cfg(feature = "js-rendering")]
pub use browser::BrowserSession;

use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Header name to value overlay applied to a navigation.
pub type Headers = BTreeMap<String, String>;

#[async_trait]
pub trait RenderService: Send {
    /// Load `url` as the session's current page.
    async fn navigate(&mut self, url: &str, headers: &Headers) -> Result<()>;

    /// Serialized markup of the current page.
    async fn page_content(&mut self) -> Result<String>;

    /// Raw text of the current page, used when markup capture fails.
    async fn text_content(&mut self) -> Result<String>;

    /// Release whatever the session holds open.
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Check if the headless browser session was compiled in
pub fn is_js_rendering_available() -> bool {
    cfg!(feature = "js-rendering")
}
