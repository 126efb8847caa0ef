use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Navigation failed for {url}: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Render failed: {0}")]
    Render(String),

    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("No page loaded in the render session")]
    NoPage,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CrawlError>;
