pub mod commands;
pub mod handlers;

pub use handlers::{
    CrawlTarget, build_crawl_config, parse_header_line, parse_headers, resolve_target_and_output,
};

pub use quarry_core::crawl::{CrawlOptions, RenderBackend, execute_crawl, extract_url_path};
