//! Breadth-first traversal state.
//!
//! A single admission set covers both "queued" and "visited": a URL is
//! checked and recorded once, when it is discovered, so no page can enter
//! the queue twice no matter how many pages link to it. Membership is keyed
//! on the parsed URL's serialisation, so `https://example.com` and
//! `https://example.com/` are the same page even though jobs keep the
//! reference text they were discovered with.

use crate::render::Headers;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use tracing::debug;
use url::Url;

/// A unit of traversal work. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchJob {
    pub url: String,
    pub depth: usize,
    /// Page that referenced this URL; empty for the seed.
    pub source: String,
    pub tag: String,
    pub attribute: String,
    pub headers: Option<Headers>,
}

impl FetchJob {
    pub fn seed(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            depth: 0,
            source: String::new(),
            tag: String::new(),
            attribute: String::new(),
            headers: None,
        }
    }

    pub fn discovered(
        url: impl Into<String>,
        depth: usize,
        source: impl Into<String>,
        tag: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            depth,
            source: source.into(),
            tag: tag.into(),
            attribute: attribute.into(),
            headers: None,
        }
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn is_seed(&self) -> bool {
        self.source.is_empty()
    }
}

/// Why a discovered job was not admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    AlreadySeen,
    TooDeep,
}

/// Set key for `url`: its serialised form when it parses, else the text.
pub fn visit_key(url: &str) -> String {
    Url::parse(url)
        .map(|parsed| parsed.to_string())
        .unwrap_or_else(|_| url.to_string())
}

#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<FetchJob>,
    admitted: HashSet<String>,
    visited: HashSet<String>,
    max_depth: usize,
}

impl Frontier {
    pub fn new(max_depth: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            admitted: HashSet::new(),
            visited: HashSet::new(),
            max_depth,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Enqueue the seed without scope, depth or duplicate checks.
    pub fn seed(&mut self, job: FetchJob) {
        self.admitted.insert(visit_key(&job.url));
        self.queue.push_back(job);
    }

    /// Admit a discovered job if it is new and within the depth bound.
    pub fn admit(&mut self, job: FetchJob) -> Result<(), Rejection> {
        if job.depth > self.max_depth {
            return Err(Rejection::TooDeep);
        }
        if !self.admitted.insert(visit_key(&job.url)) {
            return Err(Rejection::AlreadySeen);
        }
        debug!("Queued {} at depth {}", job.url, job.depth);
        self.queue.push_back(job);
        Ok(())
    }

    /// Whether a job at `depth` may discover children.
    pub fn can_expand(&self, depth: usize) -> bool {
        depth < self.max_depth
    }

    /// Pop the next job and mark it visited. Jobs whose URL was already
    /// visited are dropped.
    pub fn next_job(&mut self) -> Option<FetchJob> {
        while let Some(job) = self.queue.pop_front() {
            if self.visited.insert(visit_key(&job.url)) {
                return Some(job);
            }
            debug!("Skipping already visited {}", job.url);
        }
        None
    }

    pub fn is_seen(&self, url: &str) -> bool {
        self.admitted.contains(&visit_key(url))
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(&visit_key(url))
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child(url: &str, depth: usize) -> FetchJob {
        FetchJob::discovered(url, depth, "https://example.com/", "a", "href")
    }

    #[test]
    fn test_fifo_order() {
        let mut frontier = Frontier::new(5);
        frontier.seed(FetchJob::seed("https://example.com/"));
        frontier.admit(child("https://example.com/a", 1)).unwrap();
        frontier.admit(child("https://example.com/b", 1)).unwrap();

        let order: Vec<String> = std::iter::from_fn(|| frontier.next_job())
            .map(|j| j.url)
            .collect();
        assert_eq!(
            order,
            vec!["https://example.com/", "https://example.com/a", "https://example.com/b"]
        );
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_duplicate_discovery_is_rejected() {
        let mut frontier = Frontier::new(5);
        frontier.seed(FetchJob::seed("https://example.com/"));
        assert_eq!(
            frontier.admit(child("https://example.com/", 1)),
            Err(Rejection::AlreadySeen)
        );
        frontier.admit(child("https://example.com/a", 1)).unwrap();
        assert_eq!(
            frontier.admit(child("https://example.com/a", 2)),
            Err(Rejection::AlreadySeen)
        );
        assert_eq!(frontier.pending(), 2);
    }

    #[test]
    fn test_depth_bound() {
        let mut frontier = Frontier::new(1);
        assert!(frontier.can_expand(0));
        assert!(!frontier.can_expand(1));
        assert_eq!(
            frontier.admit(child("https://example.com/deep", 2)),
            Err(Rejection::TooDeep)
        );
        assert!(!frontier.is_seen("https://example.com/deep"));
    }

    #[test]
    fn test_next_job_marks_visited_once() {
        let mut frontier = Frontier::new(2);
        frontier.seed(FetchJob::seed("https://example.com/"));
        // A second seed bypasses admission, so the queue holds a duplicate
        frontier.seed(FetchJob::seed("https://example.com/"));

        let first = frontier.next_job().unwrap();
        assert!(first.is_seed());
        assert!(frontier.is_visited("https://example.com/"));
        assert!(frontier.next_job().is_none());
        assert_eq!(frontier.visited_count(), 1);
    }

    #[test]
    fn test_equivalent_spellings_share_one_slot() {
        let mut frontier = Frontier::new(3);
        frontier.seed(FetchJob::seed("https://example.com/"));
        assert_eq!(
            frontier.admit(child("https://example.com", 1)),
            Err(Rejection::AlreadySeen)
        );
        assert_eq!(
            frontier.admit(child("HTTPS://Example.COM:443/", 1)),
            Err(Rejection::AlreadySeen)
        );

        frontier.admit(child("https://example.com/a?x=1", 1)).unwrap();
        assert!(frontier.is_seen("https://EXAMPLE.com/a?x=1"));
        assert_eq!(frontier.pending(), 2);
    }

    #[test]
    fn test_visit_key_keeps_unparsable_text() {
        assert_eq!(visit_key("https://example.com"), "https://example.com/");
        assert_eq!(visit_key("not a url"), "not a url");
    }

    #[test]
    fn test_zero_depth_never_expands() {
        let frontier = Frontier::new(0);
        assert!(!frontier.can_expand(0));
    }
}
