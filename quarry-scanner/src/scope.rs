//! Host scope filtering.
//!
//! The crawl target is reduced to a [`ScopeHost`] once at startup: lowercase,
//! without a leading `www.` and without a port. Every candidate URL is
//! normalized the same way and compared against it.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Which hosts count as "the same site".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScopePolicy {
    /// Normalized host must equal the scope host exactly.
    #[default]
    SameHost,
    /// Also accept any subdomain of the scope host.
    IncludeSubdomains,
}

/// Lowercase, strip a leading `www.` and a trailing `:port`.
pub fn normalize_host(host: &str) -> String {
    let host = host.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    // Bracketed IPv6 literals carry colons of their own
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => host[..=end].to_string(),
            None => host.to_string(),
        };
    }

    match host.find(':') {
        Some(colon) => host[..colon].to_string(),
        None => host.to_string(),
    }
}

/// The normalized hostname of the seed URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeHost(String);

impl ScopeHost {
    pub fn new(host: &str) -> Self {
        Self(normalize_host(host))
    }

    /// Derive the scope host from a seed URL. Returns `None` when the URL has no host.
    pub fn from_url(url: &Url) -> Option<Self> {
        url.host_str().map(Self::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check a candidate URL against this scope. Unparsable or hostless
    /// candidates are out of scope.
    pub fn contains(&self, candidate: &str, policy: ScopePolicy) -> bool {
        let Some(host) = Url::parse(candidate)
            .ok()
            .and_then(|u| u.host_str().map(normalize_host))
        else {
            return false;
        };

        if host.is_empty() {
            return false;
        }

        match policy {
            ScopePolicy::SameHost => host == self.0,
            ScopePolicy::IncludeSubdomains => {
                host == self.0 || host.ends_with(&format!(".{}", self.0))
            }
        }
    }
}

impl fmt::Display for ScopeHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strict same-host check used by the traversal.
pub fn is_in_scope(scope: &ScopeHost, candidate: &str) -> bool {
    scope.contains(candidate, ScopePolicy::SameHost)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_host_variants() {
        assert_eq!(normalize_host("WWW.Example.com:8080"), "example.com");
        assert_eq!(normalize_host("example.com"), "example.com");
        assert_eq!(normalize_host("Sub.Example.COM"), "sub.example.com");
        assert_eq!(normalize_host("[::1]:3000"), "[::1]");
    }

    #[test]
    fn test_normalize_host_is_idempotent() {
        let once = normalize_host("WWW.Example.com:8080");
        assert_eq!(normalize_host(&once), once);
        assert_eq!(once, normalize_host("example.com"));
    }

    #[test]
    fn test_scope_accepts_same_host() {
        let scope = ScopeHost::new("example.com");
        assert!(is_in_scope(&scope, "https://example.com/page?x=1"));
        assert!(is_in_scope(&scope, "http://www.example.com:8080/about"));
    }

    #[test]
    fn test_scope_rejects_other_hosts() {
        let scope = ScopeHost::new("example.com");
        assert!(!is_in_scope(&scope, "https://other.com/page"));
        assert!(!is_in_scope(&scope, "https://api.example.com/page"));
        assert!(!is_in_scope(&scope, "https://notexample.com/"));
    }

    #[test]
    fn test_scope_fails_closed() {
        let scope = ScopeHost::new("example.com");
        assert!(!is_in_scope(&scope, "http://"));
        assert!(!is_in_scope(&scope, "not a url"));
        assert!(!is_in_scope(&scope, "mailto:someone@example.com"));
        assert!(!is_in_scope(&scope, "/relative/path"));
    }

    #[test]
    fn test_subdomain_policy_is_opt_in() {
        let scope = ScopeHost::new("example.com");
        let candidate = "https://docs.example.com/intro";
        assert!(!scope.contains(candidate, ScopePolicy::default()));
        assert!(scope.contains(candidate, ScopePolicy::IncludeSubdomains));
        assert!(!scope.contains("https://badexample.com/", ScopePolicy::IncludeSubdomains));
    }

    #[test]
    fn test_scope_host_from_url() {
        let url = Url::parse("https://WWW.Example.com:8443/start").unwrap();
        let scope = ScopeHost::from_url(&url).unwrap();
        assert_eq!(scope.as_str(), "example.com");
        assert_eq!(scope.to_string(), "example.com");
    }
}
