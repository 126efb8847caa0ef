//! Relative reference resolution with a site-root fallback.
//!
//! A path-relative reference such as `img/logo.png` is resolved twice: once
//! against the page it appeared on (RFC 3986 semantics) and once against the
//! site root. Sites that mix up their relative paths usually meant one of
//! the two, so both are handed back to the caller in that order.

use tracing::debug;
use url::Url;

/// Ordered output of [`resolve`]: one candidate, or a primary and a
/// distinct root-relative secondary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Single(String),
    Dual { primary: String, secondary: String },
}

impl Resolved {
    pub fn primary(&self) -> &str {
        match self {
            Resolved::Single(url) => url,
            Resolved::Dual { primary, .. } => primary,
        }
    }

    pub fn secondary(&self) -> Option<&str> {
        match self {
            Resolved::Single(_) => None,
            Resolved::Dual { secondary, .. } => Some(secondary),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary()).chain(self.secondary())
    }

    pub fn into_vec(self) -> Vec<String> {
        match self {
            Resolved::Single(url) => vec![url],
            Resolved::Dual { primary, secondary } => vec![primary, secondary],
        }
    }
}

impl IntoIterator for Resolved {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_vec().into_iter()
    }
}

fn has_http_scheme(reference: &str) -> bool {
    let lowered = reference.trim_start().to_ascii_lowercase();
    lowered.starts_with("http:") || lowered.starts_with("https:")
}

/// Resolve `reference` against `base`.
///
/// Absolute `http`/`https` references come back verbatim. When either side
/// cannot be parsed the reference itself is returned as a best-effort
/// candidate; callers that need a real URL must validate it.
pub fn resolve(reference: &str, base: &str) -> Resolved {
    if has_http_scheme(reference) {
        return Resolved::Single(reference.to_string());
    }

    let Ok(base_url) = Url::parse(base) else {
        debug!("Unparsable base {:?}, keeping {:?} verbatim", base, reference);
        return Resolved::Single(reference.to_string());
    };

    let primary = match base_url.join(reference) {
        Ok(url) => url.to_string(),
        Err(e) => {
            debug!("Cannot resolve {:?} against {}: {}", reference, base, e);
            return Resolved::Single(reference.to_string());
        }
    };

    if reference.trim_start().starts_with('/') {
        return Resolved::Single(primary);
    }

    let mut root = base_url;
    root.set_path("/");
    root.set_query(None);
    root.set_fragment(None);

    match root.join(reference) {
        Ok(secondary) if secondary.as_str() != primary => Resolved::Dual {
            primary,
            secondary: secondary.to_string(),
        },
        _ => Resolved::Single(primary),
    }
}
