//! Visited URL set for one company crawl.

use std::collections::HashSet;

use url::Url;

/// Normalize a URL for visited-set membership.
///
/// Drops the fragment, a leading `www.` and a trailing slash, so that
/// `https://www.x.com/a/` and `https://x.com/a#top` are the same page.
pub fn normalize_url(url: &Url) -> String {
    let host = url.host_str().unwrap_or("");
    let host = host.strip_prefix("www.").unwrap_or(host);
    let path = url.path();
    let path = if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        ""
    };
    let mut normalized = format!("{}://{}", url.scheme(), host);
    if let Some(port) = url.port() {
        normalized.push_str(&format!(":{}", port));
    }
    normalized.push_str(path);
    if let Some(query) = url.query() {
        normalized.push('?');
        normalized.push_str(query);
    }
    normalized
}

/// Set of normalized URLs seen during one crawl. Members are never removed.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: HashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a URL. Returns false if it was already present.
    pub fn insert(&mut self, url: &Url) -> bool {
        self.urls.insert(normalize_url(url))
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.urls.contains(&normalize_url(url))
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}
