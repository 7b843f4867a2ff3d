//! Crawl frontier: to-visit / visited URL sets scoped to the seed's host
//!
//! `next()` hands out an arbitrary pending URL. Crawl order is therefore not
//! stable between runs; only set membership is.

use std::collections::HashSet;
use url::Url;

/// Host and effective port a crawl, and every request it collects, is confined to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    host: String,
    port: Option<u16>,
}

impl Scope {
    pub fn from_seed(seed: &Url) -> Self {
        Self {
            host: seed.host_str().unwrap_or_default().to_lowercase(),
            port: seed.port_or_known_default(),
        }
    }

    /// http(s), same host (case-insensitive), same effective port
    pub fn contains(&self, url: &Url) -> bool {
        matches!(url.scheme(), "http" | "https")
            && url
                .host_str()
                .is_some_and(|h| h.eq_ignore_ascii_case(&self.host))
            && url.port_or_known_default() == self.port
    }
}

/// Pending and visited URL sets for a single-domain crawl
#[derive(Debug)]
pub struct Frontier {
    scope: Scope,
    to_visit: HashSet<Url>,
    visited: HashSet<Url>,
}

impl Frontier {
    /// Creates a frontier scoped to the seed's host and enqueues the seed
    pub fn new(seed: &Url) -> Self {
        let mut frontier = Self {
            scope: Scope::from_seed(seed),
            to_visit: HashSet::new(),
            visited: HashSet::new(),
        };
        frontier.enqueue(seed.clone());
        frontier
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Whether a URL belongs to the crawl scope
    pub fn in_scope(&self, url: &Url) -> bool {
        self.scope.contains(url)
    }

    /// Adds a URL to the pending set. Returns false when it is out of scope,
    /// already pending or already visited.
    pub fn enqueue(&mut self, mut url: Url) -> bool {
        url.set_fragment(None);
        if !self.in_scope(&url) || self.visited.contains(&url) {
            return false;
        }
        self.to_visit.insert(url)
    }

    /// Removes and returns an arbitrary pending URL
    pub fn next(&mut self) -> Option<Url> {
        let url = self.to_visit.iter().next().cloned()?;
        self.to_visit.remove(&url);
        Some(url)
    }

    /// Records a URL as visited; it can never be enqueued again
    pub fn mark_visited(&mut self, mut url: Url) {
        url.set_fragment(None);
        self.to_visit.remove(&url);
        self.visited.insert(url);
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url)
    }

    pub fn is_pending(&self, url: &Url) -> bool {
        self.to_visit.contains(url)
    }

    pub fn is_drained(&self) -> bool {
        self.to_visit.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.to_visit.len()
    }

    pub fn visited(&self) -> &HashSet<Url> {
        &self.visited
    }
}
