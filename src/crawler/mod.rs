//! Web crawler for page and endpoint discovery
//!
//! Sequential crawl over a set-based frontier. Each page is loaded through a
//! [`Browser`] collaborator; every request the browser reports is classified
//! by the [`RequestCollector`] into scan targets for the injection engines.
//! Requests outside the seed's host and port are never collected.

pub mod browser;
pub mod collector;
pub mod extractor;
pub mod frontier;

pub use browser::{Browser, HttpBrowser, InterceptDecision, InterceptedRequest, Page, ResourceType};
pub use collector::{BodyKind, RequestCollector, ScanTarget, TargetBody};
pub use frontier::{Frontier, Scope};

use crate::error::{Result, ScanError};
use crate::models::ScanConfig;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// What a finished crawl produced
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    /// Pages that loaded
    pub visited: HashSet<Url>,
    /// Pages whose navigation failed or left the scope, with the reason
    pub failed: Vec<(Url, String)>,
    /// Targets collected from intercepted requests, in interception order
    pub targets: Vec<ScanTarget>,
}

/// Single-domain crawler driving a browser collaborator
pub struct Crawler<B: Browser> {
    browser: B,
    navigation_timeout: Duration,
    max_pages: Option<usize>,
    scope: Arc<Mutex<Option<Scope>>>,
    collected: Arc<Mutex<Vec<ScanTarget>>>,
}

/// A request is collectable when it targets the scope and, if it names the
/// page that issued it, that page is in scope too
fn request_in_scope(scope: &Mutex<Option<Scope>>, request: &InterceptedRequest) -> bool {
    let guard = scope.lock().unwrap_or_else(PoisonError::into_inner);
    let Some(scope) = guard.as_ref() else {
        return false;
    };
    let contains = |raw: &str| Url::parse(raw).is_ok_and(|u| scope.contains(&u));
    contains(&request.url) && request.header("referer").map_or(true, contains)
}

impl<B: Browser> Crawler<B> {
    /// Creates a crawler and wires the browser's request interception to the collector
    pub fn new(mut browser: B, config: &ScanConfig) -> Self {
        let scope = Arc::new(Mutex::new(None));
        let collected = Arc::new(Mutex::new(Vec::new()));

        let filter = Arc::clone(&scope);
        let sink = Arc::clone(&collected);
        browser.on_request(Box::new(move |request: &InterceptedRequest| {
            if !request_in_scope(&filter, request) {
                debug!("Ignoring out-of-scope request {} {}", request.method, request.url);
                return InterceptDecision::Continue;
            }
            if let Some(target) = RequestCollector::classify(request) {
                debug!("Collected target: {target}");
                sink.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(target);
            }
            InterceptDecision::Continue
        }));

        Self {
            browser,
            navigation_timeout: Duration::from_millis(config.navigation_timeout_ms),
            max_pages: config.max_pages,
            scope,
            collected,
        }
    }

    /// Crawls from the seed until the frontier is drained.
    /// `max_pages` caps navigation attempts, failed ones included.
    pub async fn crawl(&mut self, seed: &str) -> Result<CrawlOutcome> {
        let seed_url = Url::parse(seed)?;
        if !matches!(seed_url.scheme(), "http" | "https") || seed_url.host_str().is_none() {
            return Err(ScanError::ConfigError(format!(
                "Seed URL must be an absolute http(s) URL: {seed}"
            )));
        }

        let mut frontier = Frontier::new(&seed_url);
        *self.scope.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(frontier.scope().clone());
        let mut outcome = CrawlOutcome::default();
        let mut attempted = 0;

        info!("Starting crawler on {seed_url}");

        while let Some(url) = frontier.next() {
            if let Some(max) = self.max_pages {
                if attempted >= max {
                    info!("Crawler reached max page limit ({max})");
                    break;
                }
            }
            attempted += 1;

            info!("Navigating to: {url}");
            // Attempted URLs are never revisited, whether or not they load
            frontier.mark_visited(url.clone());

            let page = match self.browser.navigate(&url, self.navigation_timeout).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("Error navigating to {url}: {e}");
                    outcome.failed.push((url, e.to_string()));
                    continue;
                }
            };

            if page.url != url {
                if !frontier.in_scope(&page.url) {
                    warn!("{url} redirected out of scope to {}", page.url);
                    outcome
                        .failed
                        .push((url, format!("redirected out of scope to {}", page.url)));
                    continue;
                }
                debug!("{url} redirected to {}", page.url);
                frontier.mark_visited(page.url.clone());
            }

            if page.status >= 400 {
                warn!("{} answered HTTP {}", page.url, page.status);
            }

            let mut discovered = 0;
            for href in self.browser.extract_links(&page) {
                match Url::parse(&href) {
                    Ok(link) => {
                        if frontier.enqueue(link) {
                            discovered += 1;
                            debug!("Discovered new link: {href}");
                        }
                    }
                    Err(e) => debug!("Skipping unparsable link {href}: {e}"),
                }
            }
            debug!("{url}: {discovered} new links, {} pending", frontier.pending_count());
            outcome.visited.insert(url);
        }

        outcome.targets = std::mem::take(
            &mut *self.collected.lock().unwrap_or_else(PoisonError::into_inner),
        );

        info!(
            "Crawler finished. Visited {} unique pages, {} failed, {} targets collected",
            outcome.visited.len(),
            outcome.failed.len(),
            outcome.targets.len()
        );

        Ok(outcome)
    }
}
