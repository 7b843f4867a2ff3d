//! Browser collaborator interface and its plain-HTTP implementation
//!
//! The crawler only needs three capabilities from a browser: navigate to a
//! URL, list the links of the loaded page, and report every network request
//! the page issues. [`HttpBrowser`] provides them without a JavaScript
//! engine: it fetches the document, reports the document request, the
//! page's sub-resources and its form submissions (filled with mock values,
//! never sent) to the registered request handlers.

use super::extractor::{self, DiscoveredForm};
use crate::error::{Result, ScanError};
use crate::http::HttpClient;
use async_trait::async_trait;
use reqwest::Method;
use std::fmt;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Kind of resource a network request loads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Document,
    Stylesheet,
    Image,
    Media,
    Font,
    Script,
    Xhr,
    Fetch,
    Other,
}

impl ResourceType {
    /// Static assets never carry injectable parameters worth probing
    pub fn is_static(&self) -> bool {
        matches!(
            self,
            ResourceType::Image
                | ResourceType::Stylesheet
                | ResourceType::Font
                | ResourceType::Script
                | ResourceType::Media
        )
    }

    /// Parses the lowercase names used by browser automation tools
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "document" => ResourceType::Document,
            "stylesheet" => ResourceType::Stylesheet,
            "image" => ResourceType::Image,
            "media" => ResourceType::Media,
            "font" => ResourceType::Font,
            "script" => ResourceType::Script,
            "xhr" => ResourceType::Xhr,
            "fetch" => ResourceType::Fetch,
            _ => ResourceType::Other,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceType::Document => "document",
            ResourceType::Stylesheet => "stylesheet",
            ResourceType::Image => "image",
            ResourceType::Media => "media",
            ResourceType::Font => "font",
            ResourceType::Script => "script",
            ResourceType::Xhr => "xhr",
            ResourceType::Fetch => "fetch",
            ResourceType::Other => "other",
        };
        f.write_str(name)
    }
}

/// A network request observed while a page loads
#[derive(Debug, Clone)]
pub struct InterceptedRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub resource_type: ResourceType,
}

impl InterceptedRequest {
    pub fn get(url: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            resource_type,
        }
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Decision a request handler returns for every intercepted request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptDecision {
    Continue,
    Abort,
}

/// Callback invoked for every intercepted request
pub type RequestHandler = Box<dyn FnMut(&InterceptedRequest) -> InterceptDecision + Send>;

/// A loaded page
#[derive(Debug, Clone)]
pub struct Page {
    /// Final URL after any redirects the browser followed
    pub url: Url,
    pub status: u16,
    pub html: String,
    /// Target of a redirect the browser did not follow
    pub redirect: Option<Url>,
}

/// Capabilities the crawler needs from a browser
#[async_trait]
pub trait Browser: Send {
    /// Loads a page. Fails with [`ScanError::NavigationError`] when the URL cannot be reached.
    async fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<Page>;

    /// Absolute link targets found on the page
    fn extract_links(&self, page: &Page) -> Vec<String>;

    /// Registers a handler for every network request the browser issues
    fn on_request(&mut self, handler: RequestHandler);
}

/// Browser collaborator backed by plain HTTP fetches and HTML parsing
pub struct HttpBrowser {
    client: HttpClient,
    handlers: Vec<RequestHandler>,
}

impl HttpBrowser {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            handlers: Vec::new(),
        }
    }

    /// Runs every handler; any Abort wins
    fn dispatch(&mut self, request: &InterceptedRequest) -> InterceptDecision {
        let mut decision = InterceptDecision::Continue;
        for handler in &mut self.handlers {
            if handler(request) == InterceptDecision::Abort {
                decision = InterceptDecision::Abort;
            }
        }
        decision
    }

    fn form_request(form: &DiscoveredForm, referer: &Url) -> InterceptedRequest {
        let headers = vec![("Referer".to_string(), referer.to_string())];

        if form.method == "POST" {
            let body = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&form.fields)
                .finish();
            let mut headers = headers;
            headers.push((
                "Content-Type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            ));
            InterceptedRequest {
                method: Method::POST,
                url: form.action.to_string(),
                headers,
                body: Some(body),
                resource_type: ResourceType::Document,
            }
        } else {
            let mut action = form.action.clone();
            action.query_pairs_mut().clear().extend_pairs(&form.fields);
            InterceptedRequest {
                method: Method::GET,
                url: action.to_string(),
                headers,
                body: None,
                resource_type: ResourceType::Document,
            }
        }
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    async fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<Page> {
        let navigation = InterceptedRequest::get(url.as_str(), ResourceType::Document);
        if self.dispatch(&navigation) == InterceptDecision::Abort {
            return Err(ScanError::NavigationError {
                url: url.to_string(),
                reason: "aborted by request handler".to_string(),
            });
        }

        let navigation_error = |e: ScanError| ScanError::NavigationError {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self
            .client
            .get(url.as_str(), timeout)
            .await
            .map_err(navigation_error)?;
        let final_url = response.url().clone();
        let status = response.status().as_u16();

        // Redirects are handed back to the crawler as a link, so the target
        // goes through the frontier's scope and visited checks
        if response.status().is_redirection() {
            let redirect = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|location| extractor::resolve_url(&final_url, location));
            debug!("{final_url} redirects to {redirect:?}");
            return Ok(Page {
                url: final_url,
                status,
                html: String::new(),
                redirect,
            });
        }

        let html = response
            .text()
            .await
            .map_err(|e| navigation_error(ScanError::HttpError(e)))?;

        for (resource, resource_type) in extractor::extract_subresources(&final_url, &html) {
            let mut request = InterceptedRequest::get(resource.as_str(), resource_type);
            request
                .headers
                .push(("Referer".to_string(), final_url.to_string()));
            self.dispatch(&request);
        }

        let forms = extractor::extract_forms(&final_url, &html);
        debug!("{} forms on {final_url}", forms.len());
        for form in &forms {
            let request = Self::form_request(form, &final_url);
            self.dispatch(&request);
        }

        Ok(Page {
            url: final_url,
            status,
            html,
            redirect: None,
        })
    }

    fn extract_links(&self, page: &Page) -> Vec<String> {
        if let Some(ref redirect) = page.redirect {
            return vec![redirect.to_string()];
        }
        extractor::extract_links(&page.url, &page.html)
    }

    fn on_request(&mut self, handler: RequestHandler) {
        self.handlers.push(handler);
    }
}
