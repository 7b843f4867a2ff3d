//! HTTP client wrapper with probe timeouts and request tracking

use crate::error::Result;
use crate::models::ScanConfig;
use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::{Client, Method, Response};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

/// A fully prepared request: method, URL, headers and optional body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl ProbeRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, content_type: &str, body: String) -> Self {
        self.headers
            .push(("Content-Type".to_string(), content_type.to_string()));
        self.body = Some(body);
        self
    }
}

impl fmt::Display for ProbeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)?;
        if let Some(ref body) = self.body {
            write!(f, "\n\n{body}")?;
        }
        Ok(())
    }
}

/// Response of a probe, fully read
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub text: String,
    pub elapsed: Duration,
}

/// The HTTP collaborator the injection engines send probes through
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ProbeRequest) -> Result<ProbeResponse>;
}

/// HTTP client wrapper with a fixed per-probe timeout and request counting
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    /// Page loads: redirects are returned, not followed
    page_client: Client,
    probe_timeout: Duration,
    request_count: Arc<AtomicU64>,
}

impl HttpClient {
    /// Creates a new HttpClient from scan configuration
    pub fn from_config(config: &ScanConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .build()?;
        let page_client = Client::builder()
            .user_agent(&config.user_agent)
            .redirect(Policy::none())
            .build()?;

        Ok(Self {
            client,
            page_client,
            probe_timeout: Duration::from_secs(config.timeout_secs),
            request_count: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Loads a page with an explicit timeout, without following redirects
    pub async fn get(&self, url: &str, timeout: Duration) -> Result<Response> {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        let response = self.page_client.get(url).timeout(timeout).send().await?;
        debug!("Response: {} for {}", response.status(), response.url());
        Ok(response)
    }

    /// Returns the total number of requests made
    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn send(&self, request: &ProbeRequest) -> Result<ProbeResponse> {
        self.request_count.fetch_add(1, Ordering::Relaxed);

        let mut req = self
            .client
            .request(request.method.clone(), request.url.clone())
            .timeout(self.probe_timeout);
        for (key, value) in &request.headers {
            req = req.header(key.as_str(), value.as_str());
        }
        if let Some(ref body) = request.body {
            req = req.body(body.clone());
        }

        let start = Instant::now();
        let response = req.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let text = response.text().await?;
        let elapsed = start.elapsed();

        debug!("Probe {} {} -> {status} in {elapsed:?}", request.method, request.url);

        Ok(ProbeResponse {
            status,
            headers,
            text,
            elapsed,
        })
    }
}
