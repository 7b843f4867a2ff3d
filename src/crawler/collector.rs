//! Classifies intercepted network requests into replayable scan targets

use super::browser::{InterceptedRequest, ResourceType};
use reqwest::Method;
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;
use url::Url;

/// Shape of the injectable data a target carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    None,
    Json,
    FormEncoded,
    QueryString,
}

/// Injectable data of a target, in source order
#[derive(Debug, Clone, PartialEq)]
pub enum TargetBody {
    None,
    Json(Map<String, Value>),
    FormEncoded(Vec<(String, String)>),
    QueryString(Vec<(String, String)>),
}

/// A classified, replayable request eligible for injection testing
#[derive(Debug, Clone, PartialEq)]
pub struct ScanTarget {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: TargetBody,
    /// Raw request body as intercepted
    pub raw_body: Option<String>,
    pub resource_type: ResourceType,
}

impl ScanTarget {
    pub fn body_kind(&self) -> BodyKind {
        match self.body {
            TargetBody::None => BodyKind::None,
            TargetBody::Json(_) => BodyKind::Json,
            TargetBody::FormEncoded(_) => BodyKind::FormEncoded,
            TargetBody::QueryString(_) => BodyKind::QueryString,
        }
    }

    /// String-valued fields of the target, in source order.
    /// Non-string JSON values are not injectable and are left out.
    pub fn body_fields(&self) -> Vec<(String, String)> {
        match &self.body {
            TargetBody::None => Vec::new(),
            TargetBody::Json(map) => map
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect(),
            TargetBody::FormEncoded(pairs) | TargetBody::QueryString(pairs) => {
                unique_fields(pairs)
            }
        }
    }

    /// Query parameters of the target URL, first value per name
    pub fn query_fields(&self) -> Vec<(String, String)> {
        let pairs: Vec<(String, String)> = self
            .url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        unique_fields(&pairs)
    }

    /// Target URL with the query string removed
    pub fn base_url(&self) -> Url {
        let mut base = self.url.clone();
        base.set_query(None);
        base.set_fragment(None);
        base
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// Keeps the first value for every field name, dropping empty names
pub(crate) fn unique_fields(pairs: &[(String, String)]) -> Vec<(String, String)> {
    let mut fields: Vec<(String, String)> = Vec::new();
    for (k, v) in pairs {
        if !k.is_empty() && !fields.iter().any(|(name, _)| name == k) {
            fields.push((k.clone(), v.clone()));
        }
    }
    fields
}

/// Whether a raw body looks like a JSON document
pub(crate) fn is_json_shaped(body: &str) -> bool {
    body.trim_start().starts_with('{')
}

/// Turns intercepted requests into scan targets
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestCollector;

impl RequestCollector {
    /// Produces at most one target for an intercepted request.
    /// Repeated identical requests produce repeated targets.
    pub fn classify(request: &InterceptedRequest) -> Option<ScanTarget> {
        if request.resource_type.is_static() {
            return None;
        }

        let url = match Url::parse(&request.url) {
            Ok(u) => u,
            Err(e) => {
                debug!("Ignoring request with unparsable URL {}: {e}", request.url);
                return None;
            }
        };

        let is_get = request.method == Method::GET;
        let has_query = url.query().is_some_and(|q| !q.is_empty());
        if is_get && !has_query {
            return None;
        }

        let raw_body = request.body.as_deref().filter(|b| !b.is_empty());
        let json_content_type = request
            .header("content-type")
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"));

        let body = match raw_body {
            Some(raw) if json_content_type || is_json_shaped(raw) => {
                match serde_json::from_str::<Value>(raw) {
                    Ok(Value::Object(map)) => TargetBody::Json(map),
                    Ok(_) => {
                        debug!("Dropping {} {}: JSON body is not an object", request.method, url);
                        return None;
                    }
                    Err(e) => {
                        debug!("Dropping {} {}: malformed JSON body: {e}", request.method, url);
                        return None;
                    }
                }
            }
            Some(raw)
                if (request.method == Method::POST || request.method == Method::PUT)
                    && raw.contains('=') =>
            {
                let pairs = url::form_urlencoded::parse(raw.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect();
                TargetBody::FormEncoded(pairs)
            }
            _ if is_get => {
                let pairs = url
                    .query_pairs()
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect();
                TargetBody::QueryString(pairs)
            }
            _ => return None,
        };

        Some(ScanTarget {
            method: request.method.clone(),
            url,
            headers: request.headers.clone(),
            body,
            raw_body: raw_body.map(str::to_string),
            resource_type: request.resource_type,
        })
    }
}
