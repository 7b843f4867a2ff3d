//! Reflected XSS detection

use super::EngineOptions;
use crate::crawler::ScanTarget;
use crate::http::Transport;
use crate::models::{HitPolicy, TargetReport, VulnClass};
use crate::payloads::PayloadSet;
use crate::scanner::oracle;
use crate::scanner::probe::{self, FieldSource, FieldSpec, Mutation};
use crate::scanner::InjectionEngine;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Each source is scanned independently
const SOURCES: [FieldSource; 3] = [
    FieldSource::JsonBody,
    FieldSource::FormBody,
    FieldSource::UrlQuery,
];

/// Characters of context kept on each side of a reflection
const CONTEXT_CHARS: usize = 40;

/// Replaces each field with markup payloads and looks for verbatim reflection
pub struct XssEngine {
    transport: Arc<dyn Transport>,
    payloads: Vec<String>,
    hit_policy: HitPolicy,
}

impl XssEngine {
    pub fn new(transport: Arc<dyn Transport>, options: EngineOptions) -> Self {
        Self {
            transport,
            payloads: PayloadSet::reflected().texts(),
            hit_policy: options.hit_policy,
        }
    }
}

/// The reflected payload with some surrounding response text
fn reflection_context(body: &str, payload: &str) -> String {
    let Some(start) = body.find(payload) else {
        return String::new();
    };
    let before: Vec<char> = body[..start].chars().rev().take(CONTEXT_CHARS).collect();
    let before: String = before.into_iter().rev().collect();
    let after: String = body[start + payload.len()..]
        .chars()
        .take(CONTEXT_CHARS)
        .collect();
    format!("...{before}{payload}{after}...")
}

#[async_trait]
impl InjectionEngine for XssEngine {
    fn name(&self) -> &str {
        "xss"
    }

    fn description(&self) -> &str {
        "Reflected XSS: replaces JSON, form and query fields with markup payloads"
    }

    async fn scan(&self, target: &ScanTarget) -> TargetReport {
        let mut report = TargetReport::new(self.name(), target.to_string());
        let headers = probe::header_snapshot(&target.headers);

        info!("[XSS] Scanning {target}");

        for source in SOURCES {
            let fields = source.fields(target);
            if fields.is_empty() {
                continue;
            }
            if !source.is_sendable(target) {
                debug!(
                    "[XSS] Skipping {} of {target}: only replayed with POST or PUT",
                    source.location()
                );
                continue;
            }

            let finding_url = source.finding_url(target);
            for (field, original) in fields {
                debug!("[XSS] Testing {} '{field}'", source.location());
                let spec = FieldSpec {
                    vuln_class: VulnClass::Xss,
                    location: source.location(),
                    finding_url: &finding_url,
                    parameter: &field,
                };

                probe::probe_field(
                    self.transport.as_ref(),
                    spec,
                    &self.payloads,
                    self.hit_policy,
                    &mut report,
                    |payload| {
                        source.build(
                            target,
                            &headers,
                            &field,
                            &Mutation::Replace.apply(&original, payload),
                        )
                    },
                    |response, payload| {
                        oracle::is_reflected(&response.text, payload)
                            .then(|| reflection_context(&response.text, payload))
                    },
                )
                .await;
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{InterceptedRequest, RequestCollector, ResourceType};
    use crate::error::Result;
    use crate::http::{ProbeRequest, ProbeResponse};
    use crate::models::Location;
    use reqwest::Method;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Echoes the decoded query and the raw body back, like a page that prints its input
    #[derive(Default)]
    struct EchoTransport {
        sent: Mutex<usize>,
    }

    #[async_trait]
    impl Transport for EchoTransport {
        async fn send(&self, request: &ProbeRequest) -> Result<ProbeResponse> {
            *self.sent.lock().expect("lock") += 1;
            let query: String = request
                .url
                .query_pairs()
                .map(|(k, v)| format!("{k}={v} "))
                .collect();
            Ok(ProbeResponse {
                status: 200,
                headers: Vec::new(),
                text: format!("<html>{query}{}</html>", request.body.clone().unwrap_or_default()),
                elapsed: Duration::from_millis(1),
            })
        }
    }

    fn target(method: Method, url: &str, body: Option<&str>) -> ScanTarget {
        RequestCollector::classify(&InterceptedRequest {
            method,
            url: url.to_string(),
            headers: Vec::new(),
            body: body.map(str::to_string),
            resource_type: ResourceType::Document,
        })
        .expect("target")
    }

    #[test]
    fn test_reflection_context() {
        let body = "<p>Results for <script>alert('XSS')</script> (0)</p>";
        let context = reflection_context(body, "<script>alert('XSS')</script>");
        assert!(context.contains("Results for <script>alert('XSS')</script> (0)"));
        assert_eq!(reflection_context("nothing", "<svg>"), "");
    }

    #[tokio::test]
    async fn test_query_and_form_sources_scanned_independently() {
        let transport = Arc::new(EchoTransport::default());
        let engine = XssEngine::new(transport.clone(), EngineOptions::default());

        let t = target(
            Method::POST,
            "http://example.com/comment?page=1",
            Some("text=hi&author=me"),
        );
        let report = engine.scan(&t).await;

        let locations: Vec<(Location, &str)> = report
            .findings
            .iter()
            .map(|f| (f.location, f.parameter.as_str()))
            .collect();
        assert!(locations.contains(&(Location::UrlParameter, "page")));
        // The form body is echoed URL-encoded, so its reflection is not verbatim
        assert!(!locations.iter().any(|(l, _)| *l == Location::FormData));

        // page: first payload hits; form fields: 5 misses each
        assert_eq!(*transport.sent.lock().expect("lock"), 11);
    }

    #[tokio::test]
    async fn test_json_field_replacement_reflected() {
        let transport = Arc::new(EchoTransport::default());
        let engine = XssEngine::new(transport.clone(), EngineOptions::default());

        let t = target(Method::POST, "http://example.com/api", Some(r#"{"text":"hi","n":1}"#));
        let report = engine.scan(&t).await;

        assert_eq!(report.findings.len(), 1);
        let finding = &report.findings[0];
        assert_eq!(finding.location, Location::JsonBody);
        assert_eq!(finding.parameter, "text");
        assert_eq!(finding.payload, "<script>alert('XSS')</script>");
        assert_eq!(report.attempts.len(), 1);
    }
}
