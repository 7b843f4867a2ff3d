//! Probe construction and the per-field payload loop shared by the engines

use crate::crawler::collector::unique_fields;
use crate::crawler::{ScanTarget, TargetBody};
use crate::error::{Result, ScanError};
use crate::http::{ProbeRequest, ProbeResponse, Transport};
use crate::models::{Finding, HitPolicy, Location, ProbeAttempt, ProbeOutcome, TargetReport, VulnClass};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Headers that describe the original body or connection and must not be replayed
const SKIPPED_HEADERS: &[&str] = &[
    "content-length",
    "content-type",
    "accept-encoding",
    "host",
    "connection",
    "transfer-encoding",
];

/// Copies the target's headers, minus those that would conflict with a mutated body
pub fn header_snapshot(headers: &[(String, String)]) -> Vec<(String, String)> {
    headers
        .iter()
        .filter(|(k, _)| !SKIPPED_HEADERS.iter().any(|s| k.eq_ignore_ascii_case(s)))
        .cloned()
        .collect()
}

/// How a payload is combined with a field's original value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// original + payload
    Append,
    /// payload only
    Replace,
}

impl Mutation {
    pub fn apply(self, original: &str, payload: &str) -> String {
        match self {
            Mutation::Append => format!("{original}{payload}"),
            Mutation::Replace => payload.to_string(),
        }
    }
}

/// Part of a request whose fields can be injected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    JsonBody,
    FormBody,
    UrlQuery,
}

impl FieldSource {
    pub fn location(self) -> Location {
        match self {
            FieldSource::JsonBody => Location::JsonBody,
            FieldSource::FormBody => Location::FormData,
            FieldSource::UrlQuery => Location::UrlParameter,
        }
    }

    /// Injectable (name, original value) pairs this source offers on the target
    pub fn fields(self, target: &ScanTarget) -> Vec<(String, String)> {
        match (self, &target.body) {
            (FieldSource::JsonBody, TargetBody::Json(_)) => target.body_fields(),
            (FieldSource::FormBody, TargetBody::FormEncoded(pairs)) => unique_fields(pairs),
            (FieldSource::UrlQuery, _) => target.query_fields(),
            _ => Vec::new(),
        }
    }

    /// Body sources are only replayed with POST or PUT
    pub fn is_sendable(self, target: &ScanTarget) -> bool {
        match self {
            FieldSource::UrlQuery => true,
            FieldSource::JsonBody | FieldSource::FormBody => {
                target.method == Method::POST || target.method == Method::PUT
            }
        }
    }

    /// URL reported in findings: query fields are reported against the bare endpoint
    pub fn finding_url(self, target: &ScanTarget) -> String {
        match self {
            FieldSource::UrlQuery => target.base_url().to_string(),
            FieldSource::JsonBody | FieldSource::FormBody => target.url.to_string(),
        }
    }

    /// Builds the request that sends `value` in `field`, everything else unchanged
    pub fn build(
        self,
        target: &ScanTarget,
        headers: &[(String, String)],
        field: &str,
        value: &str,
    ) -> Result<ProbeRequest> {
        match self {
            FieldSource::JsonBody => {
                let TargetBody::Json(map) = &target.body else {
                    return Err(ScanError::DecodeError(format!("{target} has no JSON body")));
                };
                let mut mutated = map.clone();
                mutated.insert(field.to_string(), Value::String(value.to_string()));
                let body = serde_json::to_string(&mutated)?;
                Ok(ProbeRequest::new(target.method.clone(), target.url.clone())
                    .with_headers(headers.to_vec())
                    .with_body("application/json", body))
            }
            FieldSource::FormBody => {
                let TargetBody::FormEncoded(pairs) = &target.body else {
                    return Err(ScanError::DecodeError(format!("{target} has no form body")));
                };
                let body = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(replace_field(pairs, field, value))
                    .finish();
                Ok(ProbeRequest::new(target.method.clone(), target.url.clone())
                    .with_headers(headers.to_vec())
                    .with_body("application/x-www-form-urlencoded", body))
            }
            FieldSource::UrlQuery => {
                let pairs: Vec<(String, String)> = target
                    .url
                    .query_pairs()
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect();
                let mut url = target.base_url();
                url.query_pairs_mut()
                    .extend_pairs(replace_field(&pairs, field, value));
                Ok(ProbeRequest::new(Method::GET, url).with_headers(headers.to_vec()))
            }
        }
    }
}

/// Sets the first occurrence of `field` to `value` and drops its later duplicates
fn replace_field(pairs: &[(String, String)], field: &str, value: &str) -> Vec<(String, String)> {
    let mut replaced = false;
    pairs
        .iter()
        .filter_map(|(k, v)| {
            if k != field {
                Some((k.clone(), v.clone()))
            } else if !replaced {
                replaced = true;
                Some((k.clone(), value.to_string()))
            } else {
                None
            }
        })
        .collect()
}

/// Identifies the field being probed
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec<'a> {
    pub vuln_class: VulnClass,
    pub location: Location,
    pub finding_url: &'a str,
    pub parameter: &'a str,
}

/// Sends every payload into one field, one request at a time.
///
/// `build` turns a payload into a request, `oracle` returns evidence for a
/// positive response. Every attempt is recorded in the report; failures are
/// recorded and the loop moves on to the next payload. Returns the number of hits.
pub async fn probe_field<P, B, O>(
    transport: &dyn Transport,
    spec: FieldSpec<'_>,
    payloads: &[P],
    hit_policy: HitPolicy,
    report: &mut TargetReport,
    build: B,
    oracle: O,
) -> usize
where
    P: AsRef<str> + Sync,
    B: Fn(&str) -> Result<ProbeRequest> + Send + Sync,
    O: Fn(&ProbeResponse, &str) -> Option<String> + Send + Sync,
{
    let mut hits = 0;

    for payload in payloads {
        let payload = payload.as_ref();

        let outcome = match build(payload) {
            Err(e) => {
                debug!("Could not build probe for '{}': {e}", spec.parameter);
                ProbeOutcome::DecodeFailure(e.to_string())
            }
            Ok(request) => match transport.send(&request).await {
                Ok(response) => match oracle(&response, payload) {
                    Some(evidence) => {
                        info!(
                            "{} found in {} '{}' at {}",
                            spec.vuln_class, spec.location, spec.parameter, spec.finding_url
                        );
                        report.findings.push(
                            Finding::new(
                                spec.vuln_class,
                                spec.location,
                                spec.finding_url,
                                spec.parameter,
                                payload,
                            )
                            .with_evidence(evidence)
                            .with_request(request.to_string()),
                        );
                        hits += 1;
                        ProbeOutcome::Hit
                    }
                    None => ProbeOutcome::Miss,
                },
                Err(e) if e.is_decode() => ProbeOutcome::DecodeFailure(e.to_string()),
                Err(e) => {
                    warn!("Probe of '{}' failed: {e}", spec.parameter);
                    ProbeOutcome::TransportFailure(e.to_string())
                }
            },
        };

        let stop = outcome == ProbeOutcome::Hit && hit_policy == HitPolicy::StopOnHit;
        report.attempts.push(ProbeAttempt {
            parameter: spec.parameter.to_string(),
            location: spec.location,
            payload: payload.to_string(),
            outcome,
        });
        if stop {
            break;
        }
    }

    hits
}
