//! SQL Injection detection (error-based, optional time-based blind)

use super::EngineOptions;
use crate::crawler::{BodyKind, ScanTarget};
use crate::error::{Result, ScanError};
use crate::http::Transport;
use crate::models::{TargetReport, VulnClass};
use crate::payloads::PayloadSet;
use crate::scanner::oracle;
use crate::scanner::probe::{self, FieldSource, FieldSpec, Mutation};
use crate::scanner::InjectionEngine;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Appends error-provoking payloads to each field and watches for DBMS errors
pub struct SqliEngine {
    transport: Arc<dyn Transport>,
    payloads: Vec<String>,
    time_payloads: Vec<String>,
    options: EngineOptions,
}

impl SqliEngine {
    /// Creates an engine; refuses an empty error-based payload set
    pub fn new(
        transport: Arc<dyn Transport>,
        payloads: &PayloadSet,
        options: EngineOptions,
    ) -> Result<Self> {
        if payloads.is_empty() {
            return Err(ScanError::PayloadFileError {
                path: payloads.source.clone(),
                reason: "contains no payloads".to_string(),
            });
        }
        if options.time_based && options.time_delay.is_zero() {
            return Err(ScanError::ConfigError(
                "time-based threshold must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            transport,
            payloads: payloads.texts(),
            time_payloads: PayloadSet::time_based().texts(),
            options,
        })
    }

    /// The single field source a target's body kind maps to
    fn source_for(target: &ScanTarget) -> Option<FieldSource> {
        match target.body_kind() {
            BodyKind::Json => Some(FieldSource::JsonBody),
            BodyKind::FormEncoded => Some(FieldSource::FormBody),
            BodyKind::QueryString => Some(FieldSource::UrlQuery),
            BodyKind::None => None,
        }
    }

    /// Measures a baseline with the original value, then looks for payloads
    /// that delay the response by at least the configured threshold
    async fn probe_time_based(
        &self,
        target: &ScanTarget,
        source: FieldSource,
        headers: &[(String, String)],
        spec: FieldSpec<'_>,
        original: &str,
        report: &mut TargetReport,
    ) {
        let baseline = match source.build(target, headers, spec.parameter, original) {
            Ok(request) => self.transport.send(&request).await,
            Err(e) => Err(e),
        };
        let baseline = match baseline {
            Ok(response) => response.elapsed,
            Err(e) => {
                debug!(
                    "Skipping time-based probe of '{}': baseline failed: {e}",
                    spec.parameter
                );
                return;
            }
        };

        let threshold = self.options.time_delay;
        probe::probe_field(
            self.transport.as_ref(),
            spec,
            &self.time_payloads,
            self.options.hit_policy,
            report,
            |payload| {
                source.build(
                    target,
                    headers,
                    spec.parameter,
                    &Mutation::Append.apply(original, payload),
                )
            },
            |response, _| {
                let excess = response.elapsed.saturating_sub(baseline);
                (excess >= threshold).then(|| {
                    format!(
                        "Delayed response: {:.1}s vs {:.1}s baseline",
                        response.elapsed.as_secs_f64(),
                        baseline.as_secs_f64()
                    )
                })
            },
        )
        .await;
    }
}

#[async_trait]
impl InjectionEngine for SqliEngine {
    fn name(&self) -> &str {
        "sqli"
    }

    fn description(&self) -> &str {
        "Error-based SQL injection: appends payloads to JSON, form and query fields"
    }

    async fn scan(&self, target: &ScanTarget) -> TargetReport {
        let mut report = TargetReport::new(self.name(), target.to_string());

        let Some(source) = Self::source_for(target) else {
            return report;
        };
        if !source.is_sendable(target) {
            debug!("[SQLi] Skipping {target}: body fields are only replayed with POST or PUT");
            return report;
        }

        info!("[SQLi] Scanning {target}");

        // Fresh snapshot per call: nothing leaks between targets
        let headers = probe::header_snapshot(&target.headers);
        let finding_url = source.finding_url(target);

        for (field, original) in source.fields(target) {
            debug!("[SQLi] Testing {} '{field}'", source.location());
            let spec = FieldSpec {
                vuln_class: VulnClass::Sqli,
                location: source.location(),
                finding_url: &finding_url,
                parameter: &field,
            };

            let hits = probe::probe_field(
                self.transport.as_ref(),
                spec,
                &self.payloads,
                self.options.hit_policy,
                &mut report,
                |payload| {
                    source.build(
                        target,
                        &headers,
                        &field,
                        &Mutation::Append.apply(&original, payload),
                    )
                },
                |response, _| {
                    oracle::sql_error_match(response.status, &response.text).map(|m| {
                        format!("{m}: {}", oracle::snippet(&response.text, 100))
                    })
                },
            )
            .await;

            if hits == 0 && self.options.time_based {
                self.probe_time_based(target, source, &headers, spec, &original, &mut report)
                    .await;
            }
        }

        report
    }
}
