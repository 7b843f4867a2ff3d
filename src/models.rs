//! Core data models for vulnscout

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Severity level for security findings
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Critical,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::High => write!(f, "HIGH"),
        }
    }
}

/// Vulnerability class a finding belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum VulnClass {
    #[serde(rename = "SQLi")]
    Sqli,
    #[serde(rename = "XSS")]
    Xss,
}

impl VulnClass {
    pub fn severity(&self) -> Severity {
        match self {
            VulnClass::Sqli => Severity::Critical,
            VulnClass::Xss => Severity::High,
        }
    }

    pub fn cwe(&self) -> &'static str {
        match self {
            VulnClass::Sqli => "CWE-89",
            VulnClass::Xss => "CWE-79",
        }
    }
}

impl fmt::Display for VulnClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VulnClass::Sqli => write!(f, "SQL Injection"),
            VulnClass::Xss => write!(f, "Cross-Site Scripting"),
        }
    }
}

/// Where in the request the vulnerable field lives
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Location {
    #[serde(rename = "JSON Body")]
    JsonBody,
    #[serde(rename = "Form Data")]
    FormData,
    #[serde(rename = "URL Parameter")]
    UrlParameter,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::JsonBody => write!(f, "JSON Body"),
            Location::FormData => write!(f, "Form Data"),
            Location::UrlParameter => write!(f, "URL Parameter"),
        }
    }
}

/// A confirmed vulnerability in one field of one scan target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Unique identifier
    pub id: String,
    pub vuln_class: VulnClass,
    pub location: Location,
    /// Endpoint URL (without the original query for URL parameters)
    pub url: String,
    /// Name of the vulnerable field
    pub parameter: String,
    /// Payload that triggered the oracle
    pub payload: String,
    /// Technical evidence taken from the probe response
    pub evidence: String,
    pub severity: Severity,
    /// CWE reference (e.g., CWE-79)
    pub cwe_id: String,
    /// HTTP request that demonstrates the issue
    pub request: Option<String>,
}

impl Finding {
    /// Creates a new Finding with a generated UUID
    pub fn new(
        vuln_class: VulnClass,
        location: Location,
        url: impl Into<String>,
        parameter: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            vuln_class,
            location,
            url: url.into(),
            parameter: parameter.into(),
            payload: payload.into(),
            evidence: String::new(),
            severity: vuln_class.severity(),
            cwe_id: vuln_class.cwe().to_string(),
            request: None,
        }
    }

    /// Sets the evidence for this finding
    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = evidence.into();
        self
    }

    /// Sets the request evidence
    pub fn with_request(mut self, request: impl Into<String>) -> Self {
        self.request = Some(request.into());
        self
    }
}

/// Result of a single payload attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail")]
pub enum ProbeOutcome {
    /// Oracle matched
    Hit,
    /// Response received, oracle did not match
    Miss,
    /// Request could not be sent or the response could not be read
    TransportFailure(String),
    /// Mutated request could not be built
    DecodeFailure(String),
}

/// One payload sent into one field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeAttempt {
    pub parameter: String,
    pub location: Location,
    pub payload: String,
    pub outcome: ProbeOutcome,
}

/// Everything one engine did against one scan target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetReport {
    /// Engine name ("sqli", "xss")
    pub engine: String,
    /// "METHOD url" of the scanned target
    pub target: String,
    pub findings: Vec<Finding>,
    pub attempts: Vec<ProbeAttempt>,
}

impl TargetReport {
    pub fn new(engine: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            target: target.into(),
            findings: Vec::new(),
            attempts: Vec::new(),
        }
    }

    /// Number of requests that actually went out (hits, misses and transport failures)
    pub fn probes_sent(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| !matches!(a.outcome, ProbeOutcome::DecodeFailure(_)))
            .count()
    }

    pub fn transport_failures(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| matches!(a.outcome, ProbeOutcome::TransportFailure(_)))
            .count()
    }

    pub fn decode_failures(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| matches!(a.outcome, ProbeOutcome::DecodeFailure(_)))
            .count()
    }
}

/// Result of a complete scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// Seed URL
    pub target: String,
    /// Unique scan identifier
    pub scan_id: String,
    /// Scan start time (local timezone)
    pub started_at: DateTime<Local>,
    /// Scan end time (local timezone)
    pub finished_at: Option<DateTime<Local>>,
    /// Pages successfully loaded by the crawler
    pub pages_visited: usize,
    /// Pages whose navigation failed
    pub navigation_failures: usize,
    /// Scan targets handed to the engines
    pub targets_collected: usize,
    /// All findings discovered
    pub findings: Vec<Finding>,
    /// Per-target, per-engine probe reports
    pub reports: Vec<TargetReport>,
    /// Total HTTP requests made
    pub total_requests: u64,
}

impl ScanResult {
    /// Creates a new ScanResult
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            scan_id: uuid::Uuid::new_v4().to_string(),
            started_at: Local::now(),
            finished_at: None,
            pages_visited: 0,
            navigation_failures: 0,
            targets_collected: 0,
            findings: Vec::new(),
            reports: Vec::new(),
            total_requests: 0,
        }
    }

    /// Returns count of findings of a given class
    pub fn count_by_class(&self, class: VulnClass) -> usize {
        self.findings
            .iter()
            .filter(|f| f.vuln_class == class)
            .count()
    }

    /// Marks the scan as finished
    pub fn finish(&mut self) {
        self.finished_at = Some(Local::now());
    }
}

/// What an engine does with a field after its first positive probe
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HitPolicy {
    /// Move on to the next field (at most one finding per field)
    #[default]
    StopOnHit,
    /// Keep sending the remaining payloads
    ContinueOnHit,
}

/// Configuration for a scan session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Seed URL to crawl
    pub target: String,
    /// Per-probe timeout in seconds
    pub timeout_secs: u64,
    /// User-Agent header value
    pub user_agent: String,
    /// Page navigation timeout in milliseconds
    pub navigation_timeout_ms: u64,
    /// Stop crawling after this many pages
    pub max_pages: Option<usize>,
    /// Error-based SQLi payload file
    pub payload_file: PathBuf,
    #[serde(default)]
    pub hit_policy: HitPolicy,
    /// Enable the time-based blind SQLi probe
    #[serde(default)]
    pub time_based: bool,
    /// Latency above baseline that counts as a time-based hit
    #[serde(default = "default_time_delay")]
    pub time_delay_ms: u64,
}

fn default_time_delay() -> u64 {
    2500
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            target: String::new(),
            timeout_secs: 5,
            user_agent: "vulnscout/0.1.0".to_string(),
            navigation_timeout_ms: 10_000,
            max_pages: None,
            payload_file: PathBuf::from("wordlists/sqli_error_payloads.txt"),
            hit_policy: HitPolicy::StopOnHit,
            time_based: false,
            time_delay_ms: default_time_delay(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_sets_severity_and_cwe() {
        let sqli = Finding::new(VulnClass::Sqli, Location::JsonBody, "http://x.test/api", "id", "'");
        assert_eq!(sqli.severity, Severity::Critical);
        assert_eq!(sqli.cwe_id, "CWE-89");

        let xss = Finding::new(VulnClass::Xss, Location::FormData, "http://x.test/c", "text", "<svg>");
        assert_eq!(xss.severity, Severity::High);
        assert_eq!(xss.cwe_id, "CWE-79");
        assert!(Severity::Critical < Severity::High);
    }
}
