//! JSON report export

use crate::error::Result;
use crate::models::{Location, ScanResult, VulnClass};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Finding counts broken down by class and location
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub sqli: usize,
    pub xss: usize,
    pub json_body: usize,
    pub form_data: usize,
    pub url_parameter: usize,
    pub probes_sent: usize,
    pub transport_failures: usize,
    pub decode_failures: usize,
}

impl ReportSummary {
    pub fn from_result(result: &ScanResult) -> Self {
        let by_location =
            |loc: Location| result.findings.iter().filter(|f| f.location == loc).count();

        Self {
            sqli: result.count_by_class(VulnClass::Sqli),
            xss: result.count_by_class(VulnClass::Xss),
            json_body: by_location(Location::JsonBody),
            form_data: by_location(Location::FormData),
            url_parameter: by_location(Location::UrlParameter),
            probes_sent: result.reports.iter().map(|r| r.probes_sent()).sum(),
            transport_failures: result.reports.iter().map(|r| r.transport_failures()).sum(),
            decode_failures: result.reports.iter().map(|r| r.decode_failures()).sum(),
        }
    }
}

/// On-disk layout: the summary next to the full result
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    summary: ReportSummary,
    #[serde(flatten)]
    result: &'a ScanResult,
}

/// Exports scan results as a JSON file
pub fn export(result: &ScanResult, output_path: &Path) -> Result<()> {
    let report = JsonReport {
        summary: ReportSummary::from_result(result),
        result,
    };
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(output_path, json)?;
    info!("JSON report saved to {}", output_path.display());
    Ok(())
}
