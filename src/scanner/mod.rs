//! Scanner engine and trait definitions

pub mod injection;
pub mod oracle;
pub mod probe;

use crate::crawler::{Browser, Crawler, HttpBrowser, ScanTarget};
use crate::error::Result;
use crate::http::{HttpClient, Transport};
use crate::models::{ScanConfig, ScanResult, TargetReport};
use crate::payloads::PayloadSet;
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use injection::{EngineOptions, SqliEngine, XssEngine};
use std::sync::Arc;
use tracing::info;

/// Trait that every injection engine implements
#[async_trait]
pub trait InjectionEngine: Send + Sync {
    /// Returns the engine name
    fn name(&self) -> &str;

    /// Returns a description of what this engine checks
    fn description(&self) -> &str;

    /// Probes every injectable field of the target, one request at a time
    async fn scan(&self, target: &ScanTarget) -> TargetReport;
}

/// Orchestrates crawling and the execution of the registered engines
pub struct ScanEngine {
    engines: Vec<Box<dyn InjectionEngine>>,
}

impl ScanEngine {
    /// Creates a ScanEngine with no registered engines
    pub fn new() -> Self {
        Self {
            engines: Vec::new(),
        }
    }

    /// Creates a ScanEngine with the SQLi and XSS engines, both sending through `transport`
    pub fn with_defaults(
        transport: Arc<dyn Transport>,
        sqli_payloads: &PayloadSet,
        options: EngineOptions,
    ) -> Result<Self> {
        let mut engine = Self::new();
        engine.register(Box::new(SqliEngine::new(
            Arc::clone(&transport),
            sqli_payloads,
            options,
        )?));
        engine.register(Box::new(XssEngine::new(transport, options)));
        Ok(engine)
    }

    /// Registers a new engine
    pub fn register(&mut self, engine: Box<dyn InjectionEngine>) {
        self.engines.push(engine);
    }

    /// Returns information about all registered engines
    pub fn list_engines(&self) -> Vec<(&str, &str)> {
        self.engines
            .iter()
            .map(|e| (e.name(), e.description()))
            .collect()
    }

    /// Runs every engine on every target, sequentially
    pub async fn scan_targets(&self, targets: &[ScanTarget]) -> Vec<TargetReport> {
        let pb = ProgressBar::new((targets.len() * self.engines.len()) as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );

        let mut reports = Vec::with_capacity(targets.len() * self.engines.len());
        for target in targets {
            for engine in &self.engines {
                pb.set_message(format!("{} {}", engine.name(), target.url.path()));
                let report = engine.scan(target).await;
                info!(
                    "Engine '{}' on {target}: {} probes, {} findings, {} failures",
                    engine.name(),
                    report.probes_sent(),
                    report.findings.len(),
                    report.transport_failures() + report.decode_failures()
                );
                reports.push(report);
                pb.inc(1);
            }
        }

        pb.finish_with_message("Scan complete");
        reports
    }

    /// Crawls from the seed, then scans every collected target
    pub async fn run<B: Browser>(
        &self,
        crawler: &mut Crawler<B>,
        seed: &str,
    ) -> Result<ScanResult> {
        let mut result = ScanResult::new(seed);

        let outcome = crawler.crawl(seed).await?;
        result.pages_visited = outcome.visited.len();
        result.navigation_failures = outcome.failed.len();
        result.targets_collected = outcome.targets.len();

        if outcome.targets.is_empty() {
            info!("No dynamic targets were collected for scanning");
        }

        let reports = self.scan_targets(&outcome.targets).await;
        result.findings = reports
            .iter()
            .flat_map(|r| r.findings.iter().cloned())
            .collect();
        result.reports = reports;
        result.finish();

        Ok(result)
    }
}

impl Default for ScanEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Scans a site end to end over plain HTTP: one client shared by the
/// crawler's browser and both engines
pub async fn scan_site(config: &ScanConfig, sqli_payloads: &PayloadSet) -> Result<ScanResult> {
    crate::config::validate(config)?;
    let client = HttpClient::from_config(config)?;
    let engine = ScanEngine::with_defaults(
        Arc::new(client.clone()),
        sqli_payloads,
        EngineOptions::from_config(config),
    )?;

    let mut crawler = Crawler::new(HttpBrowser::new(client.clone()), config);
    let mut result = engine.run(&mut crawler, &config.target).await?;
    result.total_requests = client.request_count();
    Ok(result)
}
