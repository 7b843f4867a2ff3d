//! vulnscout - Crawling SQLi/XSS scanner CLI

use clap::Parser;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing::error;
use tracing_subscriber::EnvFilter;

use vulnscout::config;
use vulnscout::error::Result;
use vulnscout::models::{Finding, Location, ScanConfig, ScanResult, VulnClass};
use vulnscout::payloads;
use vulnscout::report;
use vulnscout::scanner;

/// vulnscout - Crawls a site and probes its requests for SQL injection and reflected XSS
#[derive(Parser)]
#[command(name = "vulnscout", version, about, long_about = None)]
struct Cli {
    /// Seed URL; the crawl stays on its host and port
    #[arg(short, long)]
    url: String,

    /// Error-based SQLi payload file (one payload per line)
    #[arg(short, long)]
    payloads: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the full scan result as JSON to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep probing a field after its first finding
    #[arg(long)]
    continue_on_hit: bool,

    /// Also run time-based blind SQLi probes
    #[arg(long)]
    time_based: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn print_banner() {
    let banner = r#"
    ╔═══════════════════════════════════════╗
    ║  VULNSCOUT v0.1.0                     ║
    ║  SQLi / XSS crawling scanner          ║
    ╚═══════════════════════════════════════╝
    "#;
    println!("{}", banner.cyan());
}

fn print_finding(finding: &Finding) {
    let label = match finding.vuln_class {
        VulnClass::Sqli => "[SQLi]".red().bold(),
        VulnClass::Xss => "[XSS]".bright_red().bold(),
    };
    println!(
        "  {label} {} '{}' at {}",
        finding.location,
        finding.parameter.bold(),
        finding.url
    );
    println!("         payload:  {}", finding.payload.yellow());
    if !finding.evidence.is_empty() {
        println!("         evidence: {}", finding.evidence);
    }
}

fn print_summary(result: &ScanResult) {
    println!("\n{}", "  Scan Summary".bold());
    println!("  {}", "─".repeat(35));

    let mut builder = Builder::default();
    builder.push_record(["Location", "SQLi", "XSS"]);
    for location in [Location::JsonBody, Location::FormData, Location::UrlParameter] {
        let count = |class: VulnClass| {
            result
                .findings
                .iter()
                .filter(|f| f.location == location && f.vuln_class == class)
                .count()
        };
        builder.push_record([
            location.to_string(),
            count(VulnClass::Sqli).to_string(),
            count(VulnClass::Xss).to_string(),
        ]);
    }
    builder.push_record([
        "Total".to_string(),
        result.count_by_class(VulnClass::Sqli).to_string(),
        result.count_by_class(VulnClass::Xss).to_string(),
    ]);

    let mut table = builder.build();
    table.with(Style::rounded());
    println!("{table}");

    let failures: usize = result
        .reports
        .iter()
        .map(|r| r.transport_failures())
        .sum();
    println!(
        "\n  {} pages, {} failed navigations, {} targets, {} requests, {} probe failures",
        result.pages_visited.to_string().cyan(),
        result.navigation_failures.to_string().yellow(),
        result.targets_collected.to_string().cyan(),
        result.total_requests.to_string().cyan(),
        failures.to_string().yellow(),
    );
}

async fn run(cli: Cli) -> Result<ScanResult> {
    let mut scan_config = if let Some(ref path) = cli.config {
        config::load_config(path)?
    } else {
        let default_path = Path::new("config/default.toml");
        if default_path.exists() {
            config::load_config(default_path)?
        } else {
            ScanConfig::default()
        }
    };

    config::merge_cli_args(
        &mut scan_config,
        cli.url,
        cli.payloads,
        cli.continue_on_hit,
        cli.time_based,
    );

    let sqli_payloads = {
        let stdin = std::io::stdin();
        let mut input = stdin.lock();
        let mut output = std::io::stdout();
        payloads::load_or_prompt(&scan_config.payload_file, &mut input, &mut output)?
    };

    println!("  {} {}", "Target:".bold(), scan_config.target.green());
    println!(
        "  {} {} ({} payloads)",
        "Payloads:".bold(),
        sqli_payloads.source.cyan(),
        sqli_payloads.len()
    );
    println!(
        "  {} {:?}{}\n",
        "Hit policy:".bold(),
        scan_config.hit_policy,
        if scan_config.time_based {
            ", time-based enabled"
        } else {
            ""
        }
    );

    let result = scanner::scan_site(&scan_config, &sqli_payloads).await?;

    if result.findings.is_empty() {
        println!("\n  {}", "No vulnerabilities found.".green());
    } else {
        println!("\n  {}", "Findings".bold());
        for finding in &result.findings {
            print_finding(finding);
        }
    }

    print_summary(&result);

    if let Some(ref output) = cli.output {
        report::json::export(&result, output)?;
        println!(
            "\n  {} {}",
            "Report saved to:".bold(),
            output.display().to_string().green()
        );
    }

    Ok(result)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "vulnscout=debug"
    } else {
        "vulnscout=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    print_banner();

    match run(cli).await {
        Ok(result) if result.findings.is_empty() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(e) => {
            error!("Scan aborted: {e}");
            eprintln!("  {} {e}", "Error:".red().bold());
            ExitCode::from(2)
        }
    }
}
