//! Configuration management for vulnscout

use crate::error::{Result, ScanError};
use crate::models::{HitPolicy, ScanConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File-based configuration structure matching default.toml
#[derive(Debug, Deserialize)]
struct FileConfig {
    scan: Option<ScanSection>,
    crawl: Option<CrawlSection>,
    payloads: Option<PayloadsSection>,
}

#[derive(Debug, Deserialize)]
struct ScanSection {
    timeout_secs: Option<u64>,
    user_agent: Option<String>,
    continue_on_hit: Option<bool>,
    time_based: Option<bool>,
    time_delay_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct CrawlSection {
    navigation_timeout_ms: Option<u64>,
    max_pages: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct PayloadsSection {
    sqli_file: Option<PathBuf>,
}

/// Loads configuration from a TOML file and merges with defaults
pub fn load_config(path: &Path) -> Result<ScanConfig> {
    let content = std::fs::read_to_string(path).map_err(ScanError::IoError)?;
    parse_config(&content)
}

/// Parses TOML configuration text on top of the defaults
pub fn parse_config(content: &str) -> Result<ScanConfig> {
    let file_config: FileConfig = toml::from_str(content)?;

    let mut config = ScanConfig::default();

    if let Some(scan) = file_config.scan {
        if let Some(timeout) = scan.timeout_secs {
            config.timeout_secs = timeout;
        }
        if let Some(ua) = scan.user_agent {
            config.user_agent = ua;
        }
        if let Some(true) = scan.continue_on_hit {
            config.hit_policy = HitPolicy::ContinueOnHit;
        }
        if let Some(time_based) = scan.time_based {
            config.time_based = time_based;
        }
        if let Some(delay) = scan.time_delay_ms {
            config.time_delay_ms = delay;
        }
    }

    if let Some(crawl) = file_config.crawl {
        if let Some(nav) = crawl.navigation_timeout_ms {
            config.navigation_timeout_ms = nav;
        }
        config.max_pages = crawl.max_pages;
    }

    if let Some(payloads) = file_config.payloads {
        if let Some(file) = payloads.sqli_file {
            config.payload_file = file;
        }
    }

    validate(&config)?;
    Ok(config)
}

/// Rejects timing settings the scanner cannot work with. The time-based
/// threshold must be positive and shorter than the probe timeout.
pub fn validate(config: &ScanConfig) -> Result<()> {
    if config.timeout_secs == 0 {
        return Err(ScanError::ConfigError(
            "scan.timeout_secs must be greater than zero".to_string(),
        ));
    }

    if config.time_based {
        let timeout_ms = config.timeout_secs.saturating_mul(1000);
        if config.time_delay_ms == 0 || config.time_delay_ms >= timeout_ms {
            return Err(ScanError::ConfigError(format!(
                "scan.time_delay_ms must be between 1 and {} (below the probe timeout), got {}",
                timeout_ms - 1,
                config.time_delay_ms
            )));
        }
    }

    Ok(())
}

/// Merges CLI arguments into an existing ScanConfig
pub fn merge_cli_args(
    config: &mut ScanConfig,
    target: String,
    payload_file: Option<PathBuf>,
    continue_on_hit: bool,
    time_based: bool,
) {
    config.target = target;

    if let Some(p) = payload_file {
        config.payload_file = p;
    }
    if continue_on_hit {
        config.hit_policy = HitPolicy::ContinueOnHit;
    }
    if time_based {
        config.time_based = true;
    }
}
