//! Injection engines
//!
//! Detects error-based SQL injection and reflected XSS in collected scan targets.

pub mod sqli;
pub mod xss;

pub use sqli::SqliEngine;
pub use xss::XssEngine;

use crate::models::{HitPolicy, ScanConfig};
use std::time::Duration;

/// Behaviour shared by the injection engines
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    pub hit_policy: HitPolicy,
    /// Run the time-based blind SQLi probe on fields without an error-based hit
    pub time_based: bool,
    /// Latency above baseline that counts as a time-based hit
    pub time_delay: Duration,
}

impl EngineOptions {
    pub fn from_config(config: &ScanConfig) -> Self {
        Self {
            hit_policy: config.hit_policy,
            time_based: config.time_based,
            time_delay: Duration::from_millis(config.time_delay_ms),
        }
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from_config(&ScanConfig::default())
    }
}
