//! Payload sets: the external error-based SQLi list and the built-in lists

use crate::error::{Result, ScanError};
use std::fmt;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Time-based blind SQLi payloads (MySQL, SQL Server, PostgreSQL)
pub const TIME_BASED_PAYLOADS: &[&str] = &[
    "' AND (SELECT SLEEP(3)) --",
    "'; WAITFOR DELAY '0:0:3' --",
    "') AND (SELECT pg_sleep(3)) --",
];

/// Reflected XSS payloads
pub const XSS_PAYLOADS: &[&str] = &[
    "<script>alert('XSS')</script>",
    "\" onmouseover=\"alert('XSS')",
    "'>\"><img src=x onerror=alert('XSS')>",
    "<svg/onload=alert('XSS')>",
    "javascript:alert('XSS')",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadCategory {
    ErrorBased,
    TimeBased,
    Reflected,
}

impl fmt::Display for PayloadCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadCategory::ErrorBased => write!(f, "error-based"),
            PayloadCategory::TimeBased => write!(f, "time-based"),
            PayloadCategory::Reflected => write!(f, "reflected"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub text: String,
    pub category: PayloadCategory,
}

/// An ordered list of payloads of one category
#[derive(Debug, Clone)]
pub struct PayloadSet {
    /// Where the payloads came from (file path or "built-in")
    pub source: String,
    pub category: PayloadCategory,
    pub payloads: Vec<Payload>,
}

impl PayloadSet {
    fn from_lines<'a>(
        source: impl Into<String>,
        category: PayloadCategory,
        lines: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self {
            source: source.into(),
            category,
            payloads: lines
                .into_iter()
                .map(|text| Payload {
                    text: text.to_string(),
                    category,
                })
                .collect(),
        }
    }

    /// Built-in time-based SQLi payloads
    pub fn time_based() -> Self {
        Self::from_lines("built-in", PayloadCategory::TimeBased, TIME_BASED_PAYLOADS.iter().copied())
    }

    /// Built-in reflected XSS payloads
    pub fn reflected() -> Self {
        Self::from_lines("built-in", PayloadCategory::Reflected, XSS_PAYLOADS.iter().copied())
    }

    /// Payload texts in order
    pub fn texts(&self) -> Vec<String> {
        self.payloads.iter().map(|p| p.text.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }
}

/// Parses payload file content: one per line, blank lines and `#` comments skipped
pub fn parse_payloads(content: &str) -> Vec<&str> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect()
}

/// Loads error-based SQLi payloads. A missing, unreadable or empty file is an error.
pub fn load_payloads(path: &Path) -> Result<PayloadSet> {
    let source = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|e| ScanError::PayloadFileError {
        path: source.clone(),
        reason: e.to_string(),
    })?;

    let set = PayloadSet::from_lines(source.clone(), PayloadCategory::ErrorBased, parse_payloads(&content));
    if set.is_empty() {
        return Err(ScanError::PayloadFileError {
            path: source,
            reason: "contains no payloads".to_string(),
        });
    }

    info!("Loaded {} error-based payloads from {}", set.len(), set.source);
    Ok(set)
}

/// Loads payloads from `initial`, re-prompting for a file name until a
/// non-empty set loads. Fails only when the input is exhausted.
pub fn load_or_prompt<R: BufRead, W: Write>(
    initial: &Path,
    input: &mut R,
    output: &mut W,
) -> Result<PayloadSet> {
    let mut path = initial.to_path_buf();

    loop {
        match load_payloads(&path) {
            Ok(set) => return Ok(set),
            Err(e) => {
                warn!("{e}");
                writeln!(output, "[!] Could not load payloads: {e}")?;
            }
        }

        write!(output, "Payload file name: ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(ScanError::PayloadFileError {
                path: path.display().to_string(),
                reason: "no replacement file name provided".to_string(),
            });
        }
        let name = line.trim();
        if !name.is_empty() {
            path = PathBuf::from(name);
        }
    }
}
