//! vulnscout - Crawling web scanner for injection vulnerabilities
//!
//! Crawls a site from a seed URL, collects the requests its pages make and
//! probes their fields for error-based SQL injection and reflected XSS.

pub mod config;
pub mod crawler;
pub mod error;
pub mod http;
pub mod models;
pub mod payloads;
pub mod report;
pub mod scanner;
