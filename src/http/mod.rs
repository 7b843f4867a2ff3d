//! HTTP client module for vulnscout

pub mod client;
pub use client::{HttpClient, ProbeRequest, ProbeResponse, Transport};
