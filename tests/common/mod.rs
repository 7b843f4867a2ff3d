//! Common test utilities

#![allow(dead_code)]

use std::path::PathBuf;
use vulnscout::models::ScanConfig;
use vulnscout::payloads::{self, PayloadSet};
use wiremock::{Request, Respond, ResponseTemplate};

/// Creates a test ScanConfig pointing to a wiremock server
pub fn test_config(target: &str) -> ScanConfig {
    ScanConfig {
        target: target.to_string(),
        timeout_secs: 5,
        user_agent: "vulnscout-test/0.1.0".to_string(),
        navigation_timeout_ms: 2_000,
        ..ScanConfig::default()
    }
}

/// Writes the payloads to a temp file and loads them back
pub fn payload_set(lines: &[&str]) -> PayloadSet {
    let path = std::env::temp_dir().join(format!("vulnscout-it-{}.txt", uuid::Uuid::new_v4()));
    std::fs::write(&path, lines.join("\n")).expect("write payload file");
    let set = payloads::load_payloads(&path).expect("payloads load");
    let _ = std::fs::remove_file(PathBuf::from(&path));
    set
}

/// Echoes every form field and query parameter back, unescaped
pub struct EchoInput;

impl Respond for EchoInput {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut echoed = String::new();
        for (k, v) in request.url.query_pairs() {
            echoed.push_str(&format!("<p>{k}: {v}</p>"));
        }
        for (k, v) in url::form_urlencoded::parse(&request.body) {
            echoed.push_str(&format!("<p>{k}: {v}</p>"));
        }
        ResponseTemplate::new(200).set_body_string(format!("<html><body>{echoed}</body></html>"))
    }
}

/// Echoes the raw request body back
pub struct EchoBody;

impl Respond for EchoBody {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_string(String::from_utf8_lossy(&request.body).into_owned())
    }
}
