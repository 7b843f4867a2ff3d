//! Integration tests for the SQLi and XSS engines against a mock server

mod common;

use common::{payload_set, test_config, EchoBody, EchoInput};
use reqwest::Method;
use std::sync::Arc;
use vulnscout::crawler::{InterceptedRequest, RequestCollector, ResourceType, ScanTarget};
use vulnscout::http::HttpClient;
use vulnscout::models::{HitPolicy, Location, VulnClass};
use vulnscout::scanner::injection::{EngineOptions, SqliEngine, XssEngine};
use vulnscout::scanner::{InjectionEngine, ScanEngine};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn get_target(url: &str) -> ScanTarget {
    RequestCollector::classify(&InterceptedRequest::get(url, ResourceType::Document))
        .expect("GET with query is a target")
}

fn json_target(url: &str, body: &str) -> ScanTarget {
    RequestCollector::classify(&InterceptedRequest {
        method: Method::POST,
        url: url.to_string(),
        headers: vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("X-Session".to_string(), "abc123".to_string()),
        ],
        body: Some(body.to_string()),
        resource_type: ResourceType::Xhr,
    })
    .expect("JSON POST is a target")
}

#[tokio::test]
async fn test_sqli_error_in_url_parameter() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "test' OR 1=1--"))
        .respond_with(
            ResponseTemplate::new(500).set_body_string("You have an error in your SQL syntax"),
        )
        .with_priority(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>No results</p>"))
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server.uri());
    let client = HttpClient::from_config(&config).expect("Failed to create client");
    let engine = SqliEngine::new(
        Arc::new(client),
        &payload_set(&["'", "' OR 1=1--", "\""]),
        EngineOptions::default(),
    )
    .expect("engine");

    let target = get_target(&format!("{}/search?q=test", mock_server.uri()));
    let report = engine.scan(&target).await;

    assert_eq!(report.findings.len(), 1, "Expected exactly one SQLi finding");
    let finding = &report.findings[0];
    assert_eq!(finding.vuln_class, VulnClass::Sqli);
    assert_eq!(finding.location, Location::UrlParameter);
    assert_eq!(finding.parameter, "q");
    assert_eq!(finding.payload, "' OR 1=1--");
    assert_eq!(finding.url, format!("{}/search", mock_server.uri()));

    let received = mock_server.received_requests().await.expect("recording on");
    assert_eq!(received.len(), 2, "No probes of q after the first hit");
}

#[tokio::test]
async fn test_sqli_clean_endpoint_sends_n_times_m() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server.uri());
    let client = HttpClient::from_config(&config).expect("Failed to create client");
    let engine = SqliEngine::new(
        Arc::new(client),
        &payload_set(&["'", "\"", "' OR 1=1--"]),
        EngineOptions::default(),
    )
    .expect("engine");

    let target = json_target(
        &format!("{}/api/users", mock_server.uri()),
        r#"{"name":"bob","email":"bob@example.com","age":30}"#,
    );
    let report = engine.scan(&target).await;

    assert!(report.findings.is_empty());
    assert_eq!(report.probes_sent(), 6);

    let received = mock_server.received_requests().await.expect("recording on");
    assert_eq!(received.len(), 6);
    for request in &received {
        let body: serde_json::Value =
            serde_json::from_slice(&request.body).expect("probe body is JSON");
        assert_eq!(body["age"], 30, "non-string fields are kept as-is");
        assert_eq!(
            request.headers.get("x-session").and_then(|v| v.to_str().ok()),
            Some("abc123")
        );
    }
}

#[tokio::test]
async fn test_xss_reflected_json_field() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/comment"))
        .respond_with(EchoBody)
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server.uri());
    let client = HttpClient::from_config(&config).expect("Failed to create client");
    let engine = XssEngine::new(Arc::new(client), EngineOptions::default());

    let target = json_target(&format!("{}/comment", mock_server.uri()), r#"{"text":"hi"}"#);
    let report = engine.scan(&target).await;

    assert_eq!(report.findings.len(), 1);
    let finding = &report.findings[0];
    assert_eq!(finding.vuln_class, VulnClass::Xss);
    assert_eq!(finding.location, Location::JsonBody);
    assert_eq!(finding.parameter, "text");
    assert!(finding.evidence.contains(&finding.payload));
}

#[tokio::test]
async fn test_xss_query_and_form_continue_on_hit() {
    let mock_server = MockServer::start().await;

    Mock::given(path("/guestbook"))
        .respond_with(EchoInput)
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server.uri());
    let client = HttpClient::from_config(&config).expect("Failed to create client");
    let options = EngineOptions {
        hit_policy: HitPolicy::ContinueOnHit,
        ..EngineOptions::default()
    };
    let engine = XssEngine::new(Arc::new(client), options);

    let target = RequestCollector::classify(&InterceptedRequest {
        method: Method::POST,
        url: format!("{}/guestbook?lang=en", mock_server.uri()),
        headers: Vec::new(),
        body: Some("name=alice".to_string()),
        resource_type: ResourceType::Document,
    })
    .expect("form POST is a target");
    let report = engine.scan(&target).await;

    // Every payload is echoed verbatim through both sources
    let form = report
        .findings
        .iter()
        .filter(|f| f.location == Location::FormData && f.parameter == "name")
        .count();
    let query = report
        .findings
        .iter()
        .filter(|f| f.location == Location::UrlParameter && f.parameter == "lang")
        .count();
    assert_eq!(form, 5);
    assert_eq!(query, 5);
}

#[tokio::test]
async fn test_unreachable_target_records_transport_failures() {
    // Reserve a port, then close it so every connection is refused
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let uri = format!("http://{}", listener.local_addr().expect("local addr"));
    drop(listener);

    let config = test_config(&uri);
    let client = HttpClient::from_config(&config).expect("Failed to create client");
    let engine = SqliEngine::new(
        Arc::new(client),
        &payload_set(&["'", "\""]),
        EngineOptions::default(),
    )
    .expect("engine");

    let report = engine.scan(&get_target(&format!("{uri}/item?id=1"))).await;
    assert!(report.findings.is_empty());
    assert_eq!(report.transport_failures(), 2, "each payload attempted once");
}

#[tokio::test]
async fn test_static_resources_are_never_probed() {
    let request = InterceptedRequest::get(
        "http://example.com/static/app.js?v=3",
        ResourceType::Script,
    );
    assert!(RequestCollector::classify(&request).is_none());

    let request = InterceptedRequest::get("http://example.com/logo.png?w=64", ResourceType::Image);
    assert!(RequestCollector::classify(&request).is_none());
}

#[tokio::test]
async fn test_scan_engine_runs_both_engines_per_target() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(EchoInput)
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server.uri());
    let client = HttpClient::from_config(&config).expect("Failed to create client");
    let engine = ScanEngine::with_defaults(
        Arc::new(client.clone()),
        &payload_set(&["'"]),
        EngineOptions::from_config(&config),
    )
    .expect("engine");

    let engines: Vec<&str> = engine.list_engines().iter().map(|(n, _)| *n).collect();
    assert_eq!(engines, vec!["sqli", "xss"]);

    let targets = vec![get_target(&format!("{}/search?q=test", mock_server.uri()))];
    let reports = engine.scan_targets(&targets).await;

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].engine, "sqli");
    assert!(reports[0].findings.is_empty());
    assert_eq!(reports[1].engine, "xss");
    assert_eq!(reports[1].findings.len(), 1);
    // one SQLi probe, one XSS probe (first payload reflected)
    assert_eq!(client.request_count(), 2);
}
