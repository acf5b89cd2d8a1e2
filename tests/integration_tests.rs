//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: auth → paginated requests → accumulated records → export

use futures::TryStreamExt;
use mps_client::api::{Endpoint, MpsClient, ProductionLogFilter, ProductionStatus};
use mps_client::auth::AuthMode;
use mps_client::output::{export_records, ExportFormat};
use mps_client::pagination::{CancelFlag, FilterSet, PaginatedFetcher, WalkOptions};
use mps_client::{ClientConfig, Error, Record};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const KEY: &str = "mps_0123456789abcdef0123456789abcdef";

/// Mimics the server's `LIMIT ? OFFSET ?` paging over `total` rows
struct MoTable {
    total: u64,
}

impl Respond for MoTable {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let param = |name: &str| {
            request
                .url
                .query_pairs()
                .find(|(k, _)| k == name)
                .and_then(|(_, v)| v.parse::<u64>().ok())
        };
        let limit = param("limit").unwrap_or(100);
        let offset = param("offset").unwrap_or(0);
        let end = (offset + limit).min(self.total);
        let rows: Vec<Value> = (offset..end)
            .map(|i| json!({ "mo_name": format!("MO/{i:05}"), "ready_for_production": 1 }))
            .collect();

        ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "data": rows,
            "pagination": {
                "total": self.total,
                "limit": limit,
                "offset": offset,
                "has_more": end < self.total,
            }
        }))
    }
}

fn mo_names(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| r.get("mo_name").and_then(Value::as_str).map(String::from))
        .collect()
}

// ============================================================================
// Pagination Flow Tests
// ============================================================================

#[tokio::test]
async fn test_recent_mo_walk_with_api_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/data/recent-mo"))
        .and(header("x-api-key", KEY))
        .and(query_param("ready", "true"))
        .respond_with(MoTable { total: 250 })
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = MpsClient::new(mock_server.uri(), AuthMode::ApiKey(KEY.to_string())).unwrap();
    let filters = FilterSet::new().with("ready", "true");
    let records = client
        .fetch_all(Endpoint::RecentMo, &filters)
        .await
        .unwrap();

    assert_eq!(records.len(), 250);
    let names = mo_names(&records);
    assert_eq!(names.first().map(String::as_str), Some("MO/00000"));
    assert_eq!(names.last().map(String::as_str), Some("MO/00249"));
    assert!(names.windows(2).all(|w| w[0] < w[1]));

    let requests = mock_server.received_requests().await.unwrap();
    let offsets: Vec<String> = requests
        .iter()
        .filter_map(|r| {
            r.url
                .query_pairs()
                .find(|(k, _)| k == "offset")
                .map(|(_, v)| v.to_string())
        })
        .collect();
    assert_eq!(offsets, vec!["0", "100", "200"]);
}

#[tokio::test]
async fn test_total_exact_multiple_of_page_size() {
    let mock_server = MockServer::start().await;

    // has_more turns false on the page that reaches total, so no empty trailing request
    Mock::given(method("GET"))
        .and(path("/api/data/authenticity-used-line"))
        .respond_with(MoTable { total: 20 })
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = MpsClient::new(mock_server.uri(), AuthMode::ApiKey(KEY.to_string()))
        .unwrap()
        .with_walk_options(WalkOptions::new().page_size(10));
    let records = client
        .authenticity_used_line(&FilterSet::new())
        .await
        .unwrap();

    assert_eq!(records.len(), 20);
}

#[tokio::test]
async fn test_session_login_walk_and_logout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "token": "a1b2c3",
            "user": {"username": "production", "role": "production"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/data/production-log"))
        .and(header("x-session-token", "a1b2c3"))
        .and(query_param("status", "start"))
        .respond_with(MoTable { total: 7 })
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/logout"))
        .and(header("x-session-token", "a1b2c3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = MpsClient::new(mock_server.uri(), AuthMode::Unauthenticated).unwrap();
    client.login("production", "password123").await.unwrap();

    let records = client
        .production_log(ProductionLogFilter::new().status(ProductionStatus::Start))
        .await
        .unwrap();
    assert_eq!(records.len(), 7);

    client.logout().await.unwrap();
    assert_eq!(client.auth_mode().await, AuthMode::Unauthenticated);

    let err = client
        .production_log(ProductionLogFilter::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotAuthenticated));
}

#[tokio::test]
async fn test_unauthorized_aborts_walk() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/data/recent-mo"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "Unauthorized: Invalid API key"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = MpsClient::new(
        mock_server.uri(),
        AuthMode::ApiKey("mps_ffffffffffffffffffffffffffffffff".to_string()),
    )
    .unwrap();
    let err = client
        .fetch_all(Endpoint::RecentMo, &FilterSet::new())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert!(err.is_protocol());
    assert!(err.to_string().contains("Unauthorized: Invalid API key"));
}

#[tokio::test]
async fn test_max_pages_bound() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/data/recent-mo"))
        .respond_with(MoTable { total: 1_000 })
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = MpsClient::new(mock_server.uri(), AuthMode::ApiKey(KEY.to_string())).unwrap();
    let err = client
        .fetch_all_with_options(
            Endpoint::RecentMo,
            &FilterSet::new(),
            WalkOptions::new().page_size(100).max_pages(2),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::PageLimitExceeded {
            max_pages: 2,
            records_fetched: 200
        }
    ));
}

#[tokio::test]
async fn test_cancelled_walk_makes_no_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(MoTable { total: 10 })
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = MpsClient::new(mock_server.uri(), AuthMode::ApiKey(KEY.to_string())).unwrap();
    let cancel = CancelFlag::new();
    cancel.cancel();

    let err = client
        .fetch_all_with_options(
            Endpoint::RecentMo,
            &FilterSet::new(),
            WalkOptions::new().cancel_on(cancel),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled { offset: 0 }));
}

#[tokio::test]
async fn test_streaming_over_endpoint_fetcher() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/data/manufacturing-identity"))
        .respond_with(MoTable { total: 45 })
        .mount(&mock_server)
        .await;

    let client = MpsClient::new(mock_server.uri(), AuthMode::ApiKey(KEY.to_string())).unwrap();
    let fetcher = client.endpoint(Endpoint::ManufacturingIdentity);
    let walker = PaginatedFetcher::with_options(WalkOptions::new().page_size(20));

    let streamed: Vec<Record> = walker
        .stream(&fetcher, FilterSet::new())
        .try_collect()
        .await
        .unwrap();
    let collected = walker.fetch_all(&fetcher, &FilterSet::new()).await.unwrap();

    assert_eq!(streamed.len(), 45);
    assert_eq!(streamed, collected);
}

// ============================================================================
// Config → Client → Export
// ============================================================================

#[tokio::test]
async fn test_config_to_export() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/data/authenticity-used-rm"))
        .and(query_param("limit", "4"))
        .respond_with(MoTable { total: 10 })
        .expect(3)
        .mount(&mock_server)
        .await;

    let yaml = format!("base_url: {}\napi_key: {KEY}\npage_size: 4\n", mock_server.uri());
    let config = ClientConfig::from_yaml_str(&yaml).unwrap();
    let client = MpsClient::from_config(&config).unwrap();

    let records = client
        .authenticity_used_rm(&FilterSet::new())
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("out/rm.json");
    let jsonl_path = dir.path().join("out/rm.jsonl");

    assert_eq!(export_records(&records, &json_path, None).unwrap(), 10);
    assert_eq!(
        export_records(&records, &jsonl_path, Some(ExportFormat::JsonLines)).unwrap(),
        10
    );

    let json_text = std::fs::read_to_string(&json_path).unwrap();
    let reparsed: Vec<Record> = serde_json::from_str(&json_text).unwrap();
    assert_eq!(reparsed, records);

    let jsonl_text = std::fs::read_to_string(&jsonl_path).unwrap();
    assert_eq!(jsonl_text.lines().count(), 10);
}
