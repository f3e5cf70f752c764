//! HighLevel connector integration tests against a mock API server.

use std::sync::Arc;
use std::time::Duration;

use chrono_tz::UTC;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use syncline_core::CrmConnector;
use syncline_domain::{month_window, SynclineError, TenantConfig};
use syncline_infra::connectors::{HighLevelConnector, HighLevelOptions};
use syncline_infra::EnrichmentCache;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn tenant() -> TenantConfig {
    TenantConfig {
        id: "acme".to_string(),
        crm_kind: "highlevel".to_string(),
        api_token: Some("test-token".to_string()),
        location_id: Some("loc-1".to_string()),
        ..TenantConfig::default()
    }
}

fn connector_for(server: &MockServer, page_size: usize) -> HighLevelConnector {
    connector_with_cache(server, page_size, Arc::new(EnrichmentCache::new()))
}

fn connector_with_cache(
    server: &MockServer,
    page_size: usize,
    cache: Arc<EnrichmentCache>,
) -> HighLevelConnector {
    let options = HighLevelOptions {
        base_url: server.uri(),
        page_size,
        page_delay: Duration::ZERO,
        user_delay: Duration::ZERO,
    };
    HighLevelConnector::with_options(&tenant(), cache, options).expect("connector")
}

fn invoice_json(id: &str, issue_date: &str) -> serde_json::Value {
    json!({
        "_id": id,
        "invoiceNumber": "1001",
        "status": "paid",
        "total": 100.0,
        "issueDate": issue_date,
        "contactDetails": {"id": "c1", "name": "Ada"}
    })
}

#[tokio::test]
async fn construction_fails_without_credentials() {
    let cache = Arc::new(EnrichmentCache::new());
    let mut config = tenant();
    config.api_token = Some("   ".to_string());

    let err = HighLevelConnector::new(&config, cache).unwrap_err();
    match err {
        SynclineError::Config(msg) => assert!(msg.contains("api token")),
        other => panic!("expected config error, got {:?}", other),
    }
}

#[tokio::test]
async fn invoice_walk_pages_until_short_page() {
    init_tracing();
    let server = MockServer::start().await;

    // Two full pages of 2, then a short page of 1.
    Mock::given(method("GET"))
        .and(path("/invoices/"))
        .and(header("Authorization", "Bearer test-token"))
        .and(header("Version", "2021-07-28"))
        .and(query_param("altId", "loc-1"))
        .and(query_param("altType", "location"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "invoices": [invoice_json("i1", "2024-01-05"), invoice_json("i2", "2024-01-10")]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/invoices/"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "invoices": [invoice_json("i3", "2024-01-15"), invoice_json("i4", "2024-01-20")]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/invoices/"))
        .and(query_param("offset", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "invoices": [invoice_json("i5", "2024-01-25")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let connector = connector_for(&server, 2);
    let window = month_window(UTC, 2024, 1).unwrap();
    let invoices = connector.fetch_invoices(window).await.unwrap();

    assert_eq!(invoices.len(), 5);
    assert_eq!(invoices[0].id, "i1");
    assert_eq!(invoices[4].id, "i5");
}

#[tokio::test]
async fn invoices_outside_the_window_are_filtered_client_side() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/invoices/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "invoices": [
                invoice_json("in-window", "2024-01-15"),
                invoice_json("before", "2023-12-31"),
                invoice_json("at-end-boundary", "2024-02-01"),
                {"_id": "undated", "total": 5.0}
            ]
        })))
        .mount(&server)
        .await;

    let connector = connector_for(&server, 100);
    let window = month_window(UTC, 2024, 1).unwrap();
    let invoices = connector.fetch_invoices(window).await.unwrap();

    let ids: Vec<&str> = invoices.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["in-window"]);
}

#[tokio::test]
async fn contact_lookups_hit_the_cache_after_first_fetch() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contacts/c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "contact": {"id": "c1", "name": "Ada", "ownerId": "o1", "ownerName": "Rep"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let connector = connector_for(&server, 100);

    let first = connector.fetch_contact("c1").await.unwrap();
    let second = connector.fetch_contact("c1").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.owner_id.as_deref(), Some("o1"));
    assert_eq!(first.owner_name.as_deref(), Some("Rep"));
}

#[tokio::test]
async fn cache_keys_are_tenant_namespaced() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contacts/c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "contact": {"id": "c1", "name": "Ada"}
        })))
        .mount(&server)
        .await;

    let cache = Arc::new(EnrichmentCache::new());
    let connector = connector_with_cache(&server, 100, cache.clone());
    connector.fetch_contact("c1").await.unwrap();

    assert!(cache.get("acme:contact:c1").is_some());
    assert!(cache.get("other:contact:c1").is_none());
}

#[tokio::test]
async fn contact_fetch_maps_auth_failures() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contacts/c1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let connector = connector_for(&server, 100);
    let err = connector.fetch_contact("c1").await.unwrap_err();
    assert!(matches!(err, SynclineError::Auth(_)));
}

#[tokio::test]
async fn appointments_are_fetched_per_user_and_names_backfilled() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calendars/events"))
        .and(query_param("userId", "u1"))
        .and(query_param("locationId", "loc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [{
                "id": "a1",
                "title": "Intro call",
                "startTime": "2024-01-15T10:00:00Z",
                "appointmentStatus": "confirmed",
                "contactId": "c1"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/calendars/events"))
        .and(query_param("userId", "u2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"events": []})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/contacts/c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "contact": {"id": "c1", "name": "Ada Lovelace"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let connector = connector_for(&server, 100);
    let window = month_window(UTC, 2024, 1).unwrap();
    let appointments =
        connector.fetch_appointments(&["u1".to_string(), "u2".to_string()], window).await.unwrap();

    assert_eq!(appointments.len(), 1);
    assert_eq!(appointments[0].user_id, "u1");
    assert_eq!(appointments[0].contact_name, "Ada Lovelace");
}

#[tokio::test]
async fn appointment_name_backfill_failure_leaves_name_blank() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calendars/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [{"id": "a1", "startTime": "2024-01-15T10:00:00Z", "contactId": "gone"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/contacts/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let connector = connector_for(&server, 100);
    let window = month_window(UTC, 2024, 1).unwrap();
    let appointments = connector.fetch_appointments(&["u1".to_string()], window).await.unwrap();

    assert_eq!(appointments.len(), 1);
    assert_eq!(appointments[0].contact_name, "");
}

#[tokio::test]
async fn transactions_resolve_entity_id_with_entity_source_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/payments/transactions"))
        .and(query_param("altId", "loc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"_id": "t1", "status": "succeeded", "entityId": "inv-1", "createdAt": "2024-01-10"},
                {"_id": "t2", "status": "succeeded", "entitySource": {"id": "inv-2"}, "createdAt": "2024-01-11"}
            ]
        })))
        .mount(&server)
        .await;

    let connector = connector_for(&server, 100);
    let window = month_window(UTC, 2024, 1).unwrap();
    let transactions = connector.fetch_transactions(window).await.unwrap();

    assert_eq!(transactions.len(), 2);
    assert_eq!(transactions[0].entity_id.as_deref(), Some("inv-1"));
    assert_eq!(transactions[1].entity_id.as_deref(), Some("inv-2"));
}

#[tokio::test]
async fn health_check_reflects_location_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/locations/loc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"location": {"id": "loc-1"}})))
        .mount(&server)
        .await;

    let connector = connector_for(&server, 100);
    assert!(connector.health_check().await);
}

#[tokio::test]
async fn health_check_fails_closed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/locations/loc-1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let connector = connector_for(&server, 100);
    assert!(!connector.health_check().await);
}
