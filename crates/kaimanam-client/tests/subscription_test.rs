//! Contract tests for live collection streams (`Accept: text/event-stream`).

use kaimanam_client::{ClientConfig, ItemRepository, KaimanamClient, OrderRepository, StoreError};
use kaimanam_core::ItemId;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn test_client(mock_server: &MockServer) -> KaimanamClient {
    let config = ClientConfig::local_mock(&mock_server.uri()).unwrap();
    KaimanamClient::new(config).unwrap()
}

fn sse(events: &[(&str, serde_json::Value)]) -> ResponseTemplate {
    let body: String = events
        .iter()
        .map(|(name, data)| format!("event: {name}\r\ndata: {data}\r\n\r\n"))
        .collect();
    ResponseTemplate::new(200).set_body_raw(body, "text/event-stream")
}

#[tokio::test]
async fn item_stream_yields_full_snapshot_per_change() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/items.json"))
        .and(header("accept", "text/event-stream"))
        .respond_with(sse(&[
            (
                "put",
                serde_json::json!({"path": "/", "data": {
                    "-NA": {"id": "1", "name": "Idli", "amount": 40}
                }}),
            ),
            ("keep-alive", serde_json::Value::Null),
            (
                "put",
                serde_json::json!({"path": "/-NB", "data": {"id": "2", "name": "Vada", "amount": 30}}),
            ),
            (
                "patch",
                serde_json::json!({"path": "/-NA", "data": {"amount": 45}}),
            ),
            ("put", serde_json::json!({"path": "/-NB", "data": null})),
        ]))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server).await;
    let mut sub = client.items().subscribe_items().await.unwrap();

    let first = sub.next().await.unwrap().unwrap();
    assert_eq!(first.records.len(), 1);

    let second = sub.next().await.unwrap().unwrap();
    let ids: Vec<_> = second.records.iter().map(|r| r.value.id.clone()).collect();
    assert_eq!(ids, vec![ItemId::from_raw("1"), ItemId::from_raw("2")]);

    let third = sub.next().await.unwrap().unwrap();
    assert_eq!(third.records[0].value.amount.to_string(), "45");

    let fourth = sub.next().await.unwrap().unwrap();
    assert_eq!(fourth.records.len(), 1);

    assert!(sub.next().await.is_none());
}

#[tokio::test]
async fn malformed_records_are_reported_not_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/UserData.json"))
        .respond_with(sse(&[(
            "put",
            serde_json::json!({"path": "/", "data": {
                "-O1": {"items": [{"id": "1", "name": "Idli", "rate": 40, "count": 1}], "total": 40},
                "-O2": {"items": "not a list"}
            }}),
        )]))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server).await;
    let mut sub = client.orders().subscribe_orders().await.unwrap();
    let snapshot = sub.next().await.unwrap().unwrap();
    assert_eq!(snapshot.records.len(), 1);
    assert_eq!(snapshot.rejected.len(), 1);
    assert_eq!(snapshot.rejected[0].as_str(), "-O2");
}

#[tokio::test]
async fn revoked_credential_ends_stream_with_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/items.json"))
        .respond_with(sse(&[
            ("put", serde_json::json!({"path": "/", "data": null})),
            ("auth_revoked", serde_json::json!("token expired")),
        ]))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server).await;
    let mut sub = client.items().subscribe_items().await.unwrap();
    assert!(sub.next().await.unwrap().unwrap().records.is_empty());

    let err = sub.next().await.unwrap().unwrap_err();
    assert!(matches!(err, StoreError::Stream { .. }));
    assert!(sub.next().await.is_none());
}

#[tokio::test]
async fn rejected_subscription_fails_to_open() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/items.json"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Permission denied"))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server).await;
    let err = client.items().subscribe_items().await.unwrap_err();
    assert!(matches!(err, StoreError::Api { status: 401, .. }));
}
