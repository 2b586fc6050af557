//! End-to-end device calls through a running gateway.

mod common;

use common::{config_for, start_fixed_broker, start_gateway, start_mock_broker};
use plc_gateway::GatewayConfig;
use serde_json::json;

#[tokio::test]
async fn test_json_post_is_replayed_and_relayed() {
    let broker = start_mock_broker(|_| (201, None, String::new())).await;
    let gateway = start_gateway(config_for(&broker, false)).await;

    let payload = json!({
        "URL": format!("{}v2/entities/urn:ngsi_ld:Job:1/attrs", broker.url()),
        "Method": "post",
        "headers": [
            "Content-Type: application/json",
            "Content-Length: 999",
            "Fiware-Service: plant"
        ],
        "data": {"GoodPartCounter": {"value": {"dinc": 1}}}
    });
    let (status, body) = gateway.send(payload.to_string()).await;
    assert_eq!(status, 201);
    assert_eq!(body, "");

    let request = broker.last_request();
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/v2/entities/urn:ngsi_ld:Job:1/attrs");
    assert_eq!(request.header("content-type"), Some("application/json"));
    assert_eq!(request.header("fiware-service"), Some("plant"));
    assert_eq!(request.body, r#"{"GoodPartCounter":{"value":{"$inc":1}}}"#);
    assert_eq!(
        request.header("content-length"),
        Some(request.body.len().to_string().as_str())
    );

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn test_text_put_body_is_sent_verbatim() {
    let broker = start_mock_broker(|_| (204, None, String::new())).await;
    let gateway = start_gateway(config_for(&broker, false)).await;

    let payload = json!({
        "url": format!("{}v2/entities/Storage1/attrs/Level/value", broker.url()),
        "method": "PUT",
        "headers": ["Content-Type: text/plain"],
        "data": "42"
    });
    let (status, _) = gateway.send(payload.to_string()).await;
    assert_eq!(status, 204);

    let request = broker.last_request();
    assert_eq!(request.method, "PUT");
    assert_eq!(request.header("content-type"), Some("text/plain"));
    assert_eq!(request.header("content-length"), Some("2"));
    assert_eq!(request.body, "42");
}

#[tokio::test]
async fn test_get_relays_broker_body_and_content_type() {
    let broker = start_fixed_broker(200, r#"{"id":"Storage1","type":"Storage"}"#).await;
    let gateway = start_gateway(config_for(&broker, false)).await;

    let payload = json!({
        "url": format!("{}v2/entities/Storage1", broker.url()),
        "method": "GET",
        "headers": ["Accept: application/json"]
    });
    let response = gateway
        .client
        .post(gateway.url())
        .body(payload.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "application/json");
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(
        response.text().await.unwrap(),
        r#"{"id":"Storage1","type":"Storage"}"#
    );

    let request = broker.last_request();
    assert_eq!(request.method, "GET");
    assert_eq!(request.header("content-length"), None);
    assert_eq!(request.body, "");
}

#[tokio::test]
async fn test_broker_error_status_is_relayed() {
    let broker = start_fixed_broker(422, r#"{"error":"Unprocessable"}"#).await;
    let gateway = start_gateway(config_for(&broker, false)).await;

    let payload = json!({
        "url": format!("{}v2/entities", broker.url()),
        "method": "POST",
        "headers": ["Content-Type: application/json"],
        "data": {"id": "Storage1"}
    });
    let (status, body) = gateway.send(payload.to_string()).await;
    assert_eq!(status, 422);
    assert_eq!(body, r#"{"error":"Unprocessable"}"#);
}

#[tokio::test]
async fn test_invalid_payloads_never_reach_the_broker() {
    let broker = start_fixed_broker(200, "{}").await;
    let gateway = start_gateway(config_for(&broker, false)).await;
    let url = format!("{}v2/entities", broker.url());

    let cases = [
        ("not json at all".to_string(), "not valid JSON"),
        (json!({"url": url, "headers": []}).to_string(), "'method'"),
        (
            json!({"url": url, "method": "POST", "headers": []}).to_string(),
            "'data'",
        ),
        (
            json!({"url": url, "method": "POST", "headers": [], "data": {}}).to_string(),
            "missing header",
        ),
        (
            json!({"url": url, "method": "POST", "headers": ["Content-Type: application/xml"], "data": "x"})
                .to_string(),
            "unsupported Content-Type",
        ),
        (
            json!({"url": url, "method": "PUT", "headers": ["Content-Type: text/plain"], "data": ""})
                .to_string(),
            "'data' is empty",
        ),
        (
            json!({"url": "orion/v2", "method": "GET", "headers": []}).to_string(),
            "invalid url",
        ),
        (
            json!({"url": url, "method": "GET", "headers": ["a:b:c"]}).to_string(),
            "\"a:b:c\"",
        ),
    ];

    for (payload, expected) in cases {
        let (status, body) = gateway.send(payload.clone()).await;
        assert_eq!(status, 400, "{payload}");
        assert!(body.starts_with("Error processing request.\n"), "{body}");
        assert!(body.contains(expected), "{payload} -> {body}");
    }

    assert!(broker.requests().is_empty());
}

#[tokio::test]
async fn test_broker_down_is_service_unavailable() {
    let mut config = GatewayConfig::default();
    config.broker.timeout_secs = 2;
    let gateway = start_gateway(config).await;

    let payload = json!({
        "url": "http://127.0.0.1:9/v2/entities",
        "method": "GET",
        "headers": []
    });
    let (status, body) = gateway.send(payload.to_string()).await;
    assert_eq!(status, 503);
    assert!(body.starts_with("Connection error.\n"));
}

#[tokio::test]
async fn test_health_banner_and_shutdown() {
    let broker = start_fixed_broker(200, "{}").await;
    let gateway = start_gateway(config_for(&broker, false)).await;

    let response = gateway
        .client
        .get(format!("{}anything", gateway.url()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().starts_with("plc-gateway running."));

    gateway.shutdown.trigger();
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    let result = gateway.client.get(gateway.url()).send().await;
    assert!(result.is_err());
}
