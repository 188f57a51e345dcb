use chrono::{TimeZone, Utc};
use fulcrum_core::constants::redaction::REDACTED_VALUE;
use fulcrum_core::ClientKind;
use fulcrum_dispatch::{ClientConfig, DispatchClient, DispatchKind, DispatchOptions};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DISPATCH_PATH: &str = "/api/dispatch";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("fulcrum_core=debug,fulcrum_dispatch=debug")
        .with_test_writer()
        .try_init();
}

fn test_config(endpoint: &str) -> ClientConfig {
    ClientConfig::builder(ClientKind::Dispatch)
        .endpoint(endpoint)
        .token("secret-token")
        .ticket_uuid("ticket-123")
        .run_uuid("run-456")
        .message_uuid("msg-789")
        .timeout_ms(1500)
        .debug(true)
        .build()
        .expect("Failed to create test configuration")
}

async fn setup_server(status: u16) -> (MockServer, DispatchClient) {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DISPATCH_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({"uuid": "abc"})))
        .mount(&server)
        .await;

    let client = DispatchClient::new(test_config(&format!("{}{DISPATCH_PATH}", server.uri())));
    (server, client)
}

async fn sent_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|req| req.body_json::<Value>().expect("Dispatch body is not JSON"))
        .collect()
}

async fn single_body(server: &MockServer) -> Value {
    let mut bodies = sent_bodies(server).await;
    assert_eq!(bodies.len(), 1, "expected exactly one POST");
    bodies.remove(0)
}

#[tokio::test]
async fn test_dispatch_text_round_trip() {
    let (server, client) = setup_server(200).await;

    assert!(client.dispatch_text("milestone A", None).await);

    let body = single_body(&server).await;
    assert_eq!(body["kind"], "text");
    assert_eq!(body["summary"], "milestone A");
    assert_eq!(body["payload"], json!({"text": null}));
}

#[tokio::test]
async fn test_dispatch_text_with_value() {
    let (server, client) = setup_server(200).await;

    assert!(client.dispatch_text("milestone B", Some("Additional details")).await);

    let body = single_body(&server).await;
    assert_eq!(body["kind"], "text");
    assert_eq!(body["payload"], json!({"text": "Additional details"}));
}

#[tokio::test]
async fn test_dispatch_sends_envelope_and_auth_header() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DISPATCH_PATH))
        .and(header("authorization", "Bearer secret-token"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    let client = DispatchClient::new(test_config(&format!("{}{DISPATCH_PATH}", server.uri())));

    assert!(client.dispatch("api_call", "Called API", None).await);

    let body = single_body(&server).await;
    assert_eq!(body["ticket_uuid"], "ticket-123");
    assert_eq!(body["run_uuid"], "run-456");
    assert_eq!(body["message_uuid"], "msg-789");
    assert_eq!(body["kind"], "api_call");
    assert_eq!(body["summary"], "Called API");
    assert_eq!(body["source"], "sdk");
    assert_eq!(body["schema_version"], 1);
    assert!(body["client_ts"].is_string());
    assert!(body.get("payload").is_none());
}

#[tokio::test]
async fn test_dispatch_redacts_payload() {
    let (server, client) = setup_server(200).await;
    let payload = json!({
        "user": "visible",
        "password": "secret123",
        "nested": {"Api_Key": "sk-1", "items": [{"auth_token": "t"}]}
    });

    assert!(client.dispatch_json("Parsed login form", payload.clone()).await);

    let body = single_body(&server).await;
    assert_eq!(body["kind"], "json");
    assert_eq!(body["payload"]["user"], "visible");
    assert_eq!(body["payload"]["password"], REDACTED_VALUE);
    assert_eq!(body["payload"]["nested"]["Api_Key"], REDACTED_VALUE);
    assert_eq!(body["payload"]["nested"]["items"][0]["auth_token"], REDACTED_VALUE);
    assert!(!body.to_string().contains("secret123"));
    // Caller's value is untouched
    assert_eq!(payload["password"], "secret123");
}

#[tokio::test]
async fn test_dispatch_with_options() {
    let (server, client) = setup_server(200).await;
    let ts = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
    let options = DispatchOptions::default()
        .source("runtime")
        .client_ts(ts)
        .skip_redaction(true);

    let payload = Some(json!({"token": "masked-upstream"}));

    assert!(client.dispatch_with(DispatchKind::Json, "Sanitized", payload, options).await);

    let body = single_body(&server).await;
    assert_eq!(body["source"], "runtime");
    assert_eq!(body["payload"]["token"], "masked-upstream");
    let sent_ts: chrono::DateTime<Utc> = serde_json::from_value(body["client_ts"].clone()).unwrap();
    assert_eq!(sent_ts, ts);
}

#[tokio::test]
async fn test_oversized_payload_is_still_sent() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let config = ClientConfig::builder(ClientKind::Dispatch)
        .endpoint(server.uri())
        .token("token")
        .ticket_uuid("ticket")
        .run_uuid("run")
        .max_bytes(256)
        .build()
        .unwrap();
    let client = DispatchClient::new(config);

    assert!(client.dispatch_json("Big blob", json!({"blob": "x".repeat(10_000)})).await);

    let body = single_body(&server).await;
    assert_eq!(body["payload"]["_truncated"], true);
    assert_eq!(body["payload"]["_max_size"], 256);
    assert!(body["payload"]["_original_size"].as_u64().unwrap() > 10_000);
    assert!(body["payload"]["_note"].is_string());
    assert!(body["payload"].get("blob").is_none());
}

#[tokio::test]
async fn test_long_summary_is_truncated() {
    let (server, client) = setup_server(200).await;

    assert!(client.dispatch_text(&format!("{}\nmore", "x".repeat(600)), None).await);

    let summary = single_body(&server).await["summary"].as_str().unwrap().to_string();
    assert_eq!(summary.chars().count(), 512);
    assert!(summary.ends_with("..."));
    assert!(!summary.contains('\n'));
}

#[tokio::test]
async fn test_dispatch_api_call() {
    let (server, client) = setup_server(200).await;
    let mut details = Map::new();
    details.insert("to".to_string(), json!("+1234567890"));
    details.insert("api_key".to_string(), json!("sk-live"));

    assert!(client.dispatch_api_call("Sent SMS", "twilio", "send_sms", details).await);

    let body = single_body(&server).await;
    assert_eq!(body["kind"], "api_call");
    assert_eq!(body["payload"]["service"], "twilio");
    assert_eq!(body["payload"]["operation"], "send_sms");
    assert_eq!(body["payload"]["to"], "+1234567890");
    assert_eq!(body["payload"]["api_key"], REDACTED_VALUE);
}

#[tokio::test]
async fn test_dispatch_external_ref() {
    let (server, client) = setup_server(200).await;

    assert!(
        client
            .dispatch_external_ref(
                "Started browser task",
                "browser-use",
                "task",
                "task-123",
                Some("https://example.com/tasks/task-123"),
            )
            .await
    );

    let body = single_body(&server).await;
    assert_eq!(body["kind"], "external_ref");
    assert_eq!(
        body["payload"],
        json!({
            "provider": "browser-use",
            "ref_type": "task",
            "ref_id": "task-123",
            "url": "https://example.com/tasks/task-123"
        })
    );
}

#[tokio::test]
async fn test_dispatch_db() {
    let (server, client) = setup_server(200).await;

    assert!(client.dispatch_db("Loaded users", "select", "users", Some(5), None).await);

    let body = single_body(&server).await;
    assert_eq!(body["kind"], "db");
    assert_eq!(body["payload"], json!({"operation": "select", "table": "users", "count": 5}));
}

#[derive(Serialize)]
struct UserProfile {
    name: String,
    email: String,
    password: String,
}

#[tokio::test]
async fn test_dispatch_model() {
    let (server, client) = setup_server(200).await;
    let profile = UserProfile {
        name: "Test".to_string(),
        email: "test@example.com".to_string(),
        password: "hunter2".to_string(),
    };

    assert!(client.dispatch_model("Extracted profile", &profile, Some("Raw user data")).await);

    let body = single_body(&server).await;
    assert_eq!(body["kind"], "model");
    assert_eq!(body["payload"]["model_name"], "UserProfile");
    assert_eq!(body["payload"]["input_summary"], "Raw user data");
    assert_eq!(body["payload"]["data"]["name"], "Test");
    assert_eq!(body["payload"]["data"]["email"], "test@example.com");
    assert_eq!(body["payload"]["data"]["password"], REDACTED_VALUE);
}

struct Unserializable;

impl Serialize for Unserializable {
    fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(serde::ser::Error::custom("cannot serialize"))
    }
}

#[tokio::test]
async fn test_unserializable_model_returns_false() {
    let (server, client) = setup_server(200).await;

    assert!(!client.dispatch_model("Broken", &Unserializable, None).await);
    assert!(sent_bodies(&server).await.is_empty());
}

#[tokio::test]
async fn test_invalid_fields_return_false_without_sending() {
    let (server, client) = setup_server(200).await;

    assert!(!client.dispatch(DispatchKind::Custom(String::new()), "Empty kind", None).await);
    let long_source = DispatchOptions::default().source("s".repeat(33));
    assert!(!client.dispatch_with("text", "Long source", None, long_source).await);
    assert!(sent_bodies(&server).await.is_empty());
}

#[tokio::test]
async fn test_server_error_returns_false_for_every_method() {
    let (server, client) = setup_server(500).await;

    assert!(!client.dispatch("text", "Test", None).await);
    assert!(!client.dispatch_text("Test", Some("t")).await);
    assert!(!client.dispatch_json("Test", json!({"a": 1})).await);
    assert!(!client.dispatch_api_call("Test", "svc", "op", Map::new()).await);
    assert!(!client.dispatch_external_ref("Test", "p", "task", "1", None).await);
    assert!(!client.dispatch_db("Test", "select", "users", None, Some("SELECT 1")).await);
    assert!(!client.dispatch_model("Test", &json!({"a": 1}), None).await);

    // Every call still reached the server exactly once
    assert_eq!(sent_bodies(&server).await.len(), 7);
}

#[tokio::test]
async fn test_timeout_returns_false() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;
    let config = ClientConfig::builder(ClientKind::Dispatch)
        .endpoint(server.uri())
        .token("token")
        .ticket_uuid("ticket")
        .run_uuid("run")
        .timeout_ms(50)
        .build()
        .unwrap();
    let client = DispatchClient::new(config);

    assert!(!client.dispatch("text", "Slow", None).await);
    assert!(!client.dispatch_text("Slow", Some("t")).await);
    assert!(!client.dispatch_json("Slow", json!({"a": 1})).await);
    assert!(!client.dispatch_api_call("Slow", "svc", "op", Map::new()).await);
    assert!(!client.dispatch_external_ref("Slow", "p", "task", "1", None).await);
    assert!(!client.dispatch_db("Slow", "select", "users", Some(1), None).await);
    assert!(!client.dispatch_model("Slow", &json!({"a": 1}), None).await);
}

#[tokio::test]
async fn test_connection_refused_returns_false() {
    init_tracing();
    // Grab a free port and release it so nothing is listening there
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let client = DispatchClient::new(test_config(&format!("http://127.0.0.1:{port}/dispatch")));

    assert!(!client.dispatch("json", "Unreachable", None).await);
    assert!(!client.dispatch_text("Unreachable", None).await);
    assert!(!client.dispatch_json("Unreachable", json!({})).await);
    assert!(!client.dispatch_api_call("Unreachable", "svc", "op", Map::new()).await);
    assert!(!client.dispatch_external_ref("Unreachable", "p", "task", "1", None).await);
    assert!(!client.dispatch_db("Unreachable", "insert", "users", None, None).await);
    assert!(!client.dispatch_model("Unreachable", &json!({"a": 1}), None).await);
}

#[tokio::test]
async fn test_invalid_endpoint_returns_false() {
    let client = DispatchClient::new(test_config("not a url"));

    assert!(client.enabled());
    assert!(!client.dispatch_text("Nowhere", None).await);
}

#[tokio::test]
async fn test_incomplete_env_never_touches_network() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let url = server.uri();
    let env = HashMap::from([
        ("FULCRUM_DISPATCH_URL", url.as_str()),
        ("FULCRUM_RUN_TOKEN", "token"),
        ("FULCRUM_RUN_UUID", "run"),
        ("FULCRUM_DISPATCH_DEBUG", "1"),
    ]);

    let client = DispatchClient::from_env_source(&env);

    assert!(!client.enabled());
    assert!(!client.dispatch_text("Test", None).await);
    assert!(!client.dispatch_json("Test", json!({"a": 1})).await);
    assert!(!client.dispatch_db("Test", "select", "users", Some(1), None).await);
}

#[tokio::test]
async fn test_client_is_shareable_across_tasks() {
    let (server, client) = setup_server(200).await;

    let handles: Vec<_> = (0..5)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move { client.dispatch_text(&format!("step {i}"), None).await })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap());
    }
    assert_eq!(sent_bodies(&server).await.len(), 5);
}
