//! End-to-end tests for the HTTP + SSE transport.
//!
//! Each test binds a server on an ephemeral port and talks to it over real
//! HTTP with reqwest.

use pmcp::server::builder::ServerCoreBuilder;
use pmcp::TypedTool;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use server_common::transport::sse::SseServer;
use server_common::McpHandler;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Debug, Deserialize, JsonSchema)]
struct EchoInput {
    message: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct HoldInput {}

/// Lets a test pause the `hold` tool mid-call.
#[derive(Default)]
struct Gate {
    entered: Notify,
    release: Notify,
}

async fn start_server() -> (String, Arc<Gate>) {
    let gate = Arc::new(Gate::default());
    let held = gate.clone();

    let server = ServerCoreBuilder::new()
        .name("sse-test")
        .version("0.0.1")
        .tool(
            "echo",
            TypedTool::new("echo", |input: EchoInput, _extra| {
                Box::pin(async move { Ok::<_, pmcp::Error>(json!({ "echo": input.message })) })
            }),
        )
        .tool(
            "hold",
            TypedTool::new("hold", move |_input: HoldInput, _extra| {
                let gate = held.clone();
                Box::pin(async move {
                    gate.entered.notify_one();
                    gate.release.notified().await;
                    Ok::<_, pmcp::Error>(json!({ "released": true }))
                })
            }),
        )
        .build()
        .expect("server builds");

    let addr = "127.0.0.1:0".parse().unwrap();
    let (bound, _handle) = SseServer::new(addr, McpHandler::new(Arc::new(server)))
        .start()
        .await
        .expect("server starts");
    (format!("http://{}", bound), gate)
}

#[derive(Debug)]
struct SseFrame {
    event: String,
    data: String,
}

/// Minimal SSE reader over a streaming reqwest response.
struct SseClient {
    response: reqwest::Response,
    buffer: String,
}

impl SseClient {
    async fn connect(base: &str) -> Self {
        let response = reqwest::get(format!("{}/sse", base))
            .await
            .expect("GET /sse");
        assert_eq!(response.status(), 200);
        Self {
            response,
            buffer: String::new(),
        }
    }

    /// Next non-comment frame, or `None` once the stream ends or stalls.
    async fn next_frame(&mut self) -> Option<SseFrame> {
        loop {
            if let Some(pos) = self.buffer.find("\n\n") {
                let raw: String = self.buffer.drain(..pos + 2).collect();
                let mut frame = SseFrame {
                    event: String::new(),
                    data: String::new(),
                };
                for line in raw.lines() {
                    if let Some(event) = line.strip_prefix("event:") {
                        frame.event = event.trim().to_string();
                    } else if let Some(data) = line.strip_prefix("data:") {
                        frame.data.push_str(data.trim_start());
                    }
                }
                if frame.event.is_empty() && frame.data.is_empty() {
                    continue; // keep-alive comment
                }
                return Some(frame);
            }

            match tokio::time::timeout(Duration::from_secs(5), self.response.chunk()).await {
                Ok(Ok(Some(bytes))) => self.buffer.push_str(&String::from_utf8_lossy(&bytes)),
                _ => return None,
            }
        }
    }

    async fn endpoint(&mut self) -> String {
        let frame = self.next_frame().await.expect("endpoint event");
        assert_eq!(frame.event, "endpoint");
        frame.data
    }
}

async fn post(base: &str, path: &str, body: &Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{}{}", base, path))
        .json(body)
        .send()
        .await
        .expect("POST")
}

fn initialize_request(id: u64) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "initialize",
        "params": {
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": {"name": "sse-test-client", "version": "0.0.1"}
        }
    })
}

/// Run the initialize exchange on an open stream.
async fn initialize(base: &str, endpoint: &str, client: &mut SseClient) {
    let response = post(base, endpoint, &initialize_request(0)).await;
    assert_eq!(response.status(), 202);
    let frame = client.next_frame().await.expect("initialize reply");
    let reply: Value = serde_json::from_str(&frame.data).unwrap();
    assert_eq!(reply["result"]["serverInfo"]["name"], "sse-test");
}

async fn active_session(base: &str) -> Value {
    let health: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["server"], "sse-test");
    health["session"].clone()
}

#[tokio::test]
async fn test_post_without_session_is_rejected() {
    let (base, _) = start_server().await;

    let response = post(
        &base,
        "/messages",
        &json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}),
    )
    .await;

    assert_eq!(response.status(), 400);
    assert_eq!(response.text().await.unwrap(), "No active session");
    assert!(active_session(&base).await.is_null());
}

#[tokio::test]
async fn test_request_reply_over_stream() {
    let (base, _) = start_server().await;
    let mut client = SseClient::connect(&base).await;
    let endpoint = client.endpoint().await;
    assert!(endpoint.starts_with("/messages?sessionId="));
    initialize(&base, &endpoint, &mut client).await;

    let response = post(
        &base,
        &endpoint,
        &json!({
            "jsonrpc": "2.0",
            "id": 7,
            "method": "tools/call",
            "params": {"name": "echo", "arguments": {"message": "over the wire"}}
        }),
    )
    .await;
    assert_eq!(response.status(), 202);

    let frame = client.next_frame().await.expect("reply event");
    assert_eq!(frame.event, "message");
    let reply: Value = serde_json::from_str(&frame.data).unwrap();
    assert_eq!(reply["id"], 7);
    let text = reply["result"]["content"][0]["text"].as_str().unwrap();
    let body: Value = serde_json::from_str(text).unwrap();
    assert_eq!(body["echo"], "over the wire");
}

#[tokio::test]
async fn test_new_stream_supersedes_old() {
    let (base, _) = start_server().await;

    let mut first = SseClient::connect(&base).await;
    let _ = first.endpoint().await;

    let mut second = SseClient::connect(&base).await;
    let second_endpoint = second.endpoint().await;

    // The superseded stream is closed by the server
    assert!(first.next_frame().await.is_none());

    let active = active_session(&base).await;
    assert!(second_endpoint.ends_with(active.as_str().expect("active session")));

    let response = post(
        &base,
        &second_endpoint,
        &json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}),
    )
    .await;
    assert_eq!(response.status(), 202);

    let frame = second.next_frame().await.expect("reply on new stream");
    let reply: Value = serde_json::from_str(&frame.data).unwrap();
    assert_eq!(reply["id"], 1);
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let (base, _) = start_server().await;
    let mut client = SseClient::connect(&base).await;
    let endpoint = client.endpoint().await;

    let response = reqwest::Client::new()
        .post(format!("{}{}", base, endpoint))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_notification_produces_no_event() {
    let (base, _) = start_server().await;
    let mut client = SseClient::connect(&base).await;
    let endpoint = client.endpoint().await;

    let response = post(
        &base,
        &endpoint,
        &json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
    )
    .await;
    assert_eq!(response.status(), 202);

    // The next event on the stream answers the following request, not the
    // notification
    post(
        &base,
        &endpoint,
        &json!({"jsonrpc": "2.0", "id": 9, "method": "ping"}),
    )
    .await;
    let frame = client.next_frame().await.expect("ping reply");
    let reply: Value = serde_json::from_str(&frame.data).unwrap();
    assert_eq!(reply["id"], 9);
}

#[tokio::test]
async fn test_reply_for_superseded_stream_fails_the_post() {
    let (base, gate) = start_server().await;
    let mut first = SseClient::connect(&base).await;
    let first_endpoint = first.endpoint().await;
    initialize(&base, &first_endpoint, &mut first).await;

    let in_flight = tokio::spawn({
        let base = base.clone();
        async move {
            post(
                &base,
                &first_endpoint,
                &json!({
                    "jsonrpc": "2.0",
                    "id": 3,
                    "method": "tools/call",
                    "params": {"name": "hold", "arguments": {}}
                }),
            )
            .await
            .status()
        }
    });

    // The tool call is running against the first stream when a second opens
    gate.entered.notified().await;
    let mut second = SseClient::connect(&base).await;
    let second_endpoint = second.endpoint().await;
    gate.release.notify_one();

    assert_eq!(in_flight.await.unwrap(), 500);

    let active = active_session(&base).await;
    assert!(second_endpoint.ends_with(active.as_str().expect("second stream still active")));

    // The new stream keeps working and never saw the late reply
    let response = post(
        &base,
        &second_endpoint,
        &json!({"jsonrpc": "2.0", "id": 4, "method": "tools/list"}),
    )
    .await;
    assert_eq!(response.status(), 202);
    let frame = second.next_frame().await.expect("tools/list reply");
    let reply: Value = serde_json::from_str(&frame.data).unwrap();
    assert_eq!(reply["id"], 4);
    assert_eq!(reply["result"]["tools"].as_array().map(Vec::len), Some(2));
}
