//! HTTP + Server-Sent Events transport.
//!
//! - `GET /sse` opens a stream and makes it the active session. The first
//!   event is `endpoint`, naming the URL to POST follow-up messages to.
//! - `POST /messages` delivers one JSON-RPC message to the active session.
//!   Replies are written to the stream as `message` events; the POST itself
//!   answers `202 Accepted`.
//! - `GET /health` reports the current session state.

use crate::handler::McpHandler;
use crate::session::{
    SessionError, SessionEvent, SessionId, SessionManager, SessionSink, SessionStatus,
};
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub const SSE_PATH: &str = "/sse";
pub const MESSAGES_PATH: &str = "/messages";

/// Events buffered per stream before a slow peer counts as a transport error.
pub const STREAM_BUFFER: usize = 64;

#[derive(Clone)]
struct SseState {
    manager: Arc<SessionManager>,
    server_name: String,
}

#[derive(Debug, Deserialize)]
struct MessageParams {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

/// Write half of one SSE stream.
struct SseSink {
    tx: Mutex<Option<mpsc::Sender<Event>>>,
}

impl SseSink {
    fn new(tx: mpsc::Sender<Event>) -> Self {
        Self {
            tx: Mutex::new(Some(tx)),
        }
    }

    fn push(&self, event: Event) -> Result<(), SessionError> {
        let guard = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        let tx = guard
            .as_ref()
            .ok_or_else(|| SessionError::Transport("stream already closed".to_string()))?;
        tx.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => SessionError::Transport("stream buffer full".to_string()),
            TrySendError::Closed(_) => SessionError::Transport("peer disconnected".to_string()),
        })
    }
}

impl SessionSink for SseSink {
    fn send(&self, message: &Value) -> Result<(), SessionError> {
        let data = serde_json::to_string(message)
            .map_err(|e| SessionError::Transport(format!("unserializable message: {}", e)))?;
        self.push(Event::default().event("message").data(data))
    }

    fn close(&self) -> Result<(), SessionError> {
        // Dropping the sender ends the response stream once it drains
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }
}

/// Response body of one session. Dropping it (peer gone, stream ended)
/// reports `SessionEvent::Closed` for its id.
struct SessionStream {
    inner: ReceiverStream<Event>,
    id: SessionId,
    manager: Arc<SessionManager>,
}

impl Stream for SessionStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner)
            .poll_next(cx)
            .map(|event| event.map(Ok))
    }
}

impl Drop for SessionStream {
    fn drop(&mut self) {
        self.manager
            .handle_event(SessionEvent::Closed { id: self.id });
    }
}

fn endpoint_event(id: SessionId) -> Event {
    Event::default()
        .event("endpoint")
        .data(format!("{}?sessionId={}", MESSAGES_PATH, id))
}

async fn open_stream(State(state): State<SseState>) -> Sse<SessionStream> {
    let (tx, rx) = mpsc::channel(STREAM_BUFFER);
    let sink = Arc::new(SseSink::new(tx));
    let id = state.manager.accept(sink.clone());

    if let Err(e) = sink.push(endpoint_event(id)) {
        tracing::debug!(session = %id, error = %e, "Session superseded before endpoint was sent");
    }

    Sse::new(SessionStream {
        inner: ReceiverStream::new(rx),
        id,
        manager: state.manager.clone(),
    })
    .keep_alive(KeepAlive::default())
}

async fn post_message(
    State(state): State<SseState>,
    Query(params): Query<MessageParams>,
    body: Bytes,
) -> Response {
    let message: Value = match serde_json::from_slice(&body) {
        Ok(message) => message,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, format!("Invalid JSON: {}", e)).into_response();
        }
    };

    if let (Some(requested), SessionStatus::Active(active)) =
        (params.session_id.as_deref(), state.manager.status())
    {
        if requested != active.to_string() {
            tracing::info!(requested, active = %active, "Message names a superseded session; routing to the active one");
        }
    }

    match state.manager.route(message).await {
        Ok(_) => (StatusCode::ACCEPTED, "Accepted").into_response(),
        Err(e @ SessionError::NoActiveSession) => {
            tracing::warn!("Message received with no active session");
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn health(State(state): State<SseState>) -> Json<Value> {
    let session = match state.manager.status() {
        SessionStatus::Active(id) => Value::String(id.to_string()),
        SessionStatus::Idle => Value::Null,
    };
    Json(json!({
        "status": "ok",
        "server": state.server_name,
        "session": session,
    }))
}

/// MCP server over HTTP + SSE with a single active session.
pub struct SseServer {
    addr: SocketAddr,
    manager: Arc<SessionManager>,
    server_name: String,
}

impl SseServer {
    pub fn new(addr: SocketAddr, handler: McpHandler) -> Self {
        let server_name = handler.server_name().to_string();
        Self {
            addr,
            manager: Arc::new(SessionManager::new(Arc::new(handler))),
            server_name,
        }
    }

    pub fn manager(&self) -> Arc<SessionManager> {
        self.manager.clone()
    }

    pub fn router(&self) -> Router {
        let state = SseState {
            manager: self.manager.clone(),
            server_name: self.server_name.clone(),
        };

        Router::new()
            .route(SSE_PATH, get(open_stream))
            .route(MESSAGES_PATH, post(post_message))
            .route("/health", get(health))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Bind and serve in the background. Returns the bound address.
    pub async fn start(self) -> std::io::Result<(SocketAddr, JoinHandle<std::io::Result<()>>)> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        let bound = listener.local_addr()?;
        let app = self.router();

        let handle = tokio::spawn(async move { axum::serve(listener, app).await });

        Ok((bound, handle))
    }
}
