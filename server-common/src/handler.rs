//! Bridges raw JSON-RPC messages from a session into a pmcp protocol handler.
//!
//! The SSE transport hands each POSTed message to [`McpHandler`], which parses
//! it with pmcp's helpers and lets the server core answer it. Notifications and
//! client responses produce no reply.

use crate::session::MessageHandler;
use async_trait::async_trait;
use pmcp::server::core::ProtocolHandler;
use pmcp::types::{JSONRPCError, JSONRPCRequest, JSONRPCResponse};
use pmcp::ErrorCode;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Clone)]
pub struct McpHandler {
    protocol: Arc<dyn ProtocolHandler>,
}

impl McpHandler {
    pub fn new(protocol: Arc<dyn ProtocolHandler>) -> Self {
        Self { protocol }
    }

    pub fn server_name(&self) -> &str {
        &self.protocol.info().name
    }

    async fn handle_request(&self, request: JSONRPCRequest<Value>) -> JSONRPCResponse {
        let id = request.id.clone();
        let method = request.method.clone();

        match pmcp::shared::parse_request(request) {
            Ok((id, request)) => {
                tracing::debug!(%id, %method, "Dispatching request");
                self.protocol.handle_request(id, request, None).await
            }
            Err(e) => {
                tracing::warn!(%method, error = %e, "Rejecting request");
                let code = e.error_code().unwrap_or(ErrorCode::INVALID_REQUEST);
                JSONRPCResponse::error(id, JSONRPCError::new(code.as_i32(), e.to_string()))
            }
        }
    }
}

#[async_trait]
impl MessageHandler for McpHandler {
    async fn handle(&self, message: Value) -> anyhow::Result<Option<Value>> {
        if message.get("method").is_none() {
            tracing::debug!("Ignoring client response: {}", message);
            return Ok(None);
        }

        if message.get("id").is_none() {
            match pmcp::shared::parse_notification(message) {
                Ok(notification) => self.protocol.handle_notification(notification).await?,
                Err(e) => tracing::warn!(error = %e, "Dropping malformed notification"),
            }
            return Ok(None);
        }

        let id = message.get("id").cloned().unwrap_or(Value::Null);
        let request: JSONRPCRequest<Value> = match serde_json::from_value(message) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid JSON-RPC request");
                return Ok(Some(json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": {
                        "code": ErrorCode::INVALID_REQUEST.as_i32(),
                        "message": format!("Invalid request: {}", e),
                    }
                })));
            }
        };

        let response = self.handle_request(request).await;
        Ok(Some(serde_json::to_value(response)?))
    }
}
