//! HTTP transport carrying JSON-RPC messages to an [`crate::handler::McpHandler`].
//!
//! stdio is served by pmcp's own adapter; see [`crate::run`].

pub mod sse;
