//! Single-active-session transport manager.
//!
//! The HTTP transport keeps exactly zero or one live streaming session. A new
//! inbound stream supersedes the current one: the old sink is closed before
//! the new session is installed, so two output streams never coexist.
//! Follow-up messages always go to whichever session is current.
//!
//! Close and error notifications arrive as [`SessionEvent`]s carrying the
//! session id. An event only clears the slot when its id still names the
//! active session; events from superseded sessions are no-ops.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("No active session")]
    NoActiveSession,

    #[error("Failed to close session: {0}")]
    CloseFailure(String),

    #[error("Session transport error: {0}")]
    Transport(String),

    #[error("Message handling failed: {0}")]
    Handler(String),
}

/// Output side of one streaming connection.
///
/// `close` must not call back into the [`SessionManager`]; it is invoked
/// while the manager holds its slot lock.
pub trait SessionSink: Send + Sync {
    fn send(&self, message: &Value) -> Result<(), SessionError>;

    fn close(&self) -> Result<(), SessionError>;
}

/// Processes one inbound message, optionally producing a reply.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: Value) -> anyhow::Result<Option<Value>>;
}

/// Lifecycle notification raised by a session's transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The peer disconnected or the stream ended.
    Closed { id: SessionId },
    /// The stream failed; handled as an implicit close.
    TransportError { id: SessionId, error: String },
}

impl SessionEvent {
    pub fn session_id(&self) -> SessionId {
        match self {
            Self::Closed { id } | Self::TransportError { id, .. } => *id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Active(SessionId),
}

/// Outcome of a successfully routed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Routed {
    pub session: SessionId,
    /// Whether a reply was written to the session's sink.
    pub replied: bool,
}

struct ActiveSession {
    id: SessionId,
    sink: Arc<dyn SessionSink>,
}

pub struct SessionManager {
    slot: Mutex<Option<ActiveSession>>,
    handler: Arc<dyn MessageHandler>,
}

impl SessionManager {
    pub fn new(handler: Arc<dyn MessageHandler>) -> Self {
        Self {
            slot: Mutex::new(None),
            handler,
        }
    }

    // Transitions never panic while holding the lock, but recover anyway.
    fn lock_slot(&self) -> MutexGuard<'_, Option<ActiveSession>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> SessionStatus {
        match self.lock_slot().as_ref() {
            Some(active) => SessionStatus::Active(active.id),
            None => SessionStatus::Idle,
        }
    }

    /// Install `sink` as the active session, closing any previous one first.
    pub fn accept(&self, sink: Arc<dyn SessionSink>) -> SessionId {
        let id = SessionId::new();
        let mut slot = self.lock_slot();

        if let Some(previous) = slot.take() {
            tracing::info!(session = %previous.id, replacement = %id, "Superseding active session");
            if let Err(e) = previous.sink.close() {
                tracing::warn!(session = %previous.id, error = %e, "Failed to close superseded session");
            }
        }

        *slot = Some(ActiveSession { id, sink });
        tracing::info!(session = %id, "Session accepted");
        id
    }

    /// Deliver `message` to the active session's handler and write any reply
    /// onto its sink.
    pub async fn route(&self, message: Value) -> Result<Routed, SessionError> {
        let (id, sink) = {
            let slot = self.lock_slot();
            let active = slot.as_ref().ok_or(SessionError::NoActiveSession)?;
            (active.id, active.sink.clone())
        };

        let reply = self.handler.handle(message).await.map_err(|e| {
            tracing::error!(session = %id, error = %e, "Message handler failed");
            SessionError::Handler(e.to_string())
        })?;

        let Some(reply) = reply else {
            return Ok(Routed {
                session: id,
                replied: false,
            });
        };

        if let Err(e) = sink.send(&reply) {
            self.handle_event(SessionEvent::TransportError {
                id,
                error: e.to_string(),
            });
            return Err(e);
        }

        Ok(Routed {
            session: id,
            replied: true,
        })
    }

    /// Apply a close/error notification. Returns `true` if the active
    /// session was cleared.
    pub fn handle_event(&self, event: SessionEvent) -> bool {
        let mut slot = self.lock_slot();
        let id = event.session_id();

        if !matches!(slot.as_ref(), Some(active) if active.id == id) {
            tracing::debug!(session = %id, "Ignoring event for inactive session");
            return false;
        }

        let Some(active) = slot.take() else {
            return false;
        };

        match event {
            SessionEvent::Closed { .. } => {
                tracing::info!(session = %id, "Session closed");
            }
            SessionEvent::TransportError { error, .. } => {
                tracing::warn!(session = %id, error = %error, "Session transport error");
                if let Err(e) = active.sink.close() {
                    tracing::debug!(session = %id, error = %e, "Close after transport error failed");
                }
            }
        }

        true
    }

    /// Close the active session, if any. Used on shutdown.
    pub fn shutdown(&self) {
        if let Some(active) = self.lock_slot().take() {
            tracing::info!(session = %active.id, "Closing session for shutdown");
            if let Err(e) = active.sink.close() {
                tracing::warn!(session = %active.id, error = %e, "Failed to close session");
            }
        }
    }
}
