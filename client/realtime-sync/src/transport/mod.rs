//! Message-oriented channel to the realtime server
//!
//! The connection state machine only needs ordered frames, a way to probe
//! liveness, and a distinguishable credential failure. Wire framing stays
//! behind [`Transport`] so tests can script sessions in memory.

pub mod websocket;

use crate::auth::AccessToken;
use crate::error::TransportError;
use crate::models::EventKind;
use async_trait::async_trait;
use serde_json::Value;
use url::Url;

pub use websocket::WebSocketTransport;

/// Event body exactly as the server framed it
#[derive(Debug, Clone, PartialEq)]
pub struct WireEvent {
    pub sequence_id: u64,
    pub kind: EventKind,
    pub payload: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Event(WireEvent),
    /// Server probe; sessions answer it themselves
    Ping,
    Pong,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn connect(
        &self,
        endpoint: &Url,
        token: &AccessToken,
    ) -> Result<Box<dyn TransportSession>, TransportError>;
}

#[async_trait]
pub trait TransportSession: Send {
    /// Next inbound frame, `None` once the server closed the session
    ///
    /// Must be cancel safe: the connection task polls it inside `select!`.
    async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>>;

    async fn send_ping(&mut self) -> Result<(), TransportError>;

    /// Best-effort graceful close
    async fn close(&mut self);
}
