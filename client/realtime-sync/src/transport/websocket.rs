use super::{Frame, Transport, TransportSession, WireEvent};
use crate::auth::AccessToken;
use crate::error::TransportError;
use crate::models::{ClientMessage, ServerMessage};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use secrecy::ExposeSecret;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};
use url::Url;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// JSON-over-WebSocket transport
#[derive(Debug, Clone, Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn connect(
        &self,
        endpoint: &Url,
        token: &AccessToken,
    ) -> Result<Box<dyn TransportSession>, TransportError> {
        let mut request = endpoint
            .as_str()
            .into_client_request()
            .map_err(|e| TransportError::Protocol(format!("invalid request: {}", e)))?;

        let bearer = HeaderValue::from_str(&format!("Bearer {}", token.secret.expose_secret()))
            .map_err(|_| TransportError::Protocol("token is not a valid header value".into()))?;
        request.headers_mut().insert(AUTHORIZATION, bearer);

        match tokio_tungstenite::connect_async(request).await {
            Ok((stream, _)) => {
                debug!(endpoint = %endpoint, "WebSocket handshake complete");
                Ok(Box::new(WebSocketSession {
                    stream,
                    pending_pong: false,
                }))
            }
            Err(WsError::Http(response)) => {
                let status = response.status();
                match status.as_u16() {
                    401 | 403 => Err(TransportError::Unauthorized(format!(
                        "handshake rejected with {}",
                        status
                    ))),
                    code => Err(TransportError::Protocol(format!(
                        "handshake failed with HTTP {}",
                        code
                    ))),
                }
            }
            Err(e) => Err(map_ws_error(e)),
        }
    }
}

pub struct WebSocketSession {
    stream: WsStream,
    /// Application ping received but not yet answered
    pending_pong: bool,
}

impl WebSocketSession {
    async fn send(&mut self, message: ClientMessage) -> Result<(), TransportError> {
        let payload = message
            .to_json()
            .map_err(|e| TransportError::Protocol(e.to_string()))?;

        self.stream
            .send(Message::Text(payload.into()))
            .await
            .map_err(map_ws_error)
    }
}

#[async_trait]
impl TransportSession for WebSocketSession {
    async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>> {
        // Answered here, not when the ping arrives, so a cancelled call never
        // drops a frame that was already read
        if self.pending_pong {
            if let Err(e) = self.send(ClientMessage::pong()).await {
                return Some(Err(e));
            }
            self.pending_pong = false;
        }

        loop {
            let message = match self.stream.next().await? {
                Ok(message) => message,
                Err(e) => return Some(Err(map_ws_error(e))),
            };

            match message {
                Message::Text(text) => match ServerMessage::from_json(&text) {
                    Ok(ServerMessage::Event {
                        sequence_id,
                        kind,
                        payload,
                    }) => {
                        return Some(Ok(Frame::Event(WireEvent {
                            sequence_id,
                            kind,
                            payload,
                        })))
                    }
                    Ok(ServerMessage::Ping { .. }) => {
                        self.pending_pong = true;
                        return Some(Ok(Frame::Ping));
                    }
                    Ok(ServerMessage::Pong { .. }) => return Some(Ok(Frame::Pong)),
                    Ok(ServerMessage::AuthError { message }) => {
                        return Some(Err(TransportError::Unauthorized(message)))
                    }
                    Err(e) => {
                        warn!(error = %e, "Skipping unparseable server frame");
                    }
                },
                // tungstenite queues the pong reply itself
                Message::Ping(_) => return Some(Ok(Frame::Ping)),
                Message::Pong(_) => return Some(Ok(Frame::Pong)),
                Message::Close(frame) => {
                    debug!(?frame, "Server closed WebSocket");
                    return None;
                }
                Message::Binary(_) => {
                    warn!("Ignoring binary frame");
                }
                Message::Frame(_) => {}
            }
        }
    }

    async fn send_ping(&mut self) -> Result<(), TransportError> {
        self.send(ClientMessage::ping()).await
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            debug!(error = %e, "WebSocket close failed");
        }
    }
}

fn map_ws_error(e: WsError) -> TransportError {
    match e {
        WsError::ConnectionClosed | WsError::AlreadyClosed => TransportError::Closed,
        WsError::Io(io) => TransportError::Io(io.to_string()),
        other => TransportError::Protocol(other.to_string()),
    }
}
