use super::{Command, ConnectionConfig, Handlers};
use crate::auth::TokenSupplier;
use crate::error::{TokenError, TransportError};
use crate::metrics::ConnectionMetrics;
use crate::models::{ConnectionState, ConnectionStatus, DisconnectCause, InboundEvent};
use crate::transport::{Frame, Transport, TransportSession};
use chrono::{DateTime, Utc};
use resilience::{Backoff, HeartbeatAction, HeartbeatMonitor};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

/// Stand-in deadline for disabled timers
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365);

enum Step {
    Idle,
    Connect,
    Open {
        session: Box<dyn TransportSession>,
        refresh: Option<Refresh>,
    },
    Reconnect {
        cause: DisconnectCause,
        /// Fixed delay instead of the backoff schedule
        delay: Option<Duration>,
    },
    Suspended,
    Close,
}

enum ConnectFailure {
    Token(TokenError),
    Transport(TransportError),
}

/// Scheduled reconnect with a fresh token
#[derive(Clone, Copy)]
struct Refresh {
    at: Instant,
    /// `None` follows the backoff schedule
    delay: Option<Duration>,
}

struct Established {
    session: Box<dyn TransportSession>,
    expires_at: DateTime<Utc>,
}

pub(super) struct ConnectionTask {
    id: Uuid,
    config: ConnectionConfig,
    tokens: Arc<dyn TokenSupplier>,
    transport: Arc<dyn Transport>,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    state_tx: watch::Sender<ConnectionState>,
    handlers: Arc<Handlers>,
    backoff: Backoff,
    state: ConnectionState,
    close_acks: Vec<oneshot::Sender<()>>,
}

impl ConnectionTask {
    pub(super) fn new(
        id: Uuid,
        config: ConnectionConfig,
        tokens: Arc<dyn TokenSupplier>,
        transport: Arc<dyn Transport>,
        cmd_rx: mpsc::UnboundedReceiver<Command>,
        state_tx: watch::Sender<ConnectionState>,
        handlers: Arc<Handlers>,
    ) -> Self {
        let backoff = Backoff::new(config.backoff.clone());
        Self {
            id,
            config,
            tokens,
            transport,
            cmd_rx,
            state_tx,
            handlers,
            backoff,
            state: ConnectionState::Idle,
            close_acks: Vec::new(),
        }
    }

    pub(super) async fn run(mut self) {
        let mut step = Step::Idle;

        loop {
            step = match step {
                Step::Idle => self.idle().await,
                Step::Connect => self.connect().await,
                Step::Open { session, refresh } => self.open(session, refresh).await,
                Step::Reconnect { cause, delay } => self.reconnect(cause, delay).await,
                Step::Suspended => self.suspended().await,
                Step::Close => break,
            };
        }

        self.finish();
    }

    async fn idle(&mut self) -> Step {
        loop {
            match self.cmd_rx.recv().await {
                Some(Command::Open) => return Step::Connect,
                Some(Command::Suspend) => return self.enter_suspended(),
                Some(Command::Resume) => debug!(client_id = %self.id, "Resume ignored while idle"),
                Some(Command::Close(ack)) => return self.enter_close(Some(ack)),
                None => return self.enter_close(None),
            }
        }
    }

    async fn connect(&mut self) -> Step {
        let attempt = self.backoff.attempt();
        self.transition(ConnectionStatus::Connecting { attempt });

        let establishing = establish(
            Arc::clone(&self.transport),
            Arc::clone(&self.tokens),
            self.config.endpoint.clone(),
            self.config.connect_timeout,
        );
        tokio::pin!(establishing);

        loop {
            tokio::select! {
                biased;

                // Dropping `establishing` abandons the in-flight handshake
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(Command::Suspend) => return self.enter_suspended(),
                    Some(Command::Close(ack)) => return self.enter_close(Some(ack)),
                    None => return self.enter_close(None),
                    Some(Command::Open | Command::Resume) => {}
                },

                result = &mut establishing => {
                    return match result {
                        Ok(established) => self.enter_open(established),
                        Err(ConnectFailure::Token(e)) if e.is_fatal() => {
                            self.enter_auth_required(e.to_string())
                        }
                        Err(ConnectFailure::Token(e)) => {
                            warn!(client_id = %self.id, error = %e, "Token unavailable");
                            Step::Reconnect { cause: DisconnectCause::TokenUnavailable, delay: None }
                        }
                        Err(ConnectFailure::Transport(e)) if e.is_fatal() => {
                            self.enter_auth_required(e.to_string())
                        }
                        Err(ConnectFailure::Transport(e)) => {
                            warn!(client_id = %self.id, attempt, error = %e, "Connect failed");
                            Step::Reconnect { cause: DisconnectCause::ConnectFailed, delay: None }
                        }
                    };
                }
            }
        }
    }

    async fn open(
        &mut self,
        mut session: Box<dyn TransportSession>,
        refresh: Option<Refresh>,
    ) -> Step {
        let mut heartbeat = HeartbeatMonitor::new(
            self.config.heartbeat_interval,
            self.config.heartbeat_timeout,
            Instant::now(),
        );
        let mut last_sequence: Option<u64> = None;

        loop {
            let heartbeat_at = heartbeat.next_deadline();
            let refresh_at = refresh.map(|r| r.at);
            let far_future = Instant::now() + FAR_FUTURE;

            tokio::select! {
                biased;

                cmd = self.cmd_rx.recv() => match cmd {
                    Some(Command::Suspend) => {
                        session.close().await;
                        return self.enter_suspended();
                    }
                    Some(Command::Close(ack)) => {
                        session.close().await;
                        return self.enter_close(Some(ack));
                    }
                    None => {
                        session.close().await;
                        return self.enter_close(None);
                    }
                    Some(Command::Open | Command::Resume) => {}
                },

                frame = session.next_frame() => {
                    heartbeat.record_inbound(Instant::now());

                    match frame {
                        Some(Ok(Frame::Event(wire))) => {
                            if last_sequence.is_some_and(|last| wire.sequence_id <= last) {
                                debug!(
                                    client_id = %self.id,
                                    sequence_id = wire.sequence_id,
                                    last = ?last_sequence,
                                    "Non-increasing sequence id"
                                );
                            }
                            last_sequence = Some(wire.sequence_id);

                            let event = InboundEvent::new(wire.sequence_id, wire.kind, wire.payload);
                            self.handlers.emit_event(&event);
                        }
                        Some(Ok(Frame::Ping | Frame::Pong)) => {}
                        Some(Err(e)) if e.is_fatal() => {
                            session.close().await;
                            return self.enter_auth_required(e.to_string());
                        }
                        Some(Err(e)) => {
                            warn!(client_id = %self.id, error = %e, "Transport error");
                            return Step::Reconnect { cause: DisconnectCause::TransportError, delay: None };
                        }
                        None => {
                            info!(client_id = %self.id, "Server closed connection");
                            return Step::Reconnect { cause: DisconnectCause::ServerClosed, delay: None };
                        }
                    }
                },

                _ = tokio::time::sleep_until(heartbeat_at.unwrap_or(far_future)), if heartbeat_at.is_some() => {
                    let now = Instant::now();
                    match heartbeat.poll(now) {
                        HeartbeatAction::SendPing => {
                            if let Err(e) = session.send_ping().await {
                                warn!(client_id = %self.id, error = %e, "Heartbeat ping failed");
                                return Step::Reconnect { cause: DisconnectCause::TransportError, delay: None };
                            }
                            heartbeat.record_ping_sent(now);
                        }
                        HeartbeatAction::Expired => {
                            warn!(
                                client_id = %self.id,
                                timeout_ms = self.config.heartbeat_timeout.as_millis() as u64,
                                "Heartbeat timeout, server unresponsive"
                            );
                            ConnectionMetrics::record_heartbeat_timeout();
                            session.close().await;
                            return Step::Reconnect { cause: DisconnectCause::HeartbeatTimeout, delay: None };
                        }
                        HeartbeatAction::Idle => {}
                    }
                },

                _ = tokio::time::sleep_until(refresh_at.unwrap_or(far_future)), if refresh_at.is_some() => {
                    info!(client_id = %self.id, "Token nearing expiry, reconnecting with a fresh one");
                    session.close().await;
                    return Step::Reconnect {
                        cause: DisconnectCause::TokenRefresh,
                        delay: refresh.and_then(|r| r.delay),
                    };
                }
            }
        }
    }

    async fn reconnect(&mut self, cause: DisconnectCause, delay: Option<Duration>) -> Step {
        let (attempt, delay) = match delay {
            Some(delay) => (self.backoff.attempt(), delay),
            None => self.backoff.next_delay(),
        };

        ConnectionMetrics::record_reconnect_attempt();
        self.transition(ConnectionStatus::Reconnecting {
            attempt,
            delay,
            cause,
        });

        let timer = tokio::time::sleep(delay);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                biased;

                // Leaving this loop drops `timer`, so a cancelled retry never fires
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(Command::Suspend) => return self.enter_suspended(),
                    Some(Command::Close(ack)) => return self.enter_close(Some(ack)),
                    None => return self.enter_close(None),
                    Some(Command::Open | Command::Resume) => {}
                },

                _ = &mut timer => return Step::Connect,
            }
        }
    }

    async fn suspended(&mut self) -> Step {
        loop {
            match self.cmd_rx.recv().await {
                Some(Command::Resume) => {
                    self.backoff.reset();
                    return Step::Connect;
                }
                Some(Command::Suspend | Command::Open) => {}
                Some(Command::Close(ack)) => return self.enter_close(Some(ack)),
                None => return self.enter_close(None),
            }
        }
    }

    fn enter_open(&mut self, established: Established) -> Step {
        let remaining = (established.expires_at - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO);
        let short_lived = remaining < self.config.min_token_lifetime;

        if short_lived {
            warn!(
                client_id = %self.id,
                remaining_ms = remaining.as_millis() as u64,
                attempt = self.backoff.attempt(),
                "Token lifetime below minimum, keeping reconnect backoff"
            );
        } else {
            self.backoff.reset();
        }
        self.transition(ConnectionStatus::Open);

        Step::Open {
            session: established.session,
            refresh: self.refresh_schedule(remaining, short_lived),
        }
    }

    fn enter_suspended(&mut self) -> Step {
        self.transition(ConnectionStatus::Suspended);
        Step::Suspended
    }

    fn enter_close(&mut self, ack: Option<oneshot::Sender<()>>) -> Step {
        self.close_acks.extend(ack);
        Step::Close
    }

    fn enter_auth_required(&mut self, reason: String) -> Step {
        warn!(client_id = %self.id, reason = %reason, "Credential rejected, not retrying");
        self.transition(ConnectionStatus::AuthRequired { reason });
        Step::Close
    }

    /// When to reconnect with a fresh token
    ///
    /// Tokens shorter than twice `token_refresh_margin` refresh halfway
    /// through their lifetime. A healthy token reconnects immediately; one
    /// below `min_token_lifetime` waits out the next backoff delay. An already
    /// expired token gets no deadline; the server decides whether to accept it.
    fn refresh_schedule(&self, remaining: Duration, short_lived: bool) -> Option<Refresh> {
        if remaining.is_zero() {
            return None;
        }

        let lead = self.config.token_refresh_margin.min(remaining / 2);
        Some(Refresh {
            at: Instant::now() + (remaining - lead),
            delay: (!short_lived).then_some(Duration::ZERO),
        })
    }

    fn finish(&mut self) {
        if self.state != ConnectionState::Closed {
            self.transition(ConnectionStatus::Closed);
        }

        for ack in self.close_acks.drain(..) {
            let _ = ack.send(());
        }

        debug!(client_id = %self.id, "Connection task exited");
    }

    fn transition(&mut self, status: ConnectionStatus) {
        let from = self.state;
        let to = status.state();

        self.state = to;
        self.state_tx.send_replace(to);
        ConnectionMetrics::record_transition(from.as_str(), to.as_str());

        match &status {
            ConnectionStatus::Reconnecting {
                attempt,
                delay,
                cause,
            } => info!(
                client_id = %self.id,
                from = %from,
                attempt,
                delay_ms = delay.as_millis() as u64,
                cause = %cause,
                "Connection lost, reconnect scheduled"
            ),
            _ => info!(client_id = %self.id, from = %from, to = %to, "Connection state changed"),
        }

        self.handlers.emit_status(&status);
    }
}

async fn establish(
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenSupplier>,
    endpoint: Url,
    connect_timeout: Duration,
) -> Result<Established, ConnectFailure> {
    let token = tokens.get_token().await.map_err(ConnectFailure::Token)?;

    let session = match tokio::time::timeout(connect_timeout, transport.connect(&endpoint, &token)).await
    {
        Ok(Ok(session)) => session,
        Ok(Err(e)) => return Err(ConnectFailure::Transport(e)),
        Err(_) => return Err(ConnectFailure::Transport(TransportError::Timeout(connect_timeout))),
    };

    debug!(endpoint = %endpoint, expires_at = %token.expires_at, "Session established");

    Ok(Established {
        session,
        expires_at: token.expires_at,
    })
}
