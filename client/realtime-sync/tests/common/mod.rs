//! Shared test harness: scripted in-memory transport and token supplier
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use realtime_sync::{
    AccessToken, ConnectionClient, ConnectionConfig, ConnectionState, ConnectionStatus, EventKind,
    Frame, TokenError, TokenSupplier, Transport, TransportError, TransportSession, WireEvent,
};
use resilience::BackoffPolicy;
use secrecy::SecretString;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;

/// Upper bound for any single wait in a test
pub const WAIT: Duration = Duration::from_secs(300);

/// Fast, deterministic settings: no jitter, heartbeats off
pub fn test_config() -> ConnectionConfig {
    ConnectionConfig {
        endpoint: Url::parse("ws://rewards.test/realtime").unwrap(),
        backoff: BackoffPolicy::new(Duration::from_millis(100), Duration::from_secs(1), 0.0),
        heartbeat_interval: Duration::ZERO,
        heartbeat_timeout: Duration::from_millis(500),
        connect_timeout: Duration::from_secs(1),
        token_refresh_margin: Duration::from_secs(60),
        min_token_lifetime: Duration::from_secs(1),
    }
}

// ── Transport ───────────────────────────────────────────────────────────────

enum ConnectOutcome {
    Fail(TransportError),
    Hang,
    Session(MockSession),
}

/// Transport whose `connect` calls pop pre-scripted outcomes in order
///
/// An empty script fails with a transient I/O error.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<ConnectOutcome>>,
    connects: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_next(&self, error: TransportError) {
        self.script
            .lock()
            .unwrap()
            .push_back(ConnectOutcome::Fail(error));
    }

    /// Next connect never completes
    pub fn hang_next(&self) {
        self.script.lock().unwrap().push_back(ConnectOutcome::Hang);
    }

    /// Next connect succeeds; the handle drives the resulting session
    pub fn session_next(&self) -> SessionHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let pings = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicBool::new(false));

        self.script
            .lock()
            .unwrap()
            .push_back(ConnectOutcome::Session(MockSession {
                frames: rx,
                pings: Arc::clone(&pings),
                closed: Arc::clone(&closed),
            }));

        SessionHandle {
            frames: tx,
            pings,
            closed,
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(
        &self,
        _endpoint: &Url,
        _token: &AccessToken,
    ) -> Result<Box<dyn TransportSession>, TransportError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let outcome = self.script.lock().unwrap().pop_front();

        match outcome {
            Some(ConnectOutcome::Session(session)) => Ok(Box::new(session)),
            Some(ConnectOutcome::Fail(error)) => Err(error),
            Some(ConnectOutcome::Hang) => std::future::pending().await,
            None => Err(TransportError::Io("connection refused".into())),
        }
    }
}

struct MockSession {
    frames: mpsc::UnboundedReceiver<Result<Frame, TransportError>>,
    pings: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl TransportSession for MockSession {
    async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>> {
        self.frames.recv().await
    }

    async fn send_ping(&mut self) -> Result<(), TransportError> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Server side of a scripted session. Dropping it closes the session.
pub struct SessionHandle {
    frames: mpsc::UnboundedSender<Result<Frame, TransportError>>,
    pings: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
}

impl SessionHandle {
    pub fn event(&self, sequence_id: u64, kind: &str, payload: Value) {
        let _ = self.frames.send(Ok(Frame::Event(WireEvent {
            sequence_id,
            kind: EventKind::from_wire(kind),
            payload,
        })));
    }

    pub fn pong(&self) {
        let _ = self.frames.send(Ok(Frame::Pong));
    }

    pub fn fail(&self, error: TransportError) {
        let _ = self.frames.send(Err(error));
    }

    pub fn pings_sent(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }

    /// Whether the client closed the session
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

// ── Tokens ──────────────────────────────────────────────────────────────────

/// Token supplier returning scripted results, then valid tokens of `ttl`
pub struct MockTokens {
    script: Mutex<VecDeque<TokenError>>,
    ttl: Duration,
    calls: AtomicUsize,
}

impl MockTokens {
    pub fn valid() -> Arc<Self> {
        Self::with_ttl(Duration::from_secs(3600))
    }

    pub fn with_ttl(ttl: Duration) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            ttl,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn fail_next(&self, error: TokenError) {
        self.script.lock().unwrap().push_back(error);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenSupplier for MockTokens {
    async fn get_token(&self) -> Result<AccessToken, TokenError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.script.lock().unwrap().pop_front() {
            return Err(error);
        }

        Ok(AccessToken::new(
            SecretString::from("test-token"),
            Utc::now() + chrono::Duration::from_std(self.ttl).unwrap(),
        ))
    }
}

// ── Observation helpers ─────────────────────────────────────────────────────

pub fn status_channel(client: &ConnectionClient) -> mpsc::UnboundedReceiver<ConnectionStatus> {
    let (tx, rx) = mpsc::unbounded_channel();
    client.on_status_change(move |status| {
        let _ = tx.send(status.clone());
    });
    rx
}

pub fn event_channel(client: &ConnectionClient) -> mpsc::UnboundedReceiver<u64> {
    let (tx, rx) = mpsc::unbounded_channel();
    client.on_event(move |event| {
        let _ = tx.send(event.sequence_id);
    });
    rx
}

/// Whether `from -> to` is an edge of the connection state machine
pub fn is_documented_edge(from: ConnectionState, to: ConnectionState) -> bool {
    use ConnectionState::*;

    matches!(
        (from, to),
        (Idle, Connecting)
            | (Connecting, Open)
            | (Connecting, Reconnecting)
            | (Open, Reconnecting)
            | (Reconnecting, Connecting)
            | (Suspended, Connecting)
            | (Idle | Connecting | Open | Reconnecting, Suspended)
            | (Idle | Connecting | Open | Reconnecting | Suspended, Closed)
    )
}

/// Every `(from, to)` state change a client reported
///
/// Dropping the log asserts that each change followed a documented edge.
pub struct TransitionLog {
    edges: Arc<Mutex<Vec<(ConnectionState, ConnectionState)>>>,
}

impl TransitionLog {
    pub fn edges(&self) -> Vec<(ConnectionState, ConnectionState)> {
        self.edges.lock().unwrap().clone()
    }

    pub fn assert_documented(&self) {
        for (from, to) in self.edges() {
            assert!(
                is_documented_edge(from, to),
                "undocumented transition {:?} -> {:?}",
                from,
                to
            );
        }
    }
}

impl Drop for TransitionLog {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            self.assert_documented();
        }
    }
}

pub fn record_transitions(client: &ConnectionClient) -> TransitionLog {
    let edges = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&edges);
    let current = Mutex::new(client.state());

    client.on_status_change(move |status| {
        let to = status.state();
        let mut from = current.lock().unwrap();
        sink.lock().unwrap().push((*from, to));
        *from = to;
    });

    TransitionLog { edges }
}

pub async fn next<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for message")
        .expect("channel closed")
}

pub async fn wait_for_state(client: &ConnectionClient, state: ConnectionState) {
    let mut watch = client.state_watch();
    tokio::time::timeout(WAIT, watch.wait_for(|s| *s == state))
        .await
        .expect("timed out waiting for state")
        .expect("connection task dropped");
}

/// Nothing queued right now
pub fn assert_quiet<T: std::fmt::Debug>(rx: &mut mpsc::UnboundedReceiver<T>) {
    match rx.try_recv() {
        Err(mpsc::error::TryRecvError::Empty) => {}
        other => panic!("expected no message, got {:?}", other),
    }
}
