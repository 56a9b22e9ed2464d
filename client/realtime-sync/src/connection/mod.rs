//! Single logical server connection with reconnection
//!
//! [`ConnectionClient`] is a cheap handle over a background task that owns
//! the transport session, the backoff and heartbeat timers, and the state
//! machine. The handle only enqueues commands, so it is safe to call from
//! inside the client's own callbacks.
//!
//! ```text
//! Idle ─open→ Connecting ─established→ Open ─lost→ Reconnecting ─delay→ Connecting
//!   any but Closed ─suspend→ Suspended ─resume→ Connecting
//!   any ─close→ Closed
//! ```

mod task;

use crate::auth::TokenSupplier;
use crate::models::{ConnectionState, ConnectionStatus, InboundEvent};
use crate::transport::Transport;
use parking_lot::RwLock;
use resilience::BackoffPolicy;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

/// Immutable connection parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionConfig {
    pub endpoint: Url,
    pub backoff: BackoffPolicy,
    /// Inbound silence before a ping is sent; zero disables heartbeats
    pub heartbeat_interval: Duration,
    /// How long a ping may go unanswered
    pub heartbeat_timeout: Duration,
    pub connect_timeout: Duration,
    /// Reconnect this long before the token expires
    pub token_refresh_margin: Duration,
    /// Tokens living less than this refresh on the backoff schedule
    pub min_token_lifetime: Duration,
}

impl ConnectionConfig {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            backoff: BackoffPolicy::default(),
            heartbeat_interval: Duration::from_secs(25),
            heartbeat_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(10),
            token_refresh_margin: Duration::from_secs(60),
            min_token_lifetime: Duration::from_secs(30),
        }
    }
}

/// Pause/resume surface the connectivity coordinator drives
pub trait ConnectionControl: Send + Sync {
    /// Stable identity used to make attachment idempotent
    fn control_id(&self) -> Uuid;
    fn suspend(&self);
    fn resume(&self);
}

pub type EventHandler = Arc<dyn Fn(&InboundEvent) + Send + Sync>;
pub type StatusHandler = Arc<dyn Fn(&ConnectionStatus) + Send + Sync>;

enum Command {
    Open,
    Suspend,
    Resume,
    Close(oneshot::Sender<()>),
}

/// Registered callbacks, invoked only from the connection task
#[derive(Default)]
struct Handlers {
    event: RwLock<Vec<EventHandler>>,
    status: RwLock<Vec<StatusHandler>>,
}

impl Handlers {
    fn emit_event(&self, event: &InboundEvent) {
        let handlers = self.event.read().clone();
        for handler in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                warn!(sequence_id = event.sequence_id, "Event handler panicked");
            }
        }
    }

    fn emit_status(&self, status: &ConnectionStatus) {
        let handlers = self.status.read().clone();
        for handler in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(status))).is_err() {
                warn!(?status, "Status handler panicked");
            }
        }
    }
}

#[derive(Clone)]
pub struct ConnectionClient {
    id: Uuid,
    cmd_tx: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<ConnectionState>,
    handlers: Arc<Handlers>,
}

impl ConnectionClient {
    /// Spawn the connection task in `Idle`. Must be called inside a Tokio runtime.
    pub fn new(
        config: ConnectionConfig,
        tokens: Arc<dyn TokenSupplier>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let id = Uuid::new_v4();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);
        let handlers = Arc::new(Handlers::default());

        let task = task::ConnectionTask::new(
            id,
            config,
            tokens,
            transport,
            cmd_rx,
            state_tx,
            Arc::clone(&handlers),
        );
        tokio::spawn(task.run());

        debug!(client_id = %id, "Connection client created");

        Self {
            id,
            cmd_tx,
            state_rx,
            handlers,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Start connecting. Only meaningful from `Idle`; failures surface as status changes.
    pub fn open(&self) {
        self.send(Command::Open);
    }

    /// Drop any live session and stop retrying until [`resume`](Self::resume)
    pub fn suspend(&self) {
        self.send(Command::Suspend);
    }

    /// Reconnect after a suspension. No-op in any other state.
    pub fn resume(&self) {
        self.send(Command::Resume);
    }

    /// Release the session and timers and move to `Closed`
    ///
    /// Resolves once the connection task has exited; no callback fires after
    /// that. Calling it again, or any other method afterwards, does nothing.
    pub async fn close(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.cmd_tx.send(Command::Close(ack_tx)).is_err() {
            return;
        }

        // A dropped sender also means the task is gone
        let _ = ack_rx.await;
    }

    /// Handlers run sequentially on the connection task, in registration order,
    /// and must not block.
    pub fn on_event<F>(&self, handler: F)
    where
        F: Fn(&InboundEvent) + Send + Sync + 'static,
    {
        self.handlers.event.write().push(Arc::new(handler));
    }

    pub fn on_status_change<F>(&self, handler: F)
    where
        F: Fn(&ConnectionStatus) + Send + Sync + 'static,
    {
        self.handlers.status.write().push(Arc::new(handler));
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    pub fn state_watch(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    fn send(&self, command: Command) {
        if self.cmd_tx.send(command).is_err() {
            debug!(client_id = %self.id, "Command ignored, connection closed");
        }
    }
}

impl ConnectionControl for ConnectionClient {
    fn control_id(&self) -> Uuid {
        self.id
    }

    fn suspend(&self) {
        ConnectionClient::suspend(self);
    }

    fn resume(&self) {
        ConnectionClient::resume(self);
    }
}

impl std::fmt::Debug for ConnectionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionClient")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}
