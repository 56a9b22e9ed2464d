use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Lifecycle of the single logical server connection
///
/// `Idle → Connecting → Open → Reconnecting → Connecting ...`, with
/// `Suspended` reachable from every non-terminal state and `Closed` absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Idle,
    Connecting,
    Open,
    Reconnecting,
    Suspended,
    Closed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Suspended => "suspended",
            ConnectionState::Closed => "closed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Closed)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an open or opening connection was lost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisconnectCause {
    ConnectFailed,
    TransportError,
    ServerClosed,
    HeartbeatTimeout,
    TokenRefresh,
    TokenUnavailable,
}

impl DisconnectCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisconnectCause::ConnectFailed => "connect_failed",
            DisconnectCause::TransportError => "transport_error",
            DisconnectCause::ServerClosed => "server_closed",
            DisconnectCause::HeartbeatTimeout => "heartbeat_timeout",
            DisconnectCause::TokenRefresh => "token_refresh",
            DisconnectCause::TokenUnavailable => "token_unavailable",
        }
    }
}

impl fmt::Display for DisconnectCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value delivered to `on_status_change` handlers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connecting {
        attempt: u32,
    },
    Open,
    Reconnecting {
        attempt: u32,
        #[serde(with = "duration_millis")]
        delay: Duration,
        cause: DisconnectCause,
    },
    Suspended,
    Closed,
    /// Credential rejected; the connection is closed and will not retry
    AuthRequired {
        reason: String,
    },
}

impl ConnectionStatus {
    /// State the connection is in once this status has been published
    pub fn state(&self) -> ConnectionState {
        match self {
            ConnectionStatus::Connecting { .. } => ConnectionState::Connecting,
            ConnectionStatus::Open => ConnectionState::Open,
            ConnectionStatus::Reconnecting { .. } => ConnectionState::Reconnecting,
            ConnectionStatus::Suspended => ConnectionState::Suspended,
            ConnectionStatus::Closed | ConnectionStatus::AuthRequired { .. } => {
                ConnectionState::Closed
            }
        }
    }

    pub fn is_auth_required(&self) -> bool {
        matches!(self, ConnectionStatus::AuthRequired { .. })
    }
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }
}
