use std::time::Duration;
use thiserror::Error;

pub type SyncResult<T> = Result<T, SyncError>;

/// Startup failures surfaced by the binary
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("signal handling failed: {0}")]
    Signal(#[from] std::io::Error),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("failed to read environment: {0}")]
    Env(String),

    #[error("invalid settings: {0}")]
    Invalid(String),

    #[error("missing required setting {0}")]
    Missing(&'static str),
}

impl From<envy::Error> for ConfigError {
    fn from(e: envy::Error) -> Self {
        ConfigError::Env(e.to_string())
    }
}

impl From<validator::ValidationErrors> for ConfigError {
    fn from(e: validator::ValidationErrors) -> Self {
        ConfigError::Invalid(e.to_string())
    }
}

/// Failures opening or using a transport session
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Server refused the credential; retrying with the same token is pointless
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("io error: {0}")]
    Io(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("connection closed")]
    Closed,
}

impl TransportError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, TransportError::Unauthorized(_))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Credential is invalid and the user must sign in again
    #[error("credential rejected: {0}")]
    Rejected(String),

    #[error("token temporarily unavailable: {0}")]
    Unavailable(String),
}

impl TokenError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, TokenError::Rejected(_))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("malformed event {sequence_id}: {reason}")]
    Malformed { sequence_id: u64, reason: String },
}
