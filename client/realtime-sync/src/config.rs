//! Realtime connection settings
//!
//! Loaded once from `REWARDS_REALTIME_*` environment variables, validated, and
//! converted into the immutable configs the components are built from.

use crate::auth::StaticTokenSupplier;
use crate::connection::ConnectionConfig;
use crate::connectivity::{NetworkProbe, UpdateProbe};
use crate::error::ConfigError;
use crate::pipeline::PipelineConfig;
use resilience::BackoffPolicy;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use url::Url;
use validator::{Validate, ValidationError};

pub const ENV_PREFIX: &str = "REWARDS_REALTIME_";

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_settings"))]
pub struct RealtimeSettings {
    /// WebSocket endpoint (ws:// or wss://)
    #[validate(url)]
    pub endpoint: String,

    #[validate(range(min = 1))]
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Fraction of the nominal delay, in [0, 1)
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default = "default_jitter")]
    pub jitter: f64,

    /// Zero disables heartbeats
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,

    #[validate(range(min = 1))]
    #[serde(default = "default_heartbeat_timeout_ms")]
    pub heartbeat_timeout_ms: u64,

    #[validate(range(min = 1))]
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_token_refresh_margin_ms")]
    pub token_refresh_margin_ms: u64,

    #[serde(default = "default_min_token_lifetime_ms")]
    pub min_token_lifetime_ms: u64,

    #[validate(range(min = 1))]
    #[serde(default = "default_dedupe_capacity")]
    pub dedupe_capacity: usize,

    #[serde(default = "default_max_replay_burst")]
    pub max_replay_burst: usize,

    /// `host:port` checked for reachability; no probe when unset
    #[serde(default)]
    pub network_probe_addr: Option<String>,

    #[validate(range(min = 1))]
    #[serde(default = "default_network_probe_interval_ms")]
    pub network_probe_interval_ms: u64,

    /// Version document polled for pending updates; no probe when unset
    #[validate(url)]
    #[serde(default)]
    pub update_check_url: Option<String>,

    #[validate(range(min = 1))]
    #[serde(default = "default_update_check_interval_ms")]
    pub update_check_interval_ms: u64,

    /// Static bearer token, used by the binary only
    #[serde(default)]
    pub token: Option<SecretString>,

    #[validate(range(min = 1))]
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
}

fn default_base_backoff_ms() -> u64 {
    1000
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

fn default_jitter() -> f64 {
    0.3
}

fn default_heartbeat_interval_ms() -> u64 {
    25_000
}

fn default_heartbeat_timeout_ms() -> u64 {
    10_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_token_refresh_margin_ms() -> u64 {
    60_000
}

fn default_min_token_lifetime_ms() -> u64 {
    30_000
}

fn default_dedupe_capacity() -> usize {
    512
}

fn default_max_replay_burst() -> usize {
    256
}

fn default_network_probe_interval_ms() -> u64 {
    5_000
}

fn default_update_check_interval_ms() -> u64 {
    300_000 // 5 minutes
}

fn default_token_ttl_secs() -> u64 {
    3600
}

fn validate_settings(settings: &RealtimeSettings) -> Result<(), ValidationError> {
    if settings.max_backoff_ms < settings.base_backoff_ms {
        return Err(ValidationError::new("max_backoff_below_base"));
    }

    if !(0.0..1.0).contains(&settings.jitter) {
        return Err(ValidationError::new("jitter_out_of_range"));
    }

    if settings.dedupe_capacity <= settings.max_replay_burst {
        return Err(ValidationError::new("dedupe_capacity_not_above_replay_burst"));
    }

    match Url::parse(&settings.endpoint) {
        Ok(url) if matches!(url.scheme(), "ws" | "wss") => Ok(()),
        _ => Err(ValidationError::new("endpoint_not_websocket")),
    }
}

impl RealtimeSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let settings: Self = envy::prefixed(ENV_PREFIX).from_env()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load from explicit key/value pairs, using the same keys as the environment
    pub fn from_pairs<I>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let settings: Self = envy::prefixed(ENV_PREFIX).from_iter(pairs)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_millis(self.base_backoff_ms),
            Duration::from_millis(self.max_backoff_ms),
            self.jitter,
        )
    }

    pub fn connection_config(&self) -> Result<ConnectionConfig, ConfigError> {
        let endpoint =
            Url::parse(&self.endpoint).map_err(|e| ConfigError::Invalid(e.to_string()))?;

        Ok(ConnectionConfig {
            endpoint,
            backoff: self.backoff_policy(),
            heartbeat_interval: Duration::from_millis(self.heartbeat_interval_ms),
            heartbeat_timeout: Duration::from_millis(self.heartbeat_timeout_ms),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            token_refresh_margin: Duration::from_millis(self.token_refresh_margin_ms),
            min_token_lifetime: Duration::from_millis(self.min_token_lifetime_ms),
        })
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            dedupe_capacity: self.dedupe_capacity,
            max_replay_burst: self.max_replay_burst,
        }
    }

    pub fn token_supplier(&self) -> Result<StaticTokenSupplier, ConfigError> {
        let token = self
            .token
            .as_ref()
            .ok_or(ConfigError::Missing("REWARDS_REALTIME_TOKEN"))?;

        Ok(StaticTokenSupplier::new(
            SecretString::from(token.expose_secret().to_string()),
            Duration::from_secs(self.token_ttl_secs),
        ))
    }

    pub fn network_probe(&self) -> Option<NetworkProbe> {
        self.network_probe_addr.as_ref().map(|addr| {
            NetworkProbe::new(
                addr.clone(),
                Duration::from_millis(self.network_probe_interval_ms),
            )
        })
    }

    pub fn update_probe(&self) -> Result<Option<UpdateProbe>, ConfigError> {
        let Some(raw) = self.update_check_url.as_deref() else {
            return Ok(None);
        };

        let url = Url::parse(raw).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let probe = UpdateProbe::new(
            url,
            env!("CARGO_PKG_VERSION"),
            Duration::from_millis(self.update_check_interval_ms),
        )
        .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        Ok(Some(probe))
    }
}
