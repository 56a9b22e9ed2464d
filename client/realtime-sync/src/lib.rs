//! Client-side real-time sync for the rewards app
//!
//! Keeps one persistent server connection alive across network drops and
//! token expiry, turns inbound events into deduplicated notifications, and
//! pauses the connection while the device is offline.
//!
//! # Components
//!
//! - [`ConnectionClient`]: connection state machine with backoff and heartbeats
//! - [`NotificationPipeline`]: event mapping, replay suppression, fan-out
//! - [`ConnectivityCoordinator`]: online/offline and update-available status
//! - [`FeatureGate`]: startup flags deciding whether any of this runs
//! - [`bootstrap`]: wires the above together
//!
//! # Example
//!
//! ```rust,no_run
//! use realtime_sync::{
//!     bootstrap, BootstrapConfig, BootstrapDeps, ConsumerCallbacks, FeatureGate,
//!     RealtimeSettings, WebSocketTransport,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gate = FeatureGate::from_env()?;
//!     let settings = RealtimeSettings::from_env()?;
//!
//!     let config = BootstrapConfig {
//!         connection: settings.connection_config()?,
//!         pipeline: settings.pipeline_config(),
//!     };
//!     let deps = BootstrapDeps::new(
//!         Arc::new(WebSocketTransport::new()),
//!         Arc::new(settings.token_supplier()?),
//!     );
//!     let callbacks = ConsumerCallbacks::new()
//!         .on_notification(|n| println!("{}: {}", n.category, n.title));
//!
//!     if let Some(subsystem) = bootstrap(gate, config, deps, callbacks) {
//!         tokio::signal::ctrl_c().await?;
//!         subsystem.shutdown().await;
//!     }
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod connection;
pub mod connectivity;
pub mod error;
pub mod feature_gate;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod transport;

pub use auth::{AccessToken, StaticTokenSupplier, TokenSupplier};
pub use bootstrap::{
    bootstrap, BootstrapConfig, BootstrapDeps, ConsumerCallbacks, RealtimeSubsystem,
};
pub use config::RealtimeSettings;
pub use connection::{ConnectionClient, ConnectionConfig, ConnectionControl};
pub use connectivity::{ConnectivityCoordinator, NetworkProbe, UpdateProbe};
pub use error::{ConfigError, PipelineError, SyncError, SyncResult, TokenError, TransportError};
pub use feature_gate::{FeatureFlags, FeatureGate};
pub use models::{
    ConnectionState, ConnectionStatus, ConnectivitySignal, ConnectivitySnapshot, DisconnectCause,
    EventKind, InboundEvent, Notification, NotificationCategory,
};
pub use pipeline::{NotificationPipeline, PipelineConfig, PipelineStats, SubscriptionToken};
pub use transport::{Frame, Transport, TransportSession, WebSocketTransport, WireEvent};
