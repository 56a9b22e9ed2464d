//! Startup wiring for the realtime subsystem
//!
//! Reads the feature gate first. With real-time updates off nothing is built:
//! no connection, no coordinator, no timers, and no callback ever fires.
use crate::auth::TokenSupplier;
use crate::connection::{ConnectionClient, ConnectionConfig};
use crate::connectivity::ConnectivityCoordinator;
use crate::feature_gate::FeatureGate;
use crate::metrics::BootstrapMetrics;
use crate::models::{ConnectionStatus, ConnectivitySignal, ConnectivitySnapshot, Notification};
use crate::pipeline::{NotificationPipeline, PipelineConfig};
use crate::transport::Transport;
use futures::stream::{BoxStream, Stream, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{info, warn};

type NotificationCallback = Arc<dyn Fn(Notification) + Send + Sync>;
type ConnectivityCallback = Arc<dyn Fn(ConnectivitySnapshot) + Send + Sync>;
type StatusCallback = Arc<dyn Fn(&ConnectionStatus) + Send + Sync>;

/// The only surface the host UI consumes
#[derive(Clone, Default)]
pub struct ConsumerCallbacks {
    on_notification: Option<NotificationCallback>,
    on_connectivity_change: Option<ConnectivityCallback>,
    on_connection_status: Option<StatusCallback>,
}

impl ConsumerCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_notification<F>(mut self, f: F) -> Self
    where
        F: Fn(Notification) + Send + Sync + 'static,
    {
        self.on_notification = Some(Arc::new(f));
        self
    }

    pub fn on_connectivity_change<F>(mut self, f: F) -> Self
    where
        F: Fn(ConnectivitySnapshot) + Send + Sync + 'static,
    {
        self.on_connectivity_change = Some(Arc::new(f));
        self
    }

    pub fn on_connection_status<F>(mut self, f: F) -> Self
    where
        F: Fn(&ConnectionStatus) + Send + Sync + 'static,
    {
        self.on_connection_status = Some(Arc::new(f));
        self
    }
}

#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub connection: ConnectionConfig,
    pub pipeline: PipelineConfig,
}

/// External collaborators
pub struct BootstrapDeps {
    pub transport: Arc<dyn Transport>,
    pub tokens: Arc<dyn TokenSupplier>,
    pub connectivity_sources: Vec<BoxStream<'static, ConnectivitySignal>>,
}

impl BootstrapDeps {
    pub fn new(transport: Arc<dyn Transport>, tokens: Arc<dyn TokenSupplier>) -> Self {
        Self {
            transport,
            tokens,
            connectivity_sources: Vec::new(),
        }
    }

    pub fn with_source<S>(mut self, signals: S) -> Self
    where
        S: Stream<Item = ConnectivitySignal> + Send + 'static,
    {
        self.connectivity_sources.push(signals.boxed());
        self
    }
}

/// Running subsystem; dropping it without [`shutdown`](Self::shutdown) leaves
/// the connection task and signal watchers running.
pub struct RealtimeSubsystem {
    client: ConnectionClient,
    pipeline: Option<Arc<NotificationPipeline>>,
    coordinator: Arc<ConnectivityCoordinator>,
    watchers: Vec<JoinHandle<()>>,
}

impl RealtimeSubsystem {
    pub fn client(&self) -> &ConnectionClient {
        &self.client
    }

    /// `None` if the pipeline failed to initialise
    pub fn pipeline(&self) -> Option<&Arc<NotificationPipeline>> {
        self.pipeline.as_ref()
    }

    pub fn coordinator(&self) -> &Arc<ConnectivityCoordinator> {
        &self.coordinator
    }

    /// Stop signal watchers, then close the connection
    pub async fn shutdown(self) {
        for watcher in &self.watchers {
            watcher.abort();
        }
        for watcher in self.watchers {
            // Cancelled watchers resolve once their source is dropped
            let _ = watcher.await;
        }
        self.client.close().await;
        info!(client_id = %self.client.id(), "Realtime subsystem stopped");
    }
}

/// Build and start the subsystem, or return `None` when real-time updates are off
///
/// Must be called inside a Tokio runtime. Callbacks are registered before the
/// connection opens so the first `Connecting` status is observed.
pub fn bootstrap(
    gate: FeatureGate,
    config: BootstrapConfig,
    deps: BootstrapDeps,
    callbacks: ConsumerCallbacks,
) -> Option<RealtimeSubsystem> {
    if !gate.realtime_enabled() {
        info!("Real-time updates disabled, realtime subsystem not started");
        return None;
    }

    let started = Instant::now();

    let pipeline = match NotificationPipeline::new(gate.flags(), config.pipeline) {
        Ok(pipeline) => Some(Arc::new(pipeline)),
        Err(e) => {
            warn!(error = %e, "Failed to initialise notifications, continuing without them");
            None
        }
    };

    if let (Some(pipeline), Some(callback)) = (&pipeline, callbacks.on_notification) {
        pipeline.subscribe(move |notification| callback(notification));
    }

    let client = ConnectionClient::new(config.connection, deps.tokens, deps.transport);

    if let Some(callback) = callbacks.on_connection_status {
        client.on_status_change(move |status| callback(status));
    }

    if let Some(pipeline) = &pipeline {
        let pipeline = Arc::clone(pipeline);
        client.on_event(move |event| {
            pipeline.ingest(event.clone());
        });
    }

    let coordinator = Arc::new(ConnectivityCoordinator::new());
    if let Some(callback) = callbacks.on_connectivity_change {
        coordinator.on_change(move |snapshot| callback(snapshot));
    }
    coordinator.attach(Arc::new(client.clone()));

    let watchers = deps
        .connectivity_sources
        .into_iter()
        .map(|signals| coordinator.watch(signals))
        .collect();

    client.open();

    let elapsed = started.elapsed();
    BootstrapMetrics::observe_duration(elapsed.as_secs_f64());
    info!(
        client_id = %client.id(),
        notifications = pipeline.is_some() && gate.notifications_enabled(),
        elapsed_us = elapsed.as_micros() as u64,
        "Realtime subsystem started"
    );

    Some(RealtimeSubsystem {
        client,
        pipeline,
        coordinator,
        watchers,
    })
}
