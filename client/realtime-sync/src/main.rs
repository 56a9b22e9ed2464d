use realtime_sync::logging::init_tracing;
use realtime_sync::{
    bootstrap, BootstrapConfig, BootstrapDeps, ConnectionStatus, ConsumerCallbacks, FeatureGate,
    RealtimeSettings, SyncError, WebSocketTransport,
};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), SyncError> {
    // .env is optional
    let _ = dotenvy::dotenv();

    init_tracing();

    let gate = FeatureGate::from_env()?;
    if !gate.realtime_enabled() {
        info!("Real-time updates disabled, nothing to run");
        return Ok(());
    }

    let settings = RealtimeSettings::from_env()?;
    info!(endpoint = %settings.endpoint, "Starting realtime sync");

    let config = BootstrapConfig {
        connection: settings.connection_config()?,
        pipeline: settings.pipeline_config(),
    };

    let mut deps = BootstrapDeps::new(
        Arc::new(WebSocketTransport::new()),
        Arc::new(settings.token_supplier()?),
    );
    if let Some(probe) = settings.network_probe() {
        deps = deps.with_source(probe.into_stream());
    }
    if let Some(probe) = settings.update_probe()? {
        deps = deps.with_source(probe.into_stream());
    }

    let callbacks = ConsumerCallbacks::new()
        .on_notification(|n| {
            info!(
                id = %n.id,
                category = %n.category,
                title = %n.title,
                "Notification"
            )
        })
        .on_connectivity_change(|snapshot| {
            info!(
                online = snapshot.online,
                update_available = snapshot.update_available,
                "Connectivity"
            )
        })
        .on_connection_status(|status| match status {
            ConnectionStatus::AuthRequired { reason } => {
                warn!(reason = %reason, "Sign-in required, connection stopped")
            }
            other => info!(status = ?other, "Connection status"),
        });

    let Some(subsystem) = bootstrap(gate, config, deps, callbacks) else {
        return Ok(());
    };

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    subsystem.shutdown().await;

    Ok(())
}
