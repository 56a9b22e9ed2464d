/// Prometheus metrics for the realtime subsystem
#[cfg(feature = "metrics")]
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};

#[cfg(feature = "metrics")]
use once_cell::sync::Lazy;

#[cfg(feature = "metrics")]
static CONNECTION_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "realtime_connection_transitions_total",
        "Total number of connection state transitions",
        &["from", "to"]
    )
    .expect("Failed to register connection transitions metric")
});

#[cfg(feature = "metrics")]
static RECONNECT_ATTEMPTS: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "realtime_reconnect_attempts_total",
        "Total number of scheduled reconnection attempts"
    )
    .expect("Failed to register reconnect attempts metric")
});

#[cfg(feature = "metrics")]
static HEARTBEAT_TIMEOUTS: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "realtime_heartbeat_timeouts_total",
        "Connections declared dead after an unanswered heartbeat"
    )
    .expect("Failed to register heartbeat timeouts metric")
});

#[cfg(feature = "metrics")]
static NOTIFICATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "realtime_notifications_total",
        "Inbound events by pipeline outcome",
        &["outcome"]
    )
    .expect("Failed to register notifications metric")
});

#[cfg(feature = "metrics")]
static BOOTSTRAP_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "realtime_bootstrap_duration_seconds",
        "Time spent wiring the realtime subsystem at startup"
    )
    .expect("Failed to register bootstrap duration metric")
});

#[cfg(feature = "metrics")]
pub struct ConnectionMetrics;

#[cfg(feature = "metrics")]
impl ConnectionMetrics {
    pub fn record_transition(from: &str, to: &str) {
        CONNECTION_TRANSITIONS.with_label_values(&[from, to]).inc();
    }

    pub fn record_reconnect_attempt() {
        RECONNECT_ATTEMPTS.inc();
    }

    pub fn record_heartbeat_timeout() {
        HEARTBEAT_TIMEOUTS.inc();
    }
}

#[cfg(feature = "metrics")]
pub struct PipelineMetrics;

#[cfg(feature = "metrics")]
impl PipelineMetrics {
    pub fn record_notification(outcome: &str) {
        NOTIFICATIONS.with_label_values(&[outcome]).inc();
    }
}

#[cfg(feature = "metrics")]
pub struct BootstrapMetrics;

#[cfg(feature = "metrics")]
impl BootstrapMetrics {
    pub fn observe_duration(duration_secs: f64) {
        BOOTSTRAP_DURATION.observe(duration_secs);
    }
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub struct ConnectionMetrics;

#[cfg(not(feature = "metrics"))]
impl ConnectionMetrics {
    pub fn record_transition(_from: &str, _to: &str) {}
    pub fn record_reconnect_attempt() {}
    pub fn record_heartbeat_timeout() {}
}

#[cfg(not(feature = "metrics"))]
pub struct PipelineMetrics;

#[cfg(not(feature = "metrics"))]
impl PipelineMetrics {
    pub fn record_notification(_outcome: &str) {}
}

#[cfg(not(feature = "metrics"))]
pub struct BootstrapMetrics;

#[cfg(not(feature = "metrics"))]
impl BootstrapMetrics {
    pub fn observe_duration(_duration_secs: f64) {}
}
