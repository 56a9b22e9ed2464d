/// Resilience patterns for long-lived client connections
///
/// This library provides the pure timing logic behind a self-healing
/// persistent connection:
/// - **Backoff**: Exponential reconnection delay with a ceiling and jitter
/// - **Liveness**: Heartbeat bookkeeping that decides when to ping and when a
///   silent peer must be considered dead
///
/// Neither module performs I/O or sleeps; callers own the timers and feed the
/// current instant in, which keeps both deterministic under test.
///
/// # Example: Reconnect Loop
///
/// ```rust,no_run
/// use resilience::{Backoff, BackoffPolicy};
///
/// #[tokio::main]
/// async fn main() {
///     let mut backoff = Backoff::new(BackoffPolicy::default());
///
///     loop {
///         let (attempt, delay) = backoff.next_delay();
///         tokio::time::sleep(delay).await;
///         // try to connect; on success:
///         # let connected = attempt > 2;
///         if connected {
///             backoff.reset();
///             break;
///         }
///     }
/// }
/// ```

pub mod backoff;
pub mod liveness;

pub use backoff::{Backoff, BackoffPolicy};
pub use liveness::{HeartbeatAction, HeartbeatMonitor};
