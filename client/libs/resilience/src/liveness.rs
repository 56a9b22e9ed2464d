/// Heartbeat liveness tracking
///
/// The monitor does not own a timer. The connection loop sleeps until
/// [`HeartbeatMonitor::next_deadline`], then asks [`HeartbeatMonitor::poll`]
/// what to do:
/// - Inbound silence for `interval` → send a ping
/// - No inbound traffic within `timeout` of that ping → peer is dead
///
/// Any inbound frame counts as proof of life.
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// What the connection loop should do when a heartbeat deadline fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatAction {
    /// Nothing due yet
    Idle,
    /// Interval of silence elapsed, probe the peer
    SendPing,
    /// Probe went unanswered past the timeout
    Expired,
}

#[derive(Debug, Clone)]
pub struct HeartbeatMonitor {
    interval: Duration,
    timeout: Duration,
    last_inbound: Instant,
    ping_sent_at: Option<Instant>,
}

impl HeartbeatMonitor {
    /// A zero `interval` disables pinging entirely
    pub fn new(interval: Duration, timeout: Duration, now: Instant) -> Self {
        Self {
            interval,
            timeout,
            last_inbound: now,
            ping_sent_at: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.interval.is_zero()
    }

    pub fn awaiting_ack(&self) -> bool {
        self.ping_sent_at.is_some()
    }

    /// Any frame from the peer resets both the idle interval and a pending probe
    pub fn record_inbound(&mut self, now: Instant) {
        self.last_inbound = now;
        self.ping_sent_at = None;
    }

    pub fn record_ping_sent(&mut self, now: Instant) {
        self.ping_sent_at = Some(now);
    }

    /// Instant at which [`poll`](Self::poll) will next return something other than `Idle`
    ///
    /// `None` when heartbeats are disabled.
    pub fn next_deadline(&self) -> Option<Instant> {
        if !self.is_enabled() {
            return None;
        }

        Some(match self.ping_sent_at {
            Some(sent) => sent + self.timeout,
            None => self.last_inbound + self.interval,
        })
    }

    pub fn poll(&self, now: Instant) -> HeartbeatAction {
        let Some(deadline) = self.next_deadline() else {
            return HeartbeatAction::Idle;
        };

        if now < deadline {
            return HeartbeatAction::Idle;
        }

        if self.ping_sent_at.is_some() {
            debug!(
                timeout_ms = self.timeout.as_millis() as u64,
                "Heartbeat unanswered"
            );
            HeartbeatAction::Expired
        } else {
            HeartbeatAction::SendPing
        }
    }
}
