//! Inbound events → deduplicated notifications → subscribers
//!
//! Replays after a reconnect resend events the user already saw, under new
//! sequence ids. The pipeline keys delivery on payload identity through a
//! bounded [`DeliveryWindow`] and fans each new notification out to every
//! subscriber in registration order.

mod mapping;

pub use mapping::{dedupe_key, map_event, NOTIFICATION_NAMESPACE};

use crate::feature_gate::FeatureFlags;
use crate::metrics::PipelineMetrics;
use crate::models::{InboundEvent, Notification};
use delivery_window::{DeliveryDecision, DeliveryWindow, WindowError};
use parking_lot::{Mutex, RwLock};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Keys remembered for duplicate suppression
    pub dedupe_capacity: usize,
    /// Largest replay the server is expected to send after a reconnect
    pub max_replay_burst: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dedupe_capacity: 512,
            max_replay_burst: 256,
        }
    }
}

/// Handle returned by [`NotificationPipeline::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

pub type NotificationHandler = Arc<dyn Fn(Notification) + Send + Sync>;

/// Outcome counts since construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub delivered: u64,
    pub duplicate: u64,
    pub malformed: u64,
    pub ignored: u64,
    pub disabled: u64,
}

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Delivered,
    Duplicate,
    Malformed,
    Ignored,
    Disabled,
}

impl Outcome {
    fn as_str(&self) -> &'static str {
        match self {
            Outcome::Delivered => "delivered",
            Outcome::Duplicate => "duplicate",
            Outcome::Malformed => "malformed",
            Outcome::Ignored => "ignored",
            Outcome::Disabled => "disabled",
        }
    }
}

#[derive(Default)]
struct Counters {
    delivered: AtomicU64,
    duplicate: AtomicU64,
    malformed: AtomicU64,
    ignored: AtomicU64,
    disabled: AtomicU64,
}

impl Counters {
    fn record(&self, outcome: Outcome) {
        let counter = match outcome {
            Outcome::Delivered => &self.delivered,
            Outcome::Duplicate => &self.duplicate,
            Outcome::Malformed => &self.malformed,
            Outcome::Ignored => &self.ignored,
            Outcome::Disabled => &self.disabled,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        PipelineMetrics::record_notification(outcome.as_str());
    }

    fn snapshot(&self) -> PipelineStats {
        PipelineStats {
            delivered: self.delivered.load(Ordering::Relaxed),
            duplicate: self.duplicate.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            disabled: self.disabled.load(Ordering::Relaxed),
        }
    }
}

pub struct NotificationPipeline {
    flags: FeatureFlags,
    window: Mutex<DeliveryWindow>,
    subscribers: RwLock<Vec<(SubscriptionToken, NotificationHandler)>>,
    next_token: AtomicU64,
    counters: Counters,
}

impl NotificationPipeline {
    /// Fails when the window could not absorb a full replay burst
    pub fn new(flags: FeatureFlags, config: PipelineConfig) -> Result<Self, WindowError> {
        let window = DeliveryWindow::with_replay_bound(config.dedupe_capacity, config.max_replay_burst)?;

        Ok(Self {
            flags,
            window: Mutex::new(window),
            subscribers: RwLock::new(Vec::new()),
            next_token: AtomicU64::new(1),
            counters: Counters::default(),
        })
    }

    /// Register a delivery target. Every subscriber gets its own copy of each
    /// non-duplicate notification.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionToken
    where
        F: Fn(Notification) + Send + Sync + 'static,
    {
        let token = SubscriptionToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().push((token, Arc::new(handler)));
        token
    }

    /// Returns `false` if the token was unknown or already removed
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(t, _)| *t != token);
        subscribers.len() != before
    }

    /// Map, deduplicate and fan out one event
    ///
    /// Returns the delivered notification, or `None` when the event was not
    /// user-facing, malformed, already delivered, or notifications are off.
    pub fn ingest(&self, event: InboundEvent) -> Option<Notification> {
        if !self.flags.notifications_enabled {
            self.counters.record(Outcome::Disabled);
            return None;
        }

        let notification = match map_event(&event) {
            Ok(Some(notification)) => notification,
            Ok(None) => {
                self.counters.record(Outcome::Ignored);
                return None;
            }
            Err(e) => {
                warn!(error = %e, kind = %event.kind, "Dropping malformed event");
                self.counters.record(Outcome::Malformed);
                return None;
            }
        };

        let decision = self.window.lock().check_and_record(&notification.dedupe_key);
        match decision {
            Ok(DeliveryDecision::Deliver) => {}
            Ok(DeliveryDecision::Duplicate) => {
                debug!(
                    sequence_id = event.sequence_id,
                    dedupe_key = %notification.dedupe_key,
                    "Suppressed duplicate notification"
                );
                self.counters.record(Outcome::Duplicate);
                return None;
            }
            Err(e) => {
                warn!(error = %e, sequence_id = event.sequence_id, "Unusable dedupe key");
                self.counters.record(Outcome::Malformed);
                return None;
            }
        }

        self.fan_out(&notification);
        self.counters.record(Outcome::Delivered);
        Some(notification)
    }

    pub fn stats(&self) -> PipelineStats {
        self.counters.snapshot()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    pub fn flags(&self) -> FeatureFlags {
        self.flags
    }

    fn fan_out(&self, notification: &Notification) {
        // Handlers may subscribe or unsubscribe re-entrantly
        let handlers: Vec<NotificationHandler> = self
            .subscribers
            .read()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for handler in handlers {
            let copy = notification.clone();
            if catch_unwind(AssertUnwindSafe(|| handler(copy))).is_err() {
                warn!(id = %notification.id, "Notification subscriber panicked");
            }
        }
    }
}

impl std::fmt::Debug for NotificationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationPipeline")
            .field("flags", &self.flags)
            .field("subscribers", &self.subscriber_count())
            .field("stats", &self.stats())
            .finish()
    }
}
