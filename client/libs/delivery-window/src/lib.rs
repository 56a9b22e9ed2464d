//! # Delivery Window
//!
//! Bounded, insertion-ordered record of recently delivered dedupe keys.
//!
//! A reconnecting client may be handed the same logical event more than once
//! when the server replays from an earlier checkpoint. The window remembers the
//! last `capacity` keys it admitted and rejects any key it still holds, so a
//! replay burst that fits inside the window never reaches a subscriber twice.
//!
//! ```text
//! replayed event → dedupe key → DeliveryWindow ──Deliver──→ subscribers
//!                                     │
//!                                 Duplicate → dropped
//! ```
//!
//! ## Eviction
//!
//! Keys are evicted oldest-first once the window is full. A key evicted before
//! its duplicate arrives will be admitted again; size the window so that it is
//! strictly larger than the largest replay burst the server can produce
//! ([`DeliveryWindow::with_replay_bound`] enforces this).
//!
//! ## Usage
//!
//! ```
//! use delivery_window::{DeliveryDecision, DeliveryWindow};
//!
//! let mut window = DeliveryWindow::with_replay_bound(512, 256).unwrap();
//!
//! assert_eq!(window.check_and_record("points:42").unwrap(), DeliveryDecision::Deliver);
//! assert_eq!(window.check_and_record("points:42").unwrap(), DeliveryDecision::Duplicate);
//! ```

use std::collections::{HashSet, VecDeque};
use tracing::{debug, trace};

mod error;

pub use error::{WindowError, WindowResult};

/// Maximum accepted dedupe key length in bytes
pub const MAX_KEY_LEN: usize = 255;

/// Outcome of checking a key against the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryDecision {
    /// Key was not present; it has been recorded and the item should be delivered
    Deliver,

    /// Key is still held by the window; the item must be dropped
    Duplicate,
}

impl DeliveryDecision {
    /// Check if the item should reach subscribers
    pub fn should_deliver(&self) -> bool {
        matches!(self, DeliveryDecision::Deliver)
    }
}

/// Bounded FIFO set of delivered dedupe keys
///
/// Lookups and inserts are O(1). Not internally synchronised: the owner is
/// expected to serialise access (the notification pipeline holds it behind a
/// mutex on its single delivery path).
#[derive(Debug)]
pub struct DeliveryWindow {
    capacity: usize,
    order: VecDeque<String>,
    members: HashSet<String>,
    evictions: u64,
}

impl DeliveryWindow {
    /// Create a window holding at most `capacity` keys
    pub fn new(capacity: usize) -> WindowResult<Self> {
        if capacity == 0 {
            return Err(WindowError::InvalidCapacity(capacity));
        }

        Ok(Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
            evictions: 0,
        })
    }

    /// Create a window that is guaranteed to outlast a replay burst of
    /// `max_replay_burst` events
    pub fn with_replay_bound(capacity: usize, max_replay_burst: usize) -> WindowResult<Self> {
        if capacity <= max_replay_burst {
            return Err(WindowError::BurstExceedsCapacity {
                capacity,
                max_replay_burst,
            });
        }

        Self::new(capacity)
    }

    /// Check whether `key` is currently held
    pub fn contains(&self, key: &str) -> bool {
        self.members.contains(key)
    }

    /// Record `key` unless it is already held
    ///
    /// Returns [`DeliveryDecision::Duplicate`] without touching the window when
    /// the key is present. Otherwise the key is appended, the oldest key is
    /// evicted if the window was full, and [`DeliveryDecision::Deliver`] is
    /// returned.
    pub fn check_and_record(&mut self, key: &str) -> WindowResult<DeliveryDecision> {
        Self::validate_key(key)?;

        if self.members.contains(key) {
            trace!(dedupe_key = %key, "Key already in delivery window");
            return Ok(DeliveryDecision::Duplicate);
        }

        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
                self.evictions += 1;
                debug!(evicted = %oldest, capacity = self.capacity, "Delivery window evicted oldest key");
            }
        }

        self.order.push_back(key.to_owned());
        self.members.insert(key.to_owned());

        Ok(DeliveryDecision::Deliver)
    }

    /// Number of keys currently held
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total number of keys evicted since construction
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Keys in admission order, oldest first
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Drop every held key
    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }

    fn validate_key(key: &str) -> WindowResult<()> {
        if key.is_empty() {
            return Err(WindowError::InvalidKey(
                "Dedupe key cannot be empty".to_string(),
            ));
        }

        if key.len() > MAX_KEY_LEN {
            return Err(WindowError::InvalidKey(format!(
                "Dedupe key too long: {} bytes (max {})",
                key.len(),
                MAX_KEY_LEN
            )));
        }

        Ok(())
    }
}
