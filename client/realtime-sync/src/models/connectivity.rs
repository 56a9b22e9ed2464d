use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time view of network and update status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivitySnapshot {
    pub online: bool,
    pub update_available: bool,
    pub last_transition: DateTime<Utc>,
}

impl ConnectivitySnapshot {
    /// Assume reachable and current until a probe says otherwise
    pub fn initial() -> Self {
        Self {
            online: true,
            update_available: false,
            last_transition: Utc::now(),
        }
    }

    /// Apply `signal`, returning the new snapshot if anything flipped
    pub fn apply(&self, signal: ConnectivitySignal, at: DateTime<Utc>) -> Option<Self> {
        let (online, update_available) = match signal {
            ConnectivitySignal::Online => (true, self.update_available),
            ConnectivitySignal::Offline => (false, self.update_available),
            ConnectivitySignal::UpdateAvailable => (self.online, true),
            ConnectivitySignal::UpdateActivated => (self.online, false),
        };

        if online == self.online && update_available == self.update_available {
            return None;
        }

        Some(Self {
            online,
            update_available,
            last_transition: at,
        })
    }
}

/// Raw observation fed into the connectivity coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivitySignal {
    Online,
    Offline,
    /// A newer application version is ready to activate
    UpdateAvailable,
    /// The host activated the pending update
    UpdateActivated,
}
