use super::event::EventKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// User-visible notification grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    Recognition,
    Points,
    Reward,
    Announcement,
    System,
}

impl NotificationCategory {
    /// Category for a user-facing event kind, `None` for protocol traffic
    pub fn for_kind(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::RecognitionReceived => Some(NotificationCategory::Recognition),
            EventKind::PointsAwarded => Some(NotificationCategory::Points),
            EventKind::RewardRedeemed => Some(NotificationCategory::Reward),
            EventKind::Announcement => Some(NotificationCategory::Announcement),
            EventKind::SystemAlert => Some(NotificationCategory::System),
            EventKind::Heartbeat | EventKind::Ack | EventKind::Unknown(_) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::Recognition => "recognition",
            NotificationCategory::Points => "points",
            NotificationCategory::Reward => "reward",
            NotificationCategory::Announcement => "announcement",
            NotificationCategory::System => "system",
        }
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification ready for subscribers
///
/// `id` and `dedupe_key` are derived from payload content, so a replayed event
/// maps to the same values it had the first time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub category: NotificationCategory,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub dedupe_key: String,
}
