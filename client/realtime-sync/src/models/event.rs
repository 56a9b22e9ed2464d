/// Inbound event model and the JSON wire messages that carry it
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Server-side event type, named `object.action` on the wire
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    /// Liveness traffic carried as an event
    Heartbeat,
    /// Server acknowledgement of a client message
    Ack,
    /// A colleague recognised the user
    RecognitionReceived,
    /// Points were credited to the user's balance
    PointsAwarded,
    /// A reward redemption changed state
    RewardRedeemed,
    /// Company-wide announcement
    Announcement,
    /// Operational alert (maintenance, outage)
    SystemAlert,
    /// Anything this client version does not know about
    Unknown(String),
}

impl EventKind {
    pub fn from_wire(name: &str) -> Self {
        match name {
            "heartbeat" => EventKind::Heartbeat,
            "ack" => EventKind::Ack,
            "recognition.received" => EventKind::RecognitionReceived,
            "points.awarded" => EventKind::PointsAwarded,
            "reward.redeemed" => EventKind::RewardRedeemed,
            "announcement.published" => EventKind::Announcement,
            "system.alert" => EventKind::SystemAlert,
            other => EventKind::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Heartbeat => "heartbeat",
            EventKind::Ack => "ack",
            EventKind::RecognitionReceived => "recognition.received",
            EventKind::PointsAwarded => "points.awarded",
            EventKind::RewardRedeemed => "reward.redeemed",
            EventKind::Announcement => "announcement.published",
            EventKind::SystemAlert => "system.alert",
            EventKind::Unknown(name) => name,
        }
    }

    /// Whether events of this kind can become a user-visible notification
    pub fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            EventKind::Heartbeat | EventKind::Ack | EventKind::Unknown(_)
        )
    }
}

impl From<String> for EventKind {
    fn from(name: String) -> Self {
        EventKind::from_wire(&name)
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event as handed from the connection to the notification pipeline
///
/// `sequence_id` is assigned by the server per connection. It is only good for
/// display and debugging: a replay after reconnect renumbers events.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub sequence_id: u64,
    pub kind: EventKind,
    pub payload: Value,
    pub received_at: DateTime<Utc>,
}

impl InboundEvent {
    pub fn new(sequence_id: u64, kind: EventKind, payload: Value) -> Self {
        Self {
            sequence_id,
            kind,
            payload,
            received_at: Utc::now(),
        }
    }
}

/// Messages pushed by the server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Domain event
    Event {
        sequence_id: u64,
        kind: EventKind,
        #[serde(default)]
        payload: Value,
    },

    /// Heartbeat/ping from server
    Ping {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<i64>,
    },

    /// Server answers a client ping
    Pong {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<i64>,
    },

    /// Credential rejected; the server will close the socket
    AuthError { message: String },
}

impl ServerMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Messages sent by the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping { timestamp: i64 },
    Pong { timestamp: i64 },
}

impl ClientMessage {
    pub fn ping() -> Self {
        ClientMessage::Ping {
            timestamp: Utc::now().timestamp(),
        }
    }

    pub fn pong() -> Self {
        ClientMessage::Pong {
            timestamp: Utc::now().timestamp(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
