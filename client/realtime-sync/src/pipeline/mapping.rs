//! Event → notification mapping
//!
//! Identity comes from payload content only. Replays after a reconnect carry
//! new sequence ids and delivery timestamps, so those never feed the key.
use crate::error::PipelineError;
use crate::models::{InboundEvent, Notification, NotificationCategory};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Namespace for UUIDv5 notification ids
pub const NOTIFICATION_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a7e_93d4_4b8a_a5e2_0c7d_31f9_b846);

/// Payload fields that may change between deliveries of the same event
const TRANSPORT_FIELDS: &[&str] = &["sequence_id", "sent_at", "delivered_at", "replayed"];

/// Stable ids longer than this are hashed before use as a key
const MAX_ID_LEN: usize = 128;

/// Map `event` to a notification; `Ok(None)` for protocol traffic and unknown kinds
pub fn map_event(event: &InboundEvent) -> Result<Option<Notification>, PipelineError> {
    let Some(category) = NotificationCategory::for_kind(&event.kind) else {
        return Ok(None);
    };

    let malformed = |reason: &str| PipelineError::Malformed {
        sequence_id: event.sequence_id,
        reason: reason.to_string(),
    };

    let fields = event
        .payload
        .as_object()
        .ok_or_else(|| malformed("payload is not an object"))?;

    let title = match fields.get("title") {
        Some(Value::String(title)) if !title.trim().is_empty() => title.trim().to_string(),
        Some(Value::String(_)) => return Err(malformed("title is empty")),
        Some(_) => return Err(malformed("title is not a string")),
        None => return Err(malformed("missing title")),
    };

    let body = match fields.get("body") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(body)) => body.clone(),
        Some(_) => return Err(malformed("body is not a string")),
    };

    let created_at = match fields.get("created_at") {
        None | Some(Value::Null) => event.received_at,
        Some(Value::String(raw)) => DateTime::parse_from_rfc3339(raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|_| malformed("created_at is not RFC 3339"))?,
        Some(_) => return Err(malformed("created_at is not a string")),
    };

    let dedupe_key = dedupe_key(category, fields);
    let id = Uuid::new_v5(&NOTIFICATION_NAMESPACE, dedupe_key.as_bytes());

    Ok(Some(Notification {
        id,
        category,
        title,
        body,
        created_at,
        dedupe_key,
    }))
}

/// `<category>:<id>` when the payload names itself, else a content digest
pub fn dedupe_key(category: NotificationCategory, fields: &Map<String, Value>) -> String {
    if let Some(id) = stable_id(fields) {
        return format!("{}:{}", category, id);
    }

    format!("{}:sha256:{}", category, content_digest(fields))
}

fn stable_id(fields: &Map<String, Value>) -> Option<String> {
    ["id", "event_id"].iter().find_map(|name| {
        let id = match fields.get(*name)? {
            Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
            Value::Number(n) if n.is_i64() || n.is_u64() => n.to_string(),
            _ => return None,
        };

        if id.len() > MAX_ID_LEN {
            Some(format!("sha256:{}", hex::encode(Sha256::digest(id.as_bytes()))))
        } else {
            Some(id)
        }
    })
}

fn content_digest(fields: &Map<String, Value>) -> String {
    let stable: Map<String, Value> = fields
        .iter()
        .filter(|(key, _)| !TRANSPORT_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let canonical = canonicalize(Value::Object(stable)).to_string();
    hex::encode(Sha256::digest(canonical.as_bytes()))
}

/// Rebuild objects with keys in sorted order, recursively
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, canonicalize(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}
