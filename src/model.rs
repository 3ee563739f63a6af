//! Wire-level event and log message records.

use serde::{Deserialize, Serialize};

/// Wire-level event accepted by the HTTP ingress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub user_id: String,
    pub payload: String,
}

impl Event {
    /// `user_id` must be present and non-empty (§3 invariant).
    pub fn is_valid(&self) -> bool {
        !self.user_id.trim().is_empty()
    }
}

/// A single record on the partitioned log: `key` drives partitioning, `value` is
/// the opaque payload, `timestamp` is the ingestion instant (epoch millis).
#[derive(Debug, Clone)]
pub struct LogMessage {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub timestamp_millis: i64,
}

impl LogMessage {
    pub fn from_event(event: &Event, timestamp_millis: i64) -> Self {
        Self {
            key: event.user_id.clone().into_bytes(),
            value: event.payload.clone().into_bytes(),
            timestamp_millis,
        }
    }

    pub fn key_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.key)
    }

    pub fn to_event(&self) -> Event {
        Event {
            user_id: self.key_str().into_owned(),
            payload: String::from_utf8_lossy(&self.value).into_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_user_id_is_invalid() {
        let event = Event { user_id: "   ".to_string(), payload: "x".to_string() };
        assert!(!event.is_valid());
    }

    #[test]
    fn non_empty_user_id_is_valid() {
        let event = Event { user_id: "user_test_1".to_string(), payload: "x".to_string() };
        assert!(event.is_valid());
    }

    #[test]
    fn log_message_roundtrips_through_event() {
        let event = Event { user_id: "user_test_1".to_string(), payload: "hello".to_string() };
        let msg = LogMessage::from_event(&event, 42);
        let back = msg.to_event();
        assert_eq!(back.user_id, event.user_id);
        assert_eq!(back.payload, event.payload);
    }
}
