use serde::{Deserialize, Serialize};
use tripwhisper_model::{ErrorKind, ModelFinishReason};

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "message_delta")]
    MessageDelta(String),
    /// Breaks the stream with an error of the given kind.
    #[serde(rename = "error")]
    Error(ErrorKind),
    /// Ends the stream with the given finish reason. Without it the
    /// stream ends with `Stop` after the last event.
    #[serde(rename = "completed")]
    Completed(ModelFinishReason),
}

/// The preset response for one request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// If set, the request is rejected up front with this kind of error,
    /// and `events` are never delivered.
    pub rejection: Option<ErrorKind>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            rejection: None,
        }
    }

    /// Creates a `PresetResponse` that delivers `text` as one delta.
    #[inline]
    pub fn with_text<S: Into<String>>(text: S) -> Self {
        Self::with_events([PresetEvent::MessageDelta(text.into())])
    }

    /// Creates a `PresetResponse` that fails before any event.
    #[inline]
    pub fn rejected(kind: ErrorKind) -> Self {
        Self {
            events: vec![],
            rejection: Some(kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_deserialize() {
        let response = PresetResponse::with_events([
            PresetEvent::MessageDelta("Try ".to_string()),
            PresetEvent::MessageDelta("Bali.".to_string()),
            PresetEvent::Error(ErrorKind::Network),
        ]);

        let serialized = serde_json::to_string(&response).unwrap();
        let deserialized: PresetResponse =
            serde_json::from_str(&serialized).unwrap();

        assert_eq!(response, deserialized);
    }

    #[test]
    fn test_deserialize_script() {
        let script = r#"{
            "events": [{ "type": "message_delta", "data": "Hello" }],
            "rejection": "rate_limit_exceeded"
        }"#;
        let response: PresetResponse = serde_json::from_str(script).unwrap();
        assert_eq!(response.rejection, Some(ErrorKind::RateLimitExceeded));
        assert_eq!(response.events.len(), 1);
    }
}
