//! Fall event model

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Timestamp format used when the fall source does not report one
pub const FALL_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %I:%M %p";

/// Fall-detection status as reported by the fall endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallEvent {
    pub fall_detected: bool,
    pub timestamp: String,
    pub details: Option<String>,
}

/// JSON body returned by the fall endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct FallPayload {
    #[serde(alias = "fallDetected")]
    pub fall_detected: bool,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}

impl FallPayload {
    pub fn into_event(self, received_at: DateTime<Local>) -> FallEvent {
        FallEvent {
            fall_detected: self.fall_detected,
            timestamp: self
                .timestamp
                .unwrap_or_else(|| received_at.format(FALL_TIMESTAMP_FORMAT).to_string()),
            details: self.details.filter(|d| !d.trim().is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_payload_from_flask_backend() {
        // The sensor backend only reports the flag
        let payload: FallPayload = serde_json::from_str(r#"{"fall_detected": true}"#).unwrap();
        let received = Local.with_ymd_and_hms(2025, 3, 1, 22, 5, 0).unwrap();
        let event = payload.into_event(received);
        assert!(event.fall_detected);
        assert_eq!(event.timestamp, "2025-03-01 10:05 PM");
        assert_eq!(event.details, None);
    }

    #[test]
    fn test_payload_full_camel_case() {
        let payload: FallPayload = serde_json::from_str(
            r#"{"fallDetected": false, "timestamp": "2025-03-01 10:15 AM", "details": "Living room"}"#,
        )
        .unwrap();
        let event = payload.into_event(Local::now());
        assert!(!event.fall_detected);
        assert_eq!(event.timestamp, "2025-03-01 10:15 AM");
        assert_eq!(event.details.as_deref(), Some("Living room"));
    }

    #[test]
    fn test_blank_details_dropped() {
        let payload: FallPayload =
            serde_json::from_str(r#"{"fallDetected": true, "details": "  "}"#).unwrap();
        assert_eq!(payload.into_event(Local::now()).details, None);
    }

    #[test]
    fn test_missing_flag_is_rejected() {
        let result: Result<FallPayload, _> = serde_json::from_str(r#"{"timestamp": "now"}"#);
        assert!(result.is_err());
    }
}
