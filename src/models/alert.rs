//! Alert decision
//!
//! [`decide`] merges the latest fall status and vitals snapshot into a single
//! [`AlertState`]. Rules are evaluated in order and the first match wins:
//!
//! 1. a detected fall raises [`AlertState::FallAlert`]
//! 2. any vital outside its safe range raises [`AlertState::VitalsAlert`]
//! 3. otherwise [`AlertState::None`]
//!
//! A fall always pre-empts a vitals alert.

use serde::Serialize;

use super::fall::FallEvent;
use super::vitals::{
    VitalsReading, HEART_RATE_MAX_BPM, HEART_RATE_MIN_BPM, SPO2_MIN_PERCENT, TEMPERATURE_MAX_C,
    TEMPERATURE_MIN_C,
};

pub const FALL_ALERT_MESSAGE: &str = "Fall detected! Immediate attention required.";
pub const VITALS_ALERT_MESSAGE: &str = "Health fluctuations detected! Monitor closely.";
pub const ALL_CLEAR_MESSAGE: &str = "Everything is fine. No worries!";

/// A single breached threshold, carrying the offending value
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "metric", content = "value", rename_all = "snake_case")]
pub enum VitalBreach {
    HeartRateHigh(f64),
    HeartRateLow(f64),
    Spo2Low(f64),
    TemperatureHigh(f64),
    TemperatureLow(f64),
}

impl VitalBreach {
    pub fn describe(&self) -> String {
        match self {
            VitalBreach::HeartRateHigh(v) => {
                format!("heart rate {} bpm above {}", v, HEART_RATE_MAX_BPM)
            }
            VitalBreach::HeartRateLow(v) => {
                format!("heart rate {} bpm below {}", v, HEART_RATE_MIN_BPM)
            }
            VitalBreach::Spo2Low(v) => format!("SpO2 {}% below {}%", v, SPO2_MIN_PERCENT),
            VitalBreach::TemperatureHigh(v) => {
                format!("temperature {}°C above {}°C", v, TEMPERATURE_MAX_C)
            }
            VitalBreach::TemperatureLow(v) => {
                format!("temperature {}°C below {}°C", v, TEMPERATURE_MIN_C)
            }
        }
    }
}

/// Why a vitals alert was raised. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VitalsAlertReason {
    pub breaches: Vec<VitalBreach>,
}

impl VitalsAlertReason {
    pub fn summary(&self) -> String {
        self.breaches
            .iter()
            .map(VitalBreach::describe)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Derived alert state for one poll cycle
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlertState {
    #[default]
    None,
    FallAlert(FallEvent),
    VitalsAlert(VitalsAlertReason),
}

impl AlertState {
    pub fn is_alert(&self) -> bool {
        !matches!(self, AlertState::None)
    }

    /// Banner text for the presentation layer
    pub fn message(&self) -> &'static str {
        match self {
            AlertState::None => ALL_CLEAR_MESSAGE,
            AlertState::FallAlert(_) => FALL_ALERT_MESSAGE,
            AlertState::VitalsAlert(_) => VITALS_ALERT_MESSAGE,
        }
    }
}

/// Collect every threshold the reading breaches. Bounds are strict: a value
/// sitting exactly on a bound is safe.
pub fn breaches(vitals: &VitalsReading) -> Vec<VitalBreach> {
    let mut found = Vec::new();

    if vitals.heart_rate_bpm > HEART_RATE_MAX_BPM {
        found.push(VitalBreach::HeartRateHigh(vitals.heart_rate_bpm));
    } else if vitals.heart_rate_bpm < HEART_RATE_MIN_BPM {
        found.push(VitalBreach::HeartRateLow(vitals.heart_rate_bpm));
    }

    if vitals.spo2_percent < SPO2_MIN_PERCENT {
        found.push(VitalBreach::Spo2Low(vitals.spo2_percent));
    }

    if vitals.temperature_c > TEMPERATURE_MAX_C {
        found.push(VitalBreach::TemperatureHigh(vitals.temperature_c));
    } else if vitals.temperature_c < TEMPERATURE_MIN_C {
        found.push(VitalBreach::TemperatureLow(vitals.temperature_c));
    }

    found
}

/// Threshold decision function
pub fn decide(fall: &FallEvent, vitals: &VitalsReading) -> AlertState {
    if fall.fall_detected {
        return AlertState::FallAlert(fall.clone());
    }

    let breaches = breaches(vitals);
    if breaches.is_empty() {
        AlertState::None
    } else {
        AlertState::VitalsAlert(VitalsAlertReason { breaches })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn no_fall() -> FallEvent {
        FallEvent {
            fall_detected: false,
            timestamp: "2025-03-01 10:15 AM".to_string(),
            details: None,
        }
    }

    fn fall() -> FallEvent {
        FallEvent {
            fall_detected: true,
            timestamp: "2025-03-01 10:16 AM".to_string(),
            details: Some("Kitchen".to_string()),
        }
    }

    fn vitals(hr: f64, spo2: f64, temp: f64) -> VitalsReading {
        VitalsReading {
            heart_rate_bpm: hr,
            spo2_percent: spo2,
            temperature_c: temp,
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn test_safe_ranges_produce_no_alert() {
        for hr in [50.0, 72.0, 120.0] {
            for spo2 in [90.0, 95.0, 100.0] {
                for temp in [35.0, 36.8, 38.0] {
                    assert_eq!(
                        decide(&no_fall(), &vitals(hr, spo2, temp)),
                        AlertState::None,
                        "hr={} spo2={} temp={}",
                        hr,
                        spo2,
                        temp
                    );
                }
            }
        }
    }

    #[test]
    fn test_fall_preempts_vitals() {
        for v in [vitals(72.0, 98.0, 36.6), vitals(200.0, 70.0, 41.0), vitals(30.0, 80.0, 33.0)] {
            match decide(&fall(), &v) {
                AlertState::FallAlert(event) => assert_eq!(event, fall()),
                other => panic!("expected fall alert, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_heart_rate_boundary_is_strict() {
        assert_eq!(decide(&no_fall(), &vitals(120.0, 95.0, 36.8)), AlertState::None);
        assert_eq!(
            decide(&no_fall(), &vitals(121.0, 95.0, 36.8)),
            AlertState::VitalsAlert(VitalsAlertReason {
                breaches: vec![VitalBreach::HeartRateHigh(121.0)],
            })
        );
        assert_eq!(decide(&no_fall(), &vitals(50.0, 95.0, 36.8)), AlertState::None);
        assert!(decide(&no_fall(), &vitals(49.0, 95.0, 36.8)).is_alert());
    }

    #[test]
    fn test_spo2_boundary_is_strict() {
        assert_eq!(decide(&no_fall(), &vitals(72.0, 90.0, 36.8)), AlertState::None);
        assert_eq!(
            decide(&no_fall(), &vitals(72.0, 89.0, 36.8)),
            AlertState::VitalsAlert(VitalsAlertReason {
                breaches: vec![VitalBreach::Spo2Low(89.0)],
            })
        );
    }

    #[test]
    fn test_temperature_bounds() {
        assert_eq!(decide(&no_fall(), &vitals(72.0, 95.0, 38.0)), AlertState::None);
        assert_eq!(decide(&no_fall(), &vitals(72.0, 95.0, 35.0)), AlertState::None);
        assert!(decide(&no_fall(), &vitals(72.0, 95.0, 38.1)).is_alert());
        assert!(decide(&no_fall(), &vitals(72.0, 95.0, 34.9)).is_alert());
    }

    #[test]
    fn test_all_breaches_reported() {
        let found = breaches(&vitals(130.0, 85.0, 39.0));
        assert_eq!(
            found,
            vec![
                VitalBreach::HeartRateHigh(130.0),
                VitalBreach::Spo2Low(85.0),
                VitalBreach::TemperatureHigh(39.0),
            ]
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(AlertState::None.message(), ALL_CLEAR_MESSAGE);
        assert_eq!(AlertState::FallAlert(fall()).message(), FALL_ALERT_MESSAGE);
        let reason = VitalsAlertReason {
            breaches: vec![VitalBreach::Spo2Low(88.0)],
        };
        assert_eq!(reason.summary(), "SpO2 88% below 90%");
        assert_eq!(AlertState::VitalsAlert(reason).message(), VITALS_ALERT_MESSAGE);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(AlertState::VitalsAlert(VitalsAlertReason {
            breaches: vec![VitalBreach::HeartRateLow(40.0)],
        }))
        .unwrap();
        assert_eq!(json["kind"], "vitals_alert");
        assert_eq!(json["breaches"][0]["metric"], "heart_rate_low");
        assert_eq!(json["breaches"][0]["value"], 40.0);

        let json = serde_json::to_value(AlertState::None).unwrap();
        assert_eq!(json["kind"], "none");
    }
}
