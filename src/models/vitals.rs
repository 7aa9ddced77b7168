//! Vitals reading model
//!
//! A single snapshot of heart rate, blood oxygen saturation and body
//! temperature as reported by the vitals endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const HEART_RATE_MAX_BPM: f64 = 120.0;
pub const HEART_RATE_MIN_BPM: f64 = 50.0;
pub const SPO2_MIN_PERCENT: f64 = 90.0;
pub const TEMPERATURE_MAX_C: f64 = 38.0;
pub const TEMPERATURE_MIN_C: f64 = 35.0;

/// A vitals snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalsReading {
    pub heart_rate_bpm: f64,
    pub spo2_percent: f64,
    pub temperature_c: f64,
    pub observed_at: DateTime<Utc>,
}

/// JSON body returned by the vitals endpoint.
///
/// Both the camelCase and snake_case spellings seen from sensor backends are
/// accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct VitalsPayload {
    #[serde(alias = "heartRate", alias = "heart_rate", alias = "heartRateBpm")]
    pub heart_rate_bpm: f64,
    #[serde(alias = "spo2", alias = "spo2Percent")]
    pub spo2_percent: f64,
    #[serde(alias = "temperature", alias = "temperatureC")]
    pub temperature_c: f64,
    #[serde(default, alias = "observedAt")]
    pub observed_at: Option<DateTime<Utc>>,
}

impl VitalsPayload {
    /// Convert into a reading, stamping it with `received_at` if the source
    /// did not report an observation time
    pub fn into_reading(self, received_at: DateTime<Utc>) -> VitalsReading {
        VitalsReading {
            heart_rate_bpm: self.heart_rate_bpm,
            spo2_percent: self.spo2_percent,
            temperature_c: self.temperature_c,
            observed_at: self.observed_at.unwrap_or(received_at),
        }
    }
}

/// Which individual metrics are outside their safe range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VitalFlags {
    pub heart_rate: bool,
    pub spo2: bool,
    pub temperature: bool,
}

impl VitalFlags {
    pub fn any(&self) -> bool {
        self.heart_rate || self.spo2 || self.temperature
    }
}

impl VitalsReading {
    pub fn heart_rate_out_of_range(&self) -> bool {
        self.heart_rate_bpm > HEART_RATE_MAX_BPM || self.heart_rate_bpm < HEART_RATE_MIN_BPM
    }

    pub fn spo2_out_of_range(&self) -> bool {
        self.spo2_percent < SPO2_MIN_PERCENT
    }

    pub fn temperature_out_of_range(&self) -> bool {
        self.temperature_c > TEMPERATURE_MAX_C || self.temperature_c < TEMPERATURE_MIN_C
    }

    pub fn flags(&self) -> VitalFlags {
        VitalFlags {
            heart_rate: self.heart_rate_out_of_range(),
            spo2: self.spo2_out_of_range(),
            temperature: self.temperature_out_of_range(),
        }
    }

    /// Temperature as shown to the user. Alerting always uses `temperature_c`.
    pub fn display_temperature(&self, divisor: f64) -> f64 {
        if divisor > 0.0 {
            self.temperature_c / divisor
        } else {
            self.temperature_c
        }
    }
}
