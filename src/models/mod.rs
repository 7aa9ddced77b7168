//! Data models
//!
//! Vitals, fall events, the derived alert state, reminders and the patient
//! profile.

mod alert;
mod fall;
mod profile;
mod reminder;
mod vitals;

pub use alert::{
    breaches, decide, AlertState, VitalBreach, VitalsAlertReason, ALL_CLEAR_MESSAGE,
    FALL_ALERT_MESSAGE, VITALS_ALERT_MESSAGE,
};
pub use fall::{FallEvent, FallPayload, FALL_TIMESTAMP_FORMAT};
pub use profile::{PatientProfile, PatientProfileData, ProfileError};
pub use reminder::{
    format_phone_number, minute_key, normalize_time, ReminderCreate, ReminderEntry, ReminderError,
};
pub use vitals::{
    VitalFlags, VitalsPayload, VitalsReading, HEART_RATE_MAX_BPM, HEART_RATE_MIN_BPM,
    SPO2_MIN_PERCENT, TEMPERATURE_MAX_C, TEMPERATURE_MIN_C,
};

#[cfg(test)]
pub(crate) use profile::sample_profile;
