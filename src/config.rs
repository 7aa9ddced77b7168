//! Runtime configuration
//!
//! Everything is read from `LIVEWELL_*` environment variables. Missing values
//! use the defaults below; unparseable values are logged and ignored.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

pub const DEFAULT_FALL_URL: &str = "http://127.0.0.1:5000/fall-detection";
pub const DEFAULT_VITALS_URL: &str = "http://127.0.0.1:5000/health-data";
pub const DEFAULT_REMINDER_URL: &str = "https://server-2i6q.onrender.com/api/sendReminder";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_REMINDER_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_COUNTRY_CODE: &str = "+91";

/// What happens to a reminder after it has been delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPolicy {
    /// Delete the reminder from the repository
    #[default]
    Remove,
    /// Keep the reminder but flag it as sent
    MarkSent,
}

impl DeliveryPolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "remove" | "delete" => Some(DeliveryPolicy::Remove),
            "mark_sent" | "mark" | "sent" => Some(DeliveryPolicy::MarkSent),
            _ => None,
        }
    }
}

/// Service configuration
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub database_path: PathBuf,
    pub fall_url: String,
    pub vitals_url: String,
    pub reminder_url: String,
    #[serde(with = "duration_secs")]
    pub poll_interval: Duration,
    #[serde(with = "duration_secs")]
    pub reminder_interval: Duration,
    #[serde(with = "option_duration_secs")]
    pub request_timeout: Option<Duration>,
    /// Divisor applied to temperature for display only; thresholds use the raw value
    pub temperature_display_divisor: f64,
    pub default_country_code: String,
    pub delivery_policy: DeliveryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            fall_url: DEFAULT_FALL_URL.to_string(),
            vitals_url: DEFAULT_VITALS_URL.to_string(),
            reminder_url: DEFAULT_REMINDER_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            reminder_interval: DEFAULT_REMINDER_INTERVAL,
            request_timeout: None,
            temperature_display_divisor: 1.0,
            default_country_code: DEFAULT_COUNTRY_CODE.to_string(),
            delivery_policy: DeliveryPolicy::Remove,
        }
    }
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("LIVEWELL_DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }
        if let Some(url) = lookup("LIVEWELL_FALL_URL") {
            config.fall_url = url;
        }
        if let Some(url) = lookup("LIVEWELL_VITALS_URL") {
            config.vitals_url = url;
        }
        if let Some(url) = lookup("LIVEWELL_REMINDER_URL") {
            config.reminder_url = url;
        }
        if let Some(secs) = parse_secs(&lookup, "LIVEWELL_POLL_INTERVAL_SECS") {
            config.poll_interval = secs;
        }
        if let Some(secs) = parse_secs(&lookup, "LIVEWELL_REMINDER_INTERVAL_SECS") {
            config.reminder_interval = secs;
        }
        config.request_timeout = parse_secs(&lookup, "LIVEWELL_HTTP_TIMEOUT_SECS");

        if let Some(raw) = lookup("LIVEWELL_TEMPERATURE_DISPLAY_DIVISOR") {
            match raw.trim().parse::<f64>() {
                Ok(d) if d.is_finite() && d > 0.0 => config.temperature_display_divisor = d,
                _ => tracing::warn!(value = %raw, "Ignoring invalid LIVEWELL_TEMPERATURE_DISPLAY_DIVISOR"),
            }
        }
        if let Some(code) = lookup("LIVEWELL_DEFAULT_COUNTRY_CODE") {
            let code = code.trim();
            if code.starts_with('+') && code.len() > 1 {
                config.default_country_code = code.to_string();
            } else {
                tracing::warn!(value = %code, "Ignoring invalid LIVEWELL_DEFAULT_COUNTRY_CODE");
            }
        }
        if let Some(raw) = lookup("LIVEWELL_REMINDER_POLICY") {
            match DeliveryPolicy::from_str(&raw) {
                Some(policy) => config.delivery_policy = policy,
                None => tracing::warn!(value = %raw, "Ignoring invalid LIVEWELL_REMINDER_POLICY"),
            }
        }

        config
    }
}

/// Parse a strictly positive number of seconds
fn parse_secs<F>(lookup: &F, key: &str) -> Option<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring invalid duration");
            None
        }
        Ok(secs) => Some(Duration::from_secs(secs)),
    }
}

/// `<project root>/data/livewell.db`, resolved relative to the executable
fn default_database_path() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    // Go up from target/release or target/debug to project root
    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(grandparent) = path.parent().and_then(|p| p.parent()) {
            path = grandparent.to_path_buf();
        }
    }

    path.push("data");
    path.push("livewell.db");
    path
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }
}

mod option_duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&d.as_secs()),
            None => s.serialize_none(),
        }
    }
}
