//! LiveWell Status Tool
//!
//! Provides runtime status information about the LiveWell service.

use serde::Serialize;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::config::{Config, DeliveryPolicy};

/// Dashboard usage instructions for AI assistants
pub const DASHBOARD_INSTRUCTIONS: &str = r#"
# LiveWell Dashboard Instructions

LiveWell watches one patient. It polls a fall-detection endpoint and a vitals
endpoint every few seconds and turns the two readings into a single alert.

## Reading the Dashboard

**Tool:** `get_dashboard`

The `alert` object always has a `kind`:

| kind | meaning | banner |
|------|---------|--------|
| `none` | no fall, all vitals in range | "Everything is fine. No worries!" |
| `fall_alert` | the fall sensor reported a fall | "Fall detected! Immediate attention required." |
| `vitals_alert` | at least one vital is out of range | "Health fluctuations detected! Monitor closely." |

A fall always wins: if a fall is reported, the alert is `fall_alert` even when
the vitals are also out of range.

### Safe ranges

- Heart rate: 50 to 120 bpm (inclusive)
- SpO2: 90% or higher
- Temperature: 35 to 38 °C (inclusive)

Each reading carries an `out_of_range` flag so you can point at the exact
value that triggered an alert.

### Fallback data

If an endpoint cannot be reached or returns garbage, LiveWell substitutes
fixed safe values for that source and sets `notice`, for example:

```
"notice": "Using fallback data due to API failure (Vitals)."
```

**When `notice` is set, tell the user the numbers are placeholders.** Do not
report fallback vitals as the patient's real readings. `failed_sources` lists
which endpoints failed in the latest cycle.

`loading: true` means no cycle has completed yet.

## Refreshing

**Tool:** `refresh_dashboard`

Runs a poll cycle immediately instead of waiting for the next tick. If a cycle
is already running, the current dashboard is returned with `refreshed: false`.

## Trends

**Tool:** `get_vitals_history`

Returns the last 10 live readings, oldest first. Fallback values are never
recorded in the history.

---

# Medication Reminders

Reminders fire once, at the minute they are scheduled for (local time).

**Tool:** `add_reminder`
```json
{
  "pill_name": "Metformin",
  "time": "20:30",
  "phone_number": "9876543210"
}
```

- `time` is 24-hour `HH:MM`; `8:05` is stored as `08:05`
- Phone numbers without a leading `+` get the default country code
- Once delivered the reminder is removed (or marked sent, depending on
  service configuration)
- A reminder whose minute passes while the service is down is not sent later

**Tool:** `list_reminders` shows pending reminders in the order they were added.

**Tool:** `delete_reminder` removes one by `id`.

---

# Patient Profile

**Tool:** `get_patient_profile`

**Tool:** `set_patient_profile` replaces the whole profile. Required fields:
`first_name`, `last_name`, `dob` (YYYY-MM-DD), `gender`, `phone`,
`email`, `emergency_contact_name`, `emergency_phone`. All other fields
are optional.
"#;

/// Runtime status of the LiveWell service
#[derive(Debug, Clone, Serialize)]
pub struct LiveWellStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,

    /// Upstream endpoints
    pub fall_url: String,
    pub vitals_url: String,
    pub reminder_url: String,

    /// Loop settings
    pub poll_interval_secs: u64,
    pub reminder_interval_secs: u64,
    pub request_timeout_secs: Option<u64>,
    pub reminder_policy: DeliveryPolicy,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    config: Config,
}

impl StatusTracker {
    pub fn new(config: Config) -> Self {
        Self {
            start_time: Instant::now(),
            config,
        }
    }

    pub fn get_status(&self) -> LiveWellStatus {
        let build_info = BuildInfo::current();
        let config = &self.config;

        let database_size_bytes = std::fs::metadata(&config.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        LiveWellStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: config.database_path.display().to_string(),
            database_size_bytes,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
            fall_url: config.fall_url.clone(),
            vitals_url: config.vitals_url.clone(),
            reminder_url: config.reminder_url.clone(),
            poll_interval_secs: config.poll_interval.as_secs(),
            reminder_interval_secs: config.reminder_interval.as_secs(),
            request_timeout_secs: config.request_timeout.map(|t| t.as_secs()),
            reminder_policy: config.delivery_policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_status_reports_config() {
        let config = Config {
            database_path: std::env::temp_dir().join("livewell-status-missing.db"),
            request_timeout: Some(Duration::from_secs(8)),
            ..Config::default()
        };
        let status = StatusTracker::new(config).get_status();

        assert_eq!(status.process_id, std::process::id());
        assert_eq!(status.poll_interval_secs, 5);
        assert_eq!(status.reminder_interval_secs, 60);
        assert_eq!(status.request_timeout_secs, Some(8));
        assert_eq!(status.reminder_policy, DeliveryPolicy::Remove);
        assert!(status.database_size_bytes.is_none());
    }
}
