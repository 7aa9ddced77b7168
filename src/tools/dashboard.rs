//! Dashboard MCP Tools
//!
//! Renders the monitor's shared state for MCP clients.

use serde::Serialize;

use crate::models::{AlertState, FallEvent, VitalsReading};
use crate::monitor::{DashboardState, SourceFailure, VitalsMonitor, HISTORY_CAPACITY};

/// Alert banner
#[derive(Debug, Serialize)]
pub struct AlertView {
    /// `none`, `fall_alert` or `vitals_alert`
    pub kind: &'static str,
    pub message: &'static str,
    pub is_alert: bool,
    /// Human-readable breach descriptions, vitals alerts only
    pub reasons: Vec<String>,
    /// When the fall happened, fall alerts only
    pub fall_timestamp: Option<String>,
}

impl From<&AlertState> for AlertView {
    fn from(alert: &AlertState) -> Self {
        let (kind, reasons, fall_timestamp) = match alert {
            AlertState::None => ("none", Vec::new(), None),
            AlertState::FallAlert(event) => ("fall_alert", Vec::new(), Some(event.timestamp.clone())),
            AlertState::VitalsAlert(reason) => (
                "vitals_alert",
                reason.breaches.iter().map(|b| b.describe()).collect(),
                None,
            ),
        };

        Self {
            kind,
            message: alert.message(),
            is_alert: alert.is_alert(),
            reasons,
            fall_timestamp,
        }
    }
}

/// One metric with its unit and range flag
#[derive(Debug, Serialize)]
pub struct MetricView {
    pub value: f64,
    pub unit: &'static str,
    pub out_of_range: bool,
}

#[derive(Debug, Serialize)]
pub struct VitalsView {
    pub heart_rate: MetricView,
    pub spo2: MetricView,
    /// Display temperature; see `temperature_raw_c` for the value alerts use
    pub temperature: MetricView,
    pub temperature_raw_c: f64,
    pub observed_at: String,
}

impl VitalsView {
    pub fn new(reading: &VitalsReading, temperature_divisor: f64) -> Self {
        let flags = reading.flags();
        Self {
            heart_rate: MetricView {
                value: reading.heart_rate_bpm,
                unit: "bpm",
                out_of_range: flags.heart_rate,
            },
            spo2: MetricView {
                value: reading.spo2_percent,
                unit: "%",
                out_of_range: flags.spo2,
            },
            temperature: MetricView {
                value: round_tenth(reading.display_temperature(temperature_divisor)),
                unit: "°C",
                out_of_range: flags.temperature,
            },
            temperature_raw_c: reading.temperature_c,
            observed_at: reading.observed_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FallView {
    pub fall_detected: bool,
    pub timestamp: String,
    pub details: Option<String>,
}

impl From<&FallEvent> for FallView {
    fn from(event: &FallEvent) -> Self {
        Self {
            fall_detected: event.fall_detected,
            timestamp: event.timestamp.clone(),
            details: event.details.clone(),
        }
    }
}

/// Response for get_dashboard
#[derive(Debug, Serialize)]
pub struct DashboardView {
    /// True until the first poll cycle completes
    pub loading: bool,
    /// Absent while loading
    pub alert: Option<AlertView>,
    pub vitals: Option<VitalsView>,
    pub fall: Option<FallView>,
    /// Fallback warning for the latest cycle
    pub notice: Option<String>,
    pub failed_sources: Vec<SourceFailure>,
    pub last_updated: Option<String>,
    pub cycles: u64,
    pub fallback_cycles: u64,
}

impl DashboardView {
    pub fn new(state: &DashboardState, temperature_divisor: f64) -> Self {
        let loading = state.is_loading();
        Self {
            loading,
            alert: (!loading).then(|| AlertView::from(&state.alert)),
            vitals: state
                .vitals
                .as_ref()
                .map(|r| VitalsView::new(r, temperature_divisor)),
            fall: state.fall.as_ref().map(FallView::from),
            notice: state.notice.clone(),
            failed_sources: state.failures.clone(),
            last_updated: state.last_updated.map(|t| t.to_rfc3339()),
            cycles: state.cycles,
            fallback_cycles: state.fallback_cycles,
        }
    }
}

/// Response for refresh_dashboard
#[derive(Debug, Serialize)]
pub struct RefreshDashboardResponse {
    /// False when a cycle was already running and this call did not start one
    pub refreshed: bool,
    pub dashboard: DashboardView,
}

/// Response for get_vitals_history
#[derive(Debug, Serialize)]
pub struct VitalsHistoryResponse {
    pub readings: Vec<VitalsView>,
    pub count: usize,
    pub capacity: usize,
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ============================================================================
// Tool Functions
// ============================================================================

pub async fn get_dashboard(monitor: &VitalsMonitor, temperature_divisor: f64) -> DashboardView {
    let dashboard = monitor.dashboard();
    let state = dashboard.lock().await;
    DashboardView::new(&state, temperature_divisor)
}

/// Run a cycle now, unless one is already in flight
pub async fn refresh_dashboard(
    monitor: &VitalsMonitor,
    temperature_divisor: f64,
) -> RefreshDashboardResponse {
    let refreshed = monitor.refresh().await.is_some();
    if !refreshed {
        tracing::debug!("Refresh requested while a poll cycle is running");
    }

    RefreshDashboardResponse {
        refreshed,
        dashboard: get_dashboard(monitor, temperature_divisor).await,
    }
}

pub async fn get_vitals_history(
    monitor: &VitalsMonitor,
    temperature_divisor: f64,
) -> VitalsHistoryResponse {
    let dashboard = monitor.dashboard();
    let state = dashboard.lock().await;
    let readings: Vec<VitalsView> = state
        .history
        .iter()
        .map(|r| VitalsView::new(r, temperature_divisor))
        .collect();

    VitalsHistoryResponse {
        count: readings.len(),
        readings,
        capacity: HISTORY_CAPACITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{decide, VITALS_ALERT_MESSAGE};
    use crate::monitor::{fallback, CycleOutcome, SourceKind};
    use chrono::Utc;

    fn state_with(hr: f64, temp: f64, failures: Vec<SourceFailure>) -> DashboardState {
        let fall = fallback::fall_event();
        let mut vitals = fallback::vitals_reading();
        vitals.heart_rate_bpm = hr;
        vitals.temperature_c = temp;
        let alert = decide(&fall, &vitals);

        let mut state = DashboardState::new();
        state.apply(CycleOutcome {
            fall,
            vitals,
            alert,
            failures,
            completed_at: Utc::now(),
        });
        state
    }

    #[test]
    fn test_loading_view_has_no_alert() {
        let view = DashboardView::new(&DashboardState::new(), 1.0);
        assert!(view.loading);
        assert!(view.alert.is_none());
        assert!(view.vitals.is_none());
    }

    #[test]
    fn test_vitals_alert_view_flags_metric() {
        let view = DashboardView::new(&state_with(130.0, 36.8, vec![]), 1.0);
        let alert = view.alert.unwrap();
        assert_eq!(alert.kind, "vitals_alert");
        assert_eq!(alert.message, VITALS_ALERT_MESSAGE);
        assert_eq!(alert.reasons.len(), 1);

        let vitals = view.vitals.unwrap();
        assert!(vitals.heart_rate.out_of_range);
        assert!(!vitals.spo2.out_of_range);
        assert!(!vitals.temperature.out_of_range);
    }

    #[test]
    fn test_display_divisor_does_not_change_alert() {
        let view = DashboardView::new(&state_with(72.0, 74.0, vec![]), 2.0);
        let vitals = view.vitals.unwrap();
        assert_eq!(vitals.temperature.value, 37.0);
        assert_eq!(vitals.temperature_raw_c, 74.0);
        assert!(vitals.temperature.out_of_range);
        assert_eq!(view.alert.unwrap().kind, "vitals_alert");
    }

    #[test]
    fn test_notice_passed_through() {
        let failure = SourceFailure {
            source: SourceKind::Vitals,
            error: "bad response: HTTP 500".to_string(),
        };
        let view = DashboardView::new(&state_with(110.0, 36.8, vec![failure]), 1.0);
        assert!(view.notice.is_some());
        assert_eq!(view.failed_sources.len(), 1);
        assert_eq!(view.alert.unwrap().kind, "none");
    }

    #[test]
    fn test_view_serializes() {
        let view = DashboardView::new(&state_with(72.0, 36.6, vec![]), 1.0);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["alert"]["kind"], "none");
        assert_eq!(json["vitals"]["heart_rate"]["unit"], "bpm");
    }
}
