//! Dashboard state published by the poll loop

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{AlertState, FallEvent, VitalsReading};

use super::source::SourceKind;

/// Number of live readings kept for trend views
pub const HISTORY_CAPACITY: usize = 10;

/// A source that fell back during a cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceFailure {
    pub source: SourceKind,
    pub error: String,
}

/// Result of one poll cycle
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub fall: FallEvent,
    pub vitals: VitalsReading,
    pub alert: AlertState,
    pub failures: Vec<SourceFailure>,
    pub completed_at: DateTime<Utc>,
}

impl CycleOutcome {
    pub fn used_fallback(&self, source: SourceKind) -> bool {
        self.failures.iter().any(|f| f.source == source)
    }
}

/// Rolling window of the most recent live readings, oldest first
#[derive(Debug, Clone, Default, Serialize)]
pub struct VitalsHistory {
    readings: VecDeque<VitalsReading>,
}

impl VitalsHistory {
    pub fn push(&mut self, reading: VitalsReading) {
        if self.readings.len() == HISTORY_CAPACITY {
            self.readings.pop_front();
        }
        self.readings.push_back(reading);
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VitalsReading> {
        self.readings.iter()
    }
}

/// Everything the presentation layer needs to render the dashboard
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub fall: Option<FallEvent>,
    pub vitals: Option<VitalsReading>,
    pub alert: AlertState,
    /// Set while the latest cycle used substitute data
    pub notice: Option<String>,
    pub failures: Vec<SourceFailure>,
    pub last_updated: Option<DateTime<Utc>>,
    pub cycles: u64,
    pub fallback_cycles: u64,
    pub history: VitalsHistory,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True until the first cycle has been applied
    pub fn is_loading(&self) -> bool {
        self.last_updated.is_none()
    }

    pub fn apply(&mut self, outcome: CycleOutcome) {
        if !outcome.used_fallback(SourceKind::Vitals) {
            self.history.push(outcome.vitals.clone());
        }

        self.notice = fallback_notice(&outcome.failures);
        if self.notice.is_some() {
            self.fallback_cycles += 1;
        }

        self.fall = Some(outcome.fall);
        self.vitals = Some(outcome.vitals);
        self.alert = outcome.alert;
        self.failures = outcome.failures;
        self.last_updated = Some(outcome.completed_at);
        self.cycles += 1;
    }
}

fn fallback_notice(failures: &[SourceFailure]) -> Option<String> {
    if failures.is_empty() {
        return None;
    }
    let sources = failures
        .iter()
        .map(|f| f.source.display_name())
        .collect::<Vec<_>>()
        .join(", ");
    Some(format!(
        "Using fallback data due to API failure ({}).",
        sources
    ))
}
