//! Vitals poll loop
//!
//! Every tick fetches both sources concurrently, substitutes fallbacks for
//! whichever failed, runs the threshold decision and publishes the outcome to
//! the shared [`DashboardState`].

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;

use crate::models::{decide, AlertState};
use crate::task::{LoopHandle, SingleFlight};

use super::fallback;
use super::source::{FallSource, SourceKind, VitalsSource};
use super::state::{CycleOutcome, DashboardState, SourceFailure};

pub type SharedDashboard = Arc<Mutex<DashboardState>>;

/// Run one fetch-and-decide cycle. Never fails: a broken source is replaced
/// by its fallback and recorded in [`CycleOutcome::failures`].
pub async fn run_cycle(fall: &dyn FallSource, vitals: &dyn VitalsSource) -> CycleOutcome {
    let (fall_result, vitals_result) = tokio::join!(fall.fetch_fall(), vitals.fetch_vitals());

    let mut failures = Vec::new();

    let fall = match fall_result {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(source = %SourceKind::Fall, error = %e, "Fetch failed, using fallback data");
            failures.push(SourceFailure {
                source: SourceKind::Fall,
                error: e.to_string(),
            });
            fallback::fall_event()
        }
    };

    let vitals = match vitals_result {
        Ok(reading) => reading,
        Err(e) => {
            tracing::warn!(source = %SourceKind::Vitals, error = %e, "Fetch failed, using fallback data");
            failures.push(SourceFailure {
                source: SourceKind::Vitals,
                error: e.to_string(),
            });
            fallback::vitals_reading()
        }
    };

    let alert = decide(&fall, &vitals);
    match &alert {
        AlertState::FallAlert(event) => {
            tracing::warn!(timestamp = %event.timestamp, "Fall detected");
        }
        AlertState::VitalsAlert(reason) => {
            tracing::warn!(reason = %reason.summary(), "Vitals outside safe range");
        }
        AlertState::None => {
            tracing::debug!(
                heart_rate = vitals.heart_rate_bpm,
                spo2 = vitals.spo2_percent,
                temperature = vitals.temperature_c,
                "Vitals normal"
            );
        }
    }

    CycleOutcome {
        fall,
        vitals,
        alert,
        failures,
        completed_at: Utc::now(),
    }
}

/// Polls the fall and vitals sources into a shared dashboard
#[derive(Clone)]
pub struct VitalsMonitor {
    fall: Arc<dyn FallSource>,
    vitals: Arc<dyn VitalsSource>,
    dashboard: SharedDashboard,
    flight: SingleFlight,
}

impl VitalsMonitor {
    pub fn new(fall: Arc<dyn FallSource>, vitals: Arc<dyn VitalsSource>) -> Self {
        Self {
            fall,
            vitals,
            dashboard: Arc::new(Mutex::new(DashboardState::new())),
            flight: SingleFlight::new(),
        }
    }

    pub fn dashboard(&self) -> SharedDashboard {
        Arc::clone(&self.dashboard)
    }

    pub fn is_cycle_running(&self) -> bool {
        self.flight.is_running()
    }

    /// Run a cycle right now. Returns `None` without fetching if a cycle is
    /// already in flight.
    pub async fn refresh(&self) -> Option<CycleOutcome> {
        let _guard = self.flight.try_begin()?;
        let outcome = run_cycle(self.fall.as_ref(), self.vitals.as_ref()).await;
        self.dashboard.lock().await.apply(outcome.clone());
        Some(outcome)
    }

    /// Start polling: one cycle immediately, then one per `interval`. Ticks
    /// that arrive while a cycle is still running are skipped. Results of a
    /// cycle that finishes after the handle is stopped are discarded.
    pub fn spawn(&self, interval: Duration) -> LoopHandle {
        let monitor = self.clone();

        LoopHandle::spawn("vitals-poll", move |mut signal| async move {
            let cycle_signal = signal.clone();
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            tracing::info!(interval_secs = interval.as_secs_f64(), "Vitals polling started");

            loop {
                tokio::select! {
                    biased;
                    _ = signal.wait() => break,
                    _ = ticker.tick() => {
                        let Some(guard) = monitor.flight.try_begin() else {
                            tracing::debug!("Previous poll cycle still running, skipping tick");
                            continue;
                        };

                        let monitor = monitor.clone();
                        let cycle_signal = cycle_signal.clone();
                        tokio::spawn(async move {
                            let _guard = guard;
                            let outcome = run_cycle(monitor.fall.as_ref(), monitor.vitals.as_ref()).await;
                            // Shutdown is checked while holding the lock
                            let mut state = monitor.dashboard.lock().await;
                            if cycle_signal.is_shutdown() {
                                tracing::debug!("Discarding poll result after shutdown");
                                return;
                            }
                            state.apply(outcome);
                        });
                    }
                }
            }

            tracing::info!("Vitals polling stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FallEvent, VitalBreach, VitalsReading};
    use crate::monitor::source::SourceError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted source: returns a fixed result after an optional delay
    struct FakeFall {
        detected: Option<bool>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl FakeFall {
        fn ok(detected: bool) -> Self {
            Self { detected: Some(detected), delay: Duration::ZERO, calls: AtomicUsize::new(0) }
        }

        fn failing() -> Self {
            Self { detected: None, delay: Duration::ZERO, calls: AtomicUsize::new(0) }
        }

        fn slow(delay: Duration) -> Self {
            Self { detected: Some(false), delay, calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl FallSource for FakeFall {
        async fn fetch_fall(&self) -> Result<FallEvent, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match self.detected {
                Some(fall_detected) => Ok(FallEvent {
                    fall_detected,
                    timestamp: "2025-03-01 09:00 AM".to_string(),
                    details: None,
                }),
                None => Err(SourceError::BadResponse("HTTP 500 Internal Server Error".to_string())),
            }
        }
    }

    struct FakeVitals {
        reading: Option<(f64, f64, f64)>,
        calls: AtomicUsize,
    }

    impl FakeVitals {
        fn ok(hr: f64, spo2: f64, temp: f64) -> Self {
            Self { reading: Some((hr, spo2, temp)), calls: AtomicUsize::new(0) }
        }

        fn failing() -> Self {
            Self { reading: None, calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl VitalsSource for FakeVitals {
        async fn fetch_vitals(&self) -> Result<VitalsReading, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reading {
                Some((hr, spo2, temp)) => Ok(VitalsReading {
                    heart_rate_bpm: hr,
                    spo2_percent: spo2,
                    temperature_c: temp,
                    observed_at: Utc::now(),
                }),
                None => Err(SourceError::BadResponse("malformed body".to_string())),
            }
        }
    }

    #[tokio::test]
    async fn test_fall_source_failure_still_evaluates_vitals() {
        let outcome = run_cycle(&FakeFall::failing(), &FakeVitals::ok(130.0, 95.0, 36.8)).await;

        assert!(!outcome.fall.fall_detected);
        assert_eq!(outcome.fall.timestamp, fallback::FALLBACK_FALL_TIMESTAMP);
        assert!(outcome.used_fallback(SourceKind::Fall));
        assert!(!outcome.used_fallback(SourceKind::Vitals));
        match outcome.alert {
            AlertState::VitalsAlert(reason) => {
                assert_eq!(reason.breaches, vec![VitalBreach::HeartRateHigh(130.0)])
            }
            other => panic!("expected vitals alert, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_both_sources_failing_is_safe() {
        let outcome = run_cycle(&FakeFall::failing(), &FakeVitals::failing()).await;

        assert_eq!(outcome.alert, AlertState::None);
        assert_eq!(outcome.failures.len(), 2);
        assert_eq!(outcome.vitals.heart_rate_bpm, fallback::FALLBACK_HEART_RATE_BPM);
        assert_eq!(outcome.vitals.spo2_percent, fallback::FALLBACK_SPO2_PERCENT);
        assert_eq!(outcome.vitals.temperature_c, fallback::FALLBACK_TEMPERATURE_C);
    }

    #[tokio::test]
    async fn test_vitals_failure_does_not_hide_fall() {
        let outcome = run_cycle(&FakeFall::ok(true), &FakeVitals::failing()).await;
        assert!(matches!(outcome.alert, AlertState::FallAlert(_)));
    }

    #[tokio::test]
    async fn test_refresh_publishes_to_dashboard() {
        let monitor = VitalsMonitor::new(
            Arc::new(FakeFall::failing()),
            Arc::new(FakeVitals::failing()),
        );
        assert!(monitor.dashboard().lock().await.is_loading());

        monitor.refresh().await.expect("no cycle in flight");

        let dashboard = monitor.dashboard();
        let state = dashboard.lock().await;
        assert!(!state.is_loading());
        assert!(state.notice.is_some());
        assert_eq!(state.alert, AlertState::None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_polls_immediately_then_every_interval() {
        let fall = Arc::new(FakeFall::ok(false));
        let vitals = Arc::new(FakeVitals::ok(72.0, 98.0, 36.6));
        let monitor = VitalsMonitor::new(fall.clone(), vitals.clone());

        let handle = monitor.spawn(Duration::from_secs(5));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fall.calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fall.calls.load(Ordering::SeqCst), 3);
        assert_eq!(vitals.calls.load(Ordering::SeqCst), 3);
        assert_eq!(monitor.dashboard().lock().await.cycles, 3);

        handle.shutdown().await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(fall.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_ticks_are_skipped() {
        let fall = Arc::new(FakeFall::slow(Duration::from_secs(12)));
        let vitals = Arc::new(FakeVitals::ok(72.0, 98.0, 36.6));
        let monitor = VitalsMonitor::new(fall.clone(), vitals);

        let _handle = monitor.spawn(Duration::from_secs(5));

        // Ticks at 5s and 10s land while the first cycle is still running
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(fall.calls.load(Ordering::SeqCst), 1);
        assert!(monitor.is_cycle_running());

        // First cycle ends at 12s, the 15s tick starts the second
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fall.calls.load(Ordering::SeqCst), 2);
        assert_eq!(monitor.dashboard().lock().await.cycles, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_after_shutdown_is_discarded() {
        let fall = Arc::new(FakeFall::slow(Duration::from_secs(10)));
        let monitor = VitalsMonitor::new(fall.clone(), Arc::new(FakeVitals::ok(72.0, 98.0, 36.6)));

        let handle = monitor.spawn(Duration::from_secs(5));
        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.stop();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(fall.calls.load(Ordering::SeqCst), 1);
        let dashboard = monitor.dashboard();
        let state = dashboard.lock().await;
        assert!(state.is_loading());
        assert_eq!(state.cycles, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_while_dashboard_locked_discards_result() {
        let fall = Arc::new(FakeFall::slow(Duration::from_secs(1)));
        let monitor = VitalsMonitor::new(fall.clone(), Arc::new(FakeVitals::ok(72.0, 98.0, 36.6)));

        let handle = monitor.spawn(Duration::from_secs(5));
        tokio::time::sleep(Duration::from_millis(100)).await;

        // The cycle finishes at 1s and then waits on the lock held here
        let dashboard = monitor.dashboard();
        let held = dashboard.lock().await;
        tokio::time::sleep(Duration::from_secs(2)).await;
        handle.stop();
        drop(held);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fall.calls.load(Ordering::SeqCst), 1);
        let state = dashboard.lock().await;
        assert_eq!(state.cycles, 0);
        assert!(state.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_stops_polling() {
        let fall = Arc::new(FakeFall::ok(false));
        let monitor = VitalsMonitor::new(fall.clone(), Arc::new(FakeVitals::ok(72.0, 98.0, 36.6)));

        let handle = monitor.spawn(Duration::from_secs(5));
        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(handle);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fall.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_skipped_while_cycle_in_flight() {
        let monitor = VitalsMonitor::new(
            Arc::new(FakeFall::ok(false)),
            Arc::new(FakeVitals::ok(72.0, 98.0, 36.6)),
        );
        let _guard = monitor.flight.try_begin().unwrap();
        assert!(monitor.refresh().await.is_none());
    }
}
