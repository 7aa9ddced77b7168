//! Minute-resolution reminder scheduler
//!
//! Each check compares every unsent reminder against the current local
//! `HH:MM`. A reminder whose minute is missed entirely (service down, check
//! delayed past the minute) is not caught up.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveTime};
use serde::Serialize;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::DeliveryPolicy;
use crate::models::{minute_key, ReminderEntry, ReminderError};
use crate::task::{LoopHandle, SingleFlight};

use super::delivery::ReminderSender;
use super::repository::ReminderRepository;

/// What one check did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    /// Unsent reminders matching the checked minute
    pub due: usize,
    pub delivered: Vec<i64>,
    pub failed: Vec<i64>,
}

#[derive(Clone)]
pub struct ReminderScheduler {
    repository: Arc<dyn ReminderRepository>,
    sender: Arc<dyn ReminderSender>,
    policy: DeliveryPolicy,
    flight: SingleFlight,
}

impl ReminderScheduler {
    pub fn new(
        repository: Arc<dyn ReminderRepository>,
        sender: Arc<dyn ReminderSender>,
        policy: DeliveryPolicy,
    ) -> Self {
        Self {
            repository,
            sender,
            policy,
            flight: SingleFlight::new(),
        }
    }

    pub fn policy(&self) -> DeliveryPolicy {
        self.policy
    }

    /// Deliver every unsent reminder scheduled for `now`'s minute.
    ///
    /// Delivery failures are logged and leave the reminder untouched; only a
    /// repository read failure aborts the check.
    pub async fn check_due(&self, now: NaiveTime) -> Result<CheckReport, ReminderError> {
        let key = minute_key(now);
        let due: Vec<ReminderEntry> = self
            .repository
            .list()?
            .into_iter()
            .filter(|r| !r.sent && r.scheduled_time == key)
            .collect();

        let mut report = CheckReport {
            due: due.len(),
            ..CheckReport::default()
        };

        for reminder in due {
            match self.sender.send(&reminder).await {
                Ok(()) => {
                    tracing::info!(
                        id = reminder.id,
                        pill_name = %reminder.pill_name,
                        time = %reminder.scheduled_time,
                        "Reminder sent"
                    );
                    self.settle(&reminder);
                    report.delivered.push(reminder.id);
                }
                Err(e) => {
                    tracing::warn!(
                        id = reminder.id,
                        pill_name = %reminder.pill_name,
                        error = %e,
                        "Failed to send reminder"
                    );
                    report.failed.push(reminder.id);
                }
            }
        }

        Ok(report)
    }

    /// Apply the delivery policy to a reminder that was just sent
    fn settle(&self, reminder: &ReminderEntry) {
        let result = match self.policy {
            DeliveryPolicy::Remove => self.repository.delete(reminder.id),
            DeliveryPolicy::MarkSent => self.repository.mark_sent(reminder.id),
        };
        if let Err(e) = result {
            tracing::error!(id = reminder.id, error = %e, "Reminder sent but could not be updated");
        }
    }

    /// Check once per `interval`, starting one interval from now
    pub fn spawn(&self, interval: Duration) -> LoopHandle {
        let scheduler = self.clone();

        LoopHandle::spawn("reminder-scheduler", move |mut signal| async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            tracing::info!(
                interval_secs = interval.as_secs_f64(),
                policy = ?scheduler.policy,
                "Reminder scheduler started"
            );

            loop {
                tokio::select! {
                    biased;
                    _ = signal.wait() => break,
                    _ = ticker.tick() => {
                        let Some(guard) = scheduler.flight.try_begin() else {
                            tracing::debug!("Previous reminder check still running, skipping tick");
                            continue;
                        };

                        let scheduler = scheduler.clone();
                        tokio::spawn(async move {
                            let _guard = guard;
                            match scheduler.check_due(Local::now().time()).await {
                                Ok(report) if report.due > 0 => {
                                    tracing::debug!(
                                        due = report.due,
                                        delivered = report.delivered.len(),
                                        failed = report.failed.len(),
                                        "Reminder check complete"
                                    );
                                }
                                Ok(_) => {}
                                Err(e) => tracing::warn!(error = %e, "Reminder check failed"),
                            }
                        });
                    }
                }
            }

            tracing::info!("Reminder scheduler stopped");
        })
    }
}
