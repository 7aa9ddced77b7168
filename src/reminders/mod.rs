//! Medication reminders
//!
//! Storage behind [`ReminderRepository`], delivery behind [`ReminderSender`]
//! and the once-a-minute [`ReminderScheduler`] tying the two together.

mod delivery;
mod repository;
mod scheduler;

pub use delivery::{DeliveryError, HttpReminderSender, ReminderMessage, ReminderSender};
pub use repository::{InMemoryReminderRepository, ReminderRepository, SqliteReminderRepository};
pub use scheduler::{CheckReport, ReminderScheduler};
