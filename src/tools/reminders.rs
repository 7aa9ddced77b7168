//! Reminder MCP Tools
//!
//! Tools for managing medication reminders.

use serde::Serialize;

use crate::models::{ReminderCreate, ReminderEntry};
use crate::reminders::ReminderRepository;

/// Response for add_reminder
#[derive(Debug, Serialize)]
pub struct AddReminderResponse {
    pub success: bool,
    pub reminder: ReminderEntry,
}

/// Response for list_reminders
#[derive(Debug, Serialize)]
pub struct ListRemindersResponse {
    pub reminders: Vec<ReminderEntry>,
    pub total: usize,
    pub pending_count: usize,
}

/// Response for delete_reminder
#[derive(Debug, Serialize)]
pub struct DeleteReminderResponse {
    pub success: bool,
    pub deleted_id: i64,
}

// ============================================================================
// Tool Functions
// ============================================================================

/// Validate and store a new reminder
pub fn add_reminder(
    repo: &dyn ReminderRepository,
    pill_name: &str,
    time: &str,
    phone_number: &str,
    default_country_code: &str,
) -> Result<AddReminderResponse, String> {
    let data = ReminderCreate::new(pill_name, time, phone_number, default_country_code)
        .map_err(|e| e.to_string())?;

    let reminder = repo
        .put(&data)
        .map_err(|e| format!("Failed to create reminder: {}", e))?;

    tracing::info!(
        id = reminder.id,
        pill_name = %reminder.pill_name,
        time = %reminder.scheduled_time,
        "Reminder added"
    );

    Ok(AddReminderResponse {
        success: true,
        reminder,
    })
}

pub fn list_reminders(repo: &dyn ReminderRepository) -> Result<ListRemindersResponse, String> {
    let reminders = repo
        .list()
        .map_err(|e| format!("Failed to list reminders: {}", e))?;

    let pending_count = reminders.iter().filter(|r| !r.sent).count();

    Ok(ListRemindersResponse {
        total: reminders.len(),
        pending_count,
        reminders,
    })
}

pub fn delete_reminder(repo: &dyn ReminderRepository, id: i64) -> Result<DeleteReminderResponse, String> {
    let deleted = repo
        .delete(id)
        .map_err(|e| format!("Failed to delete reminder: {}", e))?;

    if !deleted {
        return Err(format!("Reminder {} not found", id));
    }

    Ok(DeleteReminderResponse {
        success: true,
        deleted_id: id,
    })
}
