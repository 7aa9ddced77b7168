//! LiveWell Tools module
//!
//! MCP tool implementations for the LiveWell monitor.

pub mod dashboard;
pub mod profile;
pub mod reminders;
pub mod status;
