//! LiveWell Monitor Library
//!
//! Fall-detection and vitals alerting, medication reminders and the patient
//! profile, served over MCP.

pub mod build_info;
pub mod config;
pub mod db;
pub mod mcp;
pub mod models;
pub mod monitor;
pub mod reminders;
pub mod task;
pub mod tools;
