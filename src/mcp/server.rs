//! LiveWell MCP Server Implementation
//!
//! Implements the MCP server with all LiveWell tools.

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::Config;
use crate::db::Database;
use crate::models::PatientProfileData;
use crate::monitor::VitalsMonitor;
use crate::reminders::ReminderRepository;
use crate::tools::dashboard;
use crate::tools::profile;
use crate::tools::reminders;
use crate::tools::status::StatusTracker;

/// LiveWell MCP Service
#[derive(Clone)]
pub struct LiveWellService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    config: Arc<Config>,
    database: Database,
    monitor: VitalsMonitor,
    reminders: Arc<dyn ReminderRepository>,
    tool_router: ToolRouter<LiveWellService>,
}

impl LiveWellService {
    pub fn new(
        config: Config,
        database: Database,
        monitor: VitalsMonitor,
        reminders: Arc<dyn ReminderRepository>,
    ) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(config.clone()))),
            config: Arc::new(config),
            database,
            monitor,
            reminders,
            tool_router: Self::tool_router(),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================================================
// Reminder Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddReminderParams {
    /// Name of the medication
    pub pill_name: String,
    /// 24-hour local time, HH:MM
    pub time: String,
    /// Number to text; the default country code is added if there is no leading +
    pub phone_number: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteReminderParams {
    pub id: i64,
}

// ============================================================================
// Profile Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetPatientProfileParams {
    pub first_name: String,
    pub last_name: String,
    /// Date of birth, YYYY-MM-DD
    pub dob: String,
    pub gender: String,
    pub phone: String,
    pub email: String,
    pub blood_type: Option<String>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub allergies: Option<String>,
    pub medications: Option<String>,
    pub chronic_conditions: Option<String>,
    pub emergency_contact_name: String,
    pub emergency_relationship: Option<String>,
    pub emergency_phone: String,
    pub preferred_hospital: Option<String>,
}

impl From<SetPatientProfileParams> for PatientProfileData {
    fn from(p: SetPatientProfileParams) -> Self {
        Self {
            first_name: p.first_name,
            last_name: p.last_name,
            dob: p.dob,
            gender: p.gender,
            phone: p.phone,
            email: p.email,
            blood_type: p.blood_type,
            height: p.height,
            weight: p.weight,
            allergies: p.allergies,
            medications: p.medications,
            chronic_conditions: p.chronic_conditions,
            emergency_contact_name: p.emergency_contact_name,
            emergency_relationship: p.emergency_relationship,
            emergency_phone: p.emergency_phone,
            preferred_hospital: p.preferred_hospital,
        }
    }
}

#[tool_router]
impl LiveWellService {
    // --- Status ---

    #[tool(description = "Get the current status of the LiveWell service including build info, database status, configured endpoints and polling intervals")]
    async fn livewell_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status();
        to_json(&status)
    }

    #[tool(description = "Get instructions for reading the dashboard, managing reminders and editing the patient profile. Call this before interpreting alerts for the first time.")]
    fn dashboard_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::DASHBOARD_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(DASHBOARD_INSTRUCTIONS)]))
    }

    // --- Dashboard ---

    #[tool(description = "Get the current alert (none, fall_alert or vitals_alert), latest vitals with out-of-range flags, fall status and any fallback-data notice")]
    async fn get_dashboard(&self) -> Result<CallToolResult, McpError> {
        let view = dashboard::get_dashboard(&self.monitor, self.config.temperature_display_divisor).await;
        to_json(&view)
    }

    #[tool(description = "Poll both sources immediately and return the updated dashboard. Does nothing extra if a poll is already running.")]
    async fn refresh_dashboard(&self) -> Result<CallToolResult, McpError> {
        let response =
            dashboard::refresh_dashboard(&self.monitor, self.config.temperature_display_divisor).await;
        to_json(&response)
    }

    #[tool(description = "Get the most recent live vitals readings, oldest first (fallback values are excluded)")]
    async fn get_vitals_history(&self) -> Result<CallToolResult, McpError> {
        let response =
            dashboard::get_vitals_history(&self.monitor, self.config.temperature_display_divisor).await;
        to_json(&response)
    }

    // --- Reminders ---

    #[tool(description = "Schedule a medication reminder text for a daily HH:MM time. The reminder is sent once and then removed.")]
    fn add_reminder(&self, Parameters(p): Parameters<AddReminderParams>) -> Result<CallToolResult, McpError> {
        let result = reminders::add_reminder(
            self.reminders.as_ref(),
            &p.pill_name,
            &p.time,
            &p.phone_number,
            &self.config.default_country_code,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "List medication reminders in the order they were added")]
    fn list_reminders(&self) -> Result<CallToolResult, McpError> {
        let result = reminders::list_reminders(self.reminders.as_ref())
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Delete a medication reminder by ID")]
    fn delete_reminder(&self, Parameters(p): Parameters<DeleteReminderParams>) -> Result<CallToolResult, McpError> {
        let result = reminders::delete_reminder(self.reminders.as_ref(), p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    // --- Patient Profile ---

    #[tool(description = "Get the patient profile (personal details, medical background and emergency contact)")]
    fn get_patient_profile(&self) -> Result<CallToolResult, McpError> {
        let result = profile::get_patient_profile(&self.database)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Create or replace the patient profile. Requires first_name, last_name, dob, gender, phone, email, emergency_contact_name and emergency_phone.")]
    fn set_patient_profile(&self, Parameters(p): Parameters<SetPatientProfileParams>) -> Result<CallToolResult, McpError> {
        let result = profile::set_patient_profile(&self.database, p.into())
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }
}

#[tool_handler]
impl ServerHandler for LiveWellService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "livewell".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("LiveWell Monitor".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "LiveWell Monitor - fall detection, vitals alerting and medication reminders for one patient. \
                 IMPORTANT: Call dashboard_instructions before interpreting alerts. \
                 If the dashboard carries a notice, the readings are fallback placeholders, not real data. \
                 Dashboard: get_dashboard, refresh_dashboard, get_vitals_history. \
                 Reminders: add_reminder, list_reminders, delete_reminder. \
                 Profile: get_patient_profile, set_patient_profile. \
                 Service: livewell_status."
                    .into(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_database;
    use crate::models::{FallEvent, VitalsReading};
    use crate::monitor::{FallSource, SourceError, VitalsSource};
    use crate::reminders::InMemoryReminderRepository;
    use async_trait::async_trait;

    struct Unreachable;

    #[async_trait]
    impl FallSource for Unreachable {
        async fn fetch_fall(&self) -> Result<FallEvent, SourceError> {
            Err(SourceError::BadResponse("HTTP 502 Bad Gateway".to_string()))
        }
    }

    #[async_trait]
    impl VitalsSource for Unreachable {
        async fn fetch_vitals(&self) -> Result<VitalsReading, SourceError> {
            Err(SourceError::BadResponse("HTTP 502 Bad Gateway".to_string()))
        }
    }

    fn service() -> LiveWellService {
        let monitor = VitalsMonitor::new(Arc::new(Unreachable), Arc::new(Unreachable));
        LiveWellService::new(
            Config::default(),
            test_database(),
            monitor,
            Arc::new(InMemoryReminderRepository::new()),
        )
    }

    #[test]
    fn test_server_info() {
        let info = service().get_info();
        assert_eq!(info.server_info.name, "livewell");
        assert!(info.instructions.unwrap().contains("dashboard_instructions"));
    }

    #[test]
    fn test_all_tools_registered() {
        let names: Vec<String> = service()
            .tool_router
            .list_all()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();

        for expected in [
            "livewell_status",
            "dashboard_instructions",
            "get_dashboard",
            "refresh_dashboard",
            "get_vitals_history",
            "add_reminder",
            "list_reminders",
            "delete_reminder",
            "get_patient_profile",
            "set_patient_profile",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing tool {}", expected);
        }
    }

    #[tokio::test]
    async fn test_refresh_uses_fallback_when_sources_down() {
        let service = service();
        service.refresh_dashboard().await.unwrap();

        let dashboard = service.monitor.dashboard();
        let state = dashboard.lock().await;
        assert_eq!(state.failures.len(), 2);
        assert!(state.notice.is_some());
        assert!(!state.alert.is_alert());
    }
}
