//! Patient Profile MCP Tools

use serde::Serialize;

use crate::db::Database;
use crate::models::{PatientProfile, PatientProfileData};

/// Response for get_patient_profile
#[derive(Debug, Serialize)]
pub struct GetProfileResponse {
    pub exists: bool,
    pub profile: Option<PatientProfile>,
}

/// Response for set_patient_profile
#[derive(Debug, Serialize)]
pub struct SetProfileResponse {
    pub success: bool,
    pub profile: PatientProfile,
}

pub fn get_patient_profile(db: &Database) -> Result<GetProfileResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let profile = PatientProfile::get(&conn)
        .map_err(|e| format!("Failed to get patient profile: {}", e))?;

    Ok(GetProfileResponse {
        exists: profile.is_some(),
        profile,
    })
}

/// Replace the stored profile. Missing required fields are reported by name.
pub fn set_patient_profile(db: &Database, data: PatientProfileData) -> Result<SetProfileResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let profile = PatientProfile::set(&conn, &data).map_err(|e| e.to_string())?;

    tracing::info!(updated_at = %profile.updated_at, "Patient profile saved");

    Ok(SetProfileResponse {
        success: true,
        profile,
    })
}
