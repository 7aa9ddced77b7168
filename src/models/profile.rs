//! Patient profile model
//!
//! Single-row record describing the monitored person and their emergency
//! contact.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{DbError, DbResult};

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Please fill in the required field: {0}")]
    MissingField(&'static str),

    #[error("Database error: {0}")]
    Db(#[from] DbError),
}

/// Profile fields as submitted by the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientProfileData {
    pub first_name: String,
    pub last_name: String,
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

impl PatientProfileData {
    /// Check required fields, reporting the first one that is blank
    pub fn validate(&self) -> Result<(), ProfileError> {
        let required: [(&'static str, &str); 8] = [
            ("first_name", self.first_name.as_str()),
            ("last_name", self.last_name.as_str()),
            ("dob", self.dob.as_str()),
            ("gender", self.gender.as_str()),
            ("phone", self.phone.as_str()),
            ("email", self.email.as_str()),
            ("emergency_contact_name", self.emergency_contact_name.as_str()),
            ("emergency_phone", self.emergency_phone.as_str()),
        ];

        match required.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(ProfileError::MissingField(*field)),
            None => Ok(()),
        }
    }
}

/// Stored patient profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientProfile {
    #[serde(flatten)]
    pub data: PatientProfileData,
    pub created_at: String,
    pub updated_at: String,
}

impl PatientProfile {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            data: PatientProfileData {
                first_name: row.get("first_name")?,
                last_name: row.get("last_name")?,
                dob: row.get("dob")?,
                gender: row.get("gender")?,
                phone: row.get("phone")?,
                email: row.get("email")?,
                blood_type: row.get("blood_type")?,
                height: row.get("height")?,
                weight: row.get("weight")?,
                allergies: row.get("allergies")?,
                medications: row.get("medications")?,
                chronic_conditions: row.get("chronic_conditions")?,
                emergency_contact_name: row.get("emergency_contact_name")?,
                emergency_relationship: row.get("emergency_relationship")?,
                emergency_phone: row.get("emergency_phone")?,
                preferred_hospital: row.get("preferred_hospital")?,
            },
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn get(conn: &Connection) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM patient_profile WHERE id = 1")?;

        match stmt.query_row([], Self::from_row) {
            Ok(profile) => Ok(Some(profile)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Validate and upsert the profile
    pub fn set(conn: &Connection, data: &PatientProfileData) -> Result<Self, ProfileError> {
        data.validate()?;

        conn.execute(
            r#"
            INSERT INTO patient_profile (
                id, first_name, last_name, dob, gender, phone, email,
                blood_type, height, weight, allergies, medications, chronic_conditions,
                emergency_contact_name, emergency_relationship, emergency_phone, preferred_hospital
            )
            VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            ON CONFLICT(id) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                dob = excluded.dob,
                gender = excluded.gender,
                phone = excluded.phone,
                email = excluded.email,
                blood_type = excluded.blood_type,
                height = excluded.height,
                weight = excluded.weight,
                allergies = excluded.allergies,
                medications = excluded.medications,
                chronic_conditions = excluded.chronic_conditions,
                emergency_contact_name = excluded.emergency_contact_name,
                emergency_relationship = excluded.emergency_relationship,
                emergency_phone = excluded.emergency_phone,
                preferred_hospital = excluded.preferred_hospital,
                updated_at = datetime('now')
            "#,
            params![
                data.first_name.trim(),
                data.last_name.trim(),
                data.dob.trim(),
                data.gender.trim(),
                data.phone.trim(),
                data.email.trim(),
                data.blood_type,
                data.height,
                data.weight,
                data.allergies,
                data.medications,
                data.chronic_conditions,
                data.emergency_contact_name.trim(),
                data.emergency_relationship,
                data.emergency_phone.trim(),
                data.preferred_hospital,
            ],
        )
        .map_err(DbError::from)?;

        Ok(Self::get(conn)?
            .ok_or_else(|| DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))?)
    }
}

#[cfg(test)]
pub(crate) fn sample_profile() -> PatientProfileData {
    PatientProfileData {
        first_name: "Asha".to_string(),
        last_name: "Patil".to_string(),
        dob: "1958-04-12".to_string(),
        gender: "female".to_string(),
        phone: "+919800000001".to_string(),
        email: "asha@example.com".to_string(),
        blood_type: Some("B+".to_string()),
        allergies: Some("Penicillin".to_string()),
        emergency_contact_name: "Ravi Patil".to_string(),
        emergency_relationship: Some("Son".to_string()),
        emergency_phone: "+919800000002".to_string(),
        ..Default::default()
    }
}
