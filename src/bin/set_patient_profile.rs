//! Utility to set the patient profile in the database
//!
//! Usage: `set_patient_profile field=value [field=value ...]`, e.g.
//! `set_patient_profile first_name=Asha last_name=Patil dob=1958-04-12 ...`

use livewell::config::Config;
use livewell::models::{PatientProfile, PatientProfileData};

/// Merge `field=value` arguments onto an empty profile
fn parse_args(args: &[String]) -> Result<PatientProfileData, String> {
    let mut fields = match serde_json::to_value(PatientProfileData::default()) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => return Err("Could not build empty profile".to_string()),
    };

    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| format!("Expected field=value, got '{}'", arg))?;
        if !fields.contains_key(key) {
            return Err(format!("Unknown profile field '{}'", key));
        }
        fields.insert(key.to_string(), serde_json::Value::String(value.to_string()));
    }

    serde_json::from_value(serde_json::Value::Object(fields)).map_err(|e| e.to_string())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let data = parse_args(&args)?;

    let config = Config::from_env();
    let db_path = config.database_path;
    println!("Database path: {}", db_path.display());

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let database = livewell::db::Database::new(&db_path)?;

    // Run migrations
    database.with_conn(|conn| {
        livewell::db::migrations::run_migrations(conn)?;
        Ok(())
    })?;

    let conn = database.get_conn()?;
    let profile = PatientProfile::set(&conn, &data)?;
    println!("Patient profile set:");
    println!("  Name: {} {}", profile.data.first_name, profile.data.last_name);
    println!("  DOB: {}", profile.data.dob);
    println!(
        "  Emergency contact: {} ({})",
        profile.data.emergency_contact_name, profile.data.emergency_phone
    );
    println!("  Updated: {}", profile.updated_at);

    Ok(())
}
