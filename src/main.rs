//! LiveWell Monitor
//!
//! Polls fall-detection and vitals endpoints, sends medication reminders and
//! serves the dashboard over MCP.

use std::sync::Arc;

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use livewell::build_info;
use livewell::config::Config;
use livewell::db::{self, Database};
use livewell::mcp::LiveWellService;
use livewell::monitor::{build_client, HttpFallSource, HttpVitalsSource, VitalsMonitor};
use livewell::reminders::{HttpReminderSender, ReminderScheduler, SqliteReminderRepository};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (output to stderr to not interfere with MCP stdio)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("livewell=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    // Print startup banner to stderr
    build_info::print_startup_banner();
    eprintln!("Starting MCP server on stdio...");

    let config = Config::from_env();
    let db_path = config.database_path.clone();
    eprintln!("Database path: {}", db_path.display());

    // Ensure data directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Initialize database
    eprintln!("Initializing database...");
    let database = Database::new(&db_path)?;

    // Run migrations
    database.with_conn(|conn| {
        if db::migrations::needs_migration(conn)? {
            eprintln!("Applying database migrations...");
        }
        db::migrations::run_migrations(conn)?;
        let version = db::migrations::get_schema_version(conn)?;
        eprintln!("Database schema version: {}", version);
        Ok(())
    })?;

    let client = build_client(config.request_timeout)?;

    // Vitals polling
    let monitor = VitalsMonitor::new(
        Arc::new(HttpFallSource::new(client.clone(), config.fall_url.clone())),
        Arc::new(HttpVitalsSource::new(client.clone(), config.vitals_url.clone())),
    );
    let poll_handle = monitor.spawn(config.poll_interval);

    // Reminder scheduling
    let reminders = Arc::new(SqliteReminderRepository::new(database.clone()));
    let scheduler = ReminderScheduler::new(
        reminders.clone(),
        Arc::new(HttpReminderSender::new(client, config.reminder_url.clone())),
        config.delivery_policy,
    );
    let reminder_handle = scheduler.spawn(config.reminder_interval);

    // Create the LiveWell service
    let service = LiveWellService::new(config, database, monitor, reminders);

    // Create stdio transport
    let transport = (stdin(), stdout());

    // Start the MCP server
    let server = service.serve(transport).await?;

    // Wait for the server to complete
    server.waiting().await?;

    poll_handle.shutdown().await;
    reminder_handle.shutdown().await;

    Ok(())
}
