//! Database module
//!
//! Handles SQLite connection and migrations.

pub mod connection;
pub mod migrations;

pub use connection::{Database, DbError, DbResult};

/// Open an in-memory database with the current schema applied.
#[cfg(test)]
pub(crate) fn test_database() -> Database {
    let db = Database::in_memory().unwrap();
    db.with_conn(migrations::run_migrations).unwrap();
    db
}
