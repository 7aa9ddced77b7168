//! Reminder storage
//!
//! The scheduler and the MCP tools only see [`ReminderRepository`]. The
//! service uses the SQLite implementation; the in-memory one backs tests and
//! embedders that do not want a database file.

use std::sync::Mutex;

use crate::db::Database;
use crate::models::{ReminderCreate, ReminderEntry, ReminderError};

pub trait ReminderRepository: Send + Sync {
    /// All reminders in insertion order
    fn list(&self) -> Result<Vec<ReminderEntry>, ReminderError>;

    fn get(&self, id: i64) -> Result<Option<ReminderEntry>, ReminderError>;

    /// Store a new, unsent reminder
    fn put(&self, data: &ReminderCreate) -> Result<ReminderEntry, ReminderError>;

    /// Returns false if no reminder has this id
    fn mark_sent(&self, id: i64) -> Result<bool, ReminderError>;

    /// Returns false if no reminder has this id
    fn delete(&self, id: i64) -> Result<bool, ReminderError>;
}

/// Reminders in the `reminders` table
#[derive(Clone)]
pub struct SqliteReminderRepository {
    db: Database,
}

impl SqliteReminderRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl ReminderRepository for SqliteReminderRepository {
    fn list(&self) -> Result<Vec<ReminderEntry>, ReminderError> {
        Ok(self.db.with_conn(ReminderEntry::list)?)
    }

    fn get(&self, id: i64) -> Result<Option<ReminderEntry>, ReminderError> {
        Ok(self.db.with_conn(|conn| ReminderEntry::get_by_id(conn, id))?)
    }

    fn put(&self, data: &ReminderCreate) -> Result<ReminderEntry, ReminderError> {
        Ok(self.db.with_conn(|conn| ReminderEntry::create(conn, data))?)
    }

    fn mark_sent(&self, id: i64) -> Result<bool, ReminderError> {
        Ok(self.db.with_conn(|conn| ReminderEntry::mark_sent(conn, id))?)
    }

    fn delete(&self, id: i64) -> Result<bool, ReminderError> {
        Ok(self.db.with_conn(|conn| ReminderEntry::delete(conn, id))?)
    }
}

#[derive(Debug, Default)]
struct MemoryStore {
    entries: Vec<ReminderEntry>,
    last_id: i64,
}

/// Process-local reminder list
#[derive(Debug, Default)]
pub struct InMemoryReminderRepository {
    store: Mutex<MemoryStore>,
}

impl InMemoryReminderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> std::sync::MutexGuard<'_, MemoryStore> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ReminderRepository for InMemoryReminderRepository {
    fn list(&self) -> Result<Vec<ReminderEntry>, ReminderError> {
        Ok(self.store().entries.clone())
    }

    fn get(&self, id: i64) -> Result<Option<ReminderEntry>, ReminderError> {
        Ok(self.store().entries.iter().find(|r| r.id == id).cloned())
    }

    fn put(&self, data: &ReminderCreate) -> Result<ReminderEntry, ReminderError> {
        let mut store = self.store();
        store.last_id += 1;
        let entry = ReminderEntry {
            id: store.last_id,
            pill_name: data.pill_name.clone(),
            scheduled_time: data.scheduled_time.clone(),
            phone_number: data.phone_number.clone(),
            sent: false,
        };
        store.entries.push(entry.clone());
        Ok(entry)
    }

    fn mark_sent(&self, id: i64) -> Result<bool, ReminderError> {
        let mut store = self.store();
        match store.entries.iter_mut().find(|r| r.id == id) {
            Some(entry) => {
                entry.sent = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&self, id: i64) -> Result<bool, ReminderError> {
        let mut store = self.store();
        let before = store.entries.len();
        store.entries.retain(|r| r.id != id);
        Ok(store.entries.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_database;

    fn create(pill: &str, time: &str) -> ReminderCreate {
        ReminderCreate::new(pill, time, "9876543210", "+91").unwrap()
    }

    /// Behaviour every implementation must share
    fn exercise(repo: &dyn ReminderRepository) {
        let a = repo.put(&create("Aspirin", "08:00")).unwrap();
        let b = repo.put(&create("Metformin", "20:30")).unwrap();
        assert!(!a.sent);
        assert!(b.id > a.id);

        let names: Vec<String> = repo.list().unwrap().into_iter().map(|r| r.pill_name).collect();
        assert_eq!(names, vec!["Aspirin", "Metformin"]);

        assert!(repo.mark_sent(a.id).unwrap());
        assert!(repo.get(a.id).unwrap().unwrap().sent);
        assert!(!repo.mark_sent(999).unwrap());

        assert!(repo.delete(a.id).unwrap());
        assert!(!repo.delete(a.id).unwrap());
        assert!(repo.get(a.id).unwrap().is_none());
        assert_eq!(repo.list().unwrap(), vec![b]);
    }

    #[test]
    fn test_sqlite_repository() {
        exercise(&SqliteReminderRepository::new(test_database()));
    }

    #[test]
    fn test_in_memory_repository() {
        exercise(&InMemoryReminderRepository::new());
    }

    #[test]
    fn test_in_memory_ids_not_reused_after_delete() {
        let repo = InMemoryReminderRepository::new();
        let a = repo.put(&create("Aspirin", "08:00")).unwrap();
        repo.delete(a.id).unwrap();
        let b = repo.put(&create("Aspirin", "08:00")).unwrap();
        assert_ne!(a.id, b.id);
    }
}
