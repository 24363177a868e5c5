use rusqlite::Connection;
use std::cell::RefCell;
use std::collections::HashMap;
use tracing::info;

use crate::errors::PipelineError;

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

// Thread-local connection slots, one per database path.
thread_local! {
    static DB_CONNS: RefCell<HashMap<String, Connection>> = RefCell::new(HashMap::new());
}

#[derive(Debug, Clone)]
pub struct Database {
    path: String,
}

impl Database {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Provides this thread's connection to `path` to the closure, opening it
    /// on first use.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, PipelineError>
    where
        F: FnOnce(&mut Connection) -> Result<T, PipelineError>,
    {
        DB_CONNS
            .try_with(|cell| {
                let mut slots = cell.borrow_mut();
                if !slots.contains_key(&self.path) {
                    let conn = Connection::open(&self.path).map_err(|e| {
                        PipelineError::DbUnavailable(format!("open {} failed: {e}", self.path))
                    })?;
                    slots.insert(self.path.clone(), conn);
                }
                match slots.get_mut(&self.path) {
                    Some(conn) => f(conn),
                    None => Err(PipelineError::DbUnavailable(self.path.clone())),
                }
            })
            .map_err(|_| PipelineError::DbUnavailable("thread-local slot destroyed".into()))?
    }
}

/// Opens the database and applies the embedded schema. Safe to repeat.
pub fn init_db(db: &Database) -> Result<(), PipelineError> {
    db.with_conn(|conn| {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    })?;

    info!(path = db.path(), "database ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_applies_twice() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("h.sqlite").to_string_lossy());
        init_db(&db).unwrap();
        init_db(&db).unwrap();

        let tables: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name LIKE 'listings_%'",
                    [],
                    |r| r.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(tables, 2);
    }

    #[test]
    fn connections_are_per_path() {
        let dir = tempfile::tempdir().unwrap();
        let a = Database::new(dir.path().join("a.sqlite").to_string_lossy());
        let b = Database::new(dir.path().join("b.sqlite").to_string_lossy());
        init_db(&a).unwrap();

        let in_b: i64 = b
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
                    [],
                    |r| r.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(in_b, 0);
    }
}
