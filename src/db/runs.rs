use crate::db::connection::Database;
use crate::errors::PipelineError;
use rusqlite::params;

#[derive(Debug)]
pub struct PipelineRun {
    pub id: i64,
    pub source: String,
    pub started_at: i64,
    pub finished_at: Option<i64>,
    pub pages_fetched: Option<i64>,
    pub listings_emitted: Option<i64>,
    pub success: bool,
    pub error_message: Option<String>,
}

pub fn start_run(db: &Database, source: &str, now: i64) -> Result<i64, PipelineError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO pipeline_runs (source, started_at, success) VALUES (?1, ?2, 0)",
            params![source, now],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

pub fn end_run(
    db: &Database,
    run_id: i64,
    now: i64,
    pages: usize,
    listings: usize,
    error: Option<String>,
) -> Result<(), PipelineError> {
    let success = error.is_none();
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE pipeline_runs SET finished_at = ?1, pages_fetched = ?2, listings_emitted = ?3, success = ?4, error_message = ?5 WHERE id = ?6",
            params![now, pages as i64, listings as i64, success, error, run_id],
        )?;
        Ok(())
    })
}

pub fn recent_runs(db: &Database, limit: u32) -> Result<Vec<PipelineRun>, PipelineError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, source, started_at, finished_at, pages_fetched, listings_emitted, success, error_message
             FROM pipeline_runs ORDER BY id DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit], |row| {
            Ok(PipelineRun {
                id: row.get(0)?,
                source: row.get(1)?,
                started_at: row.get(2)?,
                finished_at: row.get(3)?,
                pages_fetched: row.get(4)?,
                listings_emitted: row.get(5)?,
                success: row.get(6)?,
                error_message: row.get(7)?,
            })
        })?;

        let mut runs = Vec::new();
        for r in rows {
            runs.push(r?);
        }
        Ok(runs)
    })
}
