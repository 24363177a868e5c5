use crate::db::connection::Database;
use crate::errors::PipelineError;
use crate::scraper::PageProbe;
use rusqlite::params;

/// Appends a run's page-count probes.
pub fn save_probes(db: &Database, run_id: Option<i64>, probes: &[PageProbe]) -> Result<(), PipelineError> {
    db.with_conn(|conn| {
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO page_probes (run_id, source, property_type, locality, result_count, estimated_page_count, fetched_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for p in probes {
                stmt.execute(params![
                    run_id,
                    p.source.name(),
                    p.property_type,
                    p.locality,
                    p.result_count as i64,
                    p.estimated_page_count,
                    p.fetched_at,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    })
}
