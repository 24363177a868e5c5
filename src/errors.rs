// errors.rs
use crate::scraper::ScraperError;
use thiserror::Error;

/// Errors that escape the pipeline boundary: collaborator failures (database,
/// export file) and configuration problems. Per-page and per-listing issues
/// are logged and absorbed long before they could become one of these.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Scraper error: {0}")]
    Scraper(#[from] ScraperError),

    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Database unavailable: {0}")]
    DbUnavailable(String),

    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
