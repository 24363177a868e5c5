use crate::config::{GeocoderProvider, PipelineConfig, SearchScope};
use crate::db::listings::count_listings;
use crate::db::probes::save_probes;
use crate::db::runs::{end_run, recent_runs, start_run};
use crate::db::{init_db, Database, ListingSink};
use crate::errors::PipelineError;
use crate::geo::build_geocoder;
use crate::pipeline::{run_source, PipelineReport};
use crate::scraper::{BrowserPageClient, HttpPageClient, PageClient, PageClients, Source};
use crate::spreadsheets::export_listings_xlsx;
use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

mod config;
mod db;
mod domain;
mod errors;
mod geo;
mod pipeline;
mod scraper;
mod spreadsheets;
mod workers;

#[cfg(test)]
mod tests;

/// Harvests rental listings for every (type, locality) pair, geocodes them and
/// stores them per source.
#[derive(Parser, Debug)]
#[command(name = "rental_harvester")]
struct Cli {
    /// Property type slugs, comma separated (e.g. departamentos,casas)
    #[arg(long, value_delimiter = ',', required = true)]
    types: Vec<String>,
    /// Locality slugs, comma separated (e.g. rosario,funes)
    #[arg(long, value_delimiter = ',', required = true)]
    localities: Vec<String>,
    /// Sites to harvest
    #[arg(long, value_enum, value_delimiter = ',', default_values = ["argenprop", "zonaprop"])]
    sources: Vec<Source>,
    /// SQLite database file
    #[arg(long, default_value = "rental_harvester.sqlite3")]
    db: String,
    /// Also write every harvested listing to this spreadsheet
    #[arg(long)]
    xlsx: Option<PathBuf>,

    #[arg(long, default_value_t = 16)]
    fetch_concurrency: usize,
    /// Browser tabs rendering zonaprop pages at once
    #[arg(long, default_value_t = 5)]
    browser_pool_size: usize,
    /// Chrome or Chromium binary for script-rendered sites
    #[arg(long, env = "CHROME_EXECUTABLE")]
    browser_executable: Option<PathBuf>,
    #[arg(long, default_value_t = 30)]
    http_timeout_secs: u64,

    #[arg(long, value_enum, default_value = "arcgis")]
    geocoder: GeocoderProvider,
    #[arg(long, env = "ARCGIS_API_KEY", hide_env_values = true)]
    arcgis_api_key: Option<String>,
    #[arg(long, default_value_t = 6)]
    geocode_workers: usize,
    #[arg(long, default_value_t = 3)]
    geocode_attempts: u32,
    /// Backoff unit; attempt n waits n units
    #[arg(long, default_value_t = 1000)]
    geocode_backoff_ms: u64,
    #[arg(long, default_value_t = 0)]
    geocode_jitter_ms: u64,
    /// Stop geocoding once fewer than this share of listings is unresolved
    #[arg(long, default_value_t = 0.10)]
    convergence_threshold: f64,
    #[arg(long, default_value_t = 10)]
    max_geocode_rounds: u32,
    #[arg(long, default_value = "Argentina")]
    country: String,
}

impl Cli {
    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            fetch_concurrency: self.fetch_concurrency,
            browser_pool_size: self.browser_pool_size,
            browser_executable: self.browser_executable.clone(),
            http_timeout: Duration::from_secs(self.http_timeout_secs),
            geocoder: self.geocoder,
            geocoder_api_key: self.arcgis_api_key.clone(),
            geocode_workers: self.geocode_workers,
            geocode_attempts: self.geocode_attempts,
            geocode_backoff_unit: Duration::from_millis(self.geocode_backoff_ms),
            geocode_jitter: Duration::from_millis(self.geocode_jitter_ms),
            convergence_threshold: self.convergence_threshold,
            max_geocode_rounds: self.max_geocode_rounds,
            country: self.country.clone(),
            ..PipelineConfig::default()
        }
    }

    /// Requested sources in order, without repeats.
    fn sources(&self) -> Vec<Source> {
        let mut out = Vec::new();
        for s in &self.sources {
            if !out.contains(s) {
                out.push(*s);
            }
        }
        out
    }
}

fn unix_now() -> i64 {
    Utc::now().timestamp()
}

/// Plain HTTP for every source, plus a headless browser when a requested
/// source renders its results with scripts.
async fn page_clients(config: &PipelineConfig, sources: &[Source]) -> Result<PageClients> {
    let plain: Arc<dyn PageClient> =
        Arc::new(HttpPageClient::new(config).context("building HTTP client")?);

    let rendering: Option<Arc<dyn PageClient>> = if sources.iter().any(Source::needs_script) {
        let browser = BrowserPageClient::launch(config)
            .await
            .context("launching headless browser (set --browser-executable, or leave zonaprop out of --sources)")?;
        Some(Arc::new(browser))
    } else {
        None
    };
    Ok(PageClients::new(plain, rendering))
}

/// Persists a finished pass: its probes, then its listings.
fn store_report(db: &Database, run_id: i64, report: &PipelineReport) -> Result<usize, PipelineError> {
    save_probes(db, Some(run_id), &report.probes)?;
    db.upsert(report.source, &report.listings)
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let scope = SearchScope::new(&cli.types, &cli.localities);
    let config = cli.pipeline_config();
    config.validate().map_err(PipelineError::Config)?;

    let db = Database::new(cli.db.as_str());
    init_db(&db).with_context(|| format!("opening database {}", cli.db))?;

    info!(
        types = ?scope.property_types(),
        localities = ?scope.localities(),
        "search scope"
    );

    let sources = cli.sources();
    let clients = page_clients(&config, &sources).await?;
    let geocoder = build_geocoder(&config).context("building geocoder")?;

    let mut harvested = Vec::new();
    for &source in &sources {
        let run_id = start_run(&db, source.name(), unix_now())?;
        let pages = clients.for_source(source);
        let report = run_source(source, &scope, &config, pages, geocoder.clone()).await;

        let outcome = store_report(&db, run_id, &report);
        let failure = outcome.as_ref().err().map(|e| e.to_string());
        end_run(&db, run_id, unix_now(), report.pages_fetched, report.listings.len(), failure)?;

        match outcome {
            Ok(rows) => info!(
                %source,
                rows,
                stored = count_listings(&db, source)?,
                "source stored"
            ),
            Err(e) => error!(%source, error = %e, "storing listings failed"),
        }
        harvested.extend(report.listings);
    }

    if let Some(path) = &cli.xlsx {
        export_listings_xlsx(&harvested, path)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    for run in recent_runs(&db, sources.len() as u32)? {
        info!(
            id = run.id,
            source = %run.source,
            started_at = run.started_at,
            finished_at = ?run.finished_at,
            pages = ?run.pages_fetched,
            listings = ?run.listings_emitted,
            success = run.success,
            error = ?run.error_message,
            "run recorded"
        );
    }

    info!(listings = harvested.len(), "harvest complete");
    Ok(())
}
