//! One harvesting pass over a source:
//! estimate pages, fetch them, extract listings, normalize, geocode, and
//! measure landmark distances.

use crate::config::{PipelineConfig, SearchScope};
use crate::domain::{normalize, EnrichedListing};
use crate::geo::{DistanceCalculator, Geocoder, GeocodingEnricher};
use crate::scraper::extract::extract_all;
use crate::scraper::{PageClient, PageEstimator, PageFetcher, PageProbe, Source};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// What a pass produced, plus the counts needed for the run ledger.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub source: Source,
    pub probes: Vec<PageProbe>,
    pub pages_fetched: usize,
    pub raw_count: usize,
    pub listings: Vec<EnrichedListing>,
    pub geocode_rounds: u32,
}

impl PipelineReport {
    fn empty(source: Source) -> Self {
        Self {
            source,
            probes: Vec::new(),
            pages_fetched: 0,
            raw_count: 0,
            listings: Vec::new(),
            geocode_rounds: 0,
        }
    }

    pub fn resolved_count(&self) -> usize {
        self.listings.iter().filter(|l| l.coordinates.is_some()).count()
    }
}

/// Runs the whole pass for one source. Never fails: per-page and per-listing
/// problems only shrink the result.
#[instrument(skip_all, fields(source = %source))]
pub async fn run_source(
    source: Source,
    scope: &SearchScope,
    config: &PipelineConfig,
    pages: Arc<dyn PageClient>,
    geocoder: Arc<dyn Geocoder>,
) -> PipelineReport {
    if scope.is_empty() {
        warn!("search scope has no (type, locality) combinations");
        return PipelineReport::empty(source);
    }

    let concurrency = config.concurrency_for(source);

    let probes = PageEstimator::new(pages.clone(), concurrency)
        .probe(source, scope)
        .await;

    let fetched = PageFetcher::new(pages, concurrency)
        .fetch_all(source, scope, &probes)
        .await;
    let pages_fetched = fetched.len();

    let raw = extract_all(&fetched);
    drop(fetched);
    let raw_count = raw.len();

    let listings = normalize(raw);
    let outcome = GeocodingEnricher::new(geocoder, config)
        .enrich(listings)
        .await;
    let geocode_rounds = outcome.rounds;
    let unresolved = outcome.unresolved();
    if unresolved > 0 {
        info!(unresolved, "listings left without coordinates");
    }
    let listings = DistanceCalculator::enrich(outcome.resolved);

    let report = PipelineReport {
        source,
        probes,
        pages_fetched,
        raw_count,
        listings,
        geocode_rounds,
    };
    info!(
        pages = report.pages_fetched,
        raw = report.raw_count,
        listings = report.listings.len(),
        geocoded = report.resolved_count(),
        rounds = report.geocode_rounds,
        "source finished"
    );
    report
}
