// enricher.rs
use crate::config::PipelineConfig;
use crate::domain::{Coordinates, RawListing};
use crate::geo::geocoder::{build_query, Geocoder};
use crate::geo::RetryPolicy;
use crate::workers::run_bounded;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

/// Listings paired with whatever coordinate the loop settled on.
#[derive(Debug, Clone)]
pub struct GeocodingOutcome {
    pub resolved: Vec<(RawListing, Option<Coordinates>)>,
    pub rounds: u32,
}

impl GeocodingOutcome {
    pub fn unresolved(&self) -> usize {
        self.resolved.iter().filter(|(_, c)| c.is_none()).count()
    }
}

/// Geocodes listings in rounds until the unresolved share is small enough.
///
/// Each round sends one lookup per still-missing identifier through a bounded
/// pool. Results are merged by identifier, and a coordinate, once found, is
/// never replaced. The loop stops when nothing is missing, when fewer than
/// `threshold` of the identifiers are missing, or after `max_rounds`.
pub struct GeocodingEnricher {
    geocoder: Arc<dyn Geocoder>,
    retry: RetryPolicy,
    workers: usize,
    threshold: f64,
    max_rounds: u32,
    country: String,
}

impl GeocodingEnricher {
    pub fn new(geocoder: Arc<dyn Geocoder>, config: &PipelineConfig) -> Self {
        Self {
            geocoder,
            retry: config.retry_policy(),
            workers: config.geocode_workers.max(1),
            threshold: config.convergence_threshold,
            max_rounds: config.max_geocode_rounds.max(1),
            country: config.country.clone(),
        }
    }

    pub async fn enrich(&self, listings: Vec<RawListing>) -> GeocodingOutcome {
        // One query per identifier, built from its first listing.
        let mut queries: Vec<(String, String)> = Vec::new();
        let mut seen = HashSet::new();
        for listing in &listings {
            if seen.insert(listing.identifier.as_str()) {
                queries.push((listing.identifier.clone(), build_query(listing, &self.country)));
            }
        }

        let total = queries.len();
        let mut resolved: HashMap<String, Coordinates> = HashMap::new();
        let mut pending = queries.clone();
        let mut rounds = 0;

        while !pending.is_empty() && rounds < self.max_rounds {
            rounds += 1;
            let found = self.lookup_round(pending).await;
            for (identifier, coordinates) in found {
                if let Some(c) = coordinates {
                    resolved.entry(identifier).or_insert(c);
                }
            }

            pending = queries
                .iter()
                .filter(|(id, _)| !resolved.contains_key(id))
                .cloned()
                .collect();

            info!(
                round = rounds,
                resolved = resolved.len(),
                missing = pending.len(),
                total,
                "geocoding round finished"
            );
            if (pending.len() as f64) < self.threshold * total as f64 {
                break;
            }
        }

        if !pending.is_empty() {
            warn!(missing = pending.len(), total, rounds, "geocoding stopped with unresolved listings");
        }

        let resolved = listings
            .into_iter()
            .map(|listing| {
                let coordinates = resolved.get(&listing.identifier).copied();
                (listing, coordinates)
            })
            .collect();
        GeocodingOutcome { resolved, rounds }
    }

    async fn lookup_round(&self, batch: Vec<(String, String)>) -> Vec<(String, Option<Coordinates>)> {
        let geocoder = self.geocoder.clone();
        let retry = self.retry;
        run_bounded(batch, self.workers, move |(identifier, query): (String, String)| {
            let geocoder = geocoder.clone();
            async move {
                let found = retry.run(&query, || geocoder.geocode(&query)).await;
                (identifier, found)
            }
        })
        .await
    }
}
