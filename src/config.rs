// config.rs
use crate::geo::RetryPolicy;
use crate::scraper::Source;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0 Safari/537.36";

/// Property types and localities to harvest. Slugs are stored lowercased and
/// trimmed, exactly as they appear in the sites' URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchScope {
    property_types: BTreeSet<String>,
    localities: BTreeSet<String>,
}

impl SearchScope {
    pub fn new<T, L>(property_types: T, localities: L) -> Self
    where
        T: IntoIterator,
        T::Item: AsRef<str>,
        L: IntoIterator,
        L::Item: AsRef<str>,
    {
        Self {
            property_types: clean_slugs(property_types),
            localities: clean_slugs(localities),
        }
    }

    pub fn property_types(&self) -> &BTreeSet<String> {
        &self.property_types
    }

    pub fn localities(&self) -> &BTreeSet<String> {
        &self.localities
    }

    /// Every (property type, locality) combination.
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.property_types
            .iter()
            .flat_map(|t| self.localities.iter().map(move |l| (t.clone(), l.clone())))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.property_types.is_empty() || self.localities.is_empty()
    }
}

fn clean_slugs<I>(raw: I) -> BTreeSet<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    raw.into_iter()
        .map(|s| s.as_ref().trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum GeocoderProvider {
    #[value(name = "arcgis")]
    ArcGis,
    #[value(name = "nominatim")]
    Nominatim,
}

/// Every tunable of a pipeline run. Built once by the caller and passed down.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Concurrent requests against the plain-HTTP source.
    pub fetch_concurrency: usize,
    /// Concurrent browser tabs against the script-rendered source.
    pub browser_pool_size: usize,
    /// Chrome or Chromium binary; looked up on the PATH when unset.
    pub browser_executable: Option<PathBuf>,
    pub http_timeout: Duration,
    pub user_agent: String,

    pub geocoder: GeocoderProvider,
    pub geocoder_api_key: Option<String>,
    pub geocode_workers: usize,
    pub geocode_attempts: u32,
    pub geocode_backoff_unit: Duration,
    pub geocode_jitter: Duration,
    /// Stop geocoding once the unresolved share drops below this.
    pub convergence_threshold: f64,
    pub max_geocode_rounds: u32,
    pub country: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetch_concurrency: 16,
            browser_pool_size: 5,
            browser_executable: None,
            http_timeout: Duration::from_secs(30),
            user_agent: USER_AGENT.to_string(),
            geocoder: GeocoderProvider::ArcGis,
            geocoder_api_key: None,
            geocode_workers: 6,
            geocode_attempts: 3,
            geocode_backoff_unit: Duration::from_secs(1),
            geocode_jitter: Duration::ZERO,
            convergence_threshold: 0.10,
            max_geocode_rounds: 10,
            country: "Argentina".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Page-retrieval concurrency cap for a source.
    pub fn concurrency_for(&self, source: Source) -> usize {
        let cap = match source {
            Source::ArgenProp => self.fetch_concurrency,
            Source::ZonaProp => self.browser_pool_size,
        };
        cap.max(1)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::linear(self.geocode_attempts, self.geocode_backoff_unit)
            .with_jitter(self.geocode_jitter)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.geocode_attempts == 0 {
            return Err("geocode attempts must be at least 1".into());
        }
        if !(0.0..=1.0).contains(&self.convergence_threshold) {
            return Err(format!(
                "convergence threshold {} is outside 0..=1",
                self.convergence_threshold
            ));
        }
        if self.max_geocode_rounds == 0 {
            return Err("max geocode rounds must be at least 1".into());
        }
        Ok(())
    }
}
