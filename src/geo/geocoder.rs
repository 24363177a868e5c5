// geocoder.rs
use crate::config::{GeocoderProvider, PipelineConfig};
use crate::domain::logic::fold_text;
use crate::domain::{Coordinates, RawListing, NO_INFO};
use crate::scraper::ScraperError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;
use url::Url;

const ARCGIS_ENDPOINT: &str =
    "https://geocode.arcgis.com/arcgis/rest/services/World/GeocodeServer/findAddressCandidates";
const NOMINATIM_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";

/// Resolves a free-text address. `Ok(None)` means the provider answered but
/// found nothing usable.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>, ScraperError>;
}

/// Query string for a listing: address, neighborhood, city, state, country,
/// skipping parts that are empty or unknown.
pub fn build_query(listing: &RawListing, country: &str) -> String {
    let city = fold_text(&listing.city.replace('-', " "));
    [
        listing.address.as_str(),
        listing.neighborhood.as_str(),
        city.as_str(),
        listing.state.as_str(),
        country,
    ]
    .into_iter()
    .map(str::trim)
    .filter(|part| !part.is_empty() && *part != NO_INFO)
    .collect::<Vec<_>>()
    .join(",")
}

pub fn build_geocoder(config: &PipelineConfig) -> Result<Arc<dyn Geocoder>, ScraperError> {
    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.http_timeout)
        .build()
        .map_err(|e| ScraperError::Network(e.to_string()))?;

    let geocoder: Arc<dyn Geocoder> = match config.geocoder {
        GeocoderProvider::ArcGis => Arc::new(ArcGisGeocoder::new(client, config.geocoder_api_key.clone())),
        GeocoderProvider::Nominatim => Arc::new(NominatimGeocoder::new(client)),
    };
    Ok(geocoder)
}

fn endpoint(base: &str, params: &[(&str, &str)]) -> Result<Url, ScraperError> {
    Url::parse_with_params(base, params).map_err(|e| ScraperError::Config(e.to_string()))
}

async fn get_json<T: for<'de> Deserialize<'de>>(client: &Client, url: Url) -> Result<T, ScraperError> {
    let resp = client.get(url.clone()).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(ScraperError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    resp.json::<T>()
        .await
        .map_err(|e| ScraperError::Geocoding(e.to_string()))
}

// ----- ArcGIS World Geocoding Service -----

#[derive(Debug, Deserialize)]
struct ArcGisResponse {
    #[serde(default)]
    candidates: Vec<ArcGisCandidate>,
}

#[derive(Debug, Deserialize)]
struct ArcGisCandidate {
    location: ArcGisLocation,
}

#[derive(Debug, Deserialize)]
struct ArcGisLocation {
    x: f64,
    y: f64,
}

pub struct ArcGisGeocoder {
    client: Client,
    api_key: Option<String>,
}

impl ArcGisGeocoder {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }

    fn request_url(&self, query: &str) -> Result<Url, ScraperError> {
        let mut params = vec![("SingleLine", query), ("f", "json"), ("maxLocations", "1")];
        if let Some(key) = self.api_key.as_deref() {
            params.push(("token", key));
        }
        endpoint(ARCGIS_ENDPOINT, &params)
    }
}

#[async_trait]
impl Geocoder for ArcGisGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>, ScraperError> {
        let url = self.request_url(query)?;
        let body: ArcGisResponse = get_json(&self.client, url).await?;
        let found = body
            .candidates
            .first()
            .and_then(|c| Coordinates::new(c.location.y, c.location.x));
        debug!(query, found = found.is_some(), "arcgis lookup");
        Ok(found)
    }
}

// ----- OpenStreetMap Nominatim -----

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

pub struct NominatimGeocoder {
    client: Client,
}

impl NominatimGeocoder {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>, ScraperError> {
        let url = endpoint(
            NOMINATIM_ENDPOINT,
            &[("q", query), ("format", "json"), ("limit", "1")],
        )?;
        let places: Vec<NominatimPlace> = get_json(&self.client, url).await?;
        let found = places.first().and_then(|p| {
            let lat = p.lat.parse::<f64>().ok()?;
            let lon = p.lon.parse::<f64>().ok()?;
            Coordinates::new(lat, lon)
        });
        debug!(query, found = found.is_some(), "nominatim lookup");
        Ok(found)
    }
}
