// src/domain/listing.rs

use crate::scraper::Source;
use chrono::{Datelike, Duration, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder for a text field that could not be extracted.
pub const NO_INFO: &str = "no-info";
/// Placeholder for a numeric field that could not be extracted.
pub const NO_VALUE: f64 = 0.0;
/// Placeholder distance for listings without a usable coordinate.
pub const NO_DISTANCE_KM: f64 = 9999.0;

/// Number of landmark distance columns carried by every enriched listing.
pub const LANDMARK_COUNT: usize = 5;

const CAPTURED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Offset of the listing sites' local time (Argentina, UTC-03:00, no DST).
const SITE_UTC_OFFSET_HOURS: i64 = -3;

/// Current wall-clock time at the listing sites, to the second.
pub fn captured_now() -> NaiveDateTime {
    let now = Utc::now().naive_utc() + Duration::hours(SITE_UTC_OFFSET_HOURS);
    now.with_nanosecond(0).unwrap_or(now)
}

/// A validated latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Returns `None` unless both components are finite and in range.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self { latitude, longitude })
    }

    pub fn is_valid(&self) -> bool {
        Self::new(self.latitude, self.longitude).is_some()
    }
}

/// One listing card as extracted from a results page. Every field carries
/// either a parsed value or its sentinel; nothing here is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawListing {
    pub identifier: String,
    pub source: Source,
    pub property_type: String,
    pub state: String,
    pub city: String,
    pub neighborhood: String,
    pub address: String,
    pub url: String,
    pub description: String,
    pub title: String,

    pub rent_currency: String,
    pub rent_value: f64,
    pub expenses_currency: String,
    pub expenses_value: f64,
    pub total_rent: f64,

    pub usable_area: f64,
    pub rooms: f64,
    pub bedrooms: f64,
    pub bathrooms: f64,
    pub garages: f64,

    pub agency: String,
    pub photo_count: u32,
    pub photo_urls: Vec<String>,
    pub listing_score: f64,
    pub contact_link: String,
    pub captured_at: NaiveDateTime,
}

/// Identity of a listing within one source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListingKey {
    pub identifier: String,
    pub property_type: String,
    pub address: String,
}

impl RawListing {
    /// A record with every extracted field at its sentinel. Page-level context
    /// (source, type, locality, state, capture time) is known up front.
    pub fn placeholder(
        source: Source,
        property_type: &str,
        city: &str,
        state: &str,
        captured_at: NaiveDateTime,
    ) -> Self {
        Self {
            identifier: NO_INFO.to_string(),
            source,
            property_type: property_type.to_string(),
            state: state.to_string(),
            city: city.to_string(),
            neighborhood: NO_INFO.to_string(),
            address: NO_INFO.to_string(),
            url: NO_INFO.to_string(),
            description: NO_INFO.to_string(),
            title: NO_INFO.to_string(),
            rent_currency: NO_INFO.to_string(),
            rent_value: NO_VALUE,
            expenses_currency: NO_INFO.to_string(),
            expenses_value: NO_VALUE,
            total_rent: NO_VALUE,
            usable_area: NO_VALUE,
            rooms: NO_VALUE,
            bedrooms: NO_VALUE,
            bathrooms: NO_VALUE,
            garages: NO_VALUE,
            agency: NO_INFO.to_string(),
            photo_count: 0,
            photo_urls: Vec::new(),
            listing_score: NO_VALUE,
            contact_link: NO_INFO.to_string(),
            captured_at,
        }
    }

    pub fn key(&self) -> ListingKey {
        ListingKey {
            identifier: self.identifier.clone(),
            property_type: self.property_type.clone(),
            address: self.address.clone(),
        }
    }

    /// Records without a real identifier cannot be keyed and are dropped.
    pub fn has_identifier(&self) -> bool {
        let id = self.identifier.trim();
        !id.is_empty() && id != NO_INFO
    }
}

/// A listing plus its resolved coordinate and landmark distances: the
/// terminal artifact of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedListing {
    #[serde(flatten)]
    pub listing: RawListing,
    pub coordinates: Option<Coordinates>,
    pub distances_km: [f64; LANDMARK_COUNT],
}

/// Authoritative column order of the output table.
pub const OUTPUT_COLUMNS: [&str; 37] = [
    "identifier",
    "source",
    "propertyType",
    "state",
    "city",
    "neighborhood",
    "address",
    "url",
    "description",
    "title",
    "rentCurrency",
    "rentValue",
    "expensesCurrency",
    "expensesValue",
    "totalRent",
    "usableArea",
    "rooms",
    "bedrooms",
    "bathrooms",
    "garages",
    "agency",
    "photoCount",
    "photoUrls",
    "listingScore",
    "contactLink",
    "capturedDate",
    "capturedYear",
    "capturedMonth",
    "capturedDay",
    "latitude",
    "longitude",
    "coordinatePair",
    "distanceToLandmark1",
    "distanceToLandmark2",
    "distanceToLandmark3",
    "distanceToLandmark4",
    "distanceToLandmark5",
];

/// A single cell of the output table.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Text(String),
    Number(f64),
    Empty,
}

impl EnrichedListing {
    pub fn captured_date(&self) -> String {
        self.listing.captured_at.format(CAPTURED_FORMAT).to_string()
    }

    pub fn captured_year(&self) -> i32 {
        self.listing.captured_at.year()
    }

    pub fn captured_month(&self) -> u32 {
        self.listing.captured_at.month()
    }

    pub fn captured_day(&self) -> u32 {
        self.listing.captured_at.day()
    }

    pub fn latitude(&self) -> Option<f64> {
        self.coordinates.map(|c| c.latitude)
    }

    pub fn longitude(&self) -> Option<f64> {
        self.coordinates.map(|c| c.longitude)
    }

    /// "lat,lng" or the sentinel when unresolved.
    pub fn coordinate_pair(&self) -> String {
        match self.coordinates {
            Some(c) => format!("{},{}", c.latitude, c.longitude),
            None => NO_INFO.to_string(),
        }
    }

    /// One row of the output table, in `OUTPUT_COLUMNS` order.
    pub fn row(&self) -> Vec<ColumnValue> {
        use ColumnValue::{Number, Text};
        let l = &self.listing;
        let coord = |v: Option<f64>| v.map(Number).unwrap_or(ColumnValue::Empty);

        let mut row = vec![
            Text(l.identifier.clone()),
            Text(l.source.name().to_string()),
            Text(l.property_type.clone()),
            Text(l.state.clone()),
            Text(l.city.clone()),
            Text(l.neighborhood.clone()),
            Text(l.address.clone()),
            Text(l.url.clone()),
            Text(l.description.clone()),
            Text(l.title.clone()),
            Text(l.rent_currency.clone()),
            Number(l.rent_value),
            Text(l.expenses_currency.clone()),
            Number(l.expenses_value),
            Number(l.total_rent),
            Number(l.usable_area),
            Number(l.rooms),
            Number(l.bedrooms),
            Number(l.bathrooms),
            Number(l.garages),
            Text(l.agency.clone()),
            Number(l.photo_count as f64),
            Text(l.photo_urls.join(" ")),
            Number(l.listing_score),
            Text(l.contact_link.clone()),
            Text(self.captured_date()),
            Number(self.captured_year() as f64),
            Number(self.captured_month() as f64),
            Number(self.captured_day() as f64),
            coord(self.latitude()),
            coord(self.longitude()),
            Text(self.coordinate_pair()),
        ];
        row.extend(self.distances_km.iter().map(|d| Number(*d)));
        row
    }
}
