//! Listing extraction.
//!
//! Each site is described by an [`ExtractionProfile`]: where the listing cards
//! live and a table of independent [`FieldRule`]s. A rule either yields a value
//! or nothing; nothing leaves the field at its sentinel. No rule can abort the
//! record, and no record can abort the page.

mod argenprop;
mod zonaprop;

use crate::domain::logic::reconcile_total_rent;
use crate::domain::{RawListing, NO_INFO};
use crate::geo::province_for;
use crate::scraper::fetcher::FetchedPage;
use crate::scraper::{ScraperError, Source};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

/// Fields a rule can populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Identifier,
    Url,
    Neighborhood,
    Address,
    Description,
    Title,
    RentCurrency,
    RentValue,
    ExpensesCurrency,
    ExpensesValue,
    UsableArea,
    Rooms,
    Bedrooms,
    Bathrooms,
    Garages,
    Agency,
    PhotoCount,
    PhotoUrls,
    ListingScore,
    ContactLink,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Count(u32),
    List(Vec<String>),
}

pub type FieldParser = fn(ElementRef<'_>) -> Option<FieldValue>;

/// One field's extraction step. The sentinel is whatever
/// [`RawListing::placeholder`] holds for `field`.
#[derive(Clone, Copy)]
pub struct FieldRule {
    pub field: Field,
    pub parse: FieldParser,
}

pub struct ExtractionProfile {
    /// Element wrapping every listing card on a results page.
    pub container: &'static str,
    /// The listing cards inside the container.
    pub items: fn(ElementRef<'_>) -> Vec<ElementRef<'_>>,
    pub rules: &'static [FieldRule],
}

pub fn profile(source: Source) -> &'static ExtractionProfile {
    match source {
        Source::ArgenProp => &argenprop::PROFILE,
        Source::ZonaProp => &zonaprop::PROFILE,
    }
}

/// Extracts every page, one page's worth of listings at a time.
pub fn extract_all(pages: &[FetchedPage]) -> Vec<RawListing> {
    let mut listings = Vec::new();
    for page in pages {
        listings.extend(extract_page(page));
    }
    info!(pages = pages.len(), listings = listings.len(), "extraction complete");
    listings
}

/// All listing cards on one page. A page without the listing container yields
/// nothing.
pub fn extract_page(page: &FetchedPage) -> Vec<RawListing> {
    let profile = profile(page.source);
    let document = Html::parse_document(&page.raw_markup);

    let selector = match Selector::parse(profile.container) {
        Ok(selector) => selector,
        Err(e) => {
            let err = ScraperError::Selector(format!("{}: {e}", profile.container));
            warn!(url = %page.url, error = %err, "skipping page");
            return Vec::new();
        }
    };
    let Some(container) = document.select(&selector).next() else {
        warn!(url = %page.url, "listing container not found");
        return Vec::new();
    };

    let state = province_for(&page.locality).unwrap_or(NO_INFO);
    let listings: Vec<RawListing> = (profile.items)(container)
        .into_iter()
        .map(|item| extract_item(item, page, profile.rules, state))
        .collect();

    debug!(url = %page.url, count = listings.len(), "page extracted");
    listings
}

fn extract_item(item: ElementRef<'_>, page: &FetchedPage, rules: &[FieldRule], state: &str) -> RawListing {
    let mut listing = RawListing::placeholder(
        page.source,
        &page.property_type,
        &page.locality,
        state,
        page.fetched_at,
    );

    for rule in rules {
        if let Some(value) = (rule.parse)(item) {
            if !assign(&mut listing, rule.field, value) {
                debug!(field = ?rule.field, "rule produced a value of the wrong kind");
            }
        }
    }

    listing.total_rent = reconcile_total_rent(
        &listing.rent_currency,
        listing.rent_value,
        &listing.expenses_currency,
        listing.expenses_value,
    );
    listing
}

/// Stores `value` into `field`. Returns false, leaving the sentinel, when the
/// value kind does not fit the field.
fn assign(listing: &mut RawListing, field: Field, value: FieldValue) -> bool {
    use FieldValue::{Count, List, Number, Text};

    match (field, value) {
        (Field::Identifier, Text(v)) => listing.identifier = v,
        (Field::Url, Text(v)) => listing.url = v,
        (Field::Neighborhood, Text(v)) => listing.neighborhood = v,
        (Field::Address, Text(v)) => listing.address = v,
        (Field::Description, Text(v)) => listing.description = v,
        (Field::Title, Text(v)) => listing.title = v,
        (Field::RentCurrency, Text(v)) => listing.rent_currency = v,
        (Field::ExpensesCurrency, Text(v)) => listing.expenses_currency = v,
        (Field::Agency, Text(v)) => listing.agency = v,
        (Field::ContactLink, Text(v)) => listing.contact_link = v,

        (Field::RentValue, Number(v)) if v >= 0.0 => listing.rent_value = v,
        (Field::ExpensesValue, Number(v)) if v >= 0.0 => listing.expenses_value = v,
        (Field::UsableArea, Number(v)) => listing.usable_area = v,
        (Field::Rooms, Number(v)) => listing.rooms = v,
        (Field::Bedrooms, Number(v)) => listing.bedrooms = v,
        (Field::Bathrooms, Number(v)) => listing.bathrooms = v,
        (Field::Garages, Number(v)) => listing.garages = v,
        (Field::ListingScore, Number(v)) => listing.listing_score = v,

        (Field::PhotoCount, Count(v)) => listing.photo_count = v,
        (Field::PhotoUrls, List(v)) => listing.photo_urls = v,

        _ => return false,
    }
    true
}

// ----- Markup helpers shared by the site profiles -----

pub(crate) fn select_first<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    scope.select(&selector).next()
}

pub(crate) fn select_all<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => scope.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

pub(crate) fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Trimmed text of the first match, if it is non-empty.
pub(crate) fn first_text(scope: ElementRef<'_>, css: &str) -> Option<String> {
    select_first(scope, css)
        .map(text_of)
        .filter(|t| !t.is_empty())
}

pub(crate) fn first_attr(scope: ElementRef<'_>, css: &str, attr: &str) -> Option<String> {
    select_first(scope, css)?
        .value()
        .attr(attr)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn text(value: Option<String>) -> Option<FieldValue> {
    value.map(FieldValue::Text)
}

pub(crate) fn number(value: Option<f64>) -> Option<FieldValue> {
    value.map(FieldValue::Number)
}
