// Card markup of argenprop.com result pages.

use super::{
    first_attr, first_text, number, select_all, select_first, text, ExtractionProfile, Field,
    FieldRule, FieldValue,
};
use crate::domain::logic::{digits_only, first_segment, leading_number, parse_room_count};
use crate::domain::logic::LOCAL_CURRENCY;
use crate::scraper::Source;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::ElementRef;

lazy_static! {
    static ref PHOTO_TOTAL: Regex = Regex::new(r"/\s*(\d+)").expect("valid regex");
    static ref WHATSAPP: Regex = Regex::new(r"https://wa\.me/\d+").expect("valid regex");
    static ref NUMBER_CONNECTOR: Regex = Regex::new(r"\s+al\b").expect("valid regex");
}

pub static PROFILE: ExtractionProfile = ExtractionProfile {
    container: "div.listing__items",
    items: child_elements,
    rules: &[
        FieldRule { field: Field::Identifier, parse: identifier },
        FieldRule { field: Field::Url, parse: url },
        FieldRule { field: Field::PhotoCount, parse: photo_count },
        FieldRule { field: Field::Address, parse: address },
        FieldRule { field: Field::Neighborhood, parse: neighborhood },
        FieldRule { field: Field::RentCurrency, parse: rent_currency },
        FieldRule { field: Field::RentValue, parse: rent_value },
        FieldRule { field: Field::ExpensesCurrency, parse: expenses_currency },
        FieldRule { field: Field::ExpensesValue, parse: expenses_value },
        FieldRule { field: Field::Agency, parse: agency },
        FieldRule { field: Field::PhotoUrls, parse: photo_urls },
        FieldRule { field: Field::ListingScore, parse: listing_score },
        FieldRule { field: Field::Description, parse: description },
        FieldRule { field: Field::Title, parse: title },
        FieldRule { field: Field::UsableArea, parse: usable_area },
        FieldRule { field: Field::Bathrooms, parse: bathrooms },
        FieldRule { field: Field::Rooms, parse: rooms },
        FieldRule { field: Field::Bedrooms, parse: bedrooms },
        FieldRule { field: Field::Garages, parse: garages },
        FieldRule { field: Field::ContactLink, parse: contact_link },
    ],
};

fn child_elements(container: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    container.children().filter_map(ElementRef::wrap).collect()
}

fn identifier(item: ElementRef<'_>) -> Option<FieldValue> {
    text(first_attr(item, "a", "data-item-card"))
}

fn url(item: ElementRef<'_>) -> Option<FieldValue> {
    let href = first_attr(item, "a", "href")?;
    Some(FieldValue::Text(format!("{}{}", Source::ArgenProp.base_url(), href)))
}

/// The photo counter reads "1/12"; the total is after the slash.
fn photo_count(item: ElementRef<'_>) -> Option<FieldValue> {
    let counter = first_text(item, "div.counter-box")?;
    let total = PHOTO_TOTAL.captures(&counter)?.get(1)?.as_str().parse().ok()?;
    Some(FieldValue::Count(total))
}

/// "Córdoba al 1500" -> "córdoba 1500". Only the standalone "al" goes.
fn address(item: ElementRef<'_>) -> Option<FieldValue> {
    let raw = first_text(item, "p.card__address")?.to_lowercase();
    text(Some(NUMBER_CONNECTOR.replace_all(&raw, "").into_owned()))
}

fn neighborhood(item: ElementRef<'_>) -> Option<FieldValue> {
    text(first_text(item, "p.card__title--primary.show-mobile").and_then(|t| first_segment(&t)))
}

/// "Consultar precio" cards carry no currency.
fn rent_currency(item: ElementRef<'_>) -> Option<FieldValue> {
    let currency = first_text(item, "span.card__currency")?;
    if currency.to_lowercase().contains("consultar") {
        return None;
    }
    text(Some(currency))
}

/// The amount is the bare text node right after the currency span.
fn rent_value(item: ElementRef<'_>) -> Option<FieldValue> {
    let currency = select_first(item, "span.card__currency")?;
    let sibling = currency.next_sibling()?;
    let amount = sibling.value().as_text()?;
    number(digits_only(amount.trim()))
}

fn expenses_currency(item: ElementRef<'_>) -> Option<FieldValue> {
    let expenses = first_text(item, "span.card__expenses")?;
    expenses
        .contains(LOCAL_CURRENCY)
        .then(|| FieldValue::Text(LOCAL_CURRENCY.to_string()))
}

fn expenses_value(item: ElementRef<'_>) -> Option<FieldValue> {
    number(first_text(item, "span.card__expenses").and_then(|t| digits_only(&t)))
}

fn agency(item: ElementRef<'_>) -> Option<FieldValue> {
    text(first_attr(item, "div.card__agent img", "alt").map(|a| a.to_lowercase()))
}

fn photo_urls(item: ElementRef<'_>) -> Option<FieldValue> {
    let urls: Vec<String> = select_all(item, "ul.card__photos li")
        .into_iter()
        .filter_map(|li| first_attr(li, "img", "data-src"))
        .collect();
    (!urls.is_empty()).then_some(FieldValue::List(urls))
}

fn listing_score(item: ElementRef<'_>) -> Option<FieldValue> {
    number(first_text(item, "p.card__points").and_then(|t| digits_only(&t)))
}

fn description(item: ElementRef<'_>) -> Option<FieldValue> {
    text(first_text(item, "p.card__info"))
}

fn title(item: ElementRef<'_>) -> Option<FieldValue> {
    text(first_text(item, "h2.card__title"))
}

/// Text of the feature bullet marked with the given icon class.
fn feature_text(item: ElementRef<'_>, icon: &str) -> Option<String> {
    let icon_selector = format!("i.{icon}");
    select_all(item, "ul.card__main-features li")
        .into_iter()
        .find(|li| select_first(*li, &icon_selector).is_some())
        .and_then(|li| first_text(li, "span"))
}

fn usable_area(item: ElementRef<'_>) -> Option<FieldValue> {
    number(feature_text(item, "icono-superficie_cubierta").and_then(|t| leading_number(&t)))
}

fn bathrooms(item: ElementRef<'_>) -> Option<FieldValue> {
    number(feature_text(item, "icono-cantidad_banos").and_then(|t| leading_number(&t)))
}

fn rooms(item: ElementRef<'_>) -> Option<FieldValue> {
    number(feature_text(item, "icono-cantidad_ambientes").and_then(|t| parse_room_count(&t)))
}

fn bedrooms(item: ElementRef<'_>) -> Option<FieldValue> {
    number(feature_text(item, "icono-cantidad_dormitorios").and_then(|t| parse_room_count(&t)))
}

fn garages(item: ElementRef<'_>) -> Option<FieldValue> {
    number(feature_text(item, "icono-ambiente_cochera").and_then(|t| leading_number(&t)))
}

fn contact_link(item: ElementRef<'_>) -> Option<FieldValue> {
    let href = first_attr(item, "div.card-contact-group span", "data-href")?;
    text(WHATSAPP.find(&href).map(|m| m.as_str().to_string()))
}
