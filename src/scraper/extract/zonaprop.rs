// Card markup of zonaprop.com.ar result pages. Class names here are build
// hashes that change with site releases; data-qa attributes are stable.

use super::{
    first_attr, first_text, number, select_all, text, ExtractionProfile, Field, FieldRule,
    FieldValue,
};
use crate::domain::logic::{digits_only, first_segment, leading_number, parse_room_count, LOCAL_CURRENCY};
use crate::scraper::Source;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::ElementRef;

lazy_static! {
    static ref PUBLISHER_LOGO: Regex = Regex::new(r"logo_(\w.*)_").expect("valid regex");
}

pub static PROFILE: ExtractionProfile = ExtractionProfile {
    container: "div.postings-container",
    items: posting_cards,
    rules: &[
        FieldRule { field: Field::Identifier, parse: identifier },
        FieldRule { field: Field::Url, parse: url },
        FieldRule { field: Field::PhotoUrls, parse: photo_urls },
        FieldRule { field: Field::PhotoCount, parse: photo_count },
        FieldRule { field: Field::RentCurrency, parse: rent_currency },
        FieldRule { field: Field::RentValue, parse: rent_value },
        FieldRule { field: Field::ExpensesCurrency, parse: expenses_currency },
        FieldRule { field: Field::ExpensesValue, parse: expenses_value },
        FieldRule { field: Field::Address, parse: address },
        FieldRule { field: Field::Neighborhood, parse: neighborhood },
        FieldRule { field: Field::UsableArea, parse: usable_area },
        FieldRule { field: Field::Rooms, parse: rooms },
        FieldRule { field: Field::Bedrooms, parse: bedrooms },
        FieldRule { field: Field::Bathrooms, parse: bathrooms },
        FieldRule { field: Field::Garages, parse: garages },
        FieldRule { field: Field::Title, parse: title },
        FieldRule { field: Field::Description, parse: description },
        FieldRule { field: Field::Agency, parse: agency },
    ],
};

fn posting_cards(container: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    select_all(container, r#"div[data-qa="posting PROPERTY"]"#)
}

fn own_attr(item: ElementRef<'_>, attr: &str) -> Option<String> {
    item.value()
        .attr(attr)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// "Pesos" is spelled out on some cards.
fn currency_marker(raw: &str) -> Option<String> {
    match raw.trim() {
        "" => None,
        "Pesos" => Some(LOCAL_CURRENCY.to_string()),
        other => Some(other.to_string()),
    }
}

fn identifier(item: ElementRef<'_>) -> Option<FieldValue> {
    text(own_attr(item, "data-id"))
}

fn url(item: ElementRef<'_>) -> Option<FieldValue> {
    let path = own_attr(item, "data-to-posting")?;
    Some(FieldValue::Text(format!("{}{}", Source::ZonaProp.base_url(), path)))
}

fn image_urls(item: ElementRef<'_>) -> Vec<String> {
    select_all(item, "div.flickity-slider img")
        .into_iter()
        .filter_map(|img| {
            let attrs = img.value();
            attrs
                .attr("src")
                .or_else(|| attrs.attr("data-flickity-lazyload"))
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .collect()
}

fn photo_urls(item: ElementRef<'_>) -> Option<FieldValue> {
    let urls = image_urls(item);
    (!urls.is_empty()).then_some(FieldValue::List(urls))
}

fn photo_count(item: ElementRef<'_>) -> Option<FieldValue> {
    let count = image_urls(item).len() as u32;
    (count > 0).then_some(FieldValue::Count(count))
}

fn price_text(item: ElementRef<'_>) -> Option<String> {
    first_text(item, r#"div[data-qa="POSTING_CARD_PRICE"]"#)
}

fn expenses_text(item: ElementRef<'_>) -> Option<String> {
    first_text(item, r#"div[data-qa="expensas"]"#)
}

fn rent_currency(item: ElementRef<'_>) -> Option<FieldValue> {
    let price = price_text(item)?;
    if price.to_lowercase().contains("consultar") {
        return None;
    }
    let marker: String = price
        .chars()
        .filter(|c| !c.is_ascii_digit() && *c != '.')
        .collect();
    text(currency_marker(&marker))
}

fn rent_value(item: ElementRef<'_>) -> Option<FieldValue> {
    number(price_text(item).and_then(|t| digits_only(&t)))
}

/// "$ 45.000 Expensas" -> "$".
fn expenses_currency(item: ElementRef<'_>) -> Option<FieldValue> {
    let expenses = expenses_text(item)?;
    let marker: String = expenses
        .replace("Expensas", "")
        .chars()
        .filter(|c| !c.is_ascii_digit() && *c != '.')
        .collect();
    text(currency_marker(&marker))
}

fn expenses_value(item: ElementRef<'_>) -> Option<FieldValue> {
    number(expenses_text(item).and_then(|t| digits_only(&t)))
}

fn address(item: ElementRef<'_>) -> Option<FieldValue> {
    text(first_text(item, "div.postingAddress"))
}

fn neighborhood(item: ElementRef<'_>) -> Option<FieldValue> {
    text(first_text(item, r#"h2[data-qa="POSTING_CARD_LOCATION"]"#).and_then(|t| first_segment(&t)))
}

/// First feature span whose text contains `token`.
fn feature_text(item: ElementRef<'_>, token: &str) -> Option<String> {
    select_all(item, r#"h3[data-qa="POSTING_CARD_FEATURES"] span"#)
        .into_iter()
        .map(super::text_of)
        .find(|t| t.contains(token))
}

fn usable_area(item: ElementRef<'_>) -> Option<FieldValue> {
    number(feature_text(item, "m²").and_then(|t| leading_number(&t)))
}

fn rooms(item: ElementRef<'_>) -> Option<FieldValue> {
    number(feature_text(item, "amb").and_then(|t| parse_room_count(&t)))
}

fn bedrooms(item: ElementRef<'_>) -> Option<FieldValue> {
    number(feature_text(item, "dorm").and_then(|t| parse_room_count(&t)))
}

fn bathrooms(item: ElementRef<'_>) -> Option<FieldValue> {
    number(feature_text(item, "baño").and_then(|t| leading_number(&t)))
}

fn garages(item: ElementRef<'_>) -> Option<FieldValue> {
    number(feature_text(item, "coch").and_then(|t| leading_number(&t)))
}

fn title(item: ElementRef<'_>) -> Option<FieldValue> {
    text(first_text(item, "h2.sc-i1odl-11"))
}

fn description(item: ElementRef<'_>) -> Option<FieldValue> {
    text(first_text(item, r#"h3[data-qa="POSTING_CARD_DESCRIPTION"]"#))
}

/// Direct owners are labelled; agencies only show a logo whose file name
/// carries the agency slug.
fn agency(item: ElementRef<'_>) -> Option<FieldValue> {
    if let Some(owner) = first_text(item, "span.sc-hlm4rl-4") {
        return text(Some(owner));
    }
    let logo = first_attr(item, r#"img[data-qa="POSTING_CARD_PUBLISHER"]"#, "src")?;
    let slug = PUBLISHER_LOGO.captures(&logo)?.get(1)?.as_str();
    text(Some(slug.replace('-', " ")))
}

#[cfg(test)]
mod tests {
    use crate::domain::listing::NO_VALUE;
    use crate::domain::NO_INFO;
    use crate::scraper::extract::extract_page;
    use crate::scraper::extract::tests::page;
    use crate::scraper::Source;

    const CARDS: &str = r#"
<html><body>
<div class="postings-container">
  <div>
    <div data-qa="posting PROPERTY" data-id="49990001" data-to-posting="/propiedades/clasificado/alclapin-depto-49990001.html">
      <div class="flickity-slider">
        <img src="https://imgar.zonapropcdn.com/a.jpg">
        <img data-flickity-lazyload="https://imgar.zonapropcdn.com/b.jpg">
      </div>
      <div data-qa="POSTING_CARD_PRICE">$ 250.000</div>
      <div data-qa="expensas">$ 45.000 Expensas</div>
      <div class="sc-ge2uzh-0 eWOwnE postingAddress">Bv. Oroño 1200</div>
      <h2 data-qa="POSTING_CARD_LOCATION">Pichincha, Rosario</h2>
      <h3 data-qa="POSTING_CARD_FEATURES">
        <span>60 m² tot.</span><span>3 amb.</span><span>2 dorm.</span><span>1 baño</span><span>1 coch.</span>
      </h3>
      <h2 class="sc-i1odl-11 kvKUxE">Excelente 2 dormitorios</h2>
      <h3 data-qa="POSTING_CARD_DESCRIPTION">A metros del parque.</h3>
      <img data-qa="POSTING_CARD_PUBLISHER" src="https://imgar.zonapropcdn.com/empresas/logo_inmobiliaria-del-sol_12345.jpg">
    </div>
  </div>
  <div>
    <div data-qa="posting PROPERTY" data-id="49990002" data-to-posting="/propiedades/x-49990002.html">
      <div data-qa="POSTING_CARD_PRICE">USD 600</div>
      <h3 data-qa="POSTING_CARD_FEATURES"><span>Monoambiente</span></h3>
      <span class="sc-hlm4rl-4 ihiYoF">Dueño directo</span>
    </div>
  </div>
</div>
</body></html>"#;

    #[test]
    fn full_card_fields() {
        let out = extract_page(&page(Source::ZonaProp, CARDS));
        assert_eq!(out.len(), 2);

        let l = &out[0];
        assert_eq!(l.identifier, "49990001");
        assert_eq!(
            l.url,
            "https://www.zonaprop.com.ar/propiedades/clasificado/alclapin-depto-49990001.html"
        );
        assert_eq!(l.photo_count, 2);
        assert_eq!(l.photo_urls[1], "https://imgar.zonapropcdn.com/b.jpg");
        assert_eq!(l.rent_currency, "$");
        assert_eq!(l.rent_value, 250000.0);
        assert_eq!(l.expenses_currency, "$");
        assert_eq!(l.expenses_value, 45000.0);
        assert_eq!(l.total_rent, 295000.0);
        assert_eq!(l.address, "Bv. Oroño 1200");
        assert_eq!(l.neighborhood, "Pichincha");
        assert_eq!(l.usable_area, 60.0);
        assert_eq!(l.rooms, 3.0);
        assert_eq!(l.bedrooms, 2.0);
        assert_eq!(l.bathrooms, 1.0);
        assert_eq!(l.garages, 1.0);
        assert_eq!(l.title, "Excelente 2 dormitorios");
        assert_eq!(l.description, "A metros del parque.");
        assert_eq!(l.agency, "inmobiliaria del sol");
        assert_eq!(l.contact_link, NO_INFO);
        assert_eq!(l.listing_score, NO_VALUE);
    }

    #[test]
    fn sparse_card_uses_sentinels() {
        let out = extract_page(&page(Source::ZonaProp, CARDS));
        let l = &out[1];
        assert_eq!(l.rent_currency, "USD");
        assert_eq!(l.rent_value, 600.0);
        assert_eq!(l.expenses_currency, NO_INFO);
        // Unknown expenses currency: no total.
        assert_eq!(l.total_rent, 0.0);
        assert_eq!(l.rooms, 1.0);
        assert_eq!(l.agency, "Dueño directo");
        assert_eq!(l.address, NO_INFO);
        assert!(l.photo_urls.is_empty());
        assert_eq!(l.photo_count, 0);
    }
}
