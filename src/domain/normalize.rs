// src/domain/normalize.rs

use crate::domain::listing::RawListing;
use crate::domain::logic::canonicalize_neighborhood;
use std::collections::HashSet;
use tracing::debug;

/// Drops unkeyable records, canonicalizes neighborhoods, keeps the first
/// record per (identifier, property type, address) and sorts by
/// (city, property type, neighborhood).
pub fn normalize(listings: Vec<RawListing>) -> Vec<RawListing> {
    let before = listings.len();
    let mut seen = HashSet::new();

    let mut out: Vec<RawListing> = listings
        .into_iter()
        .filter(RawListing::has_identifier)
        .filter(|l| seen.insert(l.key()))
        .map(|l| RawListing {
            neighborhood: canonicalize_neighborhood(&l.neighborhood),
            ..l
        })
        .collect();

    // Stable, so ties keep first-seen order.
    out.sort_by(|a, b| {
        (&a.city, &a.property_type, &a.neighborhood).cmp(&(&b.city, &b.property_type, &b.neighborhood))
    });

    debug!(before, after = out.len(), "normalized listings");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::listing::NO_INFO;
    use crate::scraper::Source;
    use chrono::NaiveDateTime;

    fn listing(id: &str, ptype: &str, address: &str, city: &str, hood: &str) -> RawListing {
        let mut l = RawListing::placeholder(Source::ZonaProp, ptype, city, "santa fe", NaiveDateTime::default());
        l.identifier = id.to_string();
        l.address = address.to_string();
        l.neighborhood = hood.to_string();
        l
    }

    #[test]
    fn drops_missing_identifiers() {
        let out = normalize(vec![
            listing(NO_INFO, "casas", "a", "rosario", "centro"),
            listing("", "casas", "b", "rosario", "centro"),
            listing("7", "casas", "c", "rosario", "centro"),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].identifier, "7");
    }

    #[test]
    fn duplicate_keys_keep_first_seen() {
        let mut first = listing("1", "casas", "mitre 100", "rosario", "Centro");
        first.title = "first".into();
        let mut second = listing("1", "casas", "mitre 100", "rosario", "Centro");
        second.title = "second".into();
        let other_type = listing("1", "departamentos", "mitre 100", "rosario", "Centro");

        let out = normalize(vec![first, second, other_type]);
        assert_eq!(out.len(), 2);
        let casas = out.iter().find(|l| l.property_type == "casas").unwrap();
        assert_eq!(casas.title, "first");
    }

    #[test]
    fn sorted_by_city_type_neighborhood() {
        let out = normalize(vec![
            listing("1", "departamentos", "a", "rosario", "Pichincha"),
            listing("2", "casas", "b", "rosario", "Fisherton"),
            listing("3", "casas", "c", "funes", "Centro"),
            listing("4", "casas", "d", "rosario", "Alberdi"),
        ]);
        let ids: Vec<&str> = out.iter().map(|l| l.identifier.as_str()).collect();
        assert_eq!(ids, vec!["3", "4", "2", "1"]);
        assert_eq!(out[1].neighborhood, "alberdi");
    }
}
