use super::fakes::{fast_config, rosario, FakeGeocoder};
use crate::domain::{Coordinates, RawListing};
use crate::geo::geocoder::build_query;
use crate::geo::GeocodingEnricher;
use crate::scraper::Source;
use chrono::NaiveDateTime;
use std::sync::Arc;

fn listing(id: &str, address: &str) -> RawListing {
    let mut l = RawListing::placeholder(Source::ArgenProp, "departamentos", "rosario", "santa fe", NaiveDateTime::default());
    l.identifier = id.into();
    l.address = address.into();
    l
}

fn batch(n: usize) -> Vec<RawListing> {
    (0..n).map(|i| listing(&i.to_string(), &format!("calle {i}"))).collect()
}

fn query(l: &RawListing) -> String {
    build_query(l, "Argentina")
}

#[tokio::test]
async fn stops_once_missing_share_drops_below_threshold() {
    // 20 listings: 10 resolve in round 1, 5 in round 2, 3 in round 3, 1 in
    // round 4, and one never does.
    let listings = batch(20);
    let mut geocoder = FakeGeocoder::default();
    for (i, l) in listings.iter().enumerate() {
        let round = match i {
            0..=9 => 1,
            10..=14 => 2,
            15..=17 => 3,
            18 => 4,
            _ => continue,
        };
        geocoder = geocoder.resolves_on(query(l), round, rosario());
    }
    let geocoder = Arc::new(geocoder);

    let outcome = GeocodingEnricher::new(geocoder.clone(), &fast_config())
        .enrich(listings)
        .await;

    // After round 3 two are missing (not < 2); after round 4 one is.
    assert_eq!(outcome.rounds, 4);
    assert_eq!(outcome.unresolved(), 1);
    assert_eq!(geocoder.call_count(), 20 + 10 + 5 + 2);
    assert_eq!(outcome.resolved.len(), 20);
}

#[tokio::test]
async fn everything_resolved_in_one_round() {
    let listings = batch(5);
    let mut geocoder = FakeGeocoder::default();
    for l in &listings {
        geocoder = geocoder.resolves_on(query(l), 1, rosario());
    }

    let outcome = GeocodingEnricher::new(Arc::new(geocoder), &fast_config())
        .enrich(listings)
        .await;
    assert_eq!(outcome.rounds, 1);
    assert_eq!(outcome.unresolved(), 0);
}

#[tokio::test]
async fn round_cap_bounds_a_provider_that_never_answers() {
    let geocoder = Arc::new(FakeGeocoder::default());
    let mut config = fast_config();
    config.max_geocode_rounds = 3;

    let outcome = GeocodingEnricher::new(geocoder.clone(), &config)
        .enrich(batch(4))
        .await;
    assert_eq!(outcome.rounds, 3);
    assert_eq!(outcome.unresolved(), 4);
    assert_eq!(geocoder.call_count(), 12);
}

#[tokio::test]
async fn resolved_coordinates_are_never_requeried_or_replaced() {
    let listings = batch(2);
    let first = Coordinates::new(-32.95, -60.66).unwrap();
    let geocoder = Arc::new(
        FakeGeocoder::default()
            // Would answer differently if asked again.
            .script(query(&listings[0]), vec![Some(first), Some(rosario())])
            .resolves_on(query(&listings[1]), 2, rosario()),
    );
    let mut config = fast_config();
    config.convergence_threshold = 0.0;

    let outcome = GeocodingEnricher::new(geocoder.clone(), &config)
        .enrich(listings)
        .await;
    assert_eq!(outcome.rounds, 2);
    assert_eq!(geocoder.call_count(), 3);
    let by_id = |id: &str| {
        outcome
            .resolved
            .iter()
            .find(|(l, _)| l.identifier == id)
            .and_then(|(_, c)| *c)
    };
    assert_eq!(by_id("0"), Some(first));
    assert_eq!(by_id("1"), Some(rosario()));
}

#[tokio::test]
async fn shared_identifier_is_geocoded_once() {
    let a = listing("77", "mitre 900");
    let mut b = a.clone();
    b.property_type = "casas".into();
    let geocoder = Arc::new(FakeGeocoder::default().resolves_on(query(&a), 1, rosario()));

    let outcome = GeocodingEnricher::new(geocoder.clone(), &fast_config())
        .enrich(vec![a, b])
        .await;
    assert_eq!(geocoder.call_count(), 1);
    assert!(outcome.resolved.iter().all(|(_, c)| *c == Some(rosario())));
}

#[tokio::test]
async fn retries_within_a_round() {
    let listings = batch(1);
    let geocoder = Arc::new(FakeGeocoder::default().resolves_on(query(&listings[0]), 3, rosario()));
    let mut config = fast_config();
    config.geocode_attempts = 3;

    let outcome = GeocodingEnricher::new(geocoder.clone(), &config)
        .enrich(listings)
        .await;
    assert_eq!(outcome.rounds, 1);
    assert_eq!(outcome.unresolved(), 0);
    assert_eq!(geocoder.call_count(), 3);
}

#[tokio::test]
async fn nothing_to_geocode() {
    let geocoder = Arc::new(FakeGeocoder::default());
    let outcome = GeocodingEnricher::new(geocoder.clone(), &fast_config())
        .enrich(Vec::new())
        .await;
    assert_eq!(outcome.rounds, 0);
    assert_eq!(geocoder.call_count(), 0);
}
