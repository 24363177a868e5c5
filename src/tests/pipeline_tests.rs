use super::fakes::{fast_config, rosario, FakeGeocoder, FakePageClient};
use crate::config::SearchScope;
use crate::domain::{LANDMARK_COUNT, NO_DISTANCE_KM, NO_INFO, OUTPUT_COLUMNS};
use crate::pipeline::run_source;
use crate::scraper::{PageClient, PageClients, Source};
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn card(id: &str, address: &str, location: &str, price: &str) -> String {
    format!(
        r#"<div class="listing__item">
  <a href="/departamento-en-alquiler--{id}" data-item-card="{id}">
    <p class="card__price"><span class="card__currency">$</span> {price}
      <span class="card__expenses">+ $30.000 expensas</span></p>
    <p class="card__address">{address}</p>
    <p class="card__title--primary show-mobile">{location}</p>
    <h2 class="card__title">Departamento {id}</h2>
  </a>
</div>"#
    )
}

fn results_page(cards: &[String]) -> String {
    format!(
        r#"<html><body>
<p class="listing-header__results">3 Departamentos en alquiler en Rosario</p>
<div class="listing__items">
{}
<div class="listing__item listing__item--banner"><p>Publicidad</p></div>
</div>
</body></html>"#,
        cards.join("\n")
    )
}

fn argenprop_site() -> FakePageClient {
    let page = results_page(&[
        card("101", "Córdoba al 1500", "Centro, Rosario", "250.000"),
        card("102", "Mitre al 900", "Echesortu, Rosario", "180.000"),
        card("101", "Córdoba al 1500", "Centro, Rosario", "250.000"),
    ]);
    let url = |n| Source::ArgenProp.page_url("departamentos", "rosario", n);
    FakePageClient::default()
        .with_page(url(1), page)
        // Page 2 is missing (404); page 3 never connects.
        .with_failure(url(3))
}

#[tokio::test]
async fn harvests_one_source_end_to_end() {
    let pages = Arc::new(argenprop_site());
    let geocoder = Arc::new(FakeGeocoder::default().resolves_on(
        "córdoba 1500,centro,rosario,santa fe,Argentina",
        1,
        rosario(),
    ));
    let scope = SearchScope::new(["departamentos"], ["rosario"]);
    let mut config = fast_config();
    config.convergence_threshold = 0.6;

    let report = run_source(Source::ArgenProp, &scope, &config, pages.clone(), geocoder.clone()).await;

    // 3 results at 20 per page, plus the 2-page buffer.
    assert_eq!(report.probes.len(), 1);
    assert_eq!(report.probes[0].result_count, 3);
    assert_eq!(report.probes[0].estimated_page_count, 3);
    // One probe request plus three page requests.
    assert_eq!(pages.calls.load(Ordering::SeqCst), 4);
    assert_eq!(report.pages_fetched, 1);

    // Three cards and a banner; the banner and the repeated card go away.
    assert_eq!(report.raw_count, 4);
    assert_eq!(report.listings.len(), 2);
    assert_eq!(report.geocode_rounds, 1);
    assert_eq!(report.resolved_count(), 1);

    let centro = &report.listings[0];
    assert_eq!(centro.listing.identifier, "101");
    assert_eq!(centro.listing.neighborhood, "centro");
    assert_eq!(centro.listing.address, "córdoba 1500");
    assert_eq!(centro.listing.state, "santa fe");
    assert_eq!(centro.listing.total_rent, 280000.0);
    assert_eq!(centro.coordinates, Some(rosario()));
    assert!(centro.distances_km.iter().all(|d| *d < 20.0));

    let echesortu = &report.listings[1];
    assert_eq!(echesortu.listing.identifier, "102");
    assert_eq!(echesortu.coordinates, None);
    assert_eq!(echesortu.distances_km, [NO_DISTANCE_KM; LANDMARK_COUNT]);
    assert_eq!(echesortu.coordinate_pair(), NO_INFO);
    assert_eq!(echesortu.row().len(), OUTPUT_COLUMNS.len());
}

#[tokio::test]
async fn empty_scope_touches_nothing() {
    let pages = Arc::new(FakePageClient::default());
    let geocoder = Arc::new(FakeGeocoder::default());
    let scope = SearchScope::new(["departamentos"], Vec::<String>::new());

    let report = run_source(Source::ZonaProp, &scope, &fast_config(), pages.clone(), geocoder.clone()).await;
    assert!(report.listings.is_empty());
    assert!(report.probes.is_empty());
    assert_eq!(pages.calls.load(Ordering::SeqCst), 0);
    assert_eq!(geocoder.call_count(), 0);
}

#[tokio::test]
async fn unreachable_site_yields_empty_report() {
    let url = Source::ZonaProp.page_url("casas", "funes", 1);
    let pages = Arc::new(FakePageClient::default().with_failure(url));
    let geocoder = Arc::new(FakeGeocoder::default());
    let scope = SearchScope::new(["casas"], ["funes"]);

    let report = run_source(Source::ZonaProp, &scope, &fast_config(), pages.clone(), geocoder).await;
    assert_eq!(report.probes.len(), 1);
    assert_eq!(report.probes[0].estimated_page_count, 0);
    assert_eq!(report.pages_fetched, 0);
    assert!(report.listings.is_empty());
    // Only the probe was attempted.
    assert_eq!(pages.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn script_rendered_source_uses_the_browser_client() {
    let plain = Arc::new(FakePageClient::default());
    let browser = Arc::new(FakePageClient::default());
    let clients = PageClients::new(plain.clone(), Some(browser.clone() as Arc<dyn PageClient>));

    clients.for_source(Source::ZonaProp).get_page("https://z/1").await.unwrap();
    clients.for_source(Source::ArgenProp).get_page("https://a/1").await.unwrap();
    assert_eq!(browser.calls.load(Ordering::SeqCst), 1);
    assert_eq!(plain.calls.load(Ordering::SeqCst), 1);

    let without_browser = PageClients::new(plain.clone(), None);
    without_browser.for_source(Source::ZonaProp).get_page("https://z/2").await.unwrap();
    assert_eq!(plain.calls.load(Ordering::SeqCst), 2);
}
