// estimator.rs
use crate::config::SearchScope;
use crate::domain::captured_now;
use crate::domain::logic::digits_only;
use crate::scraper::source::PAGE_SIZE;
use crate::scraper::{PageClient, Source};
use crate::workers::run_bounded;
use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::Arc;
use tracing::{info, warn};

/// Upper bound on the pages enumerated for one (type, locality) pair.
pub const MAX_PAGES_PER_PAIR: u32 = 500;

lazy_static! {
    /// First number in the header, thousands dots included: "1.234".
    static ref FIRST_COUNT: Regex = Regex::new(r"\d[\d.]*").expect("valid regex");
}

/// How many result pages one (type, locality) pair is expected to span.
#[derive(Debug, Clone, PartialEq)]
pub struct PageProbe {
    pub property_type: String,
    pub locality: String,
    pub source: Source,
    pub result_count: u64,
    pub estimated_page_count: u32,
    pub fetched_at: NaiveDateTime,
}

/// `ceil(result_count / page_size) + buffer`, or 0 when there is nothing to
/// fetch, capped at [`MAX_PAGES_PER_PAIR`]. Non-decreasing in `result_count`.
pub fn estimate_page_count(result_count: u64, page_size: u32, buffer: u32) -> u32 {
    if result_count == 0 || page_size == 0 {
        return 0;
    }
    let pages = result_count.div_ceil(page_size as u64);
    u32::try_from(pages)
        .unwrap_or(u32::MAX)
        .saturating_add(buffer)
        .min(MAX_PAGES_PER_PAIR)
}

/// Reads the total result count from a first page's header. A missing or
/// unparsable header means "no listings".
pub fn parse_result_count(source: Source, html: &str) -> u64 {
    let Ok(selector) = Selector::parse(source.results_count_selector()) else {
        return 0;
    };
    let document = Html::parse_document(html);
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>())
        .and_then(|text| FIRST_COUNT.find(&text).and_then(|m| digits_only(m.as_str())))
        .map(|n| n as u64)
        .unwrap_or(0)
}

/// Fetches the first result page of every (type, locality) pair to learn how
/// many pages the full fetch should enumerate.
pub struct PageEstimator {
    client: Arc<dyn PageClient>,
    concurrency: usize,
}

impl PageEstimator {
    pub fn new(client: Arc<dyn PageClient>, concurrency: usize) -> Self {
        Self {
            client,
            concurrency,
        }
    }

    pub async fn probe(&self, source: Source, scope: &SearchScope) -> Vec<PageProbe> {
        let pairs = scope.pairs();
        info!(%source, pairs = pairs.len(), "probing result counts");

        let client = self.client.clone();
        let probes = run_bounded(pairs, self.concurrency, move |(property_type, locality)| {
            let client = client.clone();
            async move {
                let url = source.page_url(&property_type, &locality, 1);
                let result_count = match client.get_page(&url).await {
                    Ok(resp) if resp.is_success() => parse_result_count(source, &resp.body),
                    Ok(resp) => {
                        warn!(%url, status = resp.status, "probe returned non-success status");
                        0
                    }
                    Err(e) => {
                        warn!(%url, error = %e, "probe failed");
                        0
                    }
                };

                PageProbe {
                    estimated_page_count: estimate_page_count(
                        result_count,
                        PAGE_SIZE,
                        source.page_buffer(),
                    ),
                    property_type,
                    locality,
                    source,
                    result_count,
                    fetched_at: captured_now(),
                }
            }
        })
        .await;

        let total_pages: u32 = probes.iter().map(|p| p.estimated_page_count).sum();
        info!(%source, total_pages, "page estimate complete");
        probes
    }
}
