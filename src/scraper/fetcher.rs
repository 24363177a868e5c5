// fetcher.rs
use crate::config::SearchScope;
use crate::domain::captured_now;
use crate::scraper::estimator::PageProbe;
use crate::scraper::{PageClient, Source};
use crate::workers::run_bounded;
use chrono::NaiveDateTime;
use std::sync::Arc;
use tracing::{info, warn};

/// One retrieved results page. Dropped once its listings are extracted.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub property_type: String,
    pub locality: String,
    pub source: Source,
    pub url: String,
    pub raw_markup: String,
    pub fetched_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub property_type: String,
    pub locality: String,
    pub page: u32,
    pub url: String,
}

/// Expands the probe table into one request per page. Pairs without a probe
/// contribute nothing.
pub fn page_requests(source: Source, scope: &SearchScope, probes: &[PageProbe]) -> Vec<PageRequest> {
    let mut out = Vec::new();
    for (property_type, locality) in scope.pairs() {
        let max_pages = probes
            .iter()
            .filter(|p| p.source == source && p.property_type == property_type && p.locality == locality)
            .map(|p| p.estimated_page_count)
            .max()
            .unwrap_or(0);

        for page in 1..=max_pages {
            out.push(PageRequest {
                url: source.page_url(&property_type, &locality, page),
                property_type: property_type.clone(),
                locality: locality.clone(),
                page,
            });
        }
    }
    out
}

/// Retrieves every page of the scope concurrently. A page that fails for any
/// reason is logged and dropped; there is no retry.
pub struct PageFetcher {
    client: Arc<dyn PageClient>,
    concurrency: usize,
}

impl PageFetcher {
    pub fn new(client: Arc<dyn PageClient>, concurrency: usize) -> Self {
        Self {
            client,
            concurrency,
        }
    }

    pub async fn fetch_all(
        &self,
        source: Source,
        scope: &SearchScope,
        probes: &[PageProbe],
    ) -> Vec<FetchedPage> {
        let requests = page_requests(source, scope, probes);
        let requested = requests.len();
        info!(%source, pages = requested, concurrency = self.concurrency, "fetching result pages");

        let client = self.client.clone();
        let pages: Vec<FetchedPage> = run_bounded(requests, self.concurrency, move |req: PageRequest| {
            let client = client.clone();
            async move {
                match client.get_page(&req.url).await {
                    Ok(resp) if resp.is_success() => Some(FetchedPage {
                        property_type: req.property_type,
                        locality: req.locality,
                        source,
                        url: req.url,
                        raw_markup: resp.body,
                        fetched_at: captured_now(),
                    }),
                    Ok(resp) => {
                        warn!(url = %req.url, page = req.page, status = resp.status, "dropping page with non-success status");
                        None
                    }
                    Err(e) => {
                        warn!(url = %req.url, page = req.page, error = %e, "dropping page after fetch failure");
                        None
                    }
                }
            }
        })
        .await
        .into_iter()
        .flatten()
        .collect();

        info!(%source, requested, fetched = pages.len(), "page fetch complete");
        pages
    }
}
