// client.rs
use crate::config::PipelineConfig;
use crate::scraper::{ScraperError, Source};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::Client;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Raw result of retrieving one page. Non-2xx statuses are returned, not
/// raised, so callers can record them.
#[derive(Debug, Clone)]
pub struct PageResponse {
    pub status: u16,
    pub body: String,
}

impl PageResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Retrieves page markup, either over plain HTTP or through a browser.
#[async_trait]
pub trait PageClient: Send + Sync {
    async fn get_page(&self, url: &str) -> Result<PageResponse, ScraperError>;
}

pub struct HttpPageClient {
    client: Client,
}

impl HttpPageClient {
    pub fn new(config: &PipelineConfig) -> Result<Self, ScraperError> {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static("https://www.google.com/"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("es-AR,es;q=0.9"));

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| ScraperError::Network(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageClient for HttpPageClient {
    async fn get_page(&self, url: &str) -> Result<PageResponse, ScraperError> {
        let start = Instant::now();
        let resp = self.client.get(url).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;

        debug!(url, status, elapsed = ?start.elapsed(), "page retrieved");
        Ok(PageResponse { status, body })
    }
}

/// The page clients of a harvest, picked per source.
#[derive(Clone)]
pub struct PageClients {
    plain: Arc<dyn PageClient>,
    rendering: Option<Arc<dyn PageClient>>,
}

impl PageClients {
    pub fn new(plain: Arc<dyn PageClient>, rendering: Option<Arc<dyn PageClient>>) -> Self {
        Self { plain, rendering }
    }

    /// Script-rendered sources get the browser when one was launched.
    pub fn for_source(&self, source: Source) -> Arc<dyn PageClient> {
        match (&self.rendering, source.needs_script()) {
            (Some(rendering), true) => rendering.clone(),
            _ => self.plain.clone(),
        }
    }
}
