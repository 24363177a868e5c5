// browser.rs
use crate::config::PipelineConfig;
use crate::scraper::client::{PageClient, PageResponse};
use crate::scraper::ScraperError;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{EnableParams, EventResponseReceived, ResourceType};
use chromiumoxide::listeners::EventStream;
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// How long to wait for the document's response event once the page has loaded.
const STATUS_WAIT: Duration = Duration::from_secs(2);

/// Owns one browser tab and closes it when dropped.
///
/// `Page` has no `Drop` of its own; an unclosed tab keeps its CDP session
/// alive until the browser exits.
struct PageGuard {
    page: Page,
    url: String,
    closed: bool,
}

impl PageGuard {
    fn new(page: Page, url: &str) -> Self {
        Self {
            page,
            url: url.to_string(),
            closed: false,
        }
    }

    async fn close(mut self) {
        self.closed = true;
        if let Err(e) = self.page.clone().close().await {
            warn!(url = %self.url, error = %e, "closing browser tab failed");
        }
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let page = self.page.clone();
        let url = std::mem::take(&mut self.url);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(e) = page.close().await {
                    debug!(%url, error = %e, "background tab close failed");
                }
            });
        }
    }
}

/// Renders pages in a shared headless Chromium. At most `browser_pool_size`
/// tabs are open at once; each request gets a fresh tab.
pub struct BrowserPageClient {
    browser: Browser,
    handler: JoinHandle<()>,
    tabs: Semaphore,
    load_timeout: Duration,
}

impl BrowserPageClient {
    pub async fn launch(config: &PipelineConfig) -> Result<Self, ScraperError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(config.http_timeout)
            .arg(format!("--user-agent={}", config.user_agent))
            .arg("--lang=es-AR");
        if let Some(path) = &config.browser_executable {
            builder = builder.chrome_executable(path);
        }
        let browser_config = builder.build().map_err(ScraperError::Config)?;

        let (browser, mut events) = Browser::launch(browser_config).await?;
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "browser event error");
                }
            }
        });

        let pool = config.browser_pool_size.max(1);
        info!(tabs = pool, "headless browser ready");
        Ok(Self {
            browser,
            handler,
            tabs: Semaphore::new(pool),
            load_timeout: config.http_timeout,
        })
    }
}

impl Drop for BrowserPageClient {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// Status of the main document response. Pages whose response event never
/// shows up are treated as 200, since the markup did render.
async fn document_status(responses: &mut EventStream<EventResponseReceived>) -> u16 {
    while let Ok(Some(event)) = timeout(STATUS_WAIT, responses.next()).await {
        if event.r#type == ResourceType::Document {
            return u16::try_from(event.response.status).unwrap_or(0);
        }
    }
    200
}

async fn render(page: &Page, url: &str) -> Result<PageResponse, ScraperError> {
    page.execute(EnableParams::default()).await?;
    let mut responses = page.event_listener::<EventResponseReceived>().await?;

    page.goto(url).await?;
    page.wait_for_navigation().await?;

    let status = document_status(&mut responses).await;
    let body = page.content().await?;
    Ok(PageResponse { status, body })
}

#[async_trait]
impl PageClient for BrowserPageClient {
    async fn get_page(&self, url: &str) -> Result<PageResponse, ScraperError> {
        let _tab = self
            .tabs
            .acquire()
            .await
            .map_err(|e| ScraperError::Browser(e.to_string()))?;
        let start = Instant::now();

        let guard = PageGuard::new(self.browser.new_page("about:blank").await?, url);
        let rendered = timeout(self.load_timeout, render(&guard.page, url)).await;
        guard.close().await;

        let resp = rendered
            .map_err(|_| ScraperError::Browser(format!("timed out rendering {url}")))??;
        debug!(url, status = resp.status, elapsed = ?start.elapsed(), "page rendered");
        Ok(resp)
    }
}
