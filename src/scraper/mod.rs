mod browser;
pub mod client;
pub mod estimator;
pub mod extract;
pub mod fetcher;
mod scraper_error;
mod source;

pub use browser::BrowserPageClient;
pub use client::{HttpPageClient, PageClient, PageClients};
pub use estimator::{PageEstimator, PageProbe};
pub use fetcher::PageFetcher;
pub use scraper_error::ScraperError;
pub use source::Source;
