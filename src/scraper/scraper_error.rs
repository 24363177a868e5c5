use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Invalid selector '{0}'")]
    Selector(String),

    #[error("Geocoding error: {0}")]
    Geocoding(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ScraperError {
    fn from(e: reqwest::Error) -> Self {
        ScraperError::Network(e.to_string())
    }
}

impl From<chromiumoxide::error::CdpError> for ScraperError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        ScraperError::Browser(e.to_string())
    }
}
