use serde::{Deserialize, Serialize};
use std::fmt;

/// Results per page on both sites.
pub const PAGE_SIZE: u32 = 20;

/// The two listing sites this crate harvests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Server-rendered; plain HTTP works.
    #[value(name = "argenprop")]
    ArgenProp,
    /// Rendered client-side in the browser.
    #[value(name = "zonaprop")]
    ZonaProp,
}

impl Source {
    /// Whether result pages only fill in after client-side scripts run.
    pub fn needs_script(&self) -> bool {
        matches!(self, Source::ZonaProp)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Source::ArgenProp => "argenprop",
            Source::ZonaProp => "zonaprop",
        }
    }

    /// Prefix for the relative listing links found on result pages.
    pub fn base_url(&self) -> &'static str {
        match self {
            Source::ArgenProp => "https://www.argenprop.com",
            Source::ZonaProp => "https://www.zonaprop.com.ar",
        }
    }

    /// URL of result page `page` (1-indexed).
    pub fn page_url(&self, property_type: &str, locality: &str, page: u32) -> String {
        match self {
            Source::ArgenProp => format!(
                "{}/{property_type}/alquiler/{locality}?pagina-{page}",
                self.base_url()
            ),
            Source::ZonaProp => format!(
                "{}/{property_type}-alquiler-{locality}-pagina-{page}.html",
                self.base_url()
            ),
        }
    }

    /// Extra pages fetched beyond the estimate, since listings get added
    /// between the probe and the full fetch.
    pub fn page_buffer(&self) -> u32 {
        match self {
            Source::ArgenProp => 2,
            Source::ZonaProp => 1,
        }
    }

    /// Header element holding the total result count.
    pub fn results_count_selector(&self) -> &'static str {
        match self {
            Source::ArgenProp => "p.listing-header__results",
            Source::ZonaProp => "h1.sc-1oqs0ed-0",
        }
    }

    /// SQLite table holding this source's listings.
    pub fn table_name(&self) -> &'static str {
        match self {
            Source::ArgenProp => "listings_argenprop",
            Source::ZonaProp => "listings_zonaprop",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_templates() {
        assert_eq!(
            Source::ArgenProp.page_url("departamentos", "rosario", 3),
            "https://www.argenprop.com/departamentos/alquiler/rosario?pagina-3"
        );
        assert_eq!(
            Source::ZonaProp.page_url("casas", "rosario", 1),
            "https://www.zonaprop.com.ar/casas-alquiler-rosario-pagina-1.html"
        );
    }

    #[test]
    fn only_zonaprop_needs_a_browser() {
        assert!(!Source::ArgenProp.needs_script());
        assert!(Source::ZonaProp.needs_script());
    }
}
