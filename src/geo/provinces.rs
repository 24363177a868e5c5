// provinces.rs
use crate::domain::logic::fold_text;
use lazy_static::lazy_static;
use std::collections::HashMap;

/// `slug,province` lines; `#` starts a comment.
const LOCALITIES_CSV: &str = include_str!("../../data/localities.csv");

lazy_static! {
    /// Locality slug (as used in the sites' URLs) to the province it belongs to.
    static ref LOCALITY_PROVINCES: HashMap<&'static str, &'static str> = parse_table(LOCALITIES_CSV);
}

fn parse_table(csv: &'static str) -> HashMap<&'static str, &'static str> {
    csv.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once(','))
        .map(|(slug, province)| (slug.trim(), province.trim()))
        .collect()
}

/// Province for a locality slug, ignoring case and accents.
pub fn province_for(locality: &str) -> Option<&'static str> {
    let wanted = fold_text(locality).replace(' ', "-");
    LOCALITY_PROVINCES.get(wanted.as_str()).copied()
}
