// src/domain/logic.rs

use crate::domain::listing::NO_INFO;
use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Currency marker the sites use for Argentine pesos.
pub const LOCAL_CURRENCY: &str = "$";
/// Currency marker the sites use for US dollars.
pub const FOREIGN_CURRENCY: &str = "USD";

/// Marker for a one-room apartment ("monoambiente").
const STUDIO_TOKEN: &str = "mono";

lazy_static! {
    static ref LEADING_INT: Regex = Regex::new(r"^[0-9]+").expect("valid regex");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid regex");
}

/// Combines rent and expenses into a single total.
///
/// This is not a currency conversion. The sites habitually quote expenses in the
/// other currency's denomination, so a mismatch is patched by a factor of 1000
/// in the direction of the rent's currency:
///
/// | rent   | expenses | total                   |
/// |--------|----------|-------------------------|
/// | same   | same     | rent + expenses         |
/// | `USD`  | `$`      | rent + expenses / 1000  |
/// | `$`    | `USD`    | rent + expenses * 1000  |
/// | other  | other    | 0.0                     |
///
/// Unknown currencies never match, not even each other.
/// Confirm current site behaviour before changing the factor.
pub fn reconcile_total_rent(
    rent_currency: &str,
    rent_value: f64,
    expenses_currency: &str,
    expenses_value: f64,
) -> f64 {
    match (rent_currency, expenses_currency) {
        (rent, expenses) if rent == expenses && rent != NO_INFO => rent_value + expenses_value,
        (FOREIGN_CURRENCY, LOCAL_CURRENCY) => rent_value + expenses_value / 1000.0,
        (LOCAL_CURRENCY, FOREIGN_CURRENCY) => rent_value + expenses_value * 1000.0,
        _ => 0.0,
    }
}

/// Parses a room or bedroom count. Studio listings count as one room no matter
/// what digits follow the token.
pub fn parse_room_count(text: &str) -> Option<f64> {
    if text.to_lowercase().contains(STUDIO_TOKEN) {
        return Some(1.0);
    }
    leading_number(text)
}

/// Integer at the very start of the (trimmed) text, e.g. "45 m² cub." -> 45.
pub fn leading_number(text: &str) -> Option<f64> {
    LEADING_INT
        .find(text.trim())
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Every digit in the text glued together, e.g. "$ 250.000" -> 250000.
/// Thousands separators on these sites are dots, so this is how prices parse.
pub fn digits_only(text: &str) -> Option<f64> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<f64>().ok()
}

/// Text before the first comma, trimmed. "Centro, Rosario" -> "Centro".
pub fn first_segment(text: &str) -> Option<String> {
    let head = text.trim().split(',').next()?.trim();
    (!head.is_empty()).then(|| head.to_string())
}

/// Trim, collapse whitespace, lowercase and strip diacritics, so that the same
/// neighborhood spelled by two sites compares equal.
pub fn canonicalize_neighborhood(raw: &str) -> String {
    if raw == NO_INFO {
        return raw.to_string();
    }
    fold_text(raw)
}

/// Lowercase ASCII-ish form of free text: diacritics stripped, whitespace
/// collapsed. "  San  Martín " -> "san martin".
pub fn fold_text(raw: &str) -> String {
    let stripped: String = raw.nfd().filter(|c| !is_combining_mark(*c)).collect();
    WHITESPACE
        .replace_all(stripped.trim(), " ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_rent_same_currency_adds() {
        assert_eq!(reconcile_total_rent("$", 250000.0, "$", 40000.0), 290000.0);
        assert_eq!(reconcile_total_rent("USD", 500.0, "USD", 20.0), 520.0);
    }

    #[test]
    fn total_rent_foreign_rent_scales_expenses_down() {
        assert_eq!(reconcile_total_rent("USD", 1000.0, "$", 50000.0), 1050.0);
    }

    #[test]
    fn total_rent_local_rent_scales_expenses_up() {
        assert_eq!(reconcile_total_rent("$", 300.0, "USD", 25.0), 25300.0);
    }

    #[test]
    fn total_rent_unknown_rent_currency_is_zero() {
        assert_eq!(reconcile_total_rent(NO_INFO, 1000.0, "$", 5000.0), 0.0);
        assert_eq!(reconcile_total_rent("EUR", 1000.0, "$", 5000.0), 0.0);
    }

    #[test]
    fn total_rent_known_rent_with_unknown_expenses_is_zero() {
        assert_eq!(reconcile_total_rent("USD", 1000.0, NO_INFO, 30.0), 0.0);
        assert_eq!(reconcile_total_rent("$", 300000.0, NO_INFO, 50.0), 0.0);
        assert_eq!(reconcile_total_rent("$", 300000.0, "EUR", 50.0), 0.0);
        assert_eq!(reconcile_total_rent(NO_INFO, 0.0, NO_INFO, 40000.0), 0.0);
    }

    #[test]
    fn studio_token_wins_over_digits() {
        assert_eq!(parse_room_count("Monoambiente"), Some(1.0));
        assert_eq!(parse_room_count("mono 3"), Some(1.0));
        assert_eq!(parse_room_count("3 amb."), Some(3.0));
        assert_eq!(parse_room_count("amb."), None);
    }

    #[test]
    fn number_helpers() {
        assert_eq!(leading_number("  45 m² cubie."), Some(45.0));
        assert_eq!(leading_number("a 45"), None);
        assert_eq!(digits_only("$ 250.000"), Some(250000.0));
        assert_eq!(digits_only("Consultar precio"), None);
    }

    #[test]
    fn neighborhood_canonical_form() {
        assert_eq!(canonicalize_neighborhood("  Barrio   Martín "), "barrio martin");
        assert_eq!(canonicalize_neighborhood("Echesortu"), "echesortu");
        assert_eq!(canonicalize_neighborhood(NO_INFO), NO_INFO);
        assert_eq!(first_segment("Centro, Rosario").as_deref(), Some("Centro"));
        assert_eq!(first_segment(" , x"), None);
        assert_eq!(fold_text("Córdoba\tCapital"), "cordoba capital");
    }
}
