//! Numeric normalisation of listing text.
//!
//! Marketplace cards show prices as `Rp15.000` and sales as `2rb terjual`.
//! Both helpers are total: text without a parseable number yields `None`/`0`.

use std::sync::LazyLock;

use regex::Regex;

/// First run of digits and thousands separators.
static PRICE_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d[\d.,]*").unwrap());

/// A rupiah amount embedded in longer text, e.g. `Diskon 20% Rp12.500 Rp15.000`.
static PRICE_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Rp[\d.,]+").unwrap());

/// First run of digits and dots in a sold-count label.
static SOLD_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d[\d.]*").unwrap());

/// Local abbreviation for "thousand" (ribu).
const THOUSAND_TOKEN: &str = "rb";

/// Parse a raw price label into whole rupiah.
///
/// `"Rp15.000"` becomes `Some(15000)`; `"Harga tidak tersedia"` becomes `None`.
pub fn clean_price(raw: &str) -> Option<i64> {
    let run = PRICE_DIGITS.find(raw)?;
    let digits: String = run.as_str().chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Parse a sold-count label into a unit count.
///
/// The thousand abbreviation is expanded before digits are read, so
/// `"2rb terjual"` is 2000 and `"500+ terjual"` is 500. No digits means 0.
pub fn clean_sold_count(raw: &str) -> i64 {
    let expanded = raw.to_lowercase().replace(THOUSAND_TOKEN, "000");
    SOLD_DIGITS
        .find(&expanded)
        .map(|m| m.as_str().replace('.', ""))
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(0)
}

/// Pull the `Rp…` amount out of a longer text node, if any.
pub fn extract_price_token(text: &str) -> Option<&str> {
    PRICE_TOKEN.find(text).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_with_separators() {
        assert_eq!(clean_price("Rp15.000"), Some(15000));
        assert_eq!(clean_price("Rp1.250.000"), Some(1_250_000));
        assert_eq!(clean_price("Rp 7,500"), Some(7500));
        assert_eq!(clean_price("Rp999"), Some(999));
    }

    #[test]
    fn price_without_digits_is_none() {
        assert_eq!(clean_price("Harga tidak tersedia"), None);
        assert_eq!(clean_price(""), None);
        assert_eq!(clean_price("Rp..."), None);
    }

    #[test]
    fn price_takes_first_amount() {
        assert_eq!(clean_price("Rp12.500 - Rp20.000"), Some(12500));
    }

    #[test]
    fn sold_count_expands_thousands() {
        assert_eq!(clean_sold_count("2rb terjual"), 2000);
        assert_eq!(clean_sold_count("10RB+ terjual"), 10000);
        assert_eq!(clean_sold_count("500+ terjual"), 500);
        assert_eq!(clean_sold_count("1.234 terjual"), 1234);
    }

    #[test]
    fn sold_count_without_digits_is_zero() {
        assert_eq!(clean_sold_count("terjual"), 0);
        assert_eq!(clean_sold_count(""), 0);
    }

    #[test]
    fn price_token_inside_text() {
        assert_eq!(extract_price_token("Diskon Rp12.500 hari ini"), Some("Rp12.500"));
        assert_eq!(extract_price_token("Gratis ongkir"), None);
    }
}
