//! Text-to-number normalization for heterogeneous listing fields.
//!
//! Sources render prices, ratings, and review counts as display strings in
//! mixed locales (`"R$ 1.299,90"`, `"249.90"`, `"4,5 de 5 estrelas"`,
//! `"(2,3 mil)"`). The helpers here turn them into typed values or `None`.
//! A `None` price means the listing is dropped; a `None` rating or review
//! count means "unknown", never zero.
//!
//! Price locale detection is a heuristic tuned for BRL and US-style
//! formatting. It is not a general world-currency parser.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

/// Prices above this bound are treated as a separator misread, not a real offer.
pub const MAX_PLAUSIBLE_PRICE: Decimal = Decimal::from_parts(10_000_000, 0, 0, false, 0);

static NUMBER_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+(?:\.\d+)?").expect("number token regex is valid")
});

static GROUPED_INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d.,]*").expect("grouped integer regex is valid"));

static THOUSANDS_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*(?:mil|k)\b").expect("thousands regex is valid")
});

/// Parses a display price into a positive decimal.
///
/// Everything except digits, `,` and `.` is stripped first. When both
/// separators occur, whichever occurs last is the decimal separator and the
/// other is grouping. When only one kind occurs, its last occurrence is the
/// decimal separator only if exactly one or two digits follow it at the end of
/// the string; otherwise every occurrence is grouping.
///
/// Returns `None` for empty, unparsable, non-positive, or implausibly large
/// values (see [`MAX_PLAUSIBLE_PRICE`]).
#[must_use]
pub fn parse_price(text: &str) -> Option<Decimal> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    if !cleaned.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }

    let decimal_at = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) => Some(comma.max(dot)),
        (Some(pos), None) | (None, Some(pos)) => {
            let trailing = &cleaned[pos + 1..];
            let is_decimal =
                (1..=2).contains(&trailing.len()) && trailing.bytes().all(|b| b.is_ascii_digit());
            is_decimal.then_some(pos)
        }
        (None, None) => None,
    };

    let normalized: String = cleaned
        .char_indices()
        .filter_map(|(i, c)| match c {
            '0'..='9' => Some(c),
            _ if Some(i) == decimal_at => Some('.'),
            _ => None,
        })
        .collect();

    let price = Decimal::from_str(&normalized).ok()?;
    (price > Decimal::ZERO && price <= MAX_PLAUSIBLE_PRICE).then_some(price)
}

/// Parses a star rating such as `"4.5"`, `"4,7"`, or `"4,5 de 5 estrelas"`.
///
/// Takes the first numeric token after normalizing `,` to `.`. Range checks
/// happen when the value is attached to a listing.
#[must_use]
pub fn parse_rating(text: &str) -> Option<f64> {
    let normalized = text.replace(',', ".");
    let token = NUMBER_TOKEN.find(&normalized)?;
    token.as_str().parse::<f64>().ok().filter(|r| r.is_finite())
}

/// Parses a review count such as `"(1.234)"`, `"987 avaliações"`, or
/// `"2,3 mil"`.
///
/// Counts abbreviated with a thousands marker (`mil`, `k`) are scaled by 1000
/// and rounded. Otherwise grouping separators are dropped from the first
/// numeric run.
#[must_use]
pub fn parse_review_count(text: &str) -> Option<u64> {
    let cleaned = text.replace(['(', ')'], "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }

    if let Some(caps) = THOUSANDS_COUNT.captures(cleaned) {
        let value = caps[1].replace(',', ".").parse::<f64>().ok()?;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        return Some((value * 1000.0).round() as u64);
    }

    let run = GROUPED_INTEGER.find(cleaned)?;
    let digits: String = run.as_str().chars().filter(char::is_ascii_digit).collect();
    digits.parse::<u64>().ok()
}

/// `true` when a shipping or delivery label advertises free shipping.
#[must_use]
pub fn is_free_shipping_label(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("grátis") || lower.contains("gratis") || lower.contains("free")
}

/// `true` when the offer is refurbished according to its URL or title.
#[must_use]
pub fn looks_refurbished(url: &str, title: &str) -> bool {
    url.to_lowercase().contains("recondicionado") || title.to_lowercase().contains("recondicionado")
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
