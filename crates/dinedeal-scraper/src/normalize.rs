//! Heuristic conversion of raw offer text into a structured [`Offer`].
//!
//! Classification runs an ordered rule list over the text; the first rule
//! that matches decides the offer type and numeric value. Extraction of the
//! coupon code, the "up to" cap, and the card issuer is independent of the
//! chosen type.

use std::collections::HashSet;
use std::sync::LazyLock;

use dinedeal_core::{Offer, OfferMode, OfferSource, OfferType, ProviderKey, OFFER_CURRENCY};
use regex::Regex;

/// Substrings (lower-case) that mark a line of page text as offer-like.
const OFFER_KEYWORDS: [&str; 7] = ["%", "off", "cashback", "flat", "save", "bank", "offer"];

/// Lines shorter than this (in characters) are never offers.
const MIN_OFFER_TEXT_CHARS: usize = 6;

/// Card issuers recognised as payment instruments, in priority order.
const BANKS: [&str; 6] = ["hdfc", "icici", "sbi", "axis", "amex", "kotak"];

// `₹500`, `Rs. 500`, `rs 500` and bare `500` are all accepted.
const AMOUNT_PREFIX: &str = r"(?:(?:₹|rs\.?)\s*)?";

enum Matcher {
    /// The first capture group of the first matching pattern is the value.
    Amount(Vec<Regex>),
    /// Matches without producing a value.
    Mention(Regex),
}

struct TypeRule {
    offer_type: OfferType,
    matcher: Matcher,
}

impl TypeRule {
    /// `Some(value)` when the rule applies; the inner value may be absent.
    fn classify(&self, text: &str) -> Option<Option<f64>> {
        match &self.matcher {
            Matcher::Amount(patterns) => patterns.iter().find_map(|re| {
                re.captures(text)
                    .and_then(|cap| cap.get(1))
                    .map(|m| m.as_str().parse::<f64>().ok())
            }),
            Matcher::Mention(re) => re.is_match(text).then_some(None),
        }
    }
}

fn offer_regex(pattern: &str) -> Regex {
    let pattern = pattern.replace("{amount}", AMOUNT_PREFIX);
    Regex::new(&format!("(?i){pattern}")).expect("valid regex")
}

static TYPE_RULES: LazyLock<Vec<TypeRule>> = LazyLock::new(|| {
    vec![
        TypeRule {
            offer_type: OfferType::Percentage,
            matcher: Matcher::Amount(vec![offer_regex(r"\b(\d{1,2})\s?%")]),
        },
        TypeRule {
            offer_type: OfferType::Cashback,
            matcher: Matcher::Amount(vec![
                offer_regex(r"\bcash\s?back\s+(?:of\s+)?{amount}(\d{2,5})\b"),
                offer_regex(r"{amount}\b(\d{2,5})\s*(?:instant\s+)?cash\s?back\b"),
            ]),
        },
        TypeRule {
            offer_type: OfferType::Flat,
            matcher: Matcher::Amount(vec![offer_regex(
                r"\b(?:flat|save|off)\s+{amount}(\d{2,5})\b",
            )]),
        },
        TypeRule {
            offer_type: OfferType::Coupon,
            matcher: Matcher::Mention(offer_regex(r"coupon|code")),
        },
    ]
});

static COUPON_CODE: LazyLock<Regex> =
    LazyLock::new(|| offer_regex(r"\bcode\s*:?\s*([A-Z0-9]{4,10})\b"));

static MAX_DISCOUNT: LazyLock<Regex> =
    LazyLock::new(|| offer_regex(r"\b(?:up\s*to|upto)\s+{amount}(\d{2,6})\b"));

/// Builds an [`Offer`] from one raw text snippet.
///
/// Pure: the same inputs always yield the same offer.
#[must_use]
pub fn normalize_offer_text(raw: &str, provider_key: ProviderKey, source_url: &str) -> Offer {
    let title = raw.trim().to_owned();
    let lower = title.to_lowercase();

    let (offer_type, value) = TYPE_RULES
        .iter()
        .find_map(|rule| rule.classify(&title).map(|value| (rule.offer_type, value)))
        .unwrap_or((OfferType::Unknown, None));

    let coupon_code = COUPON_CODE
        .captures(&title)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_uppercase());

    let max_discount = MAX_DISCOUNT
        .captures(&title)
        .and_then(|cap| cap.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok());

    let payment_instrument = BANKS
        .iter()
        .find(|bank| lower.contains(*bank))
        .map(|bank| bank.to_uppercase());

    let currency = (value.is_some() || max_discount.is_some()).then(|| OFFER_CURRENCY.to_owned());

    Offer {
        mode: offer_mode(&lower),
        title,
        offer_type,
        value,
        currency,
        min_spend: None,
        max_discount,
        coupon_code,
        payment_instrument,
        validity_text: None,
        terms: None,
        source: OfferSource {
            provider_key,
            source_url: source_url.to_owned(),
        },
    }
}

fn offer_mode(lower: &str) -> OfferMode {
    if lower.contains("pre-book") || lower.contains("prebook") {
        OfferMode::Prebook
    } else if lower.contains("walk-in") || lower.contains("walkin") {
        OfferMode::Walkin
    } else if lower.contains("bill") {
        OfferMode::Billpay
    } else if lower.contains("bank") {
        OfferMode::Bank
    } else {
        OfferMode::Unknown
    }
}

/// Whether `text` mentions any offer keyword (case-insensitive).
#[must_use]
pub fn looks_like_offer(text: &str) -> bool {
    let lower = text.to_lowercase();
    OFFER_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Filters raw page lines down to offer candidates.
///
/// Whitespace is collapsed, short and keyword-less lines are dropped,
/// exact duplicates are removed keeping the first occurrence, and at most
/// `limit` lines are returned.
pub fn extract_offer_texts<I, S>(lines: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    lines
        .into_iter()
        .map(|line| collapse_whitespace(line.as_ref()))
        .filter(|line| line.chars().count() >= MIN_OFFER_TEXT_CHARS)
        .filter(|line| looks_like_offer(line))
        .filter(|line| seen.insert(line.clone()))
        .take(limit)
        .collect()
}

/// Joins the whitespace-separated words of `text` with single spaces.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
