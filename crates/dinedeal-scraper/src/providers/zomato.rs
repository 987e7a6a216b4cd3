//! Zomato restaurant pages.
//!
//! Offers render server-side as `.offer-card` blocks; when the markup moves
//! we fall back to scanning the visible page text.

use std::sync::LazyLock;

use dinedeal_core::{ParseResult, ProviderKey};
use scraper::{Html, Selector};

use super::text_scan::{element_text, fallback_offer_texts};
use super::{build_result, NO_OFFER_TEXT};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

static OFFER_CARD: LazyLock<Selector> = LazyLock::new(|| selector(".offer-card"));

/// Title, subtitle and description inside a card, in join order.
static CARD_PARTS: LazyLock<[Selector; 3]> = LazyLock::new(|| {
    [
        selector(".offer-title"),
        selector(".offer-sub-title"),
        selector(".offer-sub-desc"),
    ]
});

pub(super) fn parse(html: &str, source_url: &str, text_limit: usize) -> ParseResult {
    let texts = {
        let document = Html::parse_document(html);
        let cards = offer_card_texts(&document);
        if cards.is_empty() {
            fallback_offer_texts(&document, text_limit)
        } else {
            cards
        }
    };
    build_result(ProviderKey::Zomato, source_url, texts, NO_OFFER_TEXT)
}

fn offer_card_texts(document: &Html) -> Vec<String> {
    document
        .select(&OFFER_CARD)
        .filter_map(|card| {
            let parts: Vec<String> = CARD_PARTS
                .iter()
                .filter_map(|part| card.select(part).next())
                .map(element_text)
                .filter(|text| !text.is_empty())
                .collect();
            (!parts.is_empty()).then(|| parts.join(" "))
        })
        .collect()
}
