//! Per-platform page parsers.
//!
//! Each platform gets one variant of [`ProviderParser`]; the registry maps a
//! [`ProviderKey`] to its parser. Platform markup and JSON paths stay inside
//! the matching submodule.

mod eazydiner;
mod swiggy_dineout;
mod text_scan;
mod zomato;

use chrono::Utc;
use dinedeal_core::{Offer, ParseResult, ProviderKey, ScrapeStatus};

use crate::client::PageClient;
use crate::normalize::normalize_offer_text;

/// Empty-result message shared by the HTML-scanning parsers.
pub(crate) const NO_OFFER_TEXT: &str = "No offer-like text found";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderParser {
    Zomato,
    SwiggyDineout,
    Eazydiner,
}

static REGISTRY: [(ProviderKey, ProviderParser); 3] = [
    (ProviderKey::Zomato, ProviderParser::Zomato),
    (ProviderKey::SwiggyDineout, ProviderParser::SwiggyDineout),
    (ProviderKey::Eazydiner, ProviderParser::Eazydiner),
];

/// The parser registered for `key`, or `None` when the platform has no
/// implementation yet.
#[must_use]
pub fn parser_for(key: ProviderKey) -> Option<ProviderParser> {
    REGISTRY
        .iter()
        .find(|(registered, _)| *registered == key)
        .map(|(_, parser)| *parser)
}

impl ProviderParser {
    #[must_use]
    pub fn key(self) -> ProviderKey {
        match self {
            ProviderParser::Zomato => ProviderKey::Zomato,
            ProviderParser::SwiggyDineout => ProviderKey::SwiggyDineout,
            ProviderParser::Eazydiner => ProviderKey::Eazydiner,
        }
    }

    /// Extracts offers from a fetched page body.
    ///
    /// Never fails: every outcome, including a failed secondary fetch, is a
    /// [`ParseResult`] with the matching status. `text_limit` caps how many
    /// lines the page-text fallback keeps.
    pub async fn parse(
        self,
        client: &PageClient,
        html: &str,
        source_url: &str,
        text_limit: usize,
    ) -> ParseResult {
        match self {
            ProviderParser::Zomato => zomato::parse(html, source_url, text_limit),
            ProviderParser::SwiggyDineout => swiggy_dineout::parse(html, source_url, text_limit),
            ProviderParser::Eazydiner => eazydiner::parse(client, html, source_url).await,
        }
    }
}

/// Normalizes `texts` and wraps them in a result: `ok` when at least one
/// offer came out, otherwise `parse_error` with `empty_message`.
pub(crate) fn build_result(
    provider_key: ProviderKey,
    source_url: &str,
    texts: Vec<String>,
    empty_message: &str,
) -> ParseResult {
    let offers: Vec<Offer> = texts
        .iter()
        .map(|text| normalize_offer_text(text, provider_key, source_url))
        .collect();
    let (status, error_message) = if offers.is_empty() {
        (ScrapeStatus::ParseError, Some(empty_message.to_owned()))
    } else {
        (ScrapeStatus::Ok, None)
    };
    ParseResult {
        provider_key,
        source_url: source_url.to_owned(),
        status,
        fetched_at: Utc::now(),
        offers,
        raw_offer_texts: texts,
        error_message,
        http_status: None,
    }
}
