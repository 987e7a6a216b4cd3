//! Turns a parse result into a store update without rewriting unchanged
//! offers.

use dinedeal_core::{hash_offers, ParseResult, ProviderRecord, ProviderRecordUpdate, ScrapeStatus};

/// Stamped on every record this build writes.
pub(crate) const PARSER_VERSION: &str = "0.1.0";

/// Builds the update for one attempt.
///
/// A successful parse always refreshes the hash and clears the error; the
/// offer list (and raw texts, when present) is only included when the hash
/// differs from `prior`. Any other outcome records its error and leaves the
/// stored offers and hash alone.
pub(crate) fn reconcile(prior: Option<&ProviderRecord>, result: &ParseResult) -> ProviderRecordUpdate {
    let mut update = ProviderRecordUpdate {
        source_url: result.source_url.clone(),
        fetched_at: result.fetched_at,
        status: result.status,
        stale: result.status.is_stale(),
        parser_version: PARSER_VERSION.to_owned(),
        hash: None,
        error_message: None,
        offers: None,
        raw_offer_texts: None,
    };
    let raw_texts = (!result.raw_offer_texts.is_empty()).then(|| result.raw_offer_texts.clone());

    if result.status == ScrapeStatus::Ok && !result.offers.is_empty() {
        let hash = hash_offers(&result.offers);
        let changed = prior.and_then(|record| record.hash.as_deref()) != Some(hash.as_str());
        if changed {
            update.offers = Some(result.offers.clone());
            update.raw_offer_texts = raw_texts;
        }
        update.hash = Some(hash);
    } else {
        update.error_message.clone_from(&result.error_message);
        update.raw_offer_texts = raw_texts;
    }

    update
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use dinedeal_core::ProviderKey;
    use dinedeal_scraper::normalize_offer_text;

    use super::*;

    const URL: &str = "https://www.zomato.com/hyderabad/cafe";

    fn ok_result(texts: &[&str]) -> ParseResult {
        ParseResult {
            provider_key: ProviderKey::Zomato,
            source_url: URL.to_owned(),
            status: ScrapeStatus::Ok,
            fetched_at: Utc::now(),
            offers: texts
                .iter()
                .map(|t| normalize_offer_text(t, ProviderKey::Zomato, URL))
                .collect(),
            raw_offer_texts: texts.iter().map(|t| (*t).to_owned()).collect(),
            error_message: None,
            http_status: None,
        }
    }

    #[test]
    fn first_success_writes_offers_and_hash() {
        let result = ok_result(&["Flat 20% off on total bill"]);
        let update = reconcile(None, &result);
        assert_eq!(update.status, ScrapeStatus::Ok);
        assert!(!update.stale);
        assert_eq!(update.parser_version, "0.1.0");
        assert_eq!(update.hash, Some(hash_offers(&result.offers)));
        assert_eq!(update.offers.as_ref().map(Vec::len), Some(1));
        assert_eq!(
            update.raw_offer_texts,
            Some(vec!["Flat 20% off on total bill".to_owned()])
        );
        assert!(update.error_message.is_none());
    }

    #[test]
    fn unchanged_hash_only_refreshes_metadata() {
        let result = ok_result(&["Flat 20% off on total bill", "Up to ₹500 cashback via HDFC cards"]);
        let stored = reconcile(None, &result).apply_to(None);

        let reordered = ok_result(&["Up to ₹500 cashback via HDFC cards", "Flat 20% off on total bill"]);
        let update = reconcile(Some(&stored), &reordered);
        assert!(!update.writes_offers());
        assert!(update.raw_offer_texts.is_none());
        assert_eq!(update.hash, stored.hash);

        let merged = update.apply_to(Some(stored.clone()));
        assert_eq!(merged.offers, stored.offers);
    }

    #[test]
    fn changed_offers_are_rewritten() {
        let stored = reconcile(None, &ok_result(&["Flat 20% off"])).apply_to(None);
        let update = reconcile(Some(&stored), &ok_result(&["Flat 25% off"]));
        assert!(update.writes_offers());
        assert_ne!(update.hash, stored.hash);
    }

    #[test]
    fn failure_keeps_offers_and_records_error() {
        let stored = reconcile(None, &ok_result(&["Flat 20% off"])).apply_to(None);
        let failed = ParseResult::failure(ProviderKey::Zomato, URL, ScrapeStatus::Blocked, "HTTP 429")
            .with_http_status(429);

        let update = reconcile(Some(&stored), &failed);
        assert!(update.stale);
        assert!(update.hash.is_none());
        assert!(!update.writes_offers());
        assert!(update.raw_offer_texts.is_none());
        assert_eq!(update.error_message.as_deref(), Some("HTTP 429"));

        let merged = update.apply_to(Some(stored.clone()));
        assert_eq!(merged.offers, stored.offers);
        assert_eq!(merged.hash, stored.hash);
        assert_eq!(merged.status, ScrapeStatus::Blocked);
    }

    #[test]
    fn parse_error_keeps_raw_texts() {
        let mut result = ParseResult::failure(
            ProviderKey::Zomato,
            URL,
            ScrapeStatus::ParseError,
            "No offer-like text found",
        );
        result.raw_offer_texts = vec!["Some text".to_owned()];
        let update = reconcile(None, &result);
        assert_eq!(update.raw_offer_texts, Some(vec!["Some text".to_owned()]));
        assert!(update.stale);
    }

    #[test]
    fn stale_tracks_status_for_every_outcome() {
        for status in ScrapeStatus::ALL {
            let result = ParseResult::failure(ProviderKey::Zomato, URL, status, "x");
            assert_eq!(reconcile(None, &result).stale, status != ScrapeStatus::Ok);
        }
    }
}
