//! Swiggy Dineout restaurant pages.
//!
//! The page is a Next.js app; offers ship inside the `__NEXT_DATA__` script
//! as widget cards. Markup text is only a fallback.

use std::collections::HashSet;
use std::sync::LazyLock;

use dinedeal_core::{ParseResult, ProviderKey};
use scraper::{Html, Selector};
use serde_json::Value;

use super::text_scan::fallback_offer_texts;
use super::{build_result, NO_OFFER_TEXT};

static NEXT_DATA: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script#__NEXT_DATA__").expect("valid selector"));

pub(super) fn parse(html: &str, source_url: &str, text_limit: usize) -> ParseResult {
    let texts = {
        let document = Html::parse_document(html);
        let structured = next_data_json(&document)
            .map(|data| offer_texts_from_next_data(&data))
            .unwrap_or_default();
        if structured.is_empty() {
            fallback_offer_texts(&document, text_limit)
        } else {
            structured
        }
    };
    build_result(ProviderKey::SwiggyDineout, source_url, texts, NO_OFFER_TEXT)
}

fn next_data_json(document: &Html) -> Option<Value> {
    let script = document.select(&NEXT_DATA).next()?;
    let body: String = script.text().collect();
    match serde_json::from_str(&body) {
        Ok(data) => Some(data),
        Err(e) => {
            tracing::debug!(error = %e, "malformed __NEXT_DATA__ payload, using page text");
            None
        }
    }
}

/// Offer strings from the widget cards, deduplicated in first-seen order.
fn offer_texts_from_next_data(data: &Value) -> Vec<String> {
    let Some(cards) = data
        .pointer("/props/pageProps/widgetResponse/success/cards")
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    cards
        .iter()
        .filter_map(|card| card.pointer("/card/card/offers"))
        .flat_map(offer_items)
        .filter_map(combine_offer_item)
        .filter(|text| seen.insert(text.clone()))
        .collect()
}

/// The `offers` block is either `{dealOffer, dealOffers: [..]}` or a plain
/// array of items.
fn offer_items(block: &Value) -> Vec<&Value> {
    match block {
        Value::Object(map) => map
            .get("dealOffer")
            .filter(|deal| is_truthy(deal))
            .into_iter()
            .chain(
                map.get("dealOffers")
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten(),
            )
            .collect(),
        Value::Array(items) => items.iter().collect(),
        _ => Vec::new(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

fn combine_offer_item(item: &Value) -> Option<String> {
    let item = item.as_object()?;
    let details = item.get("offerDetails").and_then(Value::as_object);
    let parts: Vec<&str> = ["title", "subtitle"]
        .iter()
        .filter_map(|key| item.get(*key))
        .chain(
            details
                .into_iter()
                .flat_map(|d| ["title", "subtitle"].into_iter().filter_map(move |key| d.get(key))),
        )
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join(" "))
}

#[cfg(test)]
mod tests {
    use dinedeal_core::ScrapeStatus;
    use serde_json::json;

    use super::*;

    const URL: &str = "https://www.swiggy.com/restaurants/467233/dineout";

    fn page_with_next_data(data: &Value) -> String {
        format!(
            r#"<html><body><div>Book a table</div>
            <script id="__NEXT_DATA__" type="application/json">{data}</script></body></html>"#
        )
    }

    fn cards(offers: Value) -> Value {
        json!({
            "props": {"pageProps": {"widgetResponse": {"success": {"cards": [
                {"card": {"card": {"title": "Photos"}}},
                {"card": {"card": {"offers": offers}}}
            ]}}}}
        })
    }

    #[test]
    fn reads_deal_offer_object() {
        let data = cards(json!({
            "dealOffer": {"title": "Flat 25% off", "subtitle": "on pre-booking"},
            "dealOffers": [
                {"title": "Extra 10% off", "offerDetails": {"title": "HDFC bank cards", "subtitle": " "}},
                {"title": "Flat 25% off", "subtitle": "on pre-booking"},
                "not an object"
            ]
        }));
        let result = parse(&page_with_next_data(&data), URL, 25);
        assert_eq!(result.status, ScrapeStatus::Ok);
        assert_eq!(
            result.raw_offer_texts,
            vec![
                "Flat 25% off on pre-booking".to_owned(),
                "Extra 10% off HDFC bank cards".to_owned(),
            ]
        );
        assert_eq!(result.offers[1].payment_instrument.as_deref(), Some("HDFC"));
    }

    #[test]
    fn reads_offer_array() {
        let data = cards(json!([
            {"title": "Walk-in offer", "subtitle": "Get 15% off"},
            {"offerDetails": {"subtitle": "Cashback ₹200 on UPI"}}
        ]));
        let result = parse(&page_with_next_data(&data), URL, 25);
        assert_eq!(
            result.raw_offer_texts,
            vec![
                "Walk-in offer Get 15% off".to_owned(),
                "Cashback ₹200 on UPI".to_owned(),
            ]
        );
    }

    #[test]
    fn malformed_next_data_falls_back_to_text() {
        let html = r#"<html><body><p>Flat 20% off on total bill</p>
            <script id="__NEXT_DATA__">{not json</script></body></html>"#;
        let result = parse(html, URL, 25);
        assert_eq!(result.status, ScrapeStatus::Ok);
        assert_eq!(
            result.raw_offer_texts,
            vec!["Flat 20% off on total bill".to_owned()]
        );
    }

    #[test]
    fn empty_page_is_a_parse_error() {
        let result = parse("<html><body><p>Reviews</p></body></html>", URL, 25);
        assert_eq!(result.status, ScrapeStatus::ParseError);
        assert_eq!(result.error_message.as_deref(), Some("No offer-like text found"));
    }
}
