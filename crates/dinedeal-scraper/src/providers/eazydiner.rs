//! `EazyDiner` restaurant pages.
//!
//! The HTML shell carries no offers. They live in the Next.js data document
//! at `/_next/data/<build id>/<page path>.json`, so this parser issues a
//! second request once it has found the build id in the shell.

use std::collections::HashSet;
use std::sync::LazyLock;

use dinedeal_core::{ParseResult, ProviderKey, ScrapeStatus};
use regex::Regex;
use reqwest::Url;
use serde_json::Value;

use super::build_result;
use crate::client::PageClient;
use crate::error::ScraperError;

const KEY: ProviderKey = ProviderKey::Eazydiner;

static BUILD_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/_next/static/([^/]+)/_buildManifest\.js").expect("valid regex")
});

pub(super) async fn parse(client: &PageClient, html: &str, source_url: &str) -> ParseResult {
    let Some(build_id) = extract_build_id(html) else {
        return ParseResult::failure(KEY, source_url, ScrapeStatus::ParseError, "Build ID not found");
    };
    let Some(data_url) = build_data_url(source_url, &build_id) else {
        return ParseResult::failure(
            KEY,
            source_url,
            ScrapeStatus::ParseError,
            "Data URL not resolved",
        );
    };

    tracing::debug!(%data_url, "fetching eazydiner data document");
    let data = match client.fetch_json(&data_url).await {
        Ok(data) => data,
        Err(ScraperError::Deserialize { .. }) => {
            return ParseResult::failure(
                KEY,
                source_url,
                ScrapeStatus::ParseError,
                "Invalid JSON response",
            );
        }
        Err(e) => match e.http_status() {
            Some(status) if status >= 400 => {
                return ParseResult::failure(
                    KEY,
                    source_url,
                    ScrapeStatus::Error,
                    format!("HTTP {status}"),
                )
                .with_http_status(status);
            }
            _ => {
                return ParseResult::failure(KEY, source_url, ScrapeStatus::Error, e.to_string());
            }
        },
    };

    build_result(KEY, source_url, offer_texts_from_data(&data), "No offers found in data")
}

fn extract_build_id(html: &str) -> Option<String> {
    BUILD_ID
        .captures(html)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_owned())
}

/// `<scheme>://<host>/_next/data/<build id>/<path>.json`, or `None` when the
/// page URL has no host or an empty path.
fn build_data_url(source_url: &str, build_id: &str) -> Option<String> {
    let parsed = Url::parse(source_url.trim()).ok()?;
    let host = parsed.host_str().filter(|h| !h.is_empty())?;
    let authority = match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    };
    let path = parsed.path().trim_start_matches('/');
    if path.is_empty() {
        return None;
    }
    Some(format!(
        "{}://{authority}/_next/data/{build_id}/{path}.json",
        parsed.scheme()
    ))
}

/// Offer strings from the pay-at-venue banner and the FAQ answers that talk
/// about deals or offers, deduplicated in first-seen order.
fn offer_texts_from_data(data: &Value) -> Vec<String> {
    let detail_page = data.pointer("/pageProps/detailPage");

    let eazypay = detail_page
        .and_then(|page| page.pointer("/data/eazypay_details"))
        .and_then(Value::as_object)
        .and_then(|details| {
            ["text", "summary_text"]
                .iter()
                .filter_map(|key| details.get(*key).and_then(Value::as_str))
                .find(|text| !text.is_empty())
        });

    let graph = detail_page
        .and_then(|page| page.pointer("/meta/jsonSchema/json_schema/@graph"))
        .and_then(Value::as_array);
    let faq_answers = graph
        .into_iter()
        .flatten()
        .filter(|node| node.get("@type").and_then(Value::as_str) == Some("FAQPage"))
        .filter_map(|node| node.get("mainEntity").and_then(Value::as_array))
        .flatten()
        .filter(|question| {
            question
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_lowercase)
                .is_some_and(|name| name.contains("deal") || name.contains("offer"))
        })
        .filter_map(|question| question.pointer("/acceptedAnswer/text").and_then(Value::as_str));

    let mut seen = HashSet::new();
    eazypay
        .into_iter()
        .chain(faq_answers)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_owned)
        .filter(|text| seen.insert(text.clone()))
        .collect()
}
