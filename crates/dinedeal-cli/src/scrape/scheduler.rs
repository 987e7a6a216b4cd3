//! Decides which (place, provider) pairs are due in a run.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use dinedeal_core::{
    Place, PlatformEntry, ProviderConfig, ProviderKey, ProviderRecord, DEFAULT_PROVIDERS,
};
use dinedeal_scraper::host_of;
use regex::Regex;

/// One unit of work: fetch `url` for `provider` and reconcile against `prior`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScrapeTask {
    pub place_id: String,
    pub provider: ProviderKey,
    pub url: String,
    pub prior: Option<ProviderRecord>,
}

static SWIGGY_REST_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)rest(\d{4,})").expect("valid regex"));

static SWIGGY_REST_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-/](\d{4,})(?:/|$)").expect("valid regex"));

/// Whether a provider needs scraping this run.
///
/// Forced (globally or per entry), never fetched, or last fetched more than
/// the provider's refresh interval before `now`.
pub(crate) fn is_due(
    entry: &PlatformEntry,
    prior: Option<&ProviderRecord>,
    config: &ProviderConfig,
    force: bool,
    now: DateTime<Utc>,
) -> bool {
    if force || entry.force_refresh {
        return true;
    }
    match prior.and_then(|record| record.fetched_at) {
        None => true,
        Some(fetched_at) => now - fetched_at > config.refresh_interval(),
    }
}

/// Rewrites a Swiggy listing URL to its Dineout page.
///
/// URLs already pointing at `/dineout` are kept. Otherwise the restaurant id
/// is taken from a `rest<digits>` token, or else from a `-<digits>` /
/// `/<digits>` segment, and the canonical URL is rebuilt. Returns `None`
/// when no id can be found.
pub(crate) fn normalize_swiggy_dineout_url(url: &str) -> Option<String> {
    if url.contains("/dineout") {
        return Some(url.to_owned());
    }
    let rest_id = SWIGGY_REST_TOKEN
        .captures(url)
        .or_else(|| SWIGGY_REST_SEGMENT.captures(url))
        .and_then(|cap| cap.get(1))?;
    Some(format!(
        "https://www.swiggy.com/restaurants/{}/dineout",
        rest_id.as_str()
    ))
}

/// Builds the due tasks for one place, in provider order.
///
/// `records` is keyed by provider key string, as returned by the store.
pub(crate) fn plan_place(
    place: &Place,
    records: &BTreeMap<String, ProviderRecord>,
    force: bool,
    now: DateTime<Utc>,
) -> Vec<ScrapeTask> {
    let platforms = place.resolved_platforms();
    let mut tasks = Vec::new();

    for config in &DEFAULT_PROVIDERS {
        let provider = config.key;
        let Some(entry) = platforms.get(provider.as_str()) else {
            continue;
        };
        let Some(url) = entry.usable_url() else {
            continue;
        };

        let url = if provider == ProviderKey::SwiggyDineout {
            let Some(normalized) = normalize_swiggy_dineout_url(url) else {
                tracing::warn!(
                    place_id = %place.id,
                    provider = %provider,
                    url,
                    "no restaurant id in swiggy URL, skipping"
                );
                continue;
            };
            normalized
        } else {
            url.to_owned()
        };

        let prior = records.get(provider.as_str());
        if !is_due(entry, prior, config, force, now) {
            tracing::debug!(place_id = %place.id, provider = %provider, "not due");
            continue;
        }

        if !host_of(&url).is_some_and(|host| config.matches_host(&host)) {
            tracing::warn!(
                place_id = %place.id,
                provider = %provider,
                url = %url,
                expected = ?config.expected_domains,
                "URL host does not match provider domain"
            );
        }

        tasks.push(ScrapeTask {
            place_id: place.id.clone(),
            provider,
            url,
            prior: prior.cloned(),
        });
    }

    tasks
}
