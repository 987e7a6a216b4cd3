//! Per-attempt parse results and the persisted per-provider record.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{CoreError, Offer, ProviderKey};

/// Terminal status of one scrape attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeStatus {
    Ok,
    /// Host in backoff, or the response signalled rate limiting.
    Blocked,
    /// Transport failure, timeout, or an HTTP error status.
    Error,
    /// Page fetched but nothing usable extracted, or no parser exists.
    ParseError,
}

impl ScrapeStatus {
    pub const ALL: [ScrapeStatus; 4] = [
        ScrapeStatus::Ok,
        ScrapeStatus::Blocked,
        ScrapeStatus::Error,
        ScrapeStatus::ParseError,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ScrapeStatus::Ok => "ok",
            ScrapeStatus::Blocked => "blocked",
            ScrapeStatus::Error => "error",
            ScrapeStatus::ParseError => "parse_error",
        }
    }

    #[must_use]
    pub fn is_stale(self) -> bool {
        self != ScrapeStatus::Ok
    }
}

impl fmt::Display for ScrapeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScrapeStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScrapeStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::UnknownStatus(s.to_string()))
    }
}

/// Output of the fetch + parse phase for one task attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    pub provider_key: ProviderKey,
    pub source_url: String,
    pub status: ScrapeStatus,
    pub fetched_at: DateTime<Utc>,
    pub offers: Vec<Offer>,
    pub raw_offer_texts: Vec<String>,
    pub error_message: Option<String>,
    pub http_status: Option<u16>,
}

impl ParseResult {
    /// A result that carried no page content: the attempt failed before or
    /// during the fetch.
    #[must_use]
    pub fn failure(
        provider_key: ProviderKey,
        source_url: &str,
        status: ScrapeStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            provider_key,
            source_url: source_url.to_owned(),
            status,
            fetched_at: Utc::now(),
            offers: Vec::new(),
            raw_offer_texts: Vec::new(),
            error_message: Some(message.into()),
            http_status: None,
        }
    }

    #[must_use]
    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }
}

/// The stored state of one provider for one place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRecord {
    pub source_url: String,
    #[serde(default, deserialize_with = "deserialize_lenient_utc")]
    pub fetched_at: Option<DateTime<Utc>>,
    pub status: ScrapeStatus,
    pub stale: bool,
    #[serde(default)]
    pub parser_version: String,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub offers: Vec<Offer>,
    #[serde(default)]
    pub raw_offer_texts: Vec<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// A merge-style write against a [`ProviderRecord`].
///
/// Status and freshness fields are always written. `hash`, `offers` and
/// `raw_offer_texts` are written only when `Some`; `None` leaves the stored
/// value untouched. `error_message` is always written, so `None` clears it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRecordUpdate {
    pub source_url: String,
    pub fetched_at: DateTime<Utc>,
    pub status: ScrapeStatus,
    pub stale: bool,
    pub parser_version: String,
    pub hash: Option<String>,
    pub error_message: Option<String>,
    pub offers: Option<Vec<Offer>>,
    pub raw_offer_texts: Option<Vec<String>>,
}

impl ProviderRecordUpdate {
    /// Returns `true` when this update replaces the stored offer list.
    #[must_use]
    pub fn writes_offers(&self) -> bool {
        self.offers.is_some()
    }

    /// Merges this update into `prior`, producing the record as it would be
    /// stored afterwards.
    #[must_use]
    pub fn apply_to(&self, prior: Option<ProviderRecord>) -> ProviderRecord {
        let (prior_hash, prior_offers, prior_raw) = match prior {
            Some(record) => (record.hash, record.offers, record.raw_offer_texts),
            None => (None, Vec::new(), Vec::new()),
        };
        ProviderRecord {
            source_url: self.source_url.clone(),
            fetched_at: Some(self.fetched_at),
            status: self.status,
            stale: self.stale,
            parser_version: self.parser_version.clone(),
            hash: self.hash.clone().or(prior_hash),
            offers: self.offers.clone().unwrap_or(prior_offers),
            raw_offer_texts: self.raw_offer_texts.clone().unwrap_or(prior_raw),
            error_message: self.error_message.clone(),
        }
    }
}

/// Parses a stored timestamp as UTC.
///
/// Accepts RFC 3339 (any offset, converted to UTC) and zone-less
/// `YYYY-MM-DD[T ]HH:MM:SS[.fff]`, which is taken to already be UTC.
#[must_use]
pub fn parse_timestamp_utc(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(aware) = DateTime::parse_from_rfc3339(raw) {
        return Some(aware.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_lenient_utc<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_timestamp_utc(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {s}"))),
    }
}
