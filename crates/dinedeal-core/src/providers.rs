//! Supported dining platforms and their static scrape settings.

use std::fmt;
use std::str::FromStr;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Identifier of a supported platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKey {
    Zomato,
    SwiggyDineout,
    Eazydiner,
    Dineout,
}

impl ProviderKey {
    pub const ALL: [ProviderKey; 4] = [
        ProviderKey::Zomato,
        ProviderKey::SwiggyDineout,
        ProviderKey::Eazydiner,
        ProviderKey::Dineout,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKey::Zomato => "zomato",
            ProviderKey::SwiggyDineout => "swiggy_dineout",
            ProviderKey::Eazydiner => "eazydiner",
            ProviderKey::Dineout => "dineout",
        }
    }

    /// Static settings for this provider.
    #[must_use]
    pub fn config(self) -> &'static ProviderConfig {
        let idx = match self {
            ProviderKey::Zomato => 0,
            ProviderKey::SwiggyDineout => 1,
            ProviderKey::Eazydiner => 2,
            ProviderKey::Dineout => 3,
        };
        &DEFAULT_PROVIDERS[idx]
    }
}

impl fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s.trim())
            .ok_or_else(|| CoreError::UnknownProvider(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub key: ProviderKey,
    /// Host suffixes a well-formed URL for this provider ends with.
    pub expected_domains: &'static [&'static str],
    pub refresh_hours: i64,
}

impl ProviderConfig {
    #[must_use]
    pub fn refresh_interval(&self) -> TimeDelta {
        TimeDelta::hours(self.refresh_hours)
    }

    /// Returns `true` when `host` is, or is a subdomain of, one of the
    /// expected domains. A trailing `:port` is ignored.
    #[must_use]
    pub fn matches_host(&self, host: &str) -> bool {
        let host = host.split(':').next().unwrap_or(host).to_ascii_lowercase();
        self.expected_domains
            .iter()
            .any(|d| host == *d || host.ends_with(&format!(".{d}")))
    }
}

/// One entry per supported platform, in scheduling order. Indexed by
/// [`ProviderKey::config`]; keep the two in the same order.
pub static DEFAULT_PROVIDERS: [ProviderConfig; 4] = [
    ProviderConfig {
        key: ProviderKey::Zomato,
        expected_domains: &["zomato.com"],
        refresh_hours: 24,
    },
    ProviderConfig {
        key: ProviderKey::SwiggyDineout,
        expected_domains: &["swiggy.com"],
        refresh_hours: 24,
    },
    ProviderConfig {
        key: ProviderKey::Eazydiner,
        expected_domains: &["eazydiner.com"],
        refresh_hours: 24,
    },
    ProviderConfig {
        key: ProviderKey::Dineout,
        expected_domains: &["dineout.co.in", "dineout.com"],
        refresh_hours: 24,
    },
];
