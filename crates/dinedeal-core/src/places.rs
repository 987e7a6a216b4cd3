use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A platform listing for one place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformEntry {
    #[serde(default)]
    pub url: Option<String>,
    /// Scrape on the next run regardless of staleness.
    #[serde(default)]
    pub force_refresh: bool,
}

impl PlatformEntry {
    /// The trimmed URL, or `None` when missing or blank.
    #[must_use]
    pub fn usable_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// A venue tracked across dining platforms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub area: Option<String>,
    /// Keyed by provider key string; unknown providers are kept but ignored
    /// by scheduling.
    #[serde(default)]
    pub platforms: BTreeMap<String, PlatformEntry>,
    /// Flat fields such as `platforms.zomato.url` left behind by older
    /// imports, keyed by the full dotted field name.
    #[serde(default)]
    pub legacy_fields: BTreeMap<String, String>,
}

impl Place {
    /// Platform entries with legacy `platforms.<provider>.url` fields folded
    /// in. A structured entry always wins over a legacy field for the same
    /// provider; blank legacy values are ignored.
    #[must_use]
    pub fn resolved_platforms(&self) -> BTreeMap<String, PlatformEntry> {
        let mut platforms = self.platforms.clone();
        for (field, value) in &self.legacy_fields {
            let Some(provider) = field
                .strip_prefix("platforms.")
                .and_then(|rest| rest.strip_suffix(".url"))
            else {
                continue;
            };
            if provider.is_empty() || platforms.contains_key(provider) {
                continue;
            }
            let url = value.trim();
            if url.is_empty() {
                continue;
            }
            platforms.insert(
                provider.to_owned(),
                PlatformEntry {
                    url: Some(url.to_owned()),
                    force_refresh: false,
                },
            );
        }
        platforms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(url: &str) -> PlatformEntry {
        PlatformEntry {
            url: Some(url.to_owned()),
            force_refresh: false,
        }
    }

    #[test]
    fn usable_url_trims_and_rejects_blank() {
        assert_eq!(entry("  https://a.example/x ").usable_url(), Some("https://a.example/x"));
        assert_eq!(entry("   ").usable_url(), None);
        assert_eq!(PlatformEntry::default().usable_url(), None);
    }

    #[test]
    fn resolved_platforms_folds_in_legacy_fields() {
        let mut place = Place {
            id: "p1".to_owned(),
            ..Place::default()
        };
        place.legacy_fields.insert(
            "platforms.zomato.url".to_owned(),
            " https://www.zomato.com/hyderabad/cafe ".to_owned(),
        );
        let resolved = place.resolved_platforms();
        assert_eq!(
            resolved["zomato"].url.as_deref(),
            Some("https://www.zomato.com/hyderabad/cafe")
        );
    }

    #[test]
    fn structured_entry_wins_over_legacy_field() {
        let mut place = Place {
            id: "p1".to_owned(),
            ..Place::default()
        };
        place
            .platforms
            .insert("zomato".to_owned(), entry("https://www.zomato.com/new"));
        place.legacy_fields.insert(
            "platforms.zomato.url".to_owned(),
            "https://www.zomato.com/old".to_owned(),
        );
        assert_eq!(
            place.resolved_platforms()["zomato"].url.as_deref(),
            Some("https://www.zomato.com/new")
        );
    }

    #[test]
    fn unrelated_and_blank_legacy_fields_are_ignored() {
        let mut place = Place {
            id: "p1".to_owned(),
            ..Place::default()
        };
        place
            .legacy_fields
            .insert("platforms.eazydiner.url".to_owned(), "  ".to_owned());
        place
            .legacy_fields
            .insert("website".to_owned(), "https://cafe.example".to_owned());
        place
            .legacy_fields
            .insert("platforms.zomato.slug".to_owned(), "cafe".to_owned());
        assert!(place.resolved_platforms().is_empty());
    }

    #[test]
    fn platform_entry_reads_force_refresh_camel_case() {
        let entry: PlatformEntry =
            serde_json::from_str(r#"{"url": "https://x.example", "forceRefresh": true}"#).unwrap();
        assert!(entry.force_refresh);
    }
}
