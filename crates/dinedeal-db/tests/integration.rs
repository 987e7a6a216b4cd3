//! Offline unit tests for dinedeal-db pool configuration and row decoding.
//! These tests do not require a live database connection.

use chrono::{TimeZone, Utc};
use dinedeal_core::{AppConfig, ProviderKey, RunStatus, ScrapeStatus, StatusCounts};
use dinedeal_db::{DbError, PlaceRow, PoolConfig, ProviderRecordRow, ScrapeRunRow};
use serde_json::json;
use uuid::Uuid;

fn app_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://example".to_string(),
        log_level: "info".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        request_timeout_secs: 20,
        user_agent: "ua".to_string(),
        max_concurrent_tasks: 4,
        jitter_min_secs: 5,
        jitter_max_secs: 20,
        block_backoff_hours: 6,
        offer_text_limit: 25,
    }
}

fn record_row(status: &str) -> ProviderRecordRow {
    ProviderRecordRow {
        place_id: "hard-rock-cafe".to_string(),
        provider_key: "zomato".to_string(),
        source_url: "https://www.zomato.com/hyderabad/hard-rock-cafe-banjara-hills".to_string(),
        fetched_at: Some(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()),
        status: status.to_string(),
        stale: status != "ok",
        parser_version: "0.1.0".to_string(),
        hash: Some("abc".to_string()),
        offers: json!([{
            "title": "Flat 20% off",
            "mode": "unknown",
            "type": "percentage",
            "value": 20.0,
            "currency": "INR",
            "minSpend": null,
            "maxDiscount": null,
            "couponCode": null,
            "paymentInstrument": null,
            "validityText": null,
            "terms": null,
            "source": {"providerKey": "zomato", "sourceUrl": "https://www.zomato.com/x"}
        }]),
        raw_offer_texts: json!(["Flat 20% off"]),
        error_message: None,
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn place_row_decodes_platforms_and_legacy_fields() {
    let row = PlaceRow {
        id: "hard-rock-cafe".to_string(),
        name: "Hard Rock Cafe".to_string(),
        area: Some("Banjara Hills".to_string()),
        platforms: json!({"zomato": {"url": "https://www.zomato.com/x", "forceRefresh": true}}),
        legacy_fields: json!({"platforms.eazydiner.url": "https://www.eazydiner.com/y", "rating": 4.5}),
    };
    let place = row.into_place().unwrap();
    assert!(place.platforms["zomato"].force_refresh);
    assert_eq!(
        place.legacy_fields.get("platforms.eazydiner.url").map(String::as_str),
        Some("https://www.eazydiner.com/y")
    );
    assert!(!place.legacy_fields.contains_key("rating"));
}

#[test]
fn place_row_with_bad_platforms_is_a_json_error() {
    let row = PlaceRow {
        id: "p".to_string(),
        name: String::new(),
        area: None,
        platforms: json!(["not", "a", "map"]),
        legacy_fields: json!({}),
    };
    assert!(matches!(row.into_place(), Err(DbError::Json(_))));
}

#[test]
fn provider_record_row_decodes_offers() {
    let record = record_row("ok").into_record().unwrap();
    assert_eq!(record.status, ScrapeStatus::Ok);
    assert!(!record.stale);
    assert_eq!(record.offers.len(), 1);
    assert_eq!(record.offers[0].source.provider_key, ProviderKey::Zomato);
    assert_eq!(record.raw_offer_texts, vec!["Flat 20% off".to_string()]);
}

#[test]
fn provider_record_row_rejects_unknown_status() {
    let err = record_row("pending").into_record().unwrap_err();
    assert!(matches!(err, DbError::InvalidValue { value, .. } if value == "pending"));
}

#[test]
fn scrape_run_row_decodes_counts() {
    let row = ScrapeRunRow {
        run_id: Uuid::new_v4(),
        status: "done".to_string(),
        started_at: Utc::now(),
        finished_at: Some(Utc::now()),
        counts: json!({"ok": 2, "blocked": 1, "error": 0, "parse_error": 0}),
        providers: json!({"zomato": {"ok": 2, "blocked": 1, "error": 0, "parse_error": 0}}),
    };
    let summary = row.into_summary().unwrap();
    assert_eq!(summary.status, RunStatus::Done);
    assert_eq!(summary.counts.total(), 3);
    assert_eq!(
        summary.providers.get(&ProviderKey::Zomato),
        Some(&StatusCounts {
            ok: 2,
            blocked: 1,
            error: 0,
            parse_error: 0,
        })
    );
}
