//! Normalized promotional offers and their content hash.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::ProviderKey;

/// The single currency all extracted amounts are denominated in.
pub const OFFER_CURRENCY: &str = "INR";

/// How the offer is redeemed at the venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferMode {
    Prebook,
    Walkin,
    Billpay,
    Bank,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferType {
    Percentage,
    Cashback,
    Flat,
    Coupon,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferSource {
    pub provider_key: ProviderKey,
    pub source_url: String,
}

/// A single offer extracted from a provider page.
///
/// Every `Option` field means "not extracted", not "absent on the page".
/// `min_spend`, `validity_text` and `terms` are never populated by the text
/// normalizer but are kept so the stored shape is stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub title: String,
    pub mode: OfferMode,
    #[serde(rename = "type")]
    pub offer_type: OfferType,
    pub value: Option<f64>,
    pub currency: Option<String>,
    pub min_spend: Option<f64>,
    pub max_discount: Option<f64>,
    pub coupon_code: Option<String>,
    pub payment_instrument: Option<String>,
    pub validity_text: Option<String>,
    pub terms: Option<String>,
    pub source: OfferSource,
}

/// Computes the content hash of an offer set.
///
/// Each offer is serialized as JSON with object keys sorted, the serialized
/// offers are sorted, and the SHA-256 of the newline-joined result is
/// returned as lowercase hex. Two sets with the same offers in any order hash
/// identically.
#[must_use]
pub fn hash_offers(offers: &[Offer]) -> String {
    let mut canonical: Vec<String> = offers
        .iter()
        .map(|offer| {
            let value = serde_json::to_value(offer).unwrap_or(Value::Null);
            let mut out = String::new();
            write_canonical(&value, &mut out);
            out
        })
        .collect();
    canonical.sort_unstable();

    let mut hasher = Sha256::new();
    for (idx, entry) in canonical.iter().enumerate() {
        if idx > 0 {
            hasher.update(b"\n");
        }
        hasher.update(entry.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Writes `value` as compact JSON with object keys in sorted order,
/// independent of how `serde_json::Map` happens to be backed.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (idx, (key, item)) in entries.into_iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
