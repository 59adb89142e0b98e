//! Record ingestion and defensive numeric coercion
//!
//! Upstream ad exports are loosely typed: counters arrive as JSON numbers,
//! numeric strings (sometimes with leading zeros), empty strings, or are
//! missing entirely. [`RawRecord`] mirrors that shape one-to-one;
//! [`PerformanceRecord`] is the cleaned form the rest of the engine
//! operates on. All coercion happens here so the messy boundary stays in
//! one place.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ad record as it arrives from the ads-platform export.
///
/// Every field is optional and counters are untyped [`Value`]s. Do not use
/// this inside the engine; convert with [`PerformanceRecord::from_raw`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub ad_id: Option<String>,

    #[serde(default)]
    pub creative_id: Option<String>,

    #[serde(default)]
    pub adset_name: Option<String>,

    #[serde(default)]
    pub account_id: Option<String>,

    /// Free-text ad name, e.g. `"ProductX | Video | 1234567890123"`.
    #[serde(default, alias = "ad_name")]
    pub display_name: Option<String>,

    /// Structured creative metadata blob; nested fields may carry literal
    /// ad copy. Kept untyped since its shape varies per platform version.
    #[serde(default)]
    pub creative_spec: Option<Value>,

    #[serde(default)]
    pub thumbnail_url: Option<String>,

    /// Pre-computed campaign-level group key supplied by some upstream
    /// exports. Takes precedence over pattern discovery at level 1.
    #[serde(default)]
    pub campaign_group: Option<String>,

    #[serde(default)]
    pub impressions: Option<Value>,

    #[serde(default)]
    pub clicks: Option<Value>,

    #[serde(default)]
    pub spend: Option<Value>,

    #[serde(default)]
    pub purchases: Option<Value>,

    #[serde(default)]
    pub revenue: Option<Value>,
}

/// Cleaned, strongly-typed record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub ad_id: String,
    pub creative_id: Option<String>,
    pub adset_name: Option<String>,
    pub account_id: Option<String>,
    pub display_name: String,
    pub creative_spec: Option<Value>,
    pub thumbnail_url: Option<String>,
    pub campaign_group: Option<String>,
    pub impressions: u64,
    pub clicks: u64,
    pub spend: f64,
    pub purchases: u64,
    pub revenue: f64,
}

impl PerformanceRecord {
    /// Coerce a raw export record into the typed form.
    ///
    /// Never fails: unparseable counters become `0`, missing strings become
    /// empty/`None`. Upstream inconsistencies such as `clicks > impressions`
    /// are passed through untouched.
    pub fn from_raw(raw: RawRecord) -> Self {
        Self {
            ad_id: raw.ad_id.unwrap_or_default(),
            creative_id: raw.creative_id.filter(|s| !s.is_empty()),
            adset_name: raw.adset_name.filter(|s| !s.is_empty()),
            account_id: raw.account_id.filter(|s| !s.is_empty()),
            display_name: raw.display_name.unwrap_or_default(),
            creative_spec: raw.creative_spec,
            thumbnail_url: raw.thumbnail_url.filter(|s| !s.is_empty()),
            campaign_group: raw.campaign_group.filter(|s| !s.is_empty()),
            impressions: coerce_count(raw.impressions.as_ref()),
            clicks: coerce_count(raw.clicks.as_ref()),
            spend: coerce_amount(raw.spend.as_ref()),
            purchases: coerce_count(raw.purchases.as_ref()),
            revenue: coerce_amount(raw.revenue.as_ref()),
        }
    }
}

impl From<RawRecord> for PerformanceRecord {
    fn from(raw: RawRecord) -> Self {
        Self::from_raw(raw)
    }
}

/// Coerce an untyped counter to a non-negative integer.
pub fn coerce_count(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => {
            if let Some(u) = n.as_u64() {
                u
            } else {
                // Negative or fractional upstream value: clamp, don't crash.
                n.as_f64().map(|f| f.max(0.0) as u64).unwrap_or(0)
            }
        }
        Some(Value::String(s)) => clean_numeric_string(s)
            .parse::<u64>()
            .or_else(|_| clean_numeric_string(s).parse::<f64>().map(|f| f.max(0.0) as u64))
            .unwrap_or(0),
        _ => 0,
    }
}

/// Coerce an untyped currency amount to a non-negative float.
pub fn coerce_amount(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => clean_numeric_string(s).parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if parsed.is_finite() {
        parsed.max(0.0)
    } else {
        0.0
    }
}

/// Trim whitespace and strip leading zeros, keeping a lone `"0"` and the
/// fractional form `".5"` parseable.
fn clean_numeric_string(s: &str) -> &str {
    let trimmed = s.trim();
    let stripped = trimmed.trim_start_matches('0');
    if stripped.is_empty() && !trimmed.is_empty() {
        "0"
    } else {
        stripped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_count_variants() {
        assert_eq!(coerce_count(Some(&json!(42))), 42);
        assert_eq!(coerce_count(Some(&json!("42"))), 42);
        assert_eq!(coerce_count(Some(&json!("0042"))), 42);
        assert_eq!(coerce_count(Some(&json!(""))), 0);
        assert_eq!(coerce_count(Some(&json!("abc"))), 0);
        assert_eq!(coerce_count(Some(&json!(null))), 0);
        assert_eq!(coerce_count(Some(&json!(-3))), 0);
        assert_eq!(coerce_count(None), 0);
    }

    #[test]
    fn test_coerce_amount_variants() {
        assert_eq!(coerce_amount(Some(&json!(1.5))), 1.5);
        assert_eq!(coerce_amount(Some(&json!("1.5"))), 1.5);
        assert_eq!(coerce_amount(Some(&json!("0.5"))), 0.5);
        assert_eq!(coerce_amount(Some(&json!("007.25"))), 7.25);
        assert_eq!(coerce_amount(Some(&json!("-2.0"))), 0.0);
        assert_eq!(coerce_amount(Some(&json!({}))), 0.0);
        assert_eq!(coerce_amount(None), 0.0);
    }

    #[test]
    fn test_lone_zero_survives_stripping() {
        assert_eq!(coerce_count(Some(&json!("0"))), 0);
        assert_eq!(coerce_count(Some(&json!("000"))), 0);
        assert_eq!(coerce_amount(Some(&json!("0"))), 0.0);
    }

    #[test]
    fn test_from_raw_defaults() {
        let record = PerformanceRecord::from_raw(RawRecord::default());
        assert_eq!(record.display_name, "");
        assert_eq!(record.impressions, 0);
        assert_eq!(record.spend, 0.0);
        assert!(record.creative_id.is_none());
    }

    #[test]
    fn test_from_raw_json_round_trip() {
        let raw: RawRecord = serde_json::from_value(json!({
            "ad_id": "a1",
            "ad_name": "ProductX | Video | 1234567890123",
            "impressions": "01000",
            "clicks": 37,
            "spend": "12.50",
            "purchases": null,
            "revenue": 99.0
        }))
        .unwrap();

        let record = PerformanceRecord::from_raw(raw);
        assert_eq!(record.display_name, "ProductX | Video | 1234567890123");
        assert_eq!(record.impressions, 1000);
        assert_eq!(record.clicks, 37);
        assert_eq!(record.spend, 12.5);
        assert_eq!(record.purchases, 0);
        assert_eq!(record.revenue, 99.0);
    }
}
