//! Category validity records and probe tallies
//!
//! A "probe" asks the storefront whether a category slug still resolves to a
//! non-empty product listing. The outcome is a per-slug [`ValidityRecord`]
//! plus a running [`ProbeTally`] published after every processed slug.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

/// Outcome of a single category probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ValidityStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "KO")]
    Ko,
}

/// Per-slug result of a product-existence probe. Overwritten on re-probe,
/// never deleted individually (only bulk-cleared).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ValidityRecord {
    pub slug: String,
    pub status: ValidityStatus,
    pub error: Option<String>,
    pub probed_at: DateTime<Utc>,
}

impl ValidityRecord {
    pub fn ok(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            status: ValidityStatus::Ok,
            error: None,
            probed_at: Utc::now(),
        }
    }

    pub fn ko(slug: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            status: ValidityStatus::Ko,
            error: Some(error.into()),
            probed_at: Utc::now(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status == ValidityStatus::Ok
    }
}

/// Running probe counters. `processed` counts slugs actually visited so far,
/// so a caller observing the stream sees monotonic progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProbeTally {
    pub total: u32,
    pub valid: u32,
    pub invalid: u32,
    pub processed: u32,
}

impl ProbeTally {
    pub fn new(total: u32) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Progress percentage in `[0, 100]`; zero-total tallies report 100.
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            f64::from(self.processed) / f64::from(self.total) * 100.0
        }
    }

    pub fn record(&mut self, status: ValidityStatus) {
        self.processed += 1;
        match status {
            ValidityStatus::Ok => self.valid += 1,
            ValidityStatus::Ko => self.invalid += 1,
        }
    }
}

/// Classify a raw category-products response body.
///
/// A category is OK when the body carries a non-empty `products` array or
/// object. As a fallback heuristic (the upstream schema is inconsistent),
/// any non-empty top-level array or object also counts as OK. Everything
/// else, including scalars and empty containers, is KO.
pub fn classify_response(raw: &Value) -> ValidityStatus {
    if let Some(products) = raw.get("products") {
        return match products {
            Value::Array(items) if !items.is_empty() => ValidityStatus::Ok,
            Value::Object(map) if !map.is_empty() => ValidityStatus::Ok,
            _ => ValidityStatus::Ko,
        };
    }

    match raw {
        Value::Array(items) if !items.is_empty() => ValidityStatus::Ok,
        Value::Object(map) if !map.is_empty() => ValidityStatus::Ok,
        _ => ValidityStatus::Ko,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_empty_products_array_is_ok() {
        let raw = json!({"products": [{"slug": "p1"}]});
        assert_eq!(classify_response(&raw), ValidityStatus::Ok);
    }

    #[test]
    fn empty_products_array_is_ko_even_with_other_fields() {
        let raw = json!({"products": [], "meta": {"page": 1}});
        assert_eq!(classify_response(&raw), ValidityStatus::Ko);
    }

    #[test]
    fn products_object_counts_as_ok() {
        let raw = json!({"products": {"p1": {"name": "Mug"}}});
        assert_eq!(classify_response(&raw), ValidityStatus::Ok);
    }

    #[test]
    fn fallback_accepts_any_non_empty_top_level_object() {
        let raw = json!({"results": [{"slug": "p1"}]});
        assert_eq!(classify_response(&raw), ValidityStatus::Ok);
    }

    #[test]
    fn empty_and_scalar_bodies_are_ko() {
        assert_eq!(classify_response(&json!({})), ValidityStatus::Ko);
        assert_eq!(classify_response(&json!([])), ValidityStatus::Ko);
        assert_eq!(classify_response(&json!(null)), ValidityStatus::Ko);
        assert_eq!(classify_response(&json!("ok")), ValidityStatus::Ko);
    }

    #[test]
    fn tally_tracks_counts_and_percentage() {
        let mut tally = ProbeTally::new(4);
        assert_eq!(tally.percentage(), 0.0);

        tally.record(ValidityStatus::Ok);
        tally.record(ValidityStatus::Ko);
        assert_eq!(tally.valid, 1);
        assert_eq!(tally.invalid, 1);
        assert_eq!(tally.processed, 2);
        assert!((tally.percentage() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn status_serializes_as_upstream_strings() {
        assert_eq!(serde_json::to_string(&ValidityStatus::Ok).unwrap(), "\"OK\"");
        assert_eq!(serde_json::to_string(&ValidityStatus::Ko).unwrap(), "\"KO\"");
    }
}
