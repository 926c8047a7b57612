//! Category metrics: derived aggregates plus the deterministic simulation
//! fallbacks used when the upstream exposes no real signal.
//!
//! The storefront API gives us prices and stock flags on sampled product
//! details, but nothing about catalog structure. The structural breakdown is
//! therefore always simulated from a stable hash of the slug; price and stock
//! fall back to the same scheme only when no real sample could be fetched.
//! Simulated values are flagged as such instead of being silently blended
//! with real ones.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// The five fixed structural kinds every catalog entry is bucketed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum StructureKind {
    Standalone,
    Bundle,
    Variant,
    Accessory,
    Other,
}

impl StructureKind {
    pub const ALL: [Self; 5] = [
        Self::Standalone,
        Self::Bundle,
        Self::Variant,
        Self::Accessory,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standalone => "standalone",
            Self::Bundle => "bundle",
            Self::Variant => "variant",
            Self::Accessory => "accessory",
            Self::Other => "other",
        }
    }
}

/// Price summary over the sampled product details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricingSummary {
    pub average: f64,
    pub minimum: f64,
    pub maximum: f64,
    /// True when no real price was found and the values are hash-derived.
    pub simulated: bool,
}

impl PricingSummary {
    /// Summarize real sampled prices. Returns `None` for an empty sample so
    /// the caller falls through to the simulation path.
    pub fn from_samples(prices: &[f64]) -> Option<Self> {
        if prices.is_empty() {
            return None;
        }
        let sum: f64 = prices.iter().sum();
        let minimum = prices.iter().copied().fold(f64::INFINITY, f64::min);
        let maximum = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(Self {
            average: sum / prices.len() as f64,
            minimum,
            maximum,
            simulated: false,
        })
    }

    /// Deterministic fallback derived from the slug hash: stable across
    /// repeated calls for the same slug.
    pub fn simulated_for(slug: &str) -> Self {
        let hash = slug_hash(slug);
        let minimum = f64::from(hash % 40 + 5);
        let spread = f64::from(hash / 7 % 120 + 10);
        let maximum = minimum + spread;
        Self {
            average: (minimum + maximum) / 2.0,
            minimum,
            maximum,
            simulated: true,
        }
    }
}

/// Stock summary scaled from the sampled details to the full product count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockSummary {
    pub in_stock: u32,
    /// Fraction of products estimated in stock, in `[0, 100]`.
    pub percentage: f64,
    pub simulated: bool,
}

impl StockSummary {
    /// Scale the in-stock fraction of the sampled details up to
    /// `total_products`. `None` when nothing was sampled.
    pub fn from_samples(in_stock_sampled: u32, sampled: u32, total_products: u32) -> Option<Self> {
        if sampled == 0 {
            return None;
        }
        let percentage = f64::from(in_stock_sampled) / f64::from(sampled) * 100.0;
        let in_stock = (percentage / 100.0 * f64::from(total_products)).round() as u32;
        Some(Self {
            in_stock: in_stock.min(total_products),
            percentage,
            simulated: false,
        })
    }

    pub fn simulated_for(slug: &str, total_products: u32) -> Self {
        let hash = slug_hash(slug);
        // 55..=95 percent, so simulated categories never look fully dead.
        let percentage = f64::from(hash % 41 + 55);
        let in_stock = (percentage / 100.0 * f64::from(total_products)).round() as u32;
        Self {
            in_stock: in_stock.min(total_products),
            percentage,
            simulated: true,
        }
    }
}

/// Derived aggregate for one category slug.
///
/// Invariant: the structure distribution counts sum exactly to
/// `total_products`, and the percentages are `count / total * 100`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CategoryMetrics {
    pub slug: String,
    pub total_products: u32,
    pub pricing: PricingSummary,
    pub stock: StockSummary,
    pub structure_distribution: BTreeMap<StructureKind, u32>,
    pub structure_percentage: BTreeMap<StructureKind, f64>,
    /// Always true today: the upstream API exposes no structural signal.
    pub structure_simulated: bool,
    pub computed_at: DateTime<Utc>,
}

impl CategoryMetrics {
    pub fn is_fully_simulated(&self) -> bool {
        self.pricing.simulated && self.stock.simulated && self.structure_simulated
    }
}

/// Stable hash over the slug's characters. Deliberately simple: the only
/// requirement is determinism per slug, not distribution quality.
pub fn slug_hash(slug: &str) -> u32 {
    slug
        .chars()
        .fold(0u32, |acc, ch| acc.wrapping_mul(31).wrapping_add(ch as u32))
}

/// Simulated structural breakdown for a slug, reconciled so the counts sum
/// exactly to `total_products`.
///
/// The four non-`standalone` shares come from `(hash % N)` formulas, their
/// rounded counts are clamped to fit, and the remainder goes to
/// `standalone`.
pub fn simulated_structure_distribution(
    slug: &str,
    total_products: u32,
) -> BTreeMap<StructureKind, u32> {
    let hash = slug_hash(slug);

    let bundle_pct = f64::from(hash % 13 + 5);
    let variant_pct = f64::from(hash / 13 % 11 + 8);
    let accessory_pct = f64::from(hash / 7 % 9 + 4);
    let other_pct = f64::from(hash / 3 % 7 + 3);

    let total = f64::from(total_products);
    let mut counts: BTreeMap<StructureKind, u32> = BTreeMap::new();
    counts.insert(StructureKind::Bundle, (bundle_pct / 100.0 * total).round() as u32);
    counts.insert(StructureKind::Variant, (variant_pct / 100.0 * total).round() as u32);
    counts.insert(StructureKind::Accessory, (accessory_pct / 100.0 * total).round() as u32);
    counts.insert(StructureKind::Other, (other_pct / 100.0 * total).round() as u32);

    // Rounding on tiny totals can overshoot; shave the largest bucket until
    // the four shares fit.
    let mut assigned: u32 = counts.values().sum();
    while assigned > total_products {
        let largest = *counts
            .iter()
            .max_by_key(|(_, count)| **count)
            .map(|(kind, _)| kind)
            .unwrap_or(&StructureKind::Other);
        if let Some(count) = counts.get_mut(&largest) {
            *count -= 1;
        }
        assigned -= 1;
    }

    counts.insert(StructureKind::Standalone, total_products - assigned);
    counts
}

/// Percentages matching a distribution: `count / total * 100` per kind.
/// All-zero when `total_products` is zero.
pub fn structure_percentages(
    distribution: &BTreeMap<StructureKind, u32>,
    total_products: u32,
) -> BTreeMap<StructureKind, f64> {
    distribution
        .iter()
        .map(|(kind, count)| {
            let pct = if total_products == 0 {
                0.0
            } else {
                f64::from(*count) / f64::from(total_products) * 100.0
            };
            (*kind, pct)
        })
        .collect()
}
