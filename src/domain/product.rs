//! Normalized product detail view for dashboard display.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A product detail record normalized out of the raw upstream JSON.
///
/// The raw detail payload is inconsistent (prices as numbers or numeric
/// strings, stock flags as booleans, numbers, or strings, HTML in the
/// description). This type is the cleaned-up shape the presentation layer
/// consumes; the normalization itself lives in the extraction module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductView {
    pub slug: String,
    pub name: String,
    pub price: Option<f64>,
    pub in_stock: Option<bool>,
    pub main_image: Option<String>,
    /// Plain text, HTML tags stripped.
    pub description: String,
    /// Category names from root to the product's own category.
    pub category_trail: Vec<String>,
}

impl ProductView {
    /// A view carrying only the slug, used when the detail fetch failed but
    /// the product is still known from its listing entry.
    pub fn placeholder(slug: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            name: slug.clone(),
            slug,
            price: None,
            in_stock: None,
            main_image: None,
            description: String::new(),
            category_trail: Vec::new(),
        }
    }
}
