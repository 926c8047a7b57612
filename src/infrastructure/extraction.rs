//! Defensive extraction over inconsistent upstream response shapes.
//!
//! The retailer API is not schema-stable: product listings arrive as a bare
//! array, `{products: [...]}`, or `{results: [...]}`; prices come as numbers
//! or numeric strings; stock flags come as booleans, numbers, or strings.
//! Every extractor here tries an explicit ordered list of shapes and falls
//! back to an empty result, never an error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::domain::product::ProductView;

/// Field names tried, in order, when looking for a price on a detail record.
/// Nested paths are dot-separated.
const PRICE_FIELDS: [&str; 5] = [
    "pricing.originalPrice",
    "pricing.price",
    "originalPrice",
    "price",
    "priceValue",
];

/// Field names tried, in order, when looking for a stock flag.
const STOCK_FIELDS: [&str; 5] = [
    "pricing.isInStock",
    "isInStock",
    "inStock",
    "stock",
    "availability",
];

/// Extract the product list from a category response.
///
/// Shape matchers, tried in order: bare array, `products`, `results`. A body
/// matching none of them yields an empty list (logged, not an error).
pub fn extract_product_list(raw: &Value) -> Vec<Value> {
    if let Value::Array(items) = raw {
        return items.clone();
    }
    for field in ["products", "results"] {
        match raw.get(field) {
            Some(Value::Array(items)) => return items.clone(),
            // Keyed product maps show up on some categories.
            Some(Value::Object(map)) => return map.values().cloned().collect(),
            _ => {}
        }
    }
    debug!("No recognized product list shape in response, treating as empty");
    Vec::new()
}

/// Derive the detail-endpoint slug for a listing item.
///
/// Priority: explicit `slug` field, `id` field, last meaningful URL path
/// segment, slugified `name`. `None` when nothing usable is present.
pub fn derive_detail_slug(item: &Value) -> Option<String> {
    if let Some(slug) = item.get("slug").and_then(Value::as_str) {
        if !slug.is_empty() {
            return Some(slug.to_string());
        }
    }
    if let Some(id) = item.get("id") {
        match id {
            Value::String(s) if !s.is_empty() => return Some(s.clone()),
            Value::Number(n) => return Some(n.to_string()),
            _ => {}
        }
    }
    if let Some(url) = item.get("url").and_then(Value::as_str) {
        if let Some(segment) = last_meaningful_segment(url) {
            return Some(segment);
        }
    }
    item.get("name")
        .and_then(Value::as_str)
        .map(slugify)
        .filter(|s| !s.is_empty())
}

/// Last non-empty path segment of a URL-ish string, query and fragment
/// stripped.
fn last_meaningful_segment(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .filter(|segment| !segment.contains(':'))
        .map(str::to_string)
}

/// Lowercase, alphanumerics kept, everything else collapsed to single
/// hyphens.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_hyphen = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Numeric value at a dot-separated path, coercing numeric strings.
fn numeric_at(detail: &Value, path: &str) -> Option<f64> {
    let value = value_at(detail, path)?;
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    }
}

fn value_at<'a>(detail: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = detail;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

/// First populated price among the candidate fields, non-negative.
pub fn extract_price(detail: &Value) -> Option<f64> {
    PRICE_FIELDS
        .iter()
        .find_map(|field| numeric_at(detail, field))
        .filter(|price| *price >= 0.0)
}

/// First populated stock flag among the candidate fields.
///
/// Accepted encodings: booleans, numbers (non-zero is in stock), and
/// strings (`"true"`, `"1"`, `"yes"`, `"in_stock"`, `"instock"`, or a
/// numeric string).
pub fn extract_in_stock(detail: &Value) -> Option<bool> {
    for field in STOCK_FIELDS {
        let Some(value) = value_at(detail, field) else {
            continue;
        };
        match value {
            Value::Bool(flag) => return Some(*flag),
            Value::Number(n) => return Some(n.as_f64().is_some_and(|v| v != 0.0)),
            Value::String(s) => {
                let normalized = s.trim().to_ascii_lowercase();
                if normalized.is_empty() {
                    continue;
                }
                if let Ok(numeric) = normalized.parse::<f64>() {
                    return Some(numeric != 0.0);
                }
                return Some(matches!(
                    normalized.as_str(),
                    "true" | "yes" | "in_stock" | "instock" | "available"
                ));
            }
            _ => {}
        }
    }
    None
}

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Strip HTML tags and collapse whitespace. Good enough for the short
/// description snippets the upstream ships; not a general HTML sanitizer.
pub fn strip_html(input: &str) -> String {
    let without_tags = TAG_RE.replace_all(input, " ");
    WS_RE.replace_all(without_tags.trim(), " ").to_string()
}

/// Build the normalized [`ProductView`] from a raw detail record.
pub fn build_product_view(slug: &str, detail: &Value) -> ProductView {
    let name = detail
        .get("name")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map_or_else(|| slug.to_string(), str::to_string);

    let main_image = detail
        .get("media")
        .and_then(|media| media.get("mainImages"))
        .and_then(Value::as_array)
        .and_then(|images| images.first())
        .and_then(|image| match image {
            Value::String(src) => Some(src.clone()),
            Value::Object(_) => image
                .get("url")
                .or_else(|| image.get("src"))
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        });

    let description = detail
        .get("shortDescription")
        .and_then(Value::as_str)
        .map(strip_html)
        .unwrap_or_default();

    let category_trail = detail
        .get("categoryTree")
        .and_then(Value::as_array)
        .map(|nodes| {
            nodes
                .iter()
                .filter_map(|node| match node {
                    Value::String(name) => Some(name.clone()),
                    Value::Object(_) => node
                        .get("name")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    ProductView {
        slug: slug.to_string(),
        name,
        price: extract_price(detail),
        in_stock: extract_in_stock(detail),
        main_image,
        description,
        category_trail,
    }
}
