//! Category tree entities and traversal utilities
//!
//! The storefront ships a fixed category tree as part of its page data. The
//! tree is read-only after load; everything here is a pure function over it.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::warn;
use ts_rs::TS;

/// One node of the storefront category tree.
///
/// `slug` is the upstream identifier used in product queries. Children own
/// their subtrees, so the structure is acyclic and finite by construction.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Category {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub children: Vec<Category>,
}

impl Category {
    /// A node with no children is a probe-able leaf category.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Collect the slugs of all leaf categories, depth-first.
///
/// Internal nodes contribute nothing themselves; only nodes without children
/// end up in the result. Duplicate slugs are collapsed, keeping the first
/// occurrence in traversal order.
pub fn extract_leaf_slugs(tree: &[Category]) -> Vec<String> {
    fn walk(node: &Category, out: &mut Vec<String>) {
        if node.is_leaf() {
            out.push(node.slug.clone());
        } else {
            for child in &node.children {
                walk(child, out);
            }
        }
    }

    let mut slugs = Vec::new();
    for node in tree {
        walk(node, &mut slugs);
    }

    let mut seen = HashSet::new();
    slugs.retain(|slug| seen.insert(slug.clone()));
    slugs
}

/// Resolve the breadcrumb path (root name down to the matching node's name)
/// for `target_slug`. Returns an empty vector when the slug is not present.
///
/// If the same slug appears at multiple positions, the first match in
/// depth-first order wins; run [`verify_unique_slugs`] after load to detect
/// that situation.
pub fn resolve_path(tree: &[Category], target_slug: &str) -> Vec<String> {
    fn walk(node: &Category, target: &str, trail: &mut Vec<String>) -> bool {
        trail.push(node.name.clone());
        if node.slug == target {
            return true;
        }
        for child in &node.children {
            if walk(child, target, trail) {
                return true;
            }
        }
        trail.pop();
        false
    }

    let mut trail = Vec::new();
    for node in tree {
        if walk(node, target_slug, &mut trail) {
            return trail;
        }
    }
    Vec::new()
}

/// Load-time sanity check: report slugs that appear more than once anywhere
/// in the tree. Duplicates are logged and returned, never treated as fatal —
/// the tree is external data and path lookups still work on first-match.
pub fn verify_unique_slugs(tree: &[Category]) -> Vec<String> {
    fn walk(node: &Category, counts: &mut HashMap<String, u32>) {
        *counts.entry(node.slug.clone()).or_insert(0) += 1;
        for child in &node.children {
            walk(child, counts);
        }
    }

    let mut counts = HashMap::new();
    for node in tree {
        walk(node, &mut counts);
    }

    let mut duplicates: Vec<String> = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(slug, _)| slug)
        .collect();
    duplicates.sort();

    if !duplicates.is_empty() {
        warn!(
            "⚠️  Category tree contains {} duplicate slug(s): {:?}",
            duplicates.len(),
            duplicates
        );
    }
    duplicates
}

/// Statically bundled slug → display-name mapping, used as a fallback when
/// the category-tree endpoint is unreachable.
static FALLBACK_SLUGS: Lazy<HashMap<String, String>> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../assets/category_slugs.json")).unwrap_or_else(|e| {
        warn!("Failed to parse bundled category slug list: {}", e);
        HashMap::new()
    })
});

/// The bundled slug list shipped with the engine. No upstream call involved.
pub fn fallback_slug_map() -> &'static HashMap<String, String> {
    &FALLBACK_SLUGS
}
