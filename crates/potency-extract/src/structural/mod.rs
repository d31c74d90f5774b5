//! Extraction from untyped structured records.
//!
//! Upstream stores expose one record per product with no fixed schema. This
//! module turns such a record into a partial [`ProductInsight`]: identity
//! (url, name), a fixed-key cannabinoid set, and a terpene profile found by
//! walking the record (see [`walk`]).

mod cannabinoids;
mod walk;

use potency_core::{AppConfig, ProductInsight, TerpeneProfile};
use serde_json::Value;

use crate::canonical::display_name;
use crate::fold::TerpeneFold;
use crate::percent::{parse_percent, parse_percent_str};

pub use cannabinoids::{extract_cannabinoids, CANNABINOID_ALIASES};
pub use walk::extract_terpenes;

use cannabinoids::first_present;

/// Default number of object levels scanned for terpenes.
pub const DEFAULT_MAX_DEPTH: usize = 4;

const SLUG_FIELDS: [&str; 4] = ["slug", "productSlug", "permalink", "handle"];
const ID_FIELDS: [&str; 4] = ["id", "productId", "slugId", "sku"];
const NAME_FIELDS: [&str; 5] = [
    "ecomm_display_name",
    "bt_product_name",
    "name",
    "productName",
    "displayName",
];
const PROFILE_FIELDS: [&str; 3] = ["terpeneProfile", "terpene_profile", "terpeneBlend"];
const TOTAL_TERPENE_FIELDS: [&str; 3] = ["potency_terps", "potency.terps", "bt_potency_terps"];

/// Tunables for structural extraction.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Number of object levels the terpene walk descends into.
    pub max_depth: usize,
    /// Base an entity URL is built from when a record carries a slug or id.
    pub product_base_url: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            product_base_url: "https://www.sunnyside.shop/product".to_string(),
        }
    }
}

impl ExtractOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_depth: config.max_scan_depth,
            product_base_url: config.product_base_url.clone(),
        }
    }
}

/// Builds a partial insight from one upstream product record.
///
/// Terpenes come from the first tier that yields anything: a walk of the
/// whole record, a walk of its `potency` object, the raw `terpenes` field,
/// a `terpeneProfile`-style field, and finally a total-terpenes figure.
///
/// Returns `None` when `root` is not an object or nothing was found.
#[must_use]
pub fn extract_insight(
    root: &Value,
    fallback_url: Option<&str>,
    options: &ExtractOptions,
) -> Option<ProductInsight> {
    if !root.is_object() {
        return None;
    }

    let url = product_url(root, &options.product_base_url)
        .or_else(|| fallback_url.filter(|u| !u.is_empty()).map(str::to_owned));
    let name = first_truthy_text(root, &NAME_FIELDS);
    let cannabinoids = Some(extract_cannabinoids(root)).filter(|c| !c.is_empty());
    let terpenes = extract_profile(root, options.max_depth);

    let insight = ProductInsight {
        url,
        name,
        cannabinoids,
        terpenes,
    };

    tracing::debug!(
        url = insight.url.as_deref().unwrap_or(""),
        cannabinoids = insight.cannabinoids.as_ref().map_or(0, |c| c.len()),
        granularity = ?insight.terpene_granularity(),
        "structural extraction finished"
    );

    if insight.is_empty() {
        None
    } else {
        Some(insight)
    }
}

fn extract_profile(root: &Value, max_depth: usize) -> Option<TerpeneProfile> {
    let walked = extract_terpenes(root, max_depth);
    if !walked.is_empty() {
        return crate::fold::profile_from_entries(walked);
    }

    if let Some(potency) = root.get("potency") {
        let walked = extract_terpenes(potency, max_depth);
        if !walked.is_empty() {
            return crate::fold::profile_from_entries(walked);
        }
    }

    if let Some(profile) = root.get("terpenes").and_then(coerce_profile) {
        return Some(profile);
    }

    if let Some(profile) = PROFILE_FIELDS
        .iter()
        .filter_map(|f| root.get(*f))
        .find(|v| is_truthy(v))
        .and_then(coerce_profile)
    {
        return Some(profile);
    }

    first_present(root, &TOTAL_TERPENE_FIELDS)
        .and_then(parse_percent)
        .map(TerpeneProfile::total_only)
}

/// Interprets an arbitrary terpene-ish value as a profile.
///
/// Accepts an array of `{name, percentage|value|percent}` records or of
/// strings like `"Limonene 0.4%"`, an object of label → value, a bare
/// string or number (read as a total). Returns `None` when nothing resolves.
#[must_use]
pub fn coerce_profile(value: &Value) -> Option<TerpeneProfile> {
    let mut fold = TerpeneFold::new();
    match value {
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::Object(obj) => {
                        let Some(label) = obj.get("name").and_then(text_of) else {
                            continue;
                        };
                        let pct = ["percentage", "value", "percent"]
                            .iter()
                            .filter_map(|f| obj.get(*f))
                            .find(|v| !v.is_null())
                            .and_then(parse_percent);
                        fold.add_max(&display_name(&label), pct);
                    }
                    Value::String(s) => {
                        if let Some(label) = label_before_number(s) {
                            fold.add_max(&display_name(&label), parse_percent_str(s));
                        }
                    }
                    _ => {}
                }
            }
        }
        Value::Object(map) => {
            for (key, v) in map {
                fold.add_max(&display_name(key), parse_percent(v));
            }
        }
        Value::String(_) | Value::Number(_) => {
            return parse_percent(value).map(TerpeneProfile::total_only);
        }
        Value::Null | Value::Bool(_) => return None,
    }
    fold.into_profile()
}

/// `"Limonene: 0.4%"` → `"Limonene"`. `None` when no letters precede the number.
fn label_before_number(s: &str) -> Option<String> {
    let head = s.split(|c: char| c.is_ascii_digit()).next().unwrap_or("");
    let label = head.trim_matches(|c: char| c.is_whitespace() || c == ':' || c == '-' || c == '.');
    if label.chars().any(char::is_alphabetic) {
        Some(label.to_owned())
    } else {
        None
    }
}

/// Entity URL from a slug-like field, else an id-like field.
fn product_url(root: &Value, base: &str) -> Option<String> {
    let base = base.trim_end_matches('/');
    if let Some(slug) = first_truthy_text(root, &SLUG_FIELDS) {
        let slug = slug.strip_prefix("/product/").unwrap_or(&slug);
        return Some(format!("{base}/{slug}"));
    }
    first_truthy_text(root, &ID_FIELDS).map(|id| format!("{base}/{id}"))
}

/// First field whose value is a non-empty string or a non-zero number.
fn first_truthy_text(root: &Value, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .filter_map(|f| root.get(*f))
        .find(|v| is_truthy(v))
        .and_then(text_of)
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0 && v.is_finite()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
#[path = "structural_test.rs"]
mod tests;
