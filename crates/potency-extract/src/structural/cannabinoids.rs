//! Fixed-key cannabinoid harvesting.
//!
//! Unlike terpenes there is no fuzzy matching here: each canonical key has an
//! ordered list of field paths observed in upstream records, and the first
//! path holding a non-null value wins.

use potency_core::CannabinoidSet;
use serde_json::Value;

use crate::percent::parse_percent;

/// Canonical cannabinoid key → field paths (dot-separated) in precedence order.
pub const CANNABINOID_ALIASES: &[(&str, &[&str])] = &[
    (
        "THC",
        &[
            "thc",
            "potency.thc",
            "potency_thc",
            "bt_potency_thc",
            "thcPercent",
            "thc_percentage",
        ],
    ),
    (
        "THCA",
        &["thca", "potency.thca", "potency_thca", "bt_potency_thca"],
    ),
    (
        "CBD",
        &[
            "cbd",
            "potency.cbd",
            "potency_cbd",
            "bt_potency_cbd",
            "cbdPercent",
            "cbd_percentage",
        ],
    ),
    (
        "CBDA",
        &["cbda", "potency.cbda", "potency_cbda", "bt_potency_cbda"],
    ),
    ("CBN", &["cbn", "potency.cbn", "potency_cbn", "bt_potency_cbn"]),
    ("CBG", &["cbg", "potency.cbg", "potency_cbg", "bt_potency_cbg"]),
    ("CBC", &["cbc", "potency.cbc", "potency_cbc", "bt_potency_cbc"]),
    (
        "totalTHC",
        &[
            "totalTHC",
            "total_thc",
            "potency.totalTHC",
            "potency.total_thc",
            "potency_thc_total",
            "bt_potency_thc_total",
            "usable_thc",
        ],
    ),
    (
        "totalCBD",
        &[
            "totalCBD",
            "total_cbd",
            "potency.totalCBD",
            "potency.total_cbd",
            "potency_cbd_total",
            "bt_potency_cbd_total",
            "usable_cbd",
        ],
    ),
];

/// Resolves a dot-separated field path against nested objects.
pub(crate) fn lookup_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(root, |node, segment| node.as_object()?.get(segment))
}

/// First non-null value among `paths`.
pub(crate) fn first_present<'a>(root: &'a Value, paths: &[&str]) -> Option<&'a Value> {
    paths
        .iter()
        .filter_map(|p| lookup_path(root, p))
        .find(|v| !v.is_null())
}

/// Harvests cannabinoid percentages from a record.
///
/// Values of an upstream `cannabinoids` object are copied first under their
/// uppercased keys; the fixed alias table then overrides per key. An alias
/// whose value does not resolve to a number leaves the key as it was.
#[must_use]
pub fn extract_cannabinoids(root: &Value) -> CannabinoidSet {
    let mut set = CannabinoidSet::new();

    if let Some(source) = root.get("cannabinoids").and_then(Value::as_object) {
        for (key, value) in source {
            if let Some(pct) = parse_percent(value) {
                set.insert(key.to_uppercase(), pct);
            }
        }
    }

    for (key, paths) in CANNABINOID_ALIASES {
        if let Some(pct) = first_present(root, paths).and_then(parse_percent) {
            set.insert(*key, pct);
        }
    }

    set
}
