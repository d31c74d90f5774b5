//! The per-entity insight record and its parts.
//!
//! A [`ProductInsight`] is both the unit stored in a caller's per-entity cache
//! slot and the shape of a *partial* insight produced by a single extraction
//! pass: every field is optional, and the merge store folds partials together.
//!
//! The serialized form is plain JSON so it can be persisted as text:
//!
//! ```json
//! {
//!   "url": "https://www.sunnyside.shop/product/12345",
//!   "name": "Blue Dream 3.5g",
//!   "cannabinoids": { "THC": 22.4, "CBG": 1.1 },
//!   "terpenes": [{ "name": "Beta-Myrcene", "percentage": 0.12 }]
//! }
//! ```
//!
//! A total-only terpene profile serializes as `{ "Total Terpenes": 1.8 }`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Display order of the well-known cannabinoid keys.
pub const PREFERRED_CANNABINOIDS: [&str; 9] = [
    "THC", "THCA", "CBD", "CBDA", "CBN", "CBG", "CBC", "totalTHC", "totalCBD",
];

/// Label used for an aggregate terpene percentage.
pub const TOTAL_TERPENES_LABEL: &str = "Total Terpenes";

/// Returns `true` for labels like `"Total Terpenes"` or `"total_terpene"`.
#[must_use]
pub fn is_total_terpenes_label(label: &str) -> bool {
    let squashed: String = label
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect();
    squashed.contains("totalterpene")
}

/// Cannabinoid key → percentage.
///
/// Keys are the canonical labels from [`PREFERRED_CANNABINOIDS`] or, for
/// values copied from an upstream `cannabinoids` object, the upstream key
/// uppercased. Absent keys mean "unknown".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CannabinoidSet(BTreeMap<String, f64>);

impl CannabinoidSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    /// Stores `value` under `key`, replacing any previous value. NaN and
    /// infinities are ignored.
    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        if value.is_finite() {
            self.0.insert(key.into(), value);
        }
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Copies every key of `incoming` over `self`. Keys absent from
    /// `incoming` are left untouched.
    pub fn overlay(&mut self, incoming: &CannabinoidSet) {
        for (key, value) in incoming.iter() {
            self.0.insert(key.to_owned(), value);
        }
    }
}

impl FromIterator<(String, f64)> for CannabinoidSet {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (key, value) in iter {
            set.insert(key, value);
        }
        set
    }
}

/// One compound of a detailed terpene breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerpeneEntry {
    /// Canonical terpene name, or the raw label when it could not be canonicalized.
    pub name: String,
    pub percentage: f64,
}

impl TerpeneEntry {
    #[must_use]
    pub fn new(name: impl Into<String>, percentage: f64) -> Self {
        Self {
            name: name.into(),
            percentage,
        }
    }
}

/// How much detail a terpene profile carries. Ordered from least to most.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Granularity {
    Empty,
    TotalOnly,
    Detailed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TerpeneProfile {
    /// Per-compound breakdown with unique names.
    Detailed(Vec<TerpeneEntry>),
    /// A single aggregate percentage, used when no breakdown is available.
    TotalOnly {
        #[serde(rename = "Total Terpenes")]
        total: f64,
    },
}

impl TerpeneProfile {
    #[must_use]
    pub fn total_only(total: f64) -> Self {
        TerpeneProfile::TotalOnly { total }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            TerpeneProfile::Detailed(entries) => entries.is_empty(),
            TerpeneProfile::TotalOnly { .. } => false,
        }
    }

    /// A breakdown whose only entries are total-terpene labels counts as total-only.
    #[must_use]
    pub fn granularity(&self) -> Granularity {
        match self {
            TerpeneProfile::Detailed(entries) if entries.is_empty() => Granularity::Empty,
            TerpeneProfile::Detailed(entries) => {
                if entries.iter().all(|e| is_total_terpenes_label(&e.name)) {
                    Granularity::TotalOnly
                } else {
                    Granularity::Detailed
                }
            }
            TerpeneProfile::TotalOnly { .. } => Granularity::TotalOnly,
        }
    }

    /// Flattens the profile into `(label, percentage)` pairs. A total-only
    /// profile yields a single [`TOTAL_TERPENES_LABEL`] pair.
    #[must_use]
    pub fn entries(&self) -> Vec<(&str, f64)> {
        match self {
            TerpeneProfile::Detailed(entries) => entries
                .iter()
                .map(|e| (e.name.as_str(), e.percentage))
                .collect(),
            TerpeneProfile::TotalOnly { total } => vec![(TOTAL_TERPENES_LABEL, *total)],
        }
    }
}

/// Everything known about one entity's chemistry, possibly partial.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductInsight {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cannabinoids: Option<CannabinoidSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terpenes: Option<TerpeneProfile>,
}

impl ProductInsight {
    /// Returns `true` when no field carries any information.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.url.as_deref().is_none_or(str::is_empty)
            && self.name.as_deref().is_none_or(str::is_empty)
            && !self.has_cannabinoid_info()
            && !self.has_terpene_info()
    }

    #[must_use]
    pub fn has_cannabinoid_info(&self) -> bool {
        self.cannabinoids.as_ref().is_some_and(|c| !c.is_empty())
    }

    #[must_use]
    pub fn has_terpene_info(&self) -> bool {
        self.terpenes.as_ref().is_some_and(|t| !t.is_empty())
    }

    #[must_use]
    pub fn terpene_granularity(&self) -> Granularity {
        self.terpenes
            .as_ref()
            .map_or(Granularity::Empty, TerpeneProfile::granularity)
    }

    #[must_use]
    pub fn has_detailed_terpenes(&self) -> bool {
        self.terpene_granularity() == Granularity::Detailed
    }

    /// Column header for this insight: its name, else its URL, else `Product N`
    /// where `N` is the 1-based `position`.
    #[must_use]
    pub fn display_name(&self, position: usize) -> String {
        self.name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.url.as_deref().filter(|s| !s.is_empty()))
            .map_or_else(|| format!("Product {position}"), str::to_owned)
    }
}

/// Result of one upstream detail fetch for an entity.
///
/// A failed fetch carries only its reason and is never merged, so whatever
/// is already cached for the entity survives.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Fetched(ProductInsight),
    Failed { reason: String },
}
