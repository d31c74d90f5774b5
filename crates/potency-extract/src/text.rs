//! Extraction from rendered product-page text.
//!
//! The page reader (see `potency-scraper`) reduces an HTML page to a
//! [`PageContent`]: the full visible text, the text of the terpene section if
//! one was found, and the percent-bearing elements of that section. This
//! module turns it into a [`ProductInsight`] in three stages for terpenes:
//! name-pattern matching, proximity pairing, then a bare total.

use std::sync::LazyLock;

use potency_core::{CannabinoidSet, ProductInsight, TerpeneEntry, TerpeneProfile};
use regex::Regex;

use crate::canonical::{canonicalize, TerpeneName, CANONICAL_TERPENES};
use crate::fold::{profile_from_entries, TerpeneFold};
use crate::percent::parse_percent_str;
use crate::proximity::{extract_by_proximity, PercentNode};

/// Longest whitespace-separated qualifier (e.g. `beta`, `α`) considered part of
/// a compound name that follows it.
const MAX_QUALIFIER_CHARS: usize = 5;

static CANNABINOID_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("THC", r"(?i)THC[:\s]+(\d+\.?\d*)%"),
        ("THCA", r"(?i)THCA[:\s]+(\d+\.?\d*)%"),
        ("CBD", r"(?i)CBD[:\s]+(\d+\.?\d*)%"),
        ("CBDA", r"(?i)CBDA[:\s]+(\d+\.?\d*)%"),
    ]
    .into_iter()
    .map(|(key, pattern)| (key, Regex::new(pattern).expect("valid cannabinoid regex")))
    .collect()
});

/// One pattern per canonical terpene: any synonym, optional separators, then a
/// percentage. Synonym words may be joined by whitespace, `_` or `-`.
static TERPENE_PATTERNS: LazyLock<Vec<(TerpeneName, Regex)>> = LazyLock::new(|| {
    CANONICAL_TERPENES
        .iter()
        .map(|(name, synonyms)| {
            let alternatives = synonyms
                .iter()
                .map(|s| {
                    s.split('-')
                        .map(regex::escape)
                        .collect::<Vec<_>>()
                        .join(r"[\s_-]*")
                })
                .collect::<Vec<_>>()
                .join("|");
            let pattern = format!(r"(?i)(?:{alternatives})[\s:]*([0-9]+(?:\.[0-9]+)?)%");
            (*name, Regex::new(&pattern).expect("valid terpene regex"))
        })
        .collect()
});

static TOTAL_TERPENES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Total\s*Terpenes\s*:?\s*([0-9]+(?:\.[0-9]+)?)%")
        .expect("valid total terpenes regex")
});

/// The parts of a rendered product page used for extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContent {
    /// Visible text of the whole page.
    pub text: String,
    /// Visible text of the section headed "Terpenes", when present.
    pub terpene_section: Option<String>,
    /// Percent-bearing elements inside the terpene section.
    pub percent_nodes: Vec<PercentNode>,
}

/// Builds a partial insight from page text. `url` becomes the record's url.
///
/// Cannabinoids come from the page text. Terpenes are matched in the terpene
/// section (or the page text when there is none); when no name matches, the
/// section's percent elements are paired with nearby labels; when that also
/// yields nothing, a "Total Terpenes" figure produces a total-only profile.
#[must_use]
pub fn extract_from_page(page: &PageContent, url: Option<&str>) -> ProductInsight {
    let cannabinoids = extract_cannabinoids_from_text(&page.text);
    let terpenes = extract_terpene_profile(page);

    tracing::debug!(
        url = url.unwrap_or_default(),
        has_section = page.terpene_section.is_some(),
        cannabinoids = cannabinoids.len(),
        terpenes = terpenes.is_some(),
        "extracted page text"
    );

    ProductInsight {
        url: url.filter(|u| !u.is_empty()).map(str::to_owned),
        name: None,
        cannabinoids: (!cannabinoids.is_empty()).then_some(cannabinoids),
        terpenes,
    }
}

/// `THC`, `THCA`, `CBD` and `CBDA` percentages written as `<KEY>: <n>%`.
/// The first occurrence of each wins.
#[must_use]
pub fn extract_cannabinoids_from_text(text: &str) -> CannabinoidSet {
    CANNABINOID_PATTERNS
        .iter()
        .filter_map(|(key, re)| {
            re.captures(text)
                .and_then(|c| c.get(1))
                .and_then(|m| parse_percent_str(m.as_str()))
                .map(|v| ((*key).to_string(), v))
        })
        .collect()
}

/// Canonical terpenes followed by a percentage anywhere in `text`; repeated
/// mentions keep the largest value. Entries are ordered by the canonical table.
#[must_use]
pub fn extract_named_terpenes(text: &str) -> Vec<TerpeneEntry> {
    let mut fold = TerpeneFold::new();
    for (name, re) in TERPENE_PATTERNS.iter() {
        for caps in re.captures_iter(text) {
            let (Some(whole), Some(value)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let label = qualified_label(text, whole.start(), whole.end());
            if canonicalize(label) != Some(*name) {
                continue;
            }
            fold.add_max(name.as_str(), parse_percent_str(value.as_str()));
        }
    }
    fold.into_entries()
}

fn extract_terpene_profile(page: &PageContent) -> Option<TerpeneProfile> {
    let scope = page.terpene_section.as_deref().unwrap_or(&page.text);

    let named = extract_named_terpenes(scope);
    if !named.is_empty() {
        return profile_from_entries(named);
    }

    let nearby = extract_by_proximity(&page.percent_nodes);
    if !nearby.is_empty() {
        return profile_from_entries(nearby);
    }

    total_terpenes(scope)
        .or_else(|| total_terpenes(&page.text))
        .map(TerpeneProfile::total_only)
}

fn total_terpenes(text: &str) -> Option<f64> {
    TOTAL_TERPENES
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| parse_percent_str(m.as_str()))
}

/// The label a match really belongs to: the matched name, extended backwards
/// over the rest of its word, or over one short qualifier word separated by
/// whitespace. `"Terpinene"` is not a pinene and `"beta pinene"` is not an
/// alpha-pinene.
fn qualified_label(text: &str, start: usize, end: usize) -> &str {
    let head = &text[..start];
    let attached = head
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_alphabetic() || *c == '-' || *c == '_')
        .last()
        .map(|(i, _)| i);

    let label_start = attached.unwrap_or_else(|| {
        let before_space = head.trim_end_matches(char::is_whitespace);
        if before_space.len() == head.len() {
            return start;
        }
        let qualifier: Vec<(usize, char)> = before_space
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_alphabetic())
            .collect();
        match qualifier.last() {
            Some((i, _)) if qualifier.len() <= MAX_QUALIFIER_CHARS => *i,
            _ => start,
        }
    });

    let name_end = text[start..end]
        .find(|c: char| c.is_ascii_digit() || c == ':')
        .map_or(end, |offset| start + offset);
    text[label_start..name_end].trim_end()
}
