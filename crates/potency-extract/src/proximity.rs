//! Proximity fallback for terpene sections that carry no recognizable names.
//!
//! Some pages render each compound as a small block: a percentage in one
//! element, a label in a sibling. The page reader hands over every element of
//! the terpene section whose text holds a percentage, together with the texts
//! of the elements inside its nearest containing block; this module picks a
//! best-guess name for each percentage. No canonicalization happens here.

use std::sync::LazyLock;

use potency_core::TerpeneEntry;
use regex::Regex;

use crate::fold::TerpeneFold;
use crate::percent::parse_percent_str;

/// Longest text (in characters) still considered a compound name.
pub const MAX_NAME_CHARS: usize = 50;

static PERCENT_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]+(?:\.[0-9]+)?)%").expect("valid percent regex")
});

/// One percent-bearing element of a terpene section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PercentNode {
    /// Text content of the element itself.
    pub text: String,
    /// Text content of every element inside the element's nearest containing
    /// block, in document order.
    pub container_texts: Vec<String>,
}

/// Pairs each node's percentage with the longest name-like text of its block.
///
/// A name-like text is non-empty, contains a letter and no `%`, and is at most
/// [`MAX_NAME_CHARS`] characters. Names are title-cased per word and the first
/// value seen for a name is kept.
#[must_use]
pub fn extract_by_proximity(nodes: &[PercentNode]) -> Vec<TerpeneEntry> {
    let mut fold = TerpeneFold::new();

    for node in nodes {
        let Some(pct) = PERCENT_VALUE
            .captures(&node.text)
            .and_then(|c| c.get(1))
            .and_then(|m| parse_percent_str(m.as_str()))
        else {
            continue;
        };

        if let Some(name) = best_name(&node.container_texts) {
            fold.add_first(&title_case(name), pct);
        }
    }

    fold.into_entries()
}

/// Longest name-like text; the earliest wins among equal lengths.
fn best_name(texts: &[String]) -> Option<&str> {
    texts
        .iter()
        .map(|t| t.trim())
        .filter(|t| is_name_like(t))
        .fold(None, |best: Option<&str>, t| match best {
            Some(b) if b.chars().count() >= t.chars().count() => Some(b),
            _ => Some(t),
        })
}

fn is_name_like(text: &str) -> bool {
    !text.is_empty()
        && !text.contains('%')
        && text.chars().any(|c| c.is_ascii_alphabetic())
        && text.chars().count() <= MAX_NAME_CHARS
}

/// `"beta-MYRCENE  oil"` → `"Beta-myrcene Oil"`: each whitespace-separated
/// word gets an uppercase first letter and a lowercase remainder.
#[must_use]
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
