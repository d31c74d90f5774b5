//! Terpene name canonicalization.
//!
//! Labels arrive as display text (`"B-Myrcene"`), field names (`"beta_pinene"`)
//! or sentences (`"Limonene 0.4%"`). A label maps to the first entry of
//! [`CANONICAL_TERPENES`] that has a synonym contained in the normalized label.
//!
//! Matching is containment, so table order decides overlaps: an entry whose
//! synonyms are contained in another entry's labels must come *after* it.
//! `"caryophyllene oxide"` contains `"caryophyllene"`, `"beta-pinene"`
//! contains `"a-pinene"`, and `"terpinene"` contains `"pinene"`.

use std::fmt;

/// The fixed set of terpenes recognized by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerpeneName {
    CaryophylleneOxide,
    BetaCaryophyllene,
    Limonene,
    Humulene,
    Linalool,
    BetaMyrcene,
    Terpinene,
    BetaPinene,
    AlphaPinene,
    Ocimene,
    Terpinolene,
    Nerolidol,
    Bisabolol,
    Eucalyptol,
    Camphene,
    Geraniol,
    Valencene,
    Phellandrene,
}

impl TerpeneName {
    /// Canonical display name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TerpeneName::CaryophylleneOxide => "Caryophyllene Oxide",
            TerpeneName::BetaCaryophyllene => "Beta-Caryophyllene",
            TerpeneName::Limonene => "Limonene",
            TerpeneName::Humulene => "Humulene",
            TerpeneName::Linalool => "Linalool",
            TerpeneName::BetaMyrcene => "Beta-Myrcene",
            TerpeneName::Terpinene => "Terpinene",
            TerpeneName::BetaPinene => "Beta-Pinene",
            TerpeneName::AlphaPinene => "Alpha-Pinene",
            TerpeneName::Ocimene => "Ocimene",
            TerpeneName::Terpinolene => "Terpinolene",
            TerpeneName::Nerolidol => "Nerolidol",
            TerpeneName::Bisabolol => "Bisabolol",
            TerpeneName::Eucalyptol => "Eucalyptol",
            TerpeneName::Camphene => "Camphene",
            TerpeneName::Geraniol => "Geraniol",
            TerpeneName::Valencene => "Valencene",
            TerpeneName::Phellandrene => "Phellandrene",
        }
    }

    /// Lowercase, hyphenated synonyms for this terpene.
    #[must_use]
    pub fn synonyms(self) -> &'static [&'static str] {
        match CANONICAL_TERPENES.iter().find(|(name, _)| *name == self) {
            Some((_, synonyms)) => synonyms,
            None => &[],
        }
    }
}

impl fmt::Display for TerpeneName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical terpenes in match-priority order with their synonyms.
///
/// Synonyms are lowercase with words joined by `-`, matching the output of
/// [`normalize_label`].
pub const CANONICAL_TERPENES: &[(TerpeneName, &[&str])] = &[
    (
        TerpeneName::CaryophylleneOxide,
        &["caryophyllene-oxide"],
    ),
    (
        TerpeneName::BetaCaryophyllene,
        &["beta-caryophyllene", "b-caryophyllene", "caryophyllene"],
    ),
    (TerpeneName::Limonene, &["limonene"]),
    (TerpeneName::Humulene, &["humulene"]),
    (TerpeneName::Linalool, &["linalool"]),
    (
        TerpeneName::BetaMyrcene,
        &["beta-myrcene", "b-myrcene", "myrcene"],
    ),
    (
        TerpeneName::Terpinene,
        &["alpha-terpinene", "gamma-terpinene", "terpinene"],
    ),
    (TerpeneName::BetaPinene, &["beta-pinene", "b-pinene"]),
    (
        TerpeneName::AlphaPinene,
        &["alpha-pinene", "a-pinene", "pinene"],
    ),
    (TerpeneName::Ocimene, &["ocimene"]),
    (TerpeneName::Terpinolene, &["terpinolene"]),
    (TerpeneName::Nerolidol, &["nerolidol"]),
    (TerpeneName::Bisabolol, &["bisabolol"]),
    (TerpeneName::Eucalyptol, &["eucalyptol"]),
    (TerpeneName::Camphene, &["camphene"]),
    (TerpeneName::Geraniol, &["geraniol"]),
    (TerpeneName::Valencene, &["valencene"]),
    (
        TerpeneName::Phellandrene,
        &["alpha-phellandrene", "beta-phellandrene", "phellandrene"],
    ),
];

/// Lowercases, trims, and joins words with `-` (underscores and whitespace
/// runs both become a single hyphen).
#[must_use]
pub fn normalize_label(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace('_', "-")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Maps a free-text or key-like label to a canonical terpene, or `None` when
/// no synonym is contained in it.
#[must_use]
pub fn canonicalize(raw: &str) -> Option<TerpeneName> {
    let key = normalize_label(raw);
    if key.is_empty() {
        return None;
    }
    CANONICAL_TERPENES
        .iter()
        .find(|(_, synonyms)| synonyms.iter().any(|s| key.contains(s)))
        .map(|(name, _)| *name)
}

/// The canonical display name for `raw`, falling back to the trimmed raw label.
#[must_use]
pub fn display_name(raw: &str) -> String {
    canonicalize(raw).map_or_else(|| raw.trim().to_owned(), |n| n.as_str().to_owned())
}
