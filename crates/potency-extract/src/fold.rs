//! Duplicate folding for harvested terpene pairs.

use potency_core::{TerpeneEntry, TerpeneProfile};

/// Collects `(name, percentage)` pairs in first-seen order with unique names.
#[derive(Debug, Default)]
pub(crate) struct TerpeneFold {
    entries: Vec<TerpeneEntry>,
}

impl TerpeneFold {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds a pair, keeping the larger percentage when `name` was already
    /// seen. Ties keep the first value. Unknown percentages are dropped.
    pub(crate) fn add_max(&mut self, name: &str, percentage: Option<f64>) {
        let Some(pct) = percentage.filter(|p| p.is_finite()) else {
            return;
        };
        if name.is_empty() {
            return;
        }
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(existing) if pct > existing.percentage => existing.percentage = pct,
            Some(_) => {}
            None => self.entries.push(TerpeneEntry::new(name, pct)),
        }
    }

    /// Adds a pair only when `name` has not been seen yet.
    pub(crate) fn add_first(&mut self, name: &str, percentage: f64) {
        if name.is_empty()
            || !percentage.is_finite()
            || self.entries.iter().any(|e| e.name == name)
        {
            return;
        }
        self.entries.push(TerpeneEntry::new(name, percentage));
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn into_entries(self) -> Vec<TerpeneEntry> {
        self.entries
    }

    /// Converts the folded pairs into a profile. A breakdown consisting only of
    /// total-terpene labels collapses to a total-only profile.
    pub(crate) fn into_profile(self) -> Option<TerpeneProfile> {
        profile_from_entries(self.entries)
    }
}

pub(crate) fn profile_from_entries(entries: Vec<TerpeneEntry>) -> Option<TerpeneProfile> {
    if entries.is_empty() {
        return None;
    }
    let profile = TerpeneProfile::Detailed(entries);
    match profile.granularity() {
        potency_core::Granularity::TotalOnly => {
            let total = profile
                .entries()
                .into_iter()
                .map(|(_, v)| v)
                .fold(f64::MIN, f64::max);
            Some(TerpeneProfile::total_only(total))
        }
        _ => Some(profile),
    }
}
