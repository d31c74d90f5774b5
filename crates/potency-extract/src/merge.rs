//! Non-destructive merging of partial insights.

use potency_core::{ProductInsight, TerpeneMergePolicy};

/// Merges `incoming` into a copy of `existing`. See [`merge_into`].
#[must_use]
pub fn merge(
    existing: &ProductInsight,
    incoming: &ProductInsight,
    policy: TerpeneMergePolicy,
) -> ProductInsight {
    let mut merged = existing.clone();
    merge_into(&mut merged, incoming, policy);
    merged
}

/// Folds a newer partial insight into `existing` in place.
///
/// - `name`: the first non-empty name sticks.
/// - `url`: a non-empty incoming url overwrites.
/// - `cannabinoids`: incoming keys overwrite, other keys are kept.
/// - `terpenes`: a non-empty incoming profile replaces the existing one.
///   Under [`TerpeneMergePolicy::PreferDetailed`] it only does so when its
///   granularity is at least the existing one.
///
/// Absent or empty incoming fields never blank existing ones, and merging the
/// same partial twice is the same as merging it once.
pub fn merge_into(
    existing: &mut ProductInsight,
    incoming: &ProductInsight,
    policy: TerpeneMergePolicy,
) {
    if existing.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
        if let Some(name) = incoming.name.as_deref().filter(|n| !n.trim().is_empty()) {
            existing.name = Some(name.to_owned());
        }
    }

    if let Some(url) = incoming.url.as_deref().filter(|u| !u.is_empty()) {
        existing.url = Some(url.to_owned());
    }

    if let Some(incoming_set) = incoming.cannabinoids.as_ref().filter(|c| !c.is_empty()) {
        match existing.cannabinoids.as_mut() {
            Some(set) => set.overlay(incoming_set),
            None => existing.cannabinoids = Some(incoming_set.clone()),
        }
    }

    if let Some(profile) = incoming.terpenes.as_ref().filter(|t| !t.is_empty()) {
        let replace = match policy {
            TerpeneMergePolicy::Replace => true,
            TerpeneMergePolicy::PreferDetailed => {
                profile.granularity() >= existing.terpene_granularity()
            }
        };
        if replace {
            existing.terpenes = Some(profile.clone());
        } else {
            tracing::debug!(
                incoming = ?profile.granularity(),
                existing = ?existing.terpene_granularity(),
                "kept more detailed terpene profile"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use potency_core::{CannabinoidSet, TerpeneEntry, TerpeneProfile};

    fn cannabinoids(pairs: &[(&str, f64)]) -> Option<CannabinoidSet> {
        Some(pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect())
    }

    fn detailed() -> Option<TerpeneProfile> {
        Some(TerpeneProfile::Detailed(vec![
            TerpeneEntry::new("Limonene", 0.4),
            TerpeneEntry::new("Linalool", 0.2),
        ]))
    }

    fn existing() -> ProductInsight {
        ProductInsight {
            url: Some("https://shop/product/a".to_string()),
            name: Some("Blue Dream".to_string()),
            cannabinoids: cannabinoids(&[("THC", 20.0), ("CBD", 0.5)]),
            terpenes: detailed(),
        }
    }

    #[test]
    fn empty_incoming_changes_nothing() {
        let e = existing();
        assert_eq!(merge(&e, &ProductInsight::default(), TerpeneMergePolicy::Replace), e);
    }

    #[test]
    fn cannabinoids_merge_key_by_key() {
        let incoming = ProductInsight {
            cannabinoids: cannabinoids(&[("THC", 22.0), ("CBG", 1.0)]),
            ..ProductInsight::default()
        };
        let merged = merge(&existing(), &incoming, TerpeneMergePolicy::Replace);
        let set = merged.cannabinoids.unwrap();
        assert_eq!(set.get("THC"), Some(22.0));
        assert_eq!(set.get("CBD"), Some(0.5));
        assert_eq!(set.get("CBG"), Some(1.0));
    }

    #[test]
    fn name_is_never_overwritten() {
        let incoming = ProductInsight {
            name: Some("Other".to_string()),
            ..ProductInsight::default()
        };
        let merged = merge(&existing(), &incoming, TerpeneMergePolicy::Replace);
        assert_eq!(merged.name.as_deref(), Some("Blue Dream"));
    }

    #[test]
    fn blank_name_is_filled() {
        let mut e = existing();
        e.name = Some("  ".to_string());
        let incoming = ProductInsight {
            name: Some("Blue Dream".to_string()),
            ..ProductInsight::default()
        };
        merge_into(&mut e, &incoming, TerpeneMergePolicy::Replace);
        assert_eq!(e.name.as_deref(), Some("Blue Dream"));
    }

    #[test]
    fn latest_url_overwrites() {
        let incoming = ProductInsight {
            url: Some("https://shop/product/b".to_string()),
            ..ProductInsight::default()
        };
        let merged = merge(&existing(), &incoming, TerpeneMergePolicy::Replace);
        assert_eq!(merged.url.as_deref(), Some("https://shop/product/b"));
    }

    #[test]
    fn replace_policy_accepts_total_only_over_detailed() {
        let incoming = ProductInsight {
            terpenes: Some(TerpeneProfile::total_only(1.5)),
            ..ProductInsight::default()
        };
        let merged = merge(&existing(), &incoming, TerpeneMergePolicy::Replace);
        assert_eq!(merged.terpenes, Some(TerpeneProfile::total_only(1.5)));
    }

    #[test]
    fn prefer_detailed_keeps_breakdown() {
        let incoming = ProductInsight {
            terpenes: Some(TerpeneProfile::total_only(1.5)),
            ..ProductInsight::default()
        };
        let merged = merge(&existing(), &incoming, TerpeneMergePolicy::PreferDetailed);
        assert_eq!(merged.terpenes, detailed());
    }

    #[test]
    fn prefer_detailed_upgrades_total_only() {
        let mut e = existing();
        e.terpenes = Some(TerpeneProfile::total_only(1.5));
        let incoming = ProductInsight {
            terpenes: detailed(),
            ..ProductInsight::default()
        };
        merge_into(&mut e, &incoming, TerpeneMergePolicy::PreferDetailed);
        assert_eq!(e.terpenes, detailed());
    }

    #[test]
    fn empty_incoming_profile_is_ignored() {
        let incoming = ProductInsight {
            terpenes: Some(TerpeneProfile::Detailed(Vec::new())),
            ..ProductInsight::default()
        };
        let merged = merge(&existing(), &incoming, TerpeneMergePolicy::Replace);
        assert_eq!(merged.terpenes, detailed());
    }

    #[test]
    fn merging_twice_is_idempotent() {
        let incoming = ProductInsight {
            url: Some("https://shop/product/b".to_string()),
            name: Some("Other".to_string()),
            cannabinoids: cannabinoids(&[("THCA", 24.0)]),
            terpenes: Some(TerpeneProfile::total_only(2.0)),
        };
        for policy in [TerpeneMergePolicy::Replace, TerpeneMergePolicy::PreferDetailed] {
            let once = merge(&existing(), &incoming, policy);
            let twice = merge(&once, &incoming, policy);
            assert_eq!(once, twice);
        }
    }
}
