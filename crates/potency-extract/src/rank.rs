//! Side-by-side comparison of 2 or 3 insights with per-row rank tiers.

use std::collections::BTreeSet;

use potency_core::{ProductInsight, PREFERRED_CANNABINOIDS};
use serde::Serialize;

use crate::canonical::display_name;
use crate::error::CompareError;

/// Fewest and most insights a comparison accepts.
pub const MIN_SELECTION: usize = 2;
pub const MAX_SELECTION: usize = 3;

/// Rank of one cell within its row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankTier {
    /// Holds the row's highest positive value (ties share it).
    Max,
    /// Holds the next distinct positive value below the maximum.
    Second,
    /// Zero or unknown.
    Muted,
    /// Positive, but below the second tier.
    Unranked,
}

/// One attribute across every compared insight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub label: String,
    /// One value per insight, in selection order. `None` is unknown.
    pub values: Vec<Option<f64>>,
    /// Tier of each value, parallel to `values`.
    pub tiers: Vec<RankTier>,
}

impl ComparisonRow {
    fn new(label: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        let tiers = rank_values(&values);
        Self {
            label: label.into(),
            values,
            tiers,
        }
    }

    fn indices_of(&self, tier: RankTier) -> Vec<usize> {
        self.tiers
            .iter()
            .enumerate()
            .filter(|(_, t)| **t == tier)
            .map(|(i, _)| i)
            .collect()
    }

    #[must_use]
    pub fn max_indices(&self) -> Vec<usize> {
        self.indices_of(RankTier::Max)
    }

    #[must_use]
    pub fn second_indices(&self) -> Vec<usize> {
        self.indices_of(RankTier::Second)
    }

    #[must_use]
    pub fn muted_indices(&self) -> Vec<usize> {
        self.indices_of(RankTier::Muted)
    }

    /// Rows are shown only when some value is strictly positive.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.values.iter().any(|v| is_positive(*v))
    }
}

/// Visible rows for a selection of insights.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    /// Column header per insight.
    pub headers: Vec<String>,
    pub cannabinoids: Vec<ComparisonRow>,
    pub terpenes: Vec<ComparisonRow>,
}

fn is_positive(value: Option<f64>) -> bool {
    value.is_some_and(|v| v > 0.0)
}

/// Assigns a tier to each value: the largest positive value is `Max`, the
/// next distinct positive value `Second`, zero or unknown values `Muted`.
#[must_use]
pub fn rank_values(values: &[Option<f64>]) -> Vec<RankTier> {
    let mut distinct: Vec<f64> = values
        .iter()
        .copied()
        .filter(|v| is_positive(*v))
        .flatten()
        .collect();
    distinct.sort_by(|a, b| b.total_cmp(a));
    distinct.dedup();

    let max = distinct.first().copied();
    let second = distinct.get(1).copied();

    values
        .iter()
        .map(|v| match *v {
            Some(v) if v > 0.0 && Some(v) == max => RankTier::Max,
            Some(v) if v > 0.0 && Some(v) == second => RankTier::Second,
            Some(v) if v > 0.0 => RankTier::Unranked,
            _ => RankTier::Muted,
        })
        .collect()
}

/// Preferred cannabinoids first, then any other key present in a selected
/// insight, sorted.
#[must_use]
pub fn cannabinoid_labels(insights: &[ProductInsight]) -> Vec<String> {
    let extras: BTreeSet<&str> = insights
        .iter()
        .filter_map(|i| i.cannabinoids.as_ref())
        .flat_map(|c| c.keys())
        .filter(|k| !PREFERRED_CANNABINOIDS.contains(k))
        .collect();

    PREFERRED_CANNABINOIDS
        .iter()
        .copied()
        .chain(extras)
        .map(str::to_owned)
        .collect()
}

/// Union of canonical terpene names across the selection, sorted.
#[must_use]
pub fn terpene_labels(insights: &[ProductInsight]) -> Vec<String> {
    insights
        .iter()
        .filter_map(|i| i.terpenes.as_ref())
        .flat_map(|t| t.entries().into_iter().map(|(label, _)| display_name(label)))
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}

/// `THC` and `CBD` fall back to their totals when unknown.
fn cannabinoid_cell(insight: &ProductInsight, label: &str) -> Option<f64> {
    let set = insight.cannabinoids.as_ref()?;
    set.get(label).or_else(|| match label {
        "THC" => set.get("totalTHC"),
        "CBD" => set.get("totalCBD"),
        _ => None,
    })
}

fn terpene_cell(insight: &ProductInsight, label: &str) -> Option<f64> {
    insight
        .terpenes
        .as_ref()?
        .entries()
        .into_iter()
        .filter(|(name, _)| display_name(name) == label)
        .map(|(_, v)| v)
        .reduce(f64::max)
}

/// Builds the ranked comparison of 2 or 3 insights, in selection order.
///
/// # Errors
///
/// Returns [`CompareError::SelectionSize`] for fewer than two or more than
/// three insights.
pub fn compare(insights: &[ProductInsight]) -> Result<Comparison, CompareError> {
    if !(MIN_SELECTION..=MAX_SELECTION).contains(&insights.len()) {
        return Err(CompareError::SelectionSize {
            count: insights.len(),
        });
    }

    let build = |labels: Vec<String>, cell: fn(&ProductInsight, &str) -> Option<f64>| {
        labels
            .into_iter()
            .map(|label| {
                let values = insights.iter().map(|i| cell(i, &label)).collect();
                ComparisonRow::new(label, values)
            })
            .filter(ComparisonRow::is_visible)
            .collect::<Vec<_>>()
    };

    let comparison = Comparison {
        headers: insights
            .iter()
            .enumerate()
            .map(|(i, insight)| insight.display_name(i + 1))
            .collect(),
        cannabinoids: build(cannabinoid_labels(insights), cannabinoid_cell),
        terpenes: build(terpene_labels(insights), terpene_cell),
    };

    tracing::debug!(
        products = insights.len(),
        cannabinoid_rows = comparison.cannabinoids.len(),
        terpene_rows = comparison.terpenes.len(),
        "built comparison"
    );

    Ok(comparison)
}

#[cfg(test)]
mod tests {
    use super::*;
    use potency_core::{CannabinoidSet, TerpeneEntry, TerpeneProfile};

    fn with_cannabinoids(pairs: &[(&str, f64)]) -> ProductInsight {
        ProductInsight {
            cannabinoids: Some(
                pairs
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), *v))
                    .collect::<CannabinoidSet>(),
            ),
            ..ProductInsight::default()
        }
    }

    fn with_terpenes(entries: &[(&str, f64)]) -> ProductInsight {
        ProductInsight {
            terpenes: Some(TerpeneProfile::Detailed(
                entries
                    .iter()
                    .map(|(n, v)| TerpeneEntry::new(*n, *v))
                    .collect(),
            )),
            ..ProductInsight::default()
        }
    }

    fn row<'a>(rows: &'a [ComparisonRow], label: &str) -> Option<&'a ComparisonRow> {
        rows.iter().find(|r| r.label == label)
    }

    #[test]
    fn ties_at_max_and_distinct_second() {
        assert_eq!(
            rank_values(&[Some(10.0), Some(10.0), Some(4.0)]),
            vec![RankTier::Max, RankTier::Max, RankTier::Second]
        );
    }

    #[test]
    fn zero_and_unknown_are_muted() {
        assert_eq!(
            rank_values(&[Some(0.0), None, Some(3.0)]),
            vec![RankTier::Muted, RankTier::Muted, RankTier::Max]
        );
    }

    #[test]
    fn third_distinct_value_is_unranked() {
        assert_eq!(
            rank_values(&[Some(1.0), Some(3.0), Some(2.0)]),
            vec![RankTier::Unranked, RankTier::Max, RankTier::Second]
        );
    }

    #[test]
    fn zero_rows_are_hidden() {
        let a = with_cannabinoids(&[("THC", 0.0), ("CBD", 12.0), ("CBN", 0.0)]);
        let b = with_cannabinoids(&[("THC", 5.0), ("CBD", 0.0)]);
        let cmp = compare(&[a, b]).unwrap();

        let thc = row(&cmp.cannabinoids, "THC").unwrap();
        assert_eq!(thc.max_indices(), vec![1]);
        assert_eq!(thc.muted_indices(), vec![0]);

        let cbd = row(&cmp.cannabinoids, "CBD").unwrap();
        assert_eq!(cbd.max_indices(), vec![0]);

        assert!(row(&cmp.cannabinoids, "CBN").is_none());
        assert_eq!(cmp.cannabinoids.len(), 2);
    }

    #[test]
    fn thc_falls_back_to_total() {
        let a = with_cannabinoids(&[("totalTHC", 21.0)]);
        let b = with_cannabinoids(&[("THC", 19.0)]);
        let cmp = compare(&[a, b]).unwrap();
        let thc = row(&cmp.cannabinoids, "THC").unwrap();
        assert_eq!(thc.values, vec![Some(21.0), Some(19.0)]);
        assert_eq!(thc.second_indices(), vec![1]);
    }

    #[test]
    fn extra_cannabinoids_follow_preferred_sorted() {
        let a = with_cannabinoids(&[("THCV", 0.3), ("CBT", 0.1)]);
        let labels = cannabinoid_labels(&[a]);
        assert_eq!(&labels[..PREFERRED_CANNABINOIDS.len()], &PREFERRED_CANNABINOIDS);
        assert_eq!(&labels[PREFERRED_CANNABINOIDS.len()..], &["CBT", "THCV"]);
    }

    #[test]
    fn terpene_rows_use_canonical_names_sorted() {
        let a = with_terpenes(&[("myrcene", 0.5), ("Limonene", 0.2)]);
        let b = with_terpenes(&[("Beta-Myrcene", 0.7)]);
        let cmp = compare(&[a, b]).unwrap();

        let labels: Vec<&str> = cmp.terpenes.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Beta-Myrcene", "Limonene"]);

        let myrcene = row(&cmp.terpenes, "Beta-Myrcene").unwrap();
        assert_eq!(myrcene.max_indices(), vec![1]);
        assert_eq!(myrcene.second_indices(), vec![0]);
    }

    #[test]
    fn total_only_profile_gets_total_row() {
        let a = ProductInsight {
            terpenes: Some(TerpeneProfile::total_only(1.9)),
            ..ProductInsight::default()
        };
        let b = with_terpenes(&[("Limonene", 0.2)]);
        let cmp = compare(&[a, b]).unwrap();
        let total = row(&cmp.terpenes, "Total Terpenes").unwrap();
        assert_eq!(total.values, vec![Some(1.9), None]);
    }

    #[test]
    fn headers_fall_back_to_url_then_position() {
        let a = ProductInsight {
            name: Some("Blue Dream".to_string()),
            ..with_cannabinoids(&[("THC", 1.0)])
        };
        let b = ProductInsight {
            url: Some("https://shop/product/b".to_string()),
            ..ProductInsight::default()
        };
        let c = ProductInsight::default();
        let cmp = compare(&[a, b, c]).unwrap();
        assert_eq!(
            cmp.headers,
            vec!["Blue Dream", "https://shop/product/b", "Product 3"]
        );
    }

    #[test]
    fn selection_size_is_checked() {
        let one = vec![ProductInsight::default()];
        assert_eq!(
            compare(&one).unwrap_err(),
            CompareError::SelectionSize { count: 1 }
        );
        let four = vec![ProductInsight::default(); 4];
        assert_eq!(
            compare(&four).unwrap_err(),
            CompareError::SelectionSize { count: 4 }
        );
    }
}
