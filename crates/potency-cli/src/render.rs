//! Plain-text rendering of insights and comparison tables.

use std::fmt::Write as _;

use potency_core::ProductInsight;
use potency_extract::rank::cannabinoid_labels;
use potency_extract::{Comparison, ComparisonRow, RankTier};

const NOT_AVAILABLE: &str = "N/A";

/// Summary of one insight. Zero values are left out; cannabinoids are shown
/// with two decimals.
pub(crate) fn render_insight(insight: &ProductInsight) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", insight.display_name(1));
    let named = insight.name.as_deref().is_some_and(|n| !n.trim().is_empty());
    if let Some(url) = insight.url.as_deref().filter(|u| named && !u.is_empty()) {
        let _ = writeln!(out, "  {url}");
    }

    out.push_str("Cannabinoids:\n");
    let cannabinoids: Vec<String> = insight
        .cannabinoids
        .as_ref()
        .map(|set| {
            cannabinoid_labels(std::slice::from_ref(insight))
                .into_iter()
                .filter_map(|label| {
                    let value = set.get(&label).filter(|v| *v > 0.0)?;
                    Some(format!("{label}: {value:.2}%"))
                })
                .collect()
        })
        .unwrap_or_default();
    push_lines(&mut out, &cannabinoids);

    out.push_str("Terpenes:\n");
    let terpenes: Vec<String> = insight
        .terpenes
        .as_ref()
        .map(|profile| {
            profile
                .entries()
                .into_iter()
                .filter(|(_, v)| *v > 0.0)
                .map(|(name, v)| format!("{name}: {v}%"))
                .collect()
        })
        .unwrap_or_default();
    push_lines(&mut out, &terpenes);

    out
}

fn push_lines(out: &mut String, lines: &[String]) {
    if lines.is_empty() {
        let _ = writeln!(out, "  {NOT_AVAILABLE}");
    }
    for line in lines {
        let _ = writeln!(out, "  {line}");
    }
}

/// A cell's text: the percentage (`-` when unknown) followed by `*` for the
/// row maximum or `+` for the runner-up.
pub(crate) fn format_cell(value: Option<f64>, tier: RankTier) -> String {
    let text = value.map_or_else(|| "-".to_string(), |v| format!("{v}%"));
    match tier {
        RankTier::Max => format!("{text}*"),
        RankTier::Second => format!("{text}+"),
        RankTier::Muted | RankTier::Unranked => text,
    }
}

/// Column-aligned table with a cannabinoid block and a terpene block.
pub(crate) fn render_comparison(comparison: &Comparison) -> String {
    let mut rows: Vec<Vec<String>> = Vec::new();

    let mut header = vec![String::new()];
    header.extend(comparison.headers.iter().cloned());
    rows.push(header);

    let mut section = |title: &str, block: &[ComparisonRow]| {
        if block.is_empty() {
            return;
        }
        rows.push(vec![format!("[{title}]")]);
        for row in block {
            let mut cells = vec![row.label.clone()];
            cells.extend(
                row.values
                    .iter()
                    .zip(&row.tiers)
                    .map(|(v, t)| format_cell(*v, *t)),
            );
            rows.push(cells);
        }
    };
    section("Cannabinoids", &comparison.cannabinoids);
    section("Terpenes", &comparison.terpenes);

    let columns = comparison.headers.len() + 1;
    let widths: Vec<usize> = (0..columns)
        .map(|c| {
            rows.iter()
                .filter(|r| r.len() == columns)
                .filter_map(|r| r.get(c))
                .map(|s| s.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    for row in &rows {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{cell:<w$}"))
            .collect::<Vec<_>>()
            .join("  ");
        let _ = writeln!(out, "{}", line.trim_end());
    }
    out.push_str("\n* highest  + second highest\n");
    out
}
