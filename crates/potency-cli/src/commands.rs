//! Command handlers. Each one reads or merges into the shared store; `main`
//! persists the store afterwards.

use std::path::Path;

use anyhow::{bail, Context};
use futures::future::join_all;
use potency_core::{AppConfig, FetchOutcome, ProductInsight};
use potency_extract::{compare, extract_from_page, extract_insight, ExtractOptions, InsightStore};
use potency_scraper::{read_page, PageClient};
use serde_json::Value;

use crate::render::{render_comparison, render_insight};

/// A page fetch is worthwhile while cannabinoids are missing or the terpene
/// profile is not a per-compound breakdown.
pub(crate) fn needs_page_fetch(cached: Option<&ProductInsight>) -> bool {
    cached.is_none_or(|insight| !insight.has_cannabinoid_info() || !insight.has_detailed_terpenes())
}

/// Extracts every record in `file` and merges each into its slot.
pub(crate) fn run_extract(
    store: &InsightStore,
    config: &AppConfig,
    file: &Path,
    key: Option<&str>,
    url: Option<&str>,
) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;

    let records = match value {
        Value::Array(items) => items,
        other => vec![other],
    };
    if key.is_some() && records.len() > 1 {
        bail!("--key applies to a single record, but the file holds {}", records.len());
    }

    let options = ExtractOptions::from_app_config(config);
    let mut merged = 0usize;
    for (index, record) in records.iter().enumerate() {
        let Some(insight) = extract_insight(record, url, &options) else {
            tracing::warn!(index, "record yielded no product data");
            continue;
        };
        let Some(slot_key) = key.map(str::to_owned).or_else(|| insight.url.clone()) else {
            tracing::warn!(index, "record has no URL; pass --key to cache it");
            continue;
        };
        if let Some(stored) = store.merge(&slot_key, &insight) {
            println!("{}", render_insight(&stored));
            merged += 1;
        }
    }

    if merged == 0 {
        bail!("no product data found in {}", file.display());
    }
    tracing::info!(merged, "extracted records");
    Ok(())
}

/// Extracts a saved product page and merges it into slot `key`.
pub(crate) fn run_scan(
    store: &InsightStore,
    html_file: &Path,
    key: &str,
    url: Option<&str>,
) -> anyhow::Result<()> {
    let html = std::fs::read_to_string(html_file)
        .with_context(|| format!("failed to read {}", html_file.display()))?;
    let page = read_page(&html);
    let insight = extract_from_page(&page, url);

    match store.merge(key, &insight) {
        Some(stored) => {
            println!("{}", render_insight(&stored));
            Ok(())
        }
        None => bail!("no product data found in {}", html_file.display()),
    }
}

/// Fetches `url` unless its cached insight is already complete.
pub(crate) async fn run_fetch(
    store: &InsightStore,
    config: &AppConfig,
    url: &str,
    force: bool,
) -> anyhow::Result<()> {
    let cached = store.get(url);
    if !force && !needs_page_fetch(cached.as_ref()) {
        tracing::info!(url, "cached insight already detailed; skipping fetch");
        if let Some(insight) = cached {
            println!("{}", render_insight(&insight));
        }
        return Ok(());
    }

    let client = PageClient::from_config(config)?;
    let outcome = client.fetch_insight(url).await;
    let failure = match &outcome {
        FetchOutcome::Failed { reason } => Some(reason.clone()),
        FetchOutcome::Fetched(_) => None,
    };

    match (store.apply(url, &outcome), failure) {
        (Some(stored), failure) => {
            if let Some(reason) = failure {
                eprintln!("fetch failed ({reason}); showing cached data");
            }
            println!("{}", render_insight(&stored));
            Ok(())
        }
        (None, Some(reason)) => bail!("fetch failed for {url}: {reason}"),
        (None, None) => bail!("no product data found at {url}"),
    }
}

pub(crate) fn run_show(store: &InsightStore, key: &str) -> anyhow::Result<()> {
    let Some(insight) = store.get(key) else {
        bail!("no cached insight for {key}");
    };
    println!("{}", render_insight(&insight));
    Ok(())
}

/// Keys that look like page URLs and still need detail.
fn keys_to_fetch<'a>(store: &InsightStore, keys: &'a [String]) -> Vec<&'a str> {
    keys.iter()
        .map(String::as_str)
        .filter(|k| k.starts_with("http://") || k.starts_with("https://"))
        .filter(|k| needs_page_fetch(store.get(k).as_ref()))
        .collect()
}

/// Compares the cached insights for `keys`, fetching pages concurrently first
/// when `fetch` is set. Keys with nothing cached show up as empty columns.
pub(crate) async fn run_compare(
    store: &InsightStore,
    config: &AppConfig,
    keys: &[String],
    fetch: bool,
) -> anyhow::Result<()> {
    if fetch {
        let pending = keys_to_fetch(store, keys);
        if !pending.is_empty() {
            let client = PageClient::from_config(config)?;
            let outcomes = join_all(pending.iter().map(|url| client.fetch_insight(url))).await;
            for (url, outcome) in pending.iter().zip(&outcomes) {
                store.apply(url, outcome);
            }
        }
    }

    let selection: Vec<ProductInsight> = keys
        .iter()
        .map(|key| {
            store.get(key).unwrap_or_else(|| {
                tracing::warn!(key = key.as_str(), "no cached insight; comparing as empty");
                ProductInsight {
                    url: Some(key.clone()),
                    ..ProductInsight::default()
                }
            })
        })
        .collect();

    let comparison = compare(&selection)?;
    print!("{}", render_comparison(&comparison));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use potency_core::{CannabinoidSet, TerpeneEntry, TerpeneProfile, TerpeneMergePolicy};

    fn complete() -> ProductInsight {
        let mut set = CannabinoidSet::new();
        set.insert("THC", 20.0);
        ProductInsight {
            cannabinoids: Some(set),
            terpenes: Some(TerpeneProfile::Detailed(vec![TerpeneEntry::new(
                "Limonene", 0.3,
            )])),
            ..ProductInsight::default()
        }
    }

    #[test]
    fn missing_insight_needs_fetch() {
        assert!(needs_page_fetch(None));
    }

    #[test]
    fn total_only_profile_needs_fetch() {
        let mut insight = complete();
        insight.terpenes = Some(TerpeneProfile::total_only(1.2));
        assert!(needs_page_fetch(Some(&insight)));
    }

    #[test]
    fn missing_cannabinoids_need_fetch() {
        let mut insight = complete();
        insight.cannabinoids = None;
        assert!(needs_page_fetch(Some(&insight)));
    }

    #[test]
    fn complete_insight_needs_no_fetch() {
        assert!(!needs_page_fetch(Some(&complete())));
    }

    #[test]
    fn only_incomplete_url_keys_are_fetched() {
        let store = InsightStore::new(TerpeneMergePolicy::Replace);
        store.merge("https://shop/product/done", &complete());
        let keys = vec![
            "https://shop/product/done".to_string(),
            "https://shop/product/new".to_string(),
            "local-key".to_string(),
        ];
        assert_eq!(keys_to_fetch(&store, &keys), vec!["https://shop/product/new"]);
    }
}
