//! File-backed persistence for the insight store.
//!
//! The cache file keeps each entity's insight as the encoded text the store
//! holds, so an entry that no longer decodes only costs that one entity.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use potency_core::TerpeneMergePolicy;
use potency_extract::InsightStore;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CacheFile {
    pub(crate) updated_at: DateTime<Utc>,
    #[serde(default)]
    pub(crate) entries: BTreeMap<String, String>,
}

/// Loads the store from `path`. A missing or unreadable cache file yields an
/// empty store.
pub(crate) fn load_store(path: &Path, policy: TerpeneMergePolicy) -> anyhow::Result<InsightStore> {
    if !path.exists() {
        return Ok(InsightStore::new(policy));
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read cache file {}", path.display()))?;

    match serde_json::from_str::<CacheFile>(&raw) {
        Ok(file) => {
            tracing::debug!(
                path = %path.display(),
                entries = file.entries.len(),
                updated_at = %file.updated_at,
                "loaded insight cache"
            );
            Ok(InsightStore::with_entries(policy, file.entries))
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable insight cache");
            Ok(InsightStore::new(policy))
        }
    }
}

/// Writes every populated slot of `store` to `path`, creating parent
/// directories as needed.
pub(crate) fn save_store(path: &Path, store: &InsightStore) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create cache directory {}", parent.display()))?;
    }

    let file = CacheFile {
        updated_at: Utc::now(),
        entries: store.snapshot(),
    };
    let json = serde_json::to_string_pretty(&file).context("failed to encode insight cache")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write cache file {}", path.display()))?;

    tracing::debug!(path = %path.display(), entries = file.entries.len(), "saved insight cache");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use potency_core::{CannabinoidSet, ProductInsight};

    fn temp_cache(name: &str) -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("potency-cli-{}-{name}", std::process::id()))
            .join("insights.json")
    }

    #[test]
    fn missing_file_is_empty_store() {
        let store = load_store(&temp_cache("missing"), TerpeneMergePolicy::Replace).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn save_then_load_keeps_entries() {
        let path = temp_cache("roundtrip");
        let store = InsightStore::new(TerpeneMergePolicy::Replace);
        let mut set = CannabinoidSet::new();
        set.insert("THC", 21.5);
        let insight = ProductInsight {
            name: Some("Gelato".to_string()),
            cannabinoids: Some(set),
            ..ProductInsight::default()
        };
        store.merge("gelato", &insight);

        save_store(&path, &store).unwrap();
        let loaded = load_store(&path, TerpeneMergePolicy::Replace).unwrap();
        assert_eq!(loaded.get("gelato"), Some(insight));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn corrupt_file_is_empty_store() {
        let path = temp_cache("corrupt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();

        let store = load_store(&path, TerpeneMergePolicy::Replace).unwrap();
        assert!(store.is_empty());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
