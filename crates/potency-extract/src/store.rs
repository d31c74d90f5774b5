//! Per-entity insight cache with serialized merges.
//!
//! Each entity key owns a slot holding the JSON text of its merged insight.
//! Merges into one slot are applied under that slot's lock, in arrival order;
//! different entities never contend beyond the brief map lookup.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use potency_core::{FetchOutcome, ProductInsight, TerpeneMergePolicy};
use serde::ser::Error as _;
use serde_json::Value;

use crate::error::StoreError;
use crate::merge::merge_into;

type Slot = Arc<Mutex<Option<String>>>;

/// Thread-safe map from entity key to its merged [`ProductInsight`].
#[derive(Debug, Default)]
pub struct InsightStore {
    policy: TerpeneMergePolicy,
    slots: Mutex<HashMap<String, Slot>>,
}

/// Encodes an insight as cache text.
///
/// # Errors
///
/// Returns [`StoreError::Serialize`] if the insight cannot be encoded or
/// holds a NaN or infinite percentage, which JSON would silently turn into
/// `null`.
pub fn encode(key: &str, insight: &ProductInsight) -> Result<String, StoreError> {
    let serialize_error = |source: serde_json::Error| StoreError::Serialize {
        key: key.to_owned(),
        source,
    };
    if let Some(label) = first_non_finite(insight) {
        return Err(serialize_error(serde_json::Error::custom(format!(
            "non-finite percentage for {label}"
        ))));
    }
    serde_json::to_string(insight).map_err(serialize_error)
}

fn first_non_finite(insight: &ProductInsight) -> Option<&str> {
    let cannabinoids = insight.cannabinoids.iter().flat_map(|set| set.iter());
    let terpenes = insight.terpenes.iter().flat_map(|profile| profile.entries());
    cannabinoids
        .chain(terpenes)
        .find(|(_, value)| !value.is_finite())
        .map(|(label, _)| label)
}

/// Decodes cache text back into an insight.
///
/// # Errors
///
/// Returns [`StoreError::Deserialize`] if `text` is not a JSON object holding
/// an encoded insight.
pub fn decode(key: &str, text: &str) -> Result<ProductInsight, StoreError> {
    let deserialize_error = |source: serde_json::Error| StoreError::Deserialize {
        key: key.to_owned(),
        source,
    };
    let value: Value = serde_json::from_str(text).map_err(deserialize_error)?;
    if !value.is_object() {
        return Err(deserialize_error(<serde_json::Error as serde::de::Error>::custom(
            "cached insight is not a JSON object",
        )));
    }
    serde_json::from_value(value).map_err(deserialize_error)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Undecodable text counts as a miss.
fn decode_or_miss(key: &str, text: Option<&str>) -> Option<ProductInsight> {
    match decode(key, text?) {
        Ok(insight) => Some(insight),
        Err(err) => {
            tracing::warn!(key, error = %err, "discarding unreadable cached insight");
            None
        }
    }
}

impl InsightStore {
    #[must_use]
    pub fn new(policy: TerpeneMergePolicy) -> Self {
        Self {
            policy,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Builds a store over previously persisted `(key, encoded insight)` pairs.
    /// Entries are not decoded until read.
    #[must_use]
    pub fn with_entries<I>(policy: TerpeneMergePolicy, entries: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let slots = entries
            .into_iter()
            .map(|(key, text)| (key, Arc::new(Mutex::new(Some(text)))))
            .collect();
        Self {
            policy,
            slots: Mutex::new(slots),
        }
    }

    #[must_use]
    pub fn policy(&self) -> TerpeneMergePolicy {
        self.policy
    }

    fn slot(&self, key: &str) -> Slot {
        let mut slots = lock(&self.slots);
        Arc::clone(slots.entry(key.to_owned()).or_default())
    }

    fn existing_slot(&self, key: &str) -> Option<Slot> {
        lock(&self.slots).get(key).map(Arc::clone)
    }

    /// The cached insight for `key`, or `None` on a miss or unreadable entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<ProductInsight> {
        let slot = self.existing_slot(key)?;
        let text = lock(&slot);
        decode_or_miss(key, text.as_deref())
    }

    /// Merges `incoming` into the slot for `key` and returns the slot's
    /// resulting insight.
    ///
    /// If the merged insight cannot be encoded, the slot keeps its prior
    /// value, which is what gets returned.
    pub fn merge(&self, key: &str, incoming: &ProductInsight) -> Option<ProductInsight> {
        let slot = self.slot(key);
        let mut text = lock(&slot);

        let prior = decode_or_miss(key, text.as_deref());
        let mut merged = prior.clone().unwrap_or_default();
        merge_into(&mut merged, incoming, self.policy);

        if merged.is_empty() {
            return prior;
        }

        match encode(key, &merged) {
            Ok(encoded) => {
                *text = Some(encoded);
                tracing::debug!(
                    key,
                    granularity = ?merged.terpene_granularity(),
                    "merged insight"
                );
                Some(merged)
            }
            Err(err) => {
                tracing::warn!(key, error = %err, "keeping prior cached insight");
                prior
            }
        }
    }

    /// Merges a successful fetch. A failed fetch merges nothing and returns
    /// whatever is already cached.
    pub fn apply(&self, key: &str, outcome: &FetchOutcome) -> Option<ProductInsight> {
        match outcome {
            FetchOutcome::Fetched(insight) => self.merge(key, insight),
            FetchOutcome::Failed { reason } => {
                tracing::warn!(key, reason = reason.as_str(), "fetch failed; cached insight kept");
                self.get(key)
            }
        }
    }

    /// Drops the slot for `key`, returning its last readable insight.
    pub fn remove(&self, key: &str) -> Option<ProductInsight> {
        let slot = lock(&self.slots).remove(key)?;
        let text = lock(&slot);
        decode_or_miss(key, text.as_deref())
    }

    /// Encoded text of every populated slot, ordered by key, for persistence.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        let slots: Vec<(String, Slot)> = lock(&self.slots)
            .iter()
            .map(|(k, v)| (k.clone(), Arc::clone(v)))
            .collect();
        slots
            .into_iter()
            .filter_map(|(key, slot)| lock(&slot).clone().map(|text| (key, text)))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.slots)
            .values()
            .filter(|slot| lock(slot).is_some())
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
