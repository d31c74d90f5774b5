use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to serialize insight for {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to deserialize cached insight for {key}: {source}")]
    Deserialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompareError {
    #[error("comparison needs 2 or 3 products, got {count}")]
    SelectionSize { count: usize },
}
