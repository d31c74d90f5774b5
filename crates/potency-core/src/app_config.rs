use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// How an incoming terpene profile is reconciled with the one already cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TerpeneMergePolicy {
    /// Any non-empty incoming profile replaces the cached one, even when that
    /// downgrades a per-compound breakdown to a total-only figure.
    #[default]
    Replace,
    /// A non-empty incoming profile replaces the cached one only when its
    /// granularity is at least the cached granularity.
    PreferDetailed,
}

impl std::fmt::Display for TerpeneMergePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerpeneMergePolicy::Replace => write!(f, "replace"),
            TerpeneMergePolicy::PreferDetailed => write!(f, "prefer-detailed"),
        }
    }
}

impl std::str::FromStr for TerpeneMergePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(TerpeneMergePolicy::Replace),
            "prefer-detailed" | "prefer_detailed" => Ok(TerpeneMergePolicy::PreferDetailed),
            other => Err(format!(
                "unknown terpene merge policy \"{other}\" (expected replace or prefer-detailed)"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub cache_path: PathBuf,
    /// Base URL an entity URL is built from when a record only carries a slug or id.
    pub product_base_url: String,
    /// Number of object levels the structural extractor descends into.
    pub max_scan_depth: usize,
    pub terpene_merge_policy: TerpeneMergePolicy,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
}
