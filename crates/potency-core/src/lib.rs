//! Domain types and configuration shared by the potency insight crates.

pub mod app_config;
pub mod config;
pub mod insight;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, TerpeneMergePolicy};
pub use config::{load_app_config, load_app_config_from_env};
pub use insight::{
    is_total_terpenes_label, CannabinoidSet, FetchOutcome, Granularity, ProductInsight,
    TerpeneEntry, TerpeneProfile, PREFERRED_CANNABINOIDS, TOTAL_TERPENES_LABEL,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
