use std::env::VarError;
use std::path::PathBuf;
use std::str::FromStr;

use crate::app_config::{AppConfig, Environment, TerpeneMergePolicy};
use crate::ConfigError;

/// Reads `.env` (if any) into the process environment, then builds the config.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for a variable that is set but does
/// not parse.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Builds the config from the current process environment only.
///
/// # Errors
///
/// See [`load_app_config`].
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Typed access to `POTENCY_*` variables through an injectable lookup.
struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    fn text(&self, var: &str, default: &str) -> String {
        (self.lookup)(var).unwrap_or_else(|_| default.to_string())
    }

    fn parsed<T>(&self, var: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.text(var, default)
            .trim()
            .parse::<T>()
            .map_err(|e| invalid(var, e.to_string()))
    }
}

fn invalid(var: &str, reason: String) -> ConfigError {
    ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    }
}

/// Builds the config from `lookup`, which stands in for `std::env::var`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let vars = EnvReader { lookup };

    let env = parse_environment(&vars.text("POTENCY_ENV", "development"));
    let log_level = vars.text("POTENCY_LOG_LEVEL", "info");
    let cache_path = PathBuf::from(vars.text(
        "POTENCY_CACHE_PATH",
        "./.potency/insights.json",
    ));
    let product_base_url = vars.text(
        "POTENCY_PRODUCT_BASE_URL",
        "https://www.sunnyside.shop/product",
    )
    .trim_end_matches('/')
    .to_string();

    let max_scan_depth = vars.parsed::<usize>("POTENCY_MAX_SCAN_DEPTH", "4")?;
    if max_scan_depth == 0 {
        return Err(invalid(
            "POTENCY_MAX_SCAN_DEPTH",
            "depth must be at least 1".to_string(),
        ));
    }

    let terpene_merge_policy =
        vars.parsed::<TerpeneMergePolicy>("POTENCY_TERPENE_MERGE_POLICY", "replace")?;

    let request_timeout_secs = vars.parsed::<u64>("POTENCY_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = vars.text("POTENCY_USER_AGENT", "potency/0.1 (product-insights)");
    let max_retries = vars.parsed::<u32>("POTENCY_MAX_RETRIES", "2")?;
    let retry_backoff_base_secs = vars.parsed::<u64>("POTENCY_RETRY_BACKOFF_BASE_SECS", "1")?;

    Ok(AppConfig {
        env,
        log_level,
        cache_path,
        product_base_url,
        max_scan_depth,
        terpene_merge_policy,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_secs,
    })
}

/// Anything other than `production` or `test` means development.
fn parse_environment(s: &str) -> Environment {
    match s.trim().to_ascii_lowercase().as_str() {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
