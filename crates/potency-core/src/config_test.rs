use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn environment_names() {
    assert_eq!(parse_environment("production"), Environment::Production);
    assert_eq!(parse_environment(" Test "), Environment::Test);
    assert_eq!(parse_environment("staging"), Environment::Development);
}

#[test]
fn build_app_config_defaults_with_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).expect("defaults should be valid");
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.log_level, "info");
    assert_eq!(
        cfg.cache_path.to_string_lossy(),
        "./.potency/insights.json"
    );
    assert_eq!(cfg.product_base_url, "https://www.sunnyside.shop/product");
    assert_eq!(cfg.max_scan_depth, 4);
    assert_eq!(cfg.terpene_merge_policy, TerpeneMergePolicy::Replace);
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.user_agent, "potency/0.1 (product-insights)");
    assert_eq!(cfg.max_retries, 2);
    assert_eq!(cfg.retry_backoff_base_secs, 1);
}

#[test]
fn product_base_url_trailing_slash_is_trimmed() {
    let mut map = HashMap::new();
    map.insert("POTENCY_PRODUCT_BASE_URL", "https://shop.example.com/p/");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.product_base_url, "https://shop.example.com/p");
}

#[test]
fn max_scan_depth_override() {
    let mut map = HashMap::new();
    map.insert("POTENCY_MAX_SCAN_DEPTH", "6");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.max_scan_depth, 6);
}

#[test]
fn max_scan_depth_zero_is_rejected() {
    let mut map = HashMap::new();
    map.insert("POTENCY_MAX_SCAN_DEPTH", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "POTENCY_MAX_SCAN_DEPTH"),
        "expected InvalidEnvVar(POTENCY_MAX_SCAN_DEPTH), got: {result:?}"
    );
}

#[test]
fn max_scan_depth_invalid() {
    let mut map = HashMap::new();
    map.insert("POTENCY_MAX_SCAN_DEPTH", "deep");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "POTENCY_MAX_SCAN_DEPTH"),
        "expected InvalidEnvVar(POTENCY_MAX_SCAN_DEPTH), got: {result:?}"
    );
}

#[test]
fn terpene_merge_policy_prefer_detailed() {
    let mut map = HashMap::new();
    map.insert("POTENCY_TERPENE_MERGE_POLICY", "prefer-detailed");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.terpene_merge_policy, TerpeneMergePolicy::PreferDetailed);
}

#[test]
fn terpene_merge_policy_unknown_is_rejected() {
    let mut map = HashMap::new();
    map.insert("POTENCY_TERPENE_MERGE_POLICY", "union");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, ref reason }) if var == "POTENCY_TERPENE_MERGE_POLICY" && reason.contains("union")),
        "expected InvalidEnvVar(POTENCY_TERPENE_MERGE_POLICY), got: {result:?}"
    );
}

#[test]
fn max_retries_invalid() {
    let mut map = HashMap::new();
    map.insert("POTENCY_MAX_RETRIES", "-1");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "POTENCY_MAX_RETRIES"),
        "expected InvalidEnvVar(POTENCY_MAX_RETRIES), got: {result:?}"
    );
}

#[test]
fn request_timeout_override() {
    let mut map = HashMap::new();
    map.insert("POTENCY_REQUEST_TIMEOUT_SECS", "5");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.request_timeout_secs, 5);
}
