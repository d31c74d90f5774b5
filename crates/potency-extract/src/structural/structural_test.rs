use potency_core::{Granularity, TerpeneEntry};
use serde_json::json;

use super::*;

fn options() -> ExtractOptions {
    ExtractOptions::default()
}

// -----------------------------------------------------------------------
// extract_insight
// -----------------------------------------------------------------------

#[test]
fn end_to_end_record() {
    let root = json!({
        "thc": "22.4%",
        "cannabinoids": { "cbg": 1.1 },
        "potency": { "myrcene": 0.12 }
    });
    let insight = extract_insight(&root, None, &options()).expect("insight");
    let cannabinoids = insight.cannabinoids.expect("cannabinoids");
    assert_eq!(cannabinoids.len(), 2);
    assert_eq!(cannabinoids.get("THC"), Some(22.4));
    assert_eq!(cannabinoids.get("CBG"), Some(1.1));
    assert_eq!(
        insight.terpenes,
        Some(TerpeneProfile::Detailed(vec![TerpeneEntry::new(
            "Beta-Myrcene",
            0.12
        )]))
    );
}

#[test]
fn non_object_root_yields_nothing() {
    assert!(extract_insight(&json!([1, 2]), None, &options()).is_none());
    assert!(extract_insight(&json!("thc 20%"), None, &options()).is_none());
}

#[test]
fn empty_record_yields_nothing() {
    assert!(extract_insight(&json!({ "sku_count": 3 }), None, &options()).is_none());
}

#[test]
fn url_from_slug_strips_product_prefix() {
    let root = json!({ "slug": "/product/blue-dream-35g" });
    let insight = extract_insight(&root, None, &options()).unwrap();
    assert_eq!(
        insight.url.as_deref(),
        Some("https://www.sunnyside.shop/product/blue-dream-35g")
    );
}

#[test]
fn url_from_id_when_no_slug() {
    let root = json!({ "id": 123_456, "thc": 20 });
    let insight = extract_insight(&root, None, &options()).unwrap();
    assert_eq!(
        insight.url.as_deref(),
        Some("https://www.sunnyside.shop/product/123456")
    );
}

#[test]
fn url_uses_configured_base() {
    let opts = ExtractOptions {
        product_base_url: "https://shop.example.com/p/".to_string(),
        ..ExtractOptions::default()
    };
    let insight = extract_insight(&json!({ "handle": "gelato" }), None, &opts).unwrap();
    assert_eq!(insight.url.as_deref(), Some("https://shop.example.com/p/gelato"));
}

#[test]
fn fallback_url_used_when_record_has_no_identity() {
    let insight = extract_insight(
        &json!({ "thc": 18 }),
        Some("https://example.com/product/9"),
        &options(),
    )
    .unwrap();
    assert_eq!(insight.url.as_deref(), Some("https://example.com/product/9"));
}

#[test]
fn name_precedence() {
    let root = json!({
        "name": "generic",
        "bt_product_name": "Gelato 3.5g",
        "displayName": "ignored"
    });
    let insight = extract_insight(&root, None, &options()).unwrap();
    assert_eq!(insight.name.as_deref(), Some("Gelato 3.5g"));
}

#[test]
fn empty_name_falls_through() {
    let root = json!({ "ecomm_display_name": "", "productName": "Runtz" });
    let insight = extract_insight(&root, None, &options()).unwrap();
    assert_eq!(insight.name.as_deref(), Some("Runtz"));
}

// -----------------------------------------------------------------------
// terpene fallback tiers
// -----------------------------------------------------------------------

#[test]
fn raw_terpenes_strings_are_coerced() {
    let root = json!({ "terpenes": ["Limonene 0.4%", "Farnesene: 0.1%"] });
    let insight = extract_insight(&root, None, &options()).unwrap();
    assert_eq!(
        insight.terpenes,
        Some(TerpeneProfile::Detailed(vec![
            TerpeneEntry::new("Limonene", 0.4),
            TerpeneEntry::new("Farnesene", 0.1),
        ]))
    );
}

#[test]
fn total_terpenes_fallback() {
    let root = json!({ "potency": { "terps": "1.85%" }, "thc": 20 });
    let insight = extract_insight(&root, None, &options()).unwrap();
    assert_eq!(insight.terpenes, Some(TerpeneProfile::total_only(1.85)));
    assert_eq!(insight.terpene_granularity(), Granularity::TotalOnly);
}

#[test]
fn breakdown_wins_over_total() {
    let root = json!({
        "potency_terps": 2.0,
        "terpenes": [{ "name": "Linalool", "percentage": 0.3 }]
    });
    let insight = extract_insight(&root, None, &options()).unwrap();
    assert!(insight.has_detailed_terpenes());
}

#[test]
fn terpene_profile_field_string_is_a_total() {
    let root = json!({ "terpene_profile": "2.3%" });
    let insight = extract_insight(&root, None, &options()).unwrap();
    assert_eq!(insight.terpenes, Some(TerpeneProfile::total_only(2.3)));
}

#[test]
fn shallow_depth_still_reaches_potency() {
    let opts = ExtractOptions {
        max_depth: 1,
        ..ExtractOptions::default()
    };
    let root = json!({ "potency": { "limonene": 0.7 } });
    let insight = extract_insight(&root, None, &opts).unwrap();
    assert_eq!(
        insight.terpenes,
        Some(TerpeneProfile::Detailed(vec![TerpeneEntry::new(
            "Limonene", 0.7
        )]))
    );
}

// -----------------------------------------------------------------------
// coerce_profile
// -----------------------------------------------------------------------

#[test]
fn coerce_map_of_labels() {
    let profile = coerce_profile(&json!({ "b_myrcene": "0.5%", "Ocimene": 0.1 })).unwrap();
    assert_eq!(profile.granularity(), Granularity::Detailed);
    assert_eq!(profile.entries().len(), 2);
}

#[test]
fn coerce_total_only_map() {
    let profile = coerce_profile(&json!({ "Total Terpenes": 1.2 })).unwrap();
    assert_eq!(profile, TerpeneProfile::total_only(1.2));
}

#[test]
fn coerce_rejects_unresolvable_values() {
    assert!(coerce_profile(&json!([])).is_none());
    assert!(coerce_profile(&json!(["no numbers here"])).is_none());
    assert!(coerce_profile(&json!(null)).is_none());
    assert!(coerce_profile(&json!("unknown")).is_none());
}

#[test]
fn label_before_number_requires_letters() {
    assert_eq!(label_before_number("Limonene: 0.4%"), Some("Limonene".to_string()));
    assert_eq!(label_before_number("0.4%"), None);
}
