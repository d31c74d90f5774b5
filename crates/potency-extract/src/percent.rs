//! Percentage parsing for untrusted scalar values.
//!
//! Upstream records carry potency as numbers (`22.4`), decorated strings
//! (`"22.4%"`, `"THC 22.4 %"`), or nothing at all. Absence is always `None`;
//! nothing here fails.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+(?:\.[0-9]+)?)").expect("valid number regex"));

/// Resolves a JSON scalar into a percentage.
///
/// - finite numbers pass through unchanged
/// - NaN and infinities are unknown
/// - strings yield their first unsigned decimal number
/// - `null`, booleans, arrays and objects are unknown
#[must_use]
pub fn parse_percent(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_percent_str(s),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Like [`parse_percent`], for an optional value (a missing field is unknown).
#[must_use]
pub fn parse_percent_opt(value: Option<&Value>) -> Option<f64> {
    value.and_then(parse_percent)
}

/// Returns the first unsigned decimal number in `s`, e.g. `"37.5%"` → `37.5`.
/// A digit run too long to be a finite `f64` is unknown.
#[must_use]
pub fn parse_percent_str(s: &str) -> Option<f64> {
    let m = FIRST_NUMBER.find(s.trim())?;
    m.as_str().parse::<f64>().ok().filter(|v| v.is_finite())
}
