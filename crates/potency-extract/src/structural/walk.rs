//! Bounded-depth terpene harvesting over an untyped record.
//!
//! The walk uses an explicit work stack instead of recursion. Work items are
//! pushed in reverse so they pop in document order, which keeps the result
//! order (and the "ties keep first" rule) identical to a depth-first scan.

use potency_core::TerpeneEntry;
use serde_json::{Map, Value};

use crate::canonical::{canonicalize, display_name, TerpeneName};
use crate::fold::TerpeneFold;
use crate::percent::parse_percent_opt;

/// Field names holding a record's percentage, in precedence order.
const RECORD_VALUE_FIELDS: [&str; 3] = ["percentage", "percent", "value"];

/// Key fragment marking a container that holds a terpene breakdown.
const TERPENE_MARKER: &str = "terp";

/// What one node of an untyped record looks like to the extractor.
#[derive(Debug)]
pub(crate) enum Candidate<'a> {
    /// A `{name, percentage|percent|value}` record, in an array or under any key.
    Record {
        label: String,
        value: Option<&'a Value>,
    },
    /// A field whose key is itself a terpene name, e.g. `"myrcene": 0.12`.
    NamedField {
        name: TerpeneName,
        value: &'a Value,
    },
    /// A container under a key mentioning "terp".
    TerpeneContainer(&'a Value),
    /// Any other object or array.
    Nested(&'a Value),
    /// A scalar with nothing to harvest.
    Unrecognized,
}

/// Classifies one `key: value` entry of an object.
pub(crate) fn classify_field<'a>(key: &str, value: &'a Value) -> Candidate<'a> {
    if let Some(name) = canonicalize(key) {
        return Candidate::NamedField { name, value };
    }
    if let Some(record) = as_record(value) {
        return record;
    }
    if is_container(value) {
        if key.to_lowercase().contains(TERPENE_MARKER) {
            return Candidate::TerpeneContainer(value);
        }
        return Candidate::Nested(value);
    }
    Candidate::Unrecognized
}

/// Classifies one element of an array.
pub(crate) fn classify_item(item: &Value) -> Candidate<'_> {
    if let Some(record) = as_record(item) {
        return record;
    }
    if is_container(item) {
        return Candidate::Nested(item);
    }
    Candidate::Unrecognized
}

fn is_container(value: &Value) -> bool {
    value.is_object() || value.is_array()
}

fn as_record(value: &Value) -> Option<Candidate<'_>> {
    let obj = value.as_object()?;
    let label = label_of(obj.get("name")?)?;
    if !RECORD_VALUE_FIELDS.iter().any(|f| obj.contains_key(*f)) {
        return None;
    }
    let value = RECORD_VALUE_FIELDS
        .iter()
        .filter_map(|f| obj.get(*f))
        .find(|v| !v.is_null());
    Some(Candidate::Record { label, value })
}

/// Record names may be strings or numbers; anything else is not a name.
fn label_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

enum Work<'a> {
    Node {
        value: &'a Value,
        depth: usize,
        forced: bool,
    },
    Field {
        key: &'a str,
        value: &'a Value,
        depth: usize,
    },
    Item {
        value: &'a Value,
        depth: usize,
    },
}

/// Harvests `(name, percentage)` pairs from `root`, scanning at most
/// `max_depth` levels of nesting.
///
/// A container under a "terp" key is scanned one level deeper even when that
/// level is past the limit; its own children obey the limit again.
/// Duplicate names keep the larger percentage and pairs whose percentage
/// cannot be resolved are dropped.
#[must_use]
pub fn extract_terpenes(root: &Value, max_depth: usize) -> Vec<TerpeneEntry> {
    let mut fold = TerpeneFold::new();
    let mut stack = vec![Work::Node {
        value: root,
        depth: 0,
        forced: false,
    }];

    while let Some(work) = stack.pop() {
        match work {
            Work::Node {
                value,
                depth,
                forced,
            } => {
                if depth >= max_depth && !forced {
                    continue;
                }
                match value {
                    Value::Array(items) => push_items(&mut stack, items, depth),
                    Value::Object(map) => push_fields(&mut stack, map, depth),
                    _ => {}
                }
            }
            Work::Item { value, depth } => match classify_item(value) {
                Candidate::Record { label, value } => {
                    fold.add_max(&display_name(&label), parse_percent_opt(value));
                }
                Candidate::Nested(inner) | Candidate::TerpeneContainer(inner) => {
                    stack.push(Work::Node {
                        value: inner,
                        depth: depth + 1,
                        forced: false,
                    });
                }
                Candidate::NamedField { .. } | Candidate::Unrecognized => {}
            },
            Work::Field { key, value, depth } => match classify_field(key, value) {
                Candidate::NamedField { name, value } => {
                    fold.add_max(name.as_str(), parse_percent_opt(Some(value)));
                }
                Candidate::Record { label, value } => {
                    fold.add_max(&display_name(&label), parse_percent_opt(value));
                }
                Candidate::TerpeneContainer(inner) => stack.push(Work::Node {
                    value: inner,
                    depth: depth + 1,
                    forced: true,
                }),
                Candidate::Nested(inner) => stack.push(Work::Node {
                    value: inner,
                    depth: depth + 1,
                    forced: false,
                }),
                Candidate::Unrecognized => {
                    tracing::trace!(key, "skipping scalar field");
                }
            },
        }
    }

    fold.into_entries()
}

fn push_items<'a>(stack: &mut Vec<Work<'a>>, items: &'a [Value], depth: usize) {
    for value in items.iter().rev() {
        stack.push(Work::Item { value, depth });
    }
}

fn push_fields<'a>(stack: &mut Vec<Work<'a>>, map: &'a Map<String, Value>, depth: usize) {
    let fields: Vec<_> = map.iter().collect();
    for (key, value) in fields.into_iter().rev() {
        stack.push(Work::Field {
            key: key.as_str(),
            value,
            depth,
        });
    }
}
