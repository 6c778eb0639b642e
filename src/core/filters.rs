//! Document filtering and sorting
//!
//! A filter is an object keyed by data field. Each condition is either a
//! plain value (exact match) or an operator object:
//!
//! ```json
//! { "title": { "startsWith": "Hello" }, "rating": { "gte": 3 }, "draft": false }
//! ```
//!
//! Supported operators: `eq`, `exists`, `in`, `startsWith`, `gt`, `gte`,
//! `lt`, `lte`, `after`, `before`. A nested object without operator keys
//! matches against the nested data object.

use serde_json::{Map, Value};
use std::cmp::Ordering;

const OPERATORS: &[&str] = &[
    "eq",
    "exists",
    "in",
    "startsWith",
    "gt",
    "gte",
    "lt",
    "lte",
    "after",
    "before",
];

/// Whether `data` satisfies `filter`. A non-object filter matches everything.
pub fn matches(data: &Value, filter: &Value) -> bool {
    let Some(conditions) = filter.as_object() else {
        return true;
    };
    conditions.iter().all(|(field, condition)| {
        let actual = data.get(field).unwrap_or(&Value::Null);
        matches_condition(actual, condition)
    })
}

fn matches_condition(actual: &Value, condition: &Value) -> bool {
    match condition {
        Value::Object(ops) if is_operator_object(ops) => ops
            .iter()
            .all(|(op, expected)| apply_operator(op, actual, expected)),
        Value::Object(_) => matches(actual, condition),
        Value::Null => true,
        expected => actual == expected,
    }
}

fn is_operator_object(obj: &Map<String, Value>) -> bool {
    !obj.is_empty() && obj.keys().all(|k| OPERATORS.contains(&k.as_str()))
}

fn apply_operator(op: &str, actual: &Value, expected: &Value) -> bool {
    match op {
        "eq" => actual == expected,
        "exists" => expected.as_bool().unwrap_or(true) != actual.is_null(),
        "in" => expected
            .as_array()
            .is_some_and(|options| options.contains(actual)),
        "startsWith" => match (actual.as_str(), expected.as_str()) {
            (Some(a), Some(prefix)) => a.starts_with(prefix),
            _ => false,
        },
        "gt" | "after" => compare(actual, expected) == Some(Ordering::Greater),
        "gte" => matches!(
            compare(actual, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        "lt" | "before" => compare(actual, expected) == Some(Ordering::Less),
        "lte" => matches!(
            compare(actual, expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
        _ => false,
    }
}

/// Order two scalar values of the same kind; `None` when they don't compare
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Sort items in place by the data field named in `sort`
///
/// Items whose field is missing sort last in both directions.
pub fn apply_sort<T>(items: &mut [T], sort: &str, data: impl Fn(&T) -> &Value) {
    let (field, descending) = match sort.split_once(':') {
        Some((field, "desc")) => (field, true),
        Some((field, _)) => (field, false),
        None => (sort, false),
    };
    items.sort_by(|a, b| {
        let va = data(a).get(field).filter(|v| !v.is_null());
        let vb = data(b).get(field).filter(|v| !v.is_null());
        match (va, vb) {
            (Some(x), Some(y)) => {
                let ord = compare(x, y).unwrap_or(Ordering::Equal);
                if descending { ord.reverse() } else { ord }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // === matches() ===

    #[test]
    fn test_plain_value_is_equality() {
        let data = json!({ "title": "x", "draft": false });
        assert!(matches(&data, &json!({ "title": "x" })));
        assert!(!matches(&data, &json!({ "title": "y" })));
        assert!(matches(&data, &json!({ "draft": false })));
    }

    #[test]
    fn test_operators() {
        let data = json!({ "title": "Hello world", "rating": 4, "date": "2024-03-01" });
        assert!(matches(&data, &json!({ "title": { "startsWith": "Hello" } })));
        assert!(matches(&data, &json!({ "rating": { "gte": 4, "lt": 5 } })));
        assert!(!matches(&data, &json!({ "rating": { "gt": 4 } })));
        assert!(matches(&data, &json!({ "rating": { "in": [1, 4] } })));
        assert!(matches(&data, &json!({ "date": { "after": "2024-01-01" } })));
        assert!(!matches(&data, &json!({ "date": { "before": "2024-01-01" } })));
    }

    #[test]
    fn test_exists() {
        let data = json!({ "title": "x" });
        assert!(matches(&data, &json!({ "title": { "exists": true } })));
        assert!(matches(&data, &json!({ "body": { "exists": false } })));
        assert!(!matches(&data, &json!({ "body": { "exists": true } })));
    }

    #[test]
    fn test_nested_objects_recurse() {
        let data = json!({ "author": { "name": "Jane" } });
        assert!(matches(&data, &json!({ "author": { "name": { "eq": "Jane" } } })));
        assert!(!matches(&data, &json!({ "author": { "name": "John" } })));
    }

    #[test]
    fn test_non_object_filter_matches_everything() {
        assert!(matches(&json!({ "a": 1 }), &Value::Null));
    }

    // === apply_sort() ===

    #[test]
    fn test_sort_ascending_and_descending() {
        let mut items = vec![json!({ "n": 2 }), json!({ "n": 1 }), json!({}), json!({ "n": 3 })];
        apply_sort(&mut items, "n", |v| v);
        assert_eq!(items[0], json!({ "n": 1 }));
        assert_eq!(items[3], json!({}));

        apply_sort(&mut items, "n:desc", |v| v);
        assert_eq!(items[0], json!({ "n": 3 }));
        assert_eq!(items[3], json!({}));
    }
}
