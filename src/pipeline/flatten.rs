//! Flattening: collapse a nested JSON tree into one level of dotted paths.
//!
//! ```text
//! {"a": {"b": 1, "c": [true, null]}}  ──▶  {"a.b": 1, "a.c.0": true, "a.c.1": null}
//! ```
//!
//! Object keys and array indices both become path segments joined by `.`.
//! Only scalar leaves produce keys; an empty object or array produces none.
//! A scalar root is stored under the empty key `""`.
//!
//! Two different paths can render to the same string, for example
//! `{"a.b": 1, "a": {"b": 2}}`. The later leaf overwrites the earlier value
//! while the key keeps its first column position. Nothing warns about it.

use crate::config::DEFAULT_MAX_FLATTEN_DEPTH;
use crate::error::DocSheetError;
use indexmap::IndexMap;
use serde_json::Value;

/// A single-level record: dotted path → scalar leaf, in traversal order.
///
/// Values are always `Null`, `Bool`, `Number`, or `String`.
pub type FlatRecord = IndexMap<String, Value>;

/// Flatten with the default depth limit.
pub fn flatten(value: &Value) -> Result<FlatRecord, DocSheetError> {
    flatten_with_limit(value, DEFAULT_MAX_FLATTEN_DEPTH)
}

/// Flatten, rejecting more than `max_depth` nested containers.
///
/// The root container counts as depth 1, so `{"a": 1}` needs a limit of at
/// least 1 and `{"a": {"b": 1}}` at least 2.
pub fn flatten_with_limit(value: &Value, max_depth: usize) -> Result<FlatRecord, DocSheetError> {
    let mut out = FlatRecord::new();
    let mut prefix = String::new();
    walk(value, &mut prefix, 0, max_depth, &mut out)?;
    Ok(out)
}

fn walk(
    value: &Value,
    prefix: &mut String,
    depth: usize,
    max_depth: usize,
    out: &mut FlatRecord,
) -> Result<(), DocSheetError> {
    match value {
        Value::Object(map) => {
            let depth = enter(depth, max_depth)?;
            for (key, child) in map {
                descend(child, prefix, key, depth, max_depth, out)?;
            }
        }
        Value::Array(items) => {
            let depth = enter(depth, max_depth)?;
            for (idx, child) in items.iter().enumerate() {
                descend(child, prefix, &idx.to_string(), depth, max_depth, out)?;
            }
        }
        leaf => {
            let path = prefix.as_str();
            let key = path.strip_suffix('.').unwrap_or(path);
            out.insert(key.to_string(), leaf.clone());
        }
    }
    Ok(())
}

fn enter(depth: usize, max_depth: usize) -> Result<usize, DocSheetError> {
    let depth = depth + 1;
    if depth > max_depth {
        return Err(DocSheetError::FlattenDepthExceeded { limit: max_depth });
    }
    Ok(depth)
}

/// Recurse into `child` with `segment.` appended to the shared prefix buffer.
fn descend(
    child: &Value,
    prefix: &mut String,
    segment: &str,
    depth: usize,
    max_depth: usize,
    out: &mut FlatRecord,
) -> Result<(), DocSheetError> {
    let mark = prefix.len();
    prefix.push_str(segment);
    prefix.push('.');
    let result = walk(child, prefix, depth, max_depth, out);
    prefix.truncate(mark);
    result
}

/// Turn a record back into a JSON object (keys unchanged).
pub fn record_to_value(record: &FlatRecord) -> Value {
    Value::Object(
        record
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(r: &FlatRecord) -> Vec<&str> {
        r.keys().map(String::as_str).collect()
    }

    #[test]
    fn nested_object() {
        let r = flatten(&json!({"a": {"b": 1, "c": 2}})).unwrap();
        assert_eq!(keys(&r), ["a.b", "a.c"]);
        assert_eq!(r["a.b"], json!(1));
        assert_eq!(r["a.c"], json!(2));
    }

    #[test]
    fn top_level_array_uses_indices() {
        let r = flatten(&json!([1, 2])).unwrap();
        assert_eq!(keys(&r), ["0", "1"]);
        assert_eq!(r["0"], json!(1));
        assert_eq!(r["1"], json!(2));
    }

    #[test]
    fn mixed_nesting() {
        let r = flatten(&json!({
            "name": "Jane",
            "items": [{"sku": "A1", "qty": 2}, {"sku": "B7", "qty": null}],
            "paid": false
        }))
        .unwrap();
        assert_eq!(
            keys(&r),
            ["name", "items.0.sku", "items.0.qty", "items.1.sku", "items.1.qty", "paid"]
        );
        assert_eq!(r["items.1.qty"], Value::Null);
        assert_eq!(r["paid"], json!(false));
    }

    #[test]
    fn leaf_count_matches_scalar_leaves() {
        let v = json!({"a": [1, [2, 3], {"b": "x"}], "c": {"d": {"e": null}}});
        assert_eq!(flatten(&v).unwrap().len(), 5);
    }

    #[test]
    fn empty_containers_contribute_nothing() {
        let r = flatten(&json!({"a": {}, "b": [], "c": 1})).unwrap();
        assert_eq!(keys(&r), ["c"]);
        assert!(flatten(&json!({})).unwrap().is_empty());
    }

    #[test]
    fn scalar_root_uses_empty_key() {
        let r = flatten(&json!("hello")).unwrap();
        assert_eq!(keys(&r), [""]);
        assert_eq!(r[""], json!("hello"));
    }

    #[test]
    fn flat_object_is_idempotent() {
        let v = json!({"document_type": "Other", "issue_date": "2024-01-01", "n": 3});
        let once = flatten(&v).unwrap();
        let twice = flatten(&record_to_value(&once)).unwrap();
        assert_eq!(once, twice);
        assert_eq!(record_to_value(&once), v);
    }

    #[test]
    fn colliding_paths_last_write_wins() {
        let v = json!({"a.b": 1, "a": {"b": 2}, "z": 0});
        let r = flatten(&v).unwrap();
        assert_eq!(keys(&r), ["a.b", "z"]);
        assert_eq!(r["a.b"], json!(2));
    }

    #[test]
    fn depth_limit_is_enforced() {
        let v = json!({"a": {"b": {"c": 1}}});
        assert!(flatten_with_limit(&v, 3).is_ok());
        let err = flatten_with_limit(&v, 2).unwrap_err();
        assert!(matches!(err, DocSheetError::FlattenDepthExceeded { limit: 2 }));
    }

    #[test]
    fn pathological_depth_is_rejected_not_overflowed() {
        let mut v = json!(1);
        for _ in 0..1_000 {
            v = Value::Array(vec![v]);
        }
        assert!(matches!(
            flatten(&v),
            Err(DocSheetError::FlattenDepthExceeded { .. })
        ));
        // serde_json drops deep values recursively; unwind it iteratively.
        while let Value::Array(mut items) = v {
            v = items.pop().unwrap_or(Value::Null);
        }
    }
}
