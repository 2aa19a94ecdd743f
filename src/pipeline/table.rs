//! Tabularization: parsed JSON root → rows and a unioned column header.
//!
//! An object root becomes one row. An array root becomes one row per
//! element, each flattened on its own, so rows may have different keys.
//! The header is the union of every row's keys in first-seen order, and a
//! row without a given key leaves that cell blank. Anything else at the
//! root is rejected.

use crate::error::DocSheetError;
use crate::pipeline::flatten::{flatten_with_limit, FlatRecord};
use indexmap::IndexSet;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Rows plus the ordered union of their keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<FlatRecord>,
}

impl Table {
    /// Build a table from already-flattened rows.
    pub fn from_rows(rows: Vec<FlatRecord>) -> Self {
        let mut columns: IndexSet<String> = IndexSet::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.contains(key) {
                    columns.insert(key.clone());
                }
            }
        }
        Self {
            columns: columns.into_iter().collect(),
            rows,
        }
    }

    /// Cell at (`row`, `column`), or None when blank.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// Turn a parsed JSON root into a table.
pub fn to_table(root: &Value, max_depth: usize) -> Result<Table, DocSheetError> {
    let rows = match root {
        Value::Object(_) => vec![flatten_with_limit(root, max_depth)?],
        Value::Array(items) => {
            // The array itself is one level of nesting.
            let inner = max_depth.checked_sub(1).ok_or(DocSheetError::FlattenDepthExceeded {
                limit: max_depth,
            })?;
            items
                .iter()
                .map(|item| flatten_with_limit(item, inner))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| match e {
                    DocSheetError::FlattenDepthExceeded { .. } => {
                        DocSheetError::FlattenDepthExceeded { limit: max_depth }
                    }
                    other => other,
                })?
        }
        other => {
            return Err(DocSheetError::UnsupportedRoot {
                kind: kind_of(other),
            })
        }
    };

    let table = Table::from_rows(rows);
    debug!(
        "Built table: {} rows × {} columns",
        table.row_count(),
        table.column_count()
    );
    Ok(table)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_FLATTEN_DEPTH;
    use serde_json::json;

    fn table(v: Value) -> Result<Table, DocSheetError> {
        to_table(&v, DEFAULT_MAX_FLATTEN_DEPTH)
    }

    #[test]
    fn object_root_is_one_row() {
        let t = table(json!({"document_type": "Bill/Invoice", "total": {"amount": 10}})).unwrap();
        assert_eq!(t.columns, ["document_type", "total.amount"]);
        assert_eq!(t.row_count(), 1);
        assert_eq!(t.cell(0, "total.amount"), Some(&json!(10)));
    }

    #[test]
    fn heterogeneous_rows_union_columns() {
        let t = table(json!([{"x": 1}, {"y": 2}])).unwrap();
        assert_eq!(t.columns, ["x", "y"]);
        assert_eq!(t.cell(0, "x"), Some(&json!(1)));
        assert_eq!(t.cell(0, "y"), None);
        assert_eq!(t.cell(1, "x"), None);
        assert_eq!(t.cell(1, "y"), Some(&json!(2)));
    }

    #[test]
    fn columns_in_first_seen_order() {
        let t = table(json!([{"b": 1, "a": 2}, {"c": 3, "a": 4}, {"d": 5, "b": 6}])).unwrap();
        assert_eq!(t.columns, ["b", "a", "c", "d"]);
    }

    #[test]
    fn empty_array_is_empty_table() {
        let t = table(json!([])).unwrap();
        assert!(t.columns.is_empty());
        assert_eq!(t.row_count(), 0);
    }

    #[test]
    fn scalar_elements_use_empty_column() {
        let t = table(json!([1, {"a": 2}])).unwrap();
        assert_eq!(t.columns, ["", "a"]);
        assert_eq!(t.cell(0, ""), Some(&json!(1)));
    }

    #[test]
    fn scalar_roots_rejected() {
        for v in [json!("hello"), json!(42), json!(true), Value::Null] {
            let err = table(v).unwrap_err();
            assert!(matches!(err, DocSheetError::UnsupportedRoot { .. }), "got {err:?}");
        }
    }

    #[test]
    fn depth_counts_the_root_array() {
        let v = json!([{"a": {"b": 1}}]);
        assert!(to_table(&v, 3).is_ok());
        assert!(matches!(
            to_table(&v, 2),
            Err(DocSheetError::FlattenDepthExceeded { limit: 2 })
        ));
    }
}
