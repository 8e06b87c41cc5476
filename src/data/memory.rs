use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use super::{compare_values, DataError, Filter, FilterOp, Query, Row};

/// In-process tables keyed by name. Unknown tables read as empty.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<HashMap<String, Vec<Row>>>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Load `{ "<table>": [ {row}, ... ], ... }` from a JSON file.
    pub fn from_seed_file(path: &Path) -> Result<Self, DataError> {
        let text = std::fs::read_to_string(path).map_err(|e| DataError::Seed(format!("{}: {}", path.display(), e)))?;
        let doc: serde_json::Map<String, Value> =
            serde_json::from_str(&text).map_err(|e| DataError::Seed(format!("{}: {}", path.display(), e)))?;
        let store = Self::new();
        for (table, rows) in doc {
            let Value::Array(items) = rows else {
                return Err(DataError::Seed(format!("table '{}' is not an array", table)));
            };
            let mut parsed = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::Object(row) => parsed.push(row),
                    other => return Err(DataError::Seed(format!("table '{}' has a non-object row: {}", table, other))),
                }
            }
            store.insert(&table, parsed);
        }
        Ok(store)
    }

    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn select(&self, q: &Query) -> Vec<Row> {
        let tables = self.tables.read();
        let Some(rows) = tables.get(&q.table) else { return Vec::new(); };
        let mut out: Vec<Row> = rows.iter().filter(|r| q.matches(r)).cloned().collect();
        drop(tables);
        if let Some((column, ascending)) = &q.order {
            // Rows missing the column sort last in either direction.
            out.sort_by(|a, b| match (a.get(column), b.get(column)) {
                (Some(x), Some(y)) => {
                    let ord = compare_values(x, y).unwrap_or(Ordering::Equal);
                    if *ascending { ord } else { ord.reverse() }
                }
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            });
        }
        if let Some(n) = q.limit {
            out.truncate(n);
        }
        out
    }

    /// Rows matching the query's filters; order and limit are ignored.
    pub fn count(&self, q: &Query) -> usize {
        self.tables.read().get(&q.table).map_or(0, |rows| rows.iter().filter(|r| q.matches(r)).count())
    }

    pub fn insert(&self, table: &str, rows: Vec<Row>) {
        self.tables.write().entry(table.to_string()).or_default().extend(rows);
    }

    pub fn update(&self, table: &str, column: &str, value: &Value, patch: &Row) -> usize {
        let scope = Filter { column: column.to_string(), op: FilterOp::Eq, value: value.clone() };
        let mut tables = self.tables.write();
        let Some(rows) = tables.get_mut(table) else { return 0; };
        let mut touched = 0;
        for row in rows.iter_mut().filter(|r| scope.matches(r)) {
            for (k, v) in patch {
                row.insert(k.clone(), v.clone());
            }
            touched += 1;
        }
        touched
    }

    pub fn delete(&self, table: &str, column: &str, value: &Value) -> usize {
        let scope = Filter { column: column.to_string(), op: FilterOp::Eq, value: value.clone() };
        let mut tables = self.tables.write();
        let Some(rows) = tables.get_mut(table) else { return 0; };
        let before = rows.len();
        rows.retain(|r| !scope.matches(r));
        before - rows.len()
    }
}
