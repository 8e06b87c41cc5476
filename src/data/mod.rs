//! Remote tabular data facade.
//!
//! Views read and write rows through [`DataSource`], a thin CRUD surface over
//! either the in-process [`MemoryStore`] or a PostgREST-style [`RestSource`].
//! Rows are loose JSON objects here; typed records live in `crate::records`.

mod memory;
mod rest;

use std::cmp::Ordering;

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::error::AppError;

pub use memory::MemoryStore;
pub use rest::RestSource;

pub type Row = serde_json::Map<String, Value>;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("request to data service failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("data service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed data: {0}")]
    Decode(String),
    #[error("invalid query: {0}")]
    Query(String),
    #[error("seed file error: {0}")]
    Seed(String),
}

impl From<DataError> for AppError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::Query(m) => AppError::UserInput { code: "invalid_query".into(), message: m },
            other => AppError::Remote { code: "remote_query_failed".into(), message: other.to_string() },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl FilterOp {
    /// PostgREST operator token.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Neq => "neq",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn matches(&self, row: &Row) -> bool {
        let Some(actual) = row.get(&self.column) else { return false; };
        match self.op {
            FilterOp::Eq => compare_values(actual, &self.value) == Some(Ordering::Equal),
            FilterOp::Neq => compare_values(actual, &self.value) != Some(Ordering::Equal),
            FilterOp::Gt => compare_values(actual, &self.value) == Some(Ordering::Greater),
            FilterOp::Gte => matches!(compare_values(actual, &self.value), Some(Ordering::Greater | Ordering::Equal)),
            FilterOp::Lt => compare_values(actual, &self.value) == Some(Ordering::Less),
            FilterOp::Lte => matches!(compare_values(actual, &self.value), Some(Ordering::Less | Ordering::Equal)),
        }
    }
}

/// Order JSON scalars of the same kind; numbers also compare against numeric strings.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Number(_), _) | (_, Value::Number(_)) => {
            let x = as_f64(a)?;
            let y = as_f64(b)?;
            x.partial_cmp(&y)
        }
        _ => None,
    }
}

fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    pub filters: Vec<Filter>,
    pub order: Option<(String, bool)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn table(name: &str) -> Self { Self { table: name.to_string(), filters: Vec::new(), order: None, limit: None } }

    pub fn filter(mut self, column: &str, op: FilterOp, value: Value) -> Self {
        self.filters.push(Filter { column: column.to_string(), op, value });
        self
    }

    pub fn eq(self, column: &str, value: Value) -> Self { self.filter(column, FilterOp::Eq, value) }

    /// `ascending = false` sorts newest/largest first.
    pub fn order_by(mut self, column: &str, ascending: bool) -> Self { self.order = Some((column.to_string(), ascending)); self }

    pub fn limit(mut self, n: usize) -> Self { self.limit = Some(n); self }

    pub fn matches(&self, row: &Row) -> bool { self.filters.iter().all(|f| f.matches(row)) }
}

#[derive(Clone)]
pub enum DataSource {
    Memory(MemoryStore),
    Rest(RestSource),
}

impl DataSource {
    pub fn backend_name(&self) -> &'static str {
        match self {
            DataSource::Memory(_) => "memory",
            DataSource::Rest(_) => "rest",
        }
    }

    /// Zero or more rows matching the query's filters, ordered and limited.
    pub async fn select(&self, q: &Query) -> Result<Vec<Row>, DataError> {
        match self {
            DataSource::Memory(m) => Ok(m.select(q)),
            DataSource::Rest(r) => r.select(q).await,
        }
    }

    /// Number of rows matching the query's filters; order and limit do not apply.
    pub async fn count(&self, q: &Query) -> Result<usize, DataError> {
        match self {
            DataSource::Memory(m) => Ok(m.count(q)),
            DataSource::Rest(r) => r.count(q).await,
        }
    }

    pub async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<(), DataError> {
        match self {
            DataSource::Memory(m) => { m.insert(table, rows); Ok(()) }
            DataSource::Rest(r) => r.insert(table, rows).await,
        }
    }

    /// Merge `patch` into every row whose `column` equals `value`; returns rows touched.
    pub async fn update(&self, table: &str, column: &str, value: &Value, patch: Row) -> Result<usize, DataError> {
        match self {
            DataSource::Memory(m) => Ok(m.update(table, column, value, &patch)),
            DataSource::Rest(r) => r.update(table, column, value, patch).await,
        }
    }

    pub async fn delete(&self, table: &str, column: &str, value: &Value) -> Result<usize, DataError> {
        match self {
            DataSource::Memory(m) => Ok(m.delete(table, column, value)),
            DataSource::Rest(r) => r.delete(table, column, value).await,
        }
    }

    /// Read for rendering: a failed query degrades to an empty result.
    pub async fn fetch_or_empty(&self, q: &Query) -> Vec<Row> {
        match self.select(q).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(target: "data", table = %q.table, backend = self.backend_name(), "query failed, rendering empty: {}", e);
                Vec::new()
            }
        }
    }

    /// Count for rendering: a failed count degrades to zero.
    pub async fn count_or_zero(&self, q: &Query) -> usize {
        match self.count(q).await {
            Ok(n) => n,
            Err(e) => {
                warn!(target: "data", table = %q.table, backend = self.backend_name(), "count failed, rendering zero: {}", e);
                0
            }
        }
    }
}

#[cfg(test)]
#[path = "data_tests.rs"]
mod data_tests;
