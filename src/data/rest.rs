use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE};
use serde_json::Value;
use tracing::debug;

use super::{DataError, Query, Row};

/// PostgREST-style table API (`<base>/rest/v1/<table>`), the shape used by
/// hosted backend-as-a-service databases.
#[derive(Clone)]
pub struct RestSource {
    base_url: String,
    client: reqwest::Client,
}

fn render_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Total from a PostgREST `Content-Range` value such as `0-24/3573` or `*/0`.
pub(super) fn parse_content_range_total(range: &str) -> Option<usize> {
    let (_, total) = range.trim().rsplit_once('/')?;
    total.parse::<usize>().ok()
}

fn check_table(table: &str) -> Result<(), DataError> {
    if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(DataError::Query(format!("invalid table name '{}'", table)));
    }
    Ok(())
}

impl RestSource {
    pub fn new(base_url: &str, api_key: Option<&str>) -> Result<Self, DataError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let key_val = HeaderValue::from_str(key).map_err(|e| DataError::Query(format!("api key: {}", e)))?;
            let bearer = HeaderValue::from_str(&format!("Bearer {}", key)).map_err(|e| DataError::Query(format!("api key: {}", e)))?;
            headers.insert("apikey", key_val);
            headers.insert(AUTHORIZATION, bearer);
        }
        let client = reqwest::Client::builder().default_headers(headers).build()?;
        Ok(Self { base_url: base_url.trim_end_matches('/').to_string(), client })
    }

    pub fn table_url(&self, table: &str) -> String { format!("{}/rest/v1/{}", self.base_url, table) }

    /// Query-string pairs for a select: `select=*`, one `col=op.value` per
    /// filter, then `order` and `limit`.
    pub fn select_params(q: &Query) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        for f in &q.filters {
            params.push((f.column.clone(), format!("{}.{}", f.op.as_str(), render_value(&f.value))));
        }
        if let Some((column, ascending)) = &q.order {
            params.push(("order".to_string(), format!("{}.{}", column, if *ascending { "asc" } else { "desc" })));
        }
        if let Some(n) = q.limit {
            params.push(("limit".to_string(), n.to_string()));
        }
        params
    }

    /// Filters only, with `limit=0`: the total comes back in `Content-Range`.
    pub fn count_params(q: &Query) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        for f in &q.filters {
            params.push((f.column.clone(), format!("{}.{}", f.op.as_str(), render_value(&f.value))));
        }
        params.push(("limit".to_string(), "0".to_string()));
        params
    }

    fn scope_param(column: &str, value: &Value) -> Vec<(String, String)> { vec![(column.to_string(), format!("eq.{}", render_value(value)))] }

    async fn rows_from(resp: reqwest::Response) -> Result<Vec<Row>, DataError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DataError::Status { status: status.as_u16(), body });
        }
        let body: Value = resp.json().await?;
        match body {
            Value::Array(items) => items
                .into_iter()
                .map(|v| match v {
                    Value::Object(row) => Ok(row),
                    other => Err(DataError::Decode(format!("expected object row, got {}", other))),
                })
                .collect(),
            Value::Null => Ok(Vec::new()),
            other => Err(DataError::Decode(format!("expected array of rows, got {}", other))),
        }
    }

    pub async fn select(&self, q: &Query) -> Result<Vec<Row>, DataError> {
        check_table(&q.table)?;
        debug!(target: "data", table = %q.table, filters = q.filters.len(), "rest select");
        let resp = self.client.get(self.table_url(&q.table)).query(&Self::select_params(q)).send().await?;
        Self::rows_from(resp).await
    }

    /// Exact row count for the query's filters, without transferring rows.
    pub async fn count(&self, q: &Query) -> Result<usize, DataError> {
        check_table(&q.table)?;
        debug!(target: "data", table = %q.table, filters = q.filters.len(), "rest count");
        let resp = self
            .client
            .get(self.table_url(&q.table))
            .query(&Self::count_params(q))
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DataError::Status { status: status.as_u16(), body });
        }
        let range = resp.headers().get(CONTENT_RANGE).and_then(|v| v.to_str().ok()).unwrap_or_default();
        parse_content_range_total(range).ok_or_else(|| DataError::Decode(format!("no exact count in Content-Range '{}'", range)))
    }

    pub async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<(), DataError> {
        check_table(table)?;
        let resp = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=minimal")
            .json(&rows)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DataError::Status { status: status.as_u16(), body });
        }
        Ok(())
    }

    pub async fn update(&self, table: &str, column: &str, value: &Value, patch: Row) -> Result<usize, DataError> {
        check_table(table)?;
        let resp = self
            .client
            .patch(self.table_url(table))
            .query(&Self::scope_param(column, value))
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;
        Ok(Self::rows_from(resp).await?.len())
    }

    pub async fn delete(&self, table: &str, column: &str, value: &Value) -> Result<usize, DataError> {
        check_table(table)?;
        let resp = self
            .client
            .delete(self.table_url(table))
            .query(&Self::scope_param(column, value))
            .header("Prefer", "return=representation")
            .send()
            .await?;
        Ok(Self::rows_from(resp).await?.len())
    }
}
