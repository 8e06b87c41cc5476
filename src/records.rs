//! Typed views over loosely-shaped remote rows.
//!
//! Remote rows may omit fields or carry them with the wrong JSON type. Each
//! record's `from_row` normalizes once, here, so view code never has to
//! re-apply defaults.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::data::Row;
use crate::identity::{AccountStatus, Role};

fn text(row: &Row, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::String(s) => {
            let t = s.trim();
            if t.is_empty() { None } else { Some(t.to_string()) }
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn number(row: &Row, key: &str) -> Option<f64> {
    let v = match row.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    v.filter(|v| v.is_finite())
}

/// RFC 3339 strings or epoch milliseconds.
fn timestamp(row: &Row, key: &str) -> Option<DateTime<Utc>> {
    match row.get(key)? {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim()).ok().map(|d| d.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

fn status_text(row: &Row, default: &str) -> String { text(row, "status").map(|s| s.to_ascii_lowercase()).unwrap_or_else(|| default.to_string()) }

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub agent_id: Option<String>,
    pub customer_id: Option<String>,
    pub amount: f64,
    pub kind: String,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: text(row, "id").unwrap_or_default(),
            agent_id: text(row, "agent_id"),
            customer_id: text(row, "customer_id"),
            amount: number(row, "amount").unwrap_or(0.0),
            kind: text(row, "type").or_else(|| text(row, "kind")).unwrap_or_else(|| "unknown".to_string()),
            status: status_text(row, "pending"),
            created_at: timestamp(row, "created_at"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CspAgent {
    pub id: String,
    pub name: String,
    pub location: Option<String>,
    pub status: String,
    pub risk_score: Option<f64>,
    pub compliance_score: Option<f64>,
}

impl CspAgent {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: text(row, "id").unwrap_or_default(),
            name: text(row, "name").unwrap_or_else(|| "Unnamed agent".to_string()),
            location: text(row, "location"),
            status: status_text(row, "pending"),
            risk_score: number(row, "risk_score"),
            compliance_score: number(row, "compliance_score"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub id: String,
    pub agent_id: Option<String>,
    pub auditor_id: Option<String>,
    pub status: String,
    pub findings: u32,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl AuditReport {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: text(row, "id").unwrap_or_default(),
            agent_id: text(row, "agent_id"),
            auditor_id: text(row, "auditor_id"),
            status: status_text(row, "draft"),
            findings: number(row, "findings").filter(|n| *n >= 0.0).map(|n| n as u32).unwrap_or(0),
            submitted_at: timestamp(row, "submitted_at"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Beneficiary {
    pub id: String,
    pub name: String,
    pub service_number: Option<String>,
    pub pension_amount: Option<f64>,
    pub status: String,
}

impl Beneficiary {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: text(row, "id").unwrap_or_default(),
            name: text(row, "name").unwrap_or_else(|| "Unnamed beneficiary".to_string()),
            service_number: text(row, "service_number"),
            pension_amount: number(row, "pension_amount"),
            status: status_text(row, "active"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    /// None when the stored role is not one the portal knows.
    pub role: Option<Role>,
    pub status: AccountStatus,
    pub last_login: Option<DateTime<Utc>>,
}

impl UserSummary {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: text(row, "id").unwrap_or_default(),
            name: text(row, "name").unwrap_or_else(|| "Unknown user".to_string()),
            email: text(row, "email"),
            role: text(row, "role").and_then(|r| r.parse::<Role>().ok()),
            status: text(row, "status").and_then(|s| AccountStatus::parse(&s)).unwrap_or(AccountStatus::Pending),
            last_login: timestamp(row, "last_login"),
        }
    }
}
