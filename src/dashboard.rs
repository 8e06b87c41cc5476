//! Role dashboards, resolved through a lookup table rather than a branch per
//! role. Adding a role means adding a row to [`DASHBOARDS`].

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{json, Value};

use crate::data::{DataSource, Query};
use crate::error::{AppError, AppResult};
use crate::identity::{Identity, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardKind {
    Admin,
    CspAgent,
    Auditor,
    BankOfficer,
    Customer,
    ArmyWelfare,
}

/// A counted slice of one table, optionally scoped to the viewer's id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub title: &'static str,
    pub table: &'static str,
    #[serde(skip)]
    pub scope_column: Option<&'static str>,
    #[serde(skip)]
    pub status: Option<&'static str>,
}

const fn panel(title: &'static str, table: &'static str, scope_column: Option<&'static str>, status: Option<&'static str>) -> Panel {
    Panel { title, table, scope_column, status }
}

impl Panel {
    pub fn query_for(&self, identity: &Identity) -> Query {
        let mut q = Query::table(self.table);
        if let Some(col) = self.scope_column {
            q = q.eq(col, json!(identity.id.to_string()));
        }
        if let Some(status) = self.status {
            q = q.eq("status", json!(status));
        }
        q
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub kind: DashboardKind,
    pub title: String,
    pub greeting: String,
    pub panels: Vec<Panel>,
}

type DashboardCtor = fn(&Identity) -> DashboardView;

fn view(kind: DashboardKind, title: &str, identity: &Identity, panels: Vec<Panel>) -> DashboardView {
    DashboardView {
        kind,
        title: title.to_string(),
        greeting: format!("Welcome back, {} ({})", identity.name, identity.role.label()),
        panels,
    }
}

fn admin_dashboard(identity: &Identity) -> DashboardView {
    view(DashboardKind::Admin, "Administration Overview", identity, vec![
        panel("Registered users", "users", None, None),
        panel("CSP agents", "csp_agents", None, None),
        panel("Agents pending approval", "csp_agents", None, Some("pending")),
        panel("Transactions", "transactions", None, None),
    ])
}

fn agent_dashboard(identity: &Identity) -> DashboardView {
    view(DashboardKind::CspAgent, "CSP Agent Dashboard", identity, vec![
        panel("My transactions", "transactions", Some("agent_id"), None),
        panel("Pending transactions", "transactions", Some("agent_id"), Some("pending")),
    ])
}

fn auditor_dashboard(identity: &Identity) -> DashboardView {
    view(DashboardKind::Auditor, "Audit & Compliance", identity, vec![
        panel("Assigned audits", "audit_reports", Some("auditor_id"), None),
        panel("Open audits", "audit_reports", None, Some("in_progress")),
        panel("Reports awaiting review", "audit_reports", None, Some("submitted")),
    ])
}

fn officer_dashboard(identity: &Identity) -> DashboardView {
    view(DashboardKind::BankOfficer, "Bank Officer Dashboard", identity, vec![
        panel("CSP network", "csp_agents", None, None),
        panel("Suspended agents", "csp_agents", None, Some("suspended")),
        panel("Flagged transactions", "transactions", None, Some("flagged")),
    ])
}

fn customer_dashboard(identity: &Identity) -> DashboardView {
    view(DashboardKind::Customer, "My Banking", identity, vec![
        panel("My transactions", "transactions", Some("customer_id"), None),
    ])
}

fn welfare_dashboard(identity: &Identity) -> DashboardView {
    view(DashboardKind::ArmyWelfare, "Army Welfare Dashboard", identity, vec![
        panel("Beneficiaries", "beneficiaries", None, None),
        panel("Pending verifications", "beneficiaries", None, Some("pending")),
    ])
}

static DASHBOARDS: Lazy<HashMap<Role, DashboardCtor>> = Lazy::new(|| {
    let mut m: HashMap<Role, DashboardCtor> = HashMap::new();
    m.insert(Role::Admin, admin_dashboard);
    m.insert(Role::CspAgent, agent_dashboard);
    m.insert(Role::Auditor, auditor_dashboard);
    m.insert(Role::FieldAuditor, auditor_dashboard);
    m.insert(Role::BankOfficer, officer_dashboard);
    m.insert(Role::Customer, customer_dashboard);
    m.insert(Role::ArmyWelfareOfficer, welfare_dashboard);
    m
});

pub fn dashboard_for(identity: &Identity) -> AppResult<DashboardView> {
    let ctor = DASHBOARDS
        .get(&identity.role)
        .ok_or_else(|| AppError::config("no_dashboard".to_string(), format!("no dashboard registered for role {}", identity.role)))?;
    Ok(ctor(identity))
}

/// Dashboard JSON with each panel resolved to a row count. Counts are
/// computed by the backend; failed panel counts render as zero.
pub async fn render_dashboard(identity: &Identity, data: &DataSource) -> AppResult<Value> {
    let dash = dashboard_for(identity)?;
    let mut panels = Vec::with_capacity(dash.panels.len());
    for p in &dash.panels {
        let count = data.count_or_zero(&p.query_for(identity)).await;
        panels.push(json!({"title": p.title, "table": p.table, "count": count}));
    }
    Ok(json!({
        "kind": dash.kind,
        "title": dash.title,
        "greeting": dash.greeting,
        "panels": panels,
    }))
}
