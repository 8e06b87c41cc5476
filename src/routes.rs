//! Route table: path → required roles → view.

use serde_json::{json, Value};

use crate::data::{Query, Row};
use crate::identity::{Identity, Role, AUDITOR_ROLES};
use crate::records::{AuditReport, Beneficiary, CspAgent, Transaction, UserSummary};

/// Pages reachable without a session.
pub const PUBLIC_PAGES: &[(&str, &str)] = &[
    ("/", "Home"),
    ("/about", "About Us"),
    ("/services", "Services"),
    ("/contact", "Contact"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Transactions,
    CspAgents,
    AuditReports,
    Beneficiaries,
    Users,
}

impl ViewKind {
    pub fn table(&self) -> &'static str {
        match self {
            ViewKind::Transactions => "transactions",
            ViewKind::CspAgents => "csp_agents",
            ViewKind::AuditReports => "audit_reports",
            ViewKind::Beneficiaries => "beneficiaries",
            ViewKind::Users => "users",
        }
    }

    /// Listing order as (column, ascending): dated tables newest first, the rest by name.
    fn ordering(&self) -> (&'static str, bool) {
        match self {
            ViewKind::Transactions => ("created_at", false),
            ViewKind::AuditReports => ("submitted_at", false),
            ViewKind::CspAgents | ViewKind::Beneficiaries | ViewKind::Users => ("name", true),
        }
    }

    /// Normalize raw rows into this view's record type.
    pub fn normalize(&self, rows: &[Row]) -> Vec<Value> {
        fn to_json<T: serde::Serialize>(items: impl Iterator<Item = T>) -> Vec<Value> {
            items.filter_map(|t| serde_json::to_value(t).ok()).collect()
        }
        match self {
            ViewKind::Transactions => to_json(rows.iter().map(Transaction::from_row)),
            ViewKind::CspAgents => to_json(rows.iter().map(CspAgent::from_row)),
            ViewKind::AuditReports => to_json(rows.iter().map(AuditReport::from_row)),
            ViewKind::Beneficiaries => to_json(rows.iter().map(Beneficiary::from_row)),
            ViewKind::Users => to_json(rows.iter().map(UserSummary::from_row)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteSpec {
    pub path: &'static str,
    pub title: &'static str,
    /// Empty means any signed-in identity.
    pub required: &'static [Role],
    pub view: ViewKind,
    /// Column compared with the viewer's id, for "my ..." listings.
    pub scope_column: Option<&'static str>,
}

/// Listing size cap for every table view.
pub const VIEW_ROW_LIMIT: usize = 100;

impl RouteSpec {
    pub fn query_for(&self, identity: &Identity) -> Query {
        let (column, ascending) = self.view.ordering();
        let mut q = Query::table(self.view.table());
        if let Some(col) = self.scope_column {
            q = q.eq(col, json!(identity.id.to_string()));
        }
        q.order_by(column, ascending).limit(VIEW_ROW_LIMIT)
    }
}

const fn route(path: &'static str, title: &'static str, required: &'static [Role], view: ViewKind, scope_column: Option<&'static str>) -> RouteSpec {
    RouteSpec { path, title, required, view, scope_column }
}

pub static PROTECTED_ROUTES: &[RouteSpec] = &[
    route("/admin/users", "User Management", &[Role::Admin], ViewKind::Users, None),
    route("/admin/csp-agents", "CSP Agents", &[Role::Admin], ViewKind::CspAgents, None),
    route("/admin/transactions", "All Transactions", &[Role::Admin], ViewKind::Transactions, None),
    route("/admin/audit-reports", "Audit Reports", &[Role::Admin], ViewKind::AuditReports, None),
    route("/csp/transactions", "My Transactions", &[Role::CspAgent], ViewKind::Transactions, Some("agent_id")),
    route("/audit/reports", "Audit Reports", AUDITOR_ROLES, ViewKind::AuditReports, None),
    route("/audit/assigned", "My Assignments", AUDITOR_ROLES, ViewKind::AuditReports, Some("auditor_id")),
    route("/bank/csp-agents", "CSP Network", &[Role::BankOfficer], ViewKind::CspAgents, None),
    route("/bank/transactions", "Transactions", &[Role::BankOfficer], ViewKind::Transactions, None),
    route("/customer/transactions", "My Transactions", &[Role::Customer], ViewKind::Transactions, Some("customer_id")),
    route("/welfare/beneficiaries", "Beneficiaries", &[Role::ArmyWelfareOfficer], ViewKind::Beneficiaries, None),
];

pub fn find_route(path: &str) -> Option<&'static RouteSpec> { PROTECTED_ROUTES.iter().find(|r| r.path == path) }
