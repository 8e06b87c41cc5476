use crate::error::AppResult;
use crate::identity::{Audience, Role};

use super::{NavigationEntry as E, NavigationSection, NavigationTree};

pub const HOME_SECTION: &str = "home";

const ADMIN: Audience = Audience::Role(Role::Admin);
const AGENT: Audience = Audience::Role(Role::CspAgent);
const AUDITOR: Audience = Audience::Role(Role::Auditor);
const FIELD_AUDITOR: Audience = Audience::Role(Role::FieldAuditor);
const OFFICER: Audience = Audience::Role(Role::BankOfficer);
const CUSTOMER: Audience = Audience::Role(Role::Customer);
const WELFARE: Audience = Audience::Role(Role::ArmyWelfareOfficer);

/// Section holding each role's own dashboard link; expanded by default.
pub fn dashboard_section(role: Role) -> &'static str {
    match role {
        Role::Admin => "admin",
        Role::CspAgent => "csp",
        Role::Auditor | Role::FieldAuditor => "audit",
        Role::BankOfficer => "bank",
        Role::Customer => "customer",
        Role::ArmyWelfareOfficer => "welfare",
    }
}

/// The portal's navigation tree.
pub fn portal_menu() -> AppResult<NavigationTree> {
    let everyone = Audience::everyone();
    let signed_in = Audience::signed_in();
    let auditors = [AUDITOR, FIELD_AUDITOR];

    NavigationTree::new(vec![
        NavigationSection::new(HOME_SECTION, "Home", vec![
            E::new("/", "Home", "home", &everyone).exact(),
            E::new("/about", "About Us", "info", &everyone),
            E::new("/services", "Services", "briefcase", &everyone),
            E::new("/contact", "Contact", "phone", &everyone),
        ]),
        NavigationSection::new("admin", "Administration", vec![
            E::new("/dashboard", "Admin Dashboard", "layout-dashboard", &[ADMIN]).exact(),
            E::new("/admin/users", "User Management", "users", &[ADMIN]),
            E::new("/admin/csp-agents", "CSP Agents", "store", &[ADMIN]),
            E::new("/admin/transactions", "All Transactions", "arrow-left-right", &[ADMIN]),
            E::new("/admin/audit-reports", "Audit Reports", "clipboard-check", &[ADMIN]),
        ]),
        NavigationSection::new("csp", "CSP Operations", vec![
            E::new("/dashboard", "Agent Dashboard", "layout-dashboard", &[AGENT]).exact(),
            E::new("/csp/transactions", "My Transactions", "arrow-left-right", &[AGENT]),
        ]),
        NavigationSection::new("audit", "Audit & Compliance", vec![
            E::new("/dashboard", "Audit Dashboard", "layout-dashboard", &auditors).exact(),
            E::new("/audit/reports", "Audit Reports", "clipboard-check", &auditors),
            E::new("/audit/assigned", "My Assignments", "map-pin", &auditors),
        ]),
        NavigationSection::new("bank", "Bank Operations", vec![
            E::new("/dashboard", "Officer Dashboard", "layout-dashboard", &[OFFICER]).exact(),
            E::new("/bank/csp-agents", "CSP Network", "store", &[OFFICER]),
            E::new("/bank/transactions", "Transactions", "arrow-left-right", &[OFFICER]),
        ]),
        NavigationSection::new("customer", "My Banking", vec![
            E::new("/dashboard", "My Dashboard", "layout-dashboard", &[CUSTOMER]).exact(),
            E::new("/customer/transactions", "My Transactions", "arrow-left-right", &[CUSTOMER]),
        ]),
        NavigationSection::new("welfare", "Army Welfare", vec![
            E::new("/dashboard", "Welfare Dashboard", "layout-dashboard", &[WELFARE]).exact(),
            E::new("/welfare/beneficiaries", "Beneficiaries", "shield", &[WELFARE]),
        ]),
        NavigationSection::new("account", "Account", vec![
            E::new("/profile", "My Profile", "user", &signed_in),
            E::new("/login", "Sign In", "log-in", &[Audience::Guest]),
        ]),
    ])
}
