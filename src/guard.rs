//! Route guard: decides whether a protected view renders or redirects.

use serde::Serialize;
use tracing::warn;

use crate::identity::{is_authorized, Role, Session};

pub const LOGIN_PATH: &str = "/login";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardOutcome {
    /// Session still restoring; show a neutral waiting state only.
    Loading,
    RedirectLogin,
    RedirectUnauthorized,
    Render,
}

impl GuardOutcome {
    pub fn redirect_target(&self) -> Option<&'static str> {
        match self {
            GuardOutcome::RedirectLogin => Some(LOGIN_PATH),
            GuardOutcome::RedirectUnauthorized => Some(UNAUTHORIZED_PATH),
            GuardOutcome::Loading | GuardOutcome::Render => None,
        }
    }
}

/// Pure decision over (loading, authenticated, authorized). An empty
/// `required` list admits any authenticated identity.
pub fn evaluate(session: &Session, required: &[Role]) -> GuardOutcome {
    if session.is_loading() {
        return GuardOutcome::Loading;
    }
    if !session.is_authenticated() {
        return GuardOutcome::RedirectLogin;
    }
    if !required.is_empty() && !is_authorized(session, required) {
        return GuardOutcome::RedirectUnauthorized;
    }
    GuardOutcome::Render
}

/// [`evaluate`] plus a diagnostic log line for refused navigation.
pub fn check(session: &Session, path: &str, required: &[Role]) -> GuardOutcome {
    let outcome = evaluate(session, required);
    if outcome == GuardOutcome::RedirectUnauthorized {
        let (user, role) = session.identity().map(|i| (i.email.as_str(), i.role.as_str())).unwrap_or(("-", "-"));
        let required: Vec<&str> = required.iter().map(|r| r.as_str()).collect();
        warn!(target: "guard", path, user, role, ?required, "unauthorized navigation");
    }
    outcome
}
