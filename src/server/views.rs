//! Page handlers. Every protected view goes through the route guard before
//! any data is fetched.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde_json::json;

use crate::dashboard::render_dashboard;
use crate::guard::{check, GuardOutcome};
use crate::identity::{Identity, Role, Session};
use crate::routes::RouteSpec;

use super::{current_session, AppState};

/// Map a non-render guard outcome to its response.
fn guard_response(outcome: GuardOutcome) -> Option<Response> {
    match outcome {
        GuardOutcome::Render => None,
        GuardOutcome::Loading => Some((StatusCode::ACCEPTED, Json(json!({"status": "loading"}))).into_response()),
        GuardOutcome::RedirectLogin | GuardOutcome::RedirectUnauthorized => {
            outcome.redirect_target().map(|to| Redirect::to(to).into_response())
        }
    }
}

/// Run the guard and hand back the identity to render for.
fn admit(session: &Session, path: &str, required: &[Role]) -> Result<Identity, Response> {
    let outcome = check(session, path, required);
    if let Some(resp) = guard_response(outcome) {
        return Err(resp);
    }
    match session.identity() {
        Some(identity) => Ok(identity.clone()),
        None => Err(Redirect::to(crate::guard::LOGIN_PATH).into_response()),
    }
}

pub(super) async fn listing(state: AppState, headers: HeaderMap, spec: &'static RouteSpec) -> Response {
    let (_, session) = current_session(&state, &headers);
    let identity = match admit(&session, spec.path, spec.required) {
        Ok(i) => i,
        Err(resp) => return resp,
    };
    let rows = state.data.fetch_or_empty(&spec.query_for(&identity)).await;
    let items = spec.view.normalize(&rows);
    Json(json!({
        "title": spec.title,
        "path": spec.path,
        "table": spec.view.table(),
        "count": items.len(),
        "rows": items,
    }))
    .into_response()
}

pub(super) async fn dashboard(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (_, session) = current_session(&state, &headers);
    let identity = match admit(&session, "/dashboard", &[]) {
        Ok(i) => i,
        Err(resp) => return resp,
    };
    match render_dashboard(&identity, &state.data).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => e.into_response(),
    }
}

pub(super) async fn profile(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (_, session) = current_session(&state, &headers);
    match admit(&session, "/profile", &[]) {
        Ok(identity) => Json(json!({"title": "My Profile", "user": identity, "roleLabel": identity.role.label()})).into_response(),
        Err(resp) => resp,
    }
}

pub(super) fn public_page(path: &'static str, title: &'static str) -> Json<serde_json::Value> {
    Json(json!({"title": title, "path": path}))
}

pub(super) async fn login_page(State(state): State<AppState>, headers: HeaderMap) -> Json<serde_json::Value> {
    let (_, session) = current_session(&state, &headers);
    Json(json!({"title": "Sign In", "path": crate::guard::LOGIN_PATH, "authenticated": session.is_authenticated()}))
}

pub(super) async fn unauthorized_page() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({"title": "Access Denied", "message": "Your role does not have access to this page."})),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::demo_identities;

    #[test]
    fn guard_outcomes_map_to_http() {
        assert!(guard_response(GuardOutcome::Render).is_none());
        assert_eq!(guard_response(GuardOutcome::Loading).unwrap().status(), StatusCode::ACCEPTED);
        let login = guard_response(GuardOutcome::RedirectLogin).unwrap();
        assert_eq!(login.status(), StatusCode::SEE_OTHER);
        assert_eq!(login.headers()["location"], "/login");
        let denied = guard_response(GuardOutcome::RedirectUnauthorized).unwrap();
        assert_eq!(denied.headers()["location"], "/unauthorized");
    }

    #[test]
    fn admit_returns_identity_for_member_roles() {
        let officer = demo_identities().into_iter().find(|i| i.role == Role::BankOfficer).unwrap();
        let session = Session::authenticated(officer.clone());
        assert_eq!(admit(&session, "/bank/transactions", &[Role::BankOfficer]).ok(), Some(officer));
        assert!(admit(&session, "/admin/users", &[Role::Admin]).is_err());
    }

    #[test]
    fn admit_holds_a_restoring_session_at_accepted() {
        let resp = admit(&Session::loading(), "/admin/users", &[Role::Admin]).err().unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        assert!(resp.headers().get("location").is_none());
        let resp = admit(&Session::loading(), "/dashboard", &[]).err().unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
    }
}
