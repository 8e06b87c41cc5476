//! HTTP integration tests: login/logout round trip, route guard redirects,
//! role-filtered navigation and CSRF enforcement against a live server.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use csp_portal::config::PortalConfig;
use csp_portal::data::{DataSource, MemoryStore, Row};
use csp_portal::identity::{MemoryStorage, StaticDirectory, DEMO_PASSWORD};
use csp_portal::server::{app, AppState, CSRF_HEADER};

const CUSTOMER_ID: &str = "00000000-0000-0000-0000-000000000006";

fn row(v: Value) -> Row { v.as_object().cloned().unwrap() }

fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.insert("transactions", vec![
        row(json!({"id": "t1", "customer_id": CUSTOMER_ID, "amount": "1500.50", "type": "deposit", "status": "completed", "created_at": "2024-03-01T10:00:00Z"})),
        row(json!({"id": "t2", "customer_id": "someone-else", "amount": 20, "status": "pending"})),
        row(json!({"id": "t3", "customer_id": CUSTOMER_ID, "amount": null, "created_at": "2024-03-02T10:00:00Z"})),
    ]);
    store
}

async fn spawn_portal() -> Result<String> {
    let config = PortalConfig { login_latency: Duration::ZERO, secure_cookie: false, ..PortalConfig::default() };
    let state = AppState::new(
        config,
        Arc::new(StaticDirectory::demo()?),
        Arc::new(MemoryStorage::new()),
        DataSource::Memory(seeded_store()),
    )?;
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app(state)).await;
    });
    Ok(format!("http://{}", addr))
}

fn client() -> Result<Client> { Ok(Client::builder().cookie_store(true).redirect(Policy::none()).build()?) }

async fn login(c: &Client, base: &str, email: &str) -> Result<String> {
    let resp = c.post(format!("{}/login", base)).json(&json!({"email": email, "password": DEMO_PASSWORD})).send().await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    Ok(body["csrf"].as_str().unwrap_or_default().to_string())
}

fn location(resp: &reqwest::Response) -> Option<String> {
    resp.headers().get("location").and_then(|v| v.to_str().ok()).map(|s| s.to_string())
}

#[tokio::test]
async fn guest_is_redirected_to_login() -> Result<()> {
    let base = spawn_portal().await?;
    let c = client()?;
    for path in ["/dashboard", "/admin/users", "/customer/transactions", "/profile"] {
        let resp = c.get(format!("{}{}", base, path)).send().await?;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{}", path);
        assert_eq!(location(&resp).as_deref(), Some("/login"), "{}", path);
    }
    let home = c.get(format!("{}/", base)).send().await?;
    assert_eq!(home.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn customer_on_admin_view_goes_to_unauthorized() -> Result<()> {
    let base = spawn_portal().await?;
    let c = client()?;
    login(&c, &base, "customer@cspportal.in").await?;
    let resp = c.get(format!("{}/admin/users", base)).send().await?;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some("/unauthorized"));
    let page = c.get(format!("{}/unauthorized", base)).send().await?;
    assert_eq!(page.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn customer_listing_is_scoped_and_normalized() -> Result<()> {
    let base = spawn_portal().await?;
    let c = client()?;
    login(&c, &base, "customer@cspportal.in").await?;
    let resp = c.get(format!("{}/customer/transactions", base)).send().await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    assert_eq!(body["count"], json!(2));
    let rows = body["rows"].as_array().cloned().unwrap_or_default();
    assert_eq!(rows[0]["id"], json!("t3"));
    assert_eq!(rows[0]["amount"], json!(0.0));
    assert_eq!(rows[1]["amount"], json!(1500.5));
    Ok(())
}

#[tokio::test]
async fn login_session_logout_round_trip() -> Result<()> {
    let base = spawn_portal().await?;
    let c = client()?;

    let s: Value = c.get(format!("{}/session", base)).send().await?.json().await?;
    assert_eq!(s["authenticated"], json!(false));

    let csrf = login(&c, &base, "OFFICER@cspportal.in").await?;
    let s: Value = c.get(format!("{}/session", base)).send().await?.json().await?;
    assert_eq!(s["authenticated"], json!(true));
    assert_eq!(s["user"]["role"], json!("bank_officer"));

    let dash: Value = c.get(format!("{}/dashboard", base)).send().await?.json().await?;
    assert_eq!(dash["kind"], json!("bank_officer"));

    let refused = c.post(format!("{}/logout", base)).send().await?;
    assert_eq!(refused.status(), StatusCode::FORBIDDEN);

    let out = c.post(format!("{}/logout", base)).header(CSRF_HEADER, &csrf).send().await?;
    assert_eq!(out.status(), StatusCode::OK);
    let s: Value = c.get(format!("{}/session", base)).send().await?.json().await?;
    assert_eq!(s["authenticated"], json!(false));

    let again = c.post(format!("{}/logout", base)).send().await?;
    assert_eq!(again.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn bad_credentials_are_rejected_without_a_session() -> Result<()> {
    let base = spawn_portal().await?;
    let c = client()?;
    let resp = c.post(format!("{}/login", base)).json(&json!({"email": "admin@cspportal.in", "password": "wrong"})).send().await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await?;
    assert_eq!(body["code"], json!("invalid_credentials"));
    let s: Value = c.get(format!("{}/session", base)).send().await?.json().await?;
    assert_eq!(s["authenticated"], json!(false));
    Ok(())
}

#[tokio::test]
async fn navigation_is_filtered_by_role_and_toggles_need_csrf() -> Result<()> {
    let base = spawn_portal().await?;
    let c = client()?;

    let guest: Value = c.get(format!("{}/nav", base)).send().await?.json().await?;
    let ids: Vec<&str> = guest["sections"].as_array().into_iter().flatten().filter_map(|s| s["id"].as_str()).collect();
    assert_eq!(ids, vec!["home", "account"]);

    let csrf = login(&c, &base, "field.auditor@cspportal.in").await?;
    let nav: Value = c.get(format!("{}/nav?path=/audit/assigned/42", base)).send().await?.json().await?;
    let ids: Vec<&str> = nav["sections"].as_array().into_iter().flatten().filter_map(|s| s["id"].as_str()).collect();
    assert!(ids.contains(&"audit"));
    assert!(!ids.contains(&"admin"));
    assert_eq!(nav["active"], json!("/audit/assigned"));

    let no_token = c.post(format!("{}/nav/toggle/audit", base)).send().await?;
    assert_eq!(no_token.status(), StatusCode::FORBIDDEN);

    let toggled: Value = c.post(format!("{}/nav/toggle/audit", base)).header(CSRF_HEADER, &csrf).send().await?.json().await?;
    assert_eq!(toggled["expanded"], json!(false));

    let hidden = c.post(format!("{}/nav/toggle/admin", base)).header(CSRF_HEADER, &csrf).send().await?;
    assert_eq!(hidden.status(), StatusCode::NOT_FOUND);
    Ok(())
}

fn set_cookie(resp: &reqwest::Response) -> Option<String> {
    resp.headers().get("set-cookie").and_then(|v| v.to_str().ok()).map(|s| s.to_string())
}

fn sid_of(cookie: &str) -> Option<String> {
    cookie.split(';').next()?.strip_prefix("csp_portal_session=").map(|s| s.to_string())
}

#[tokio::test]
async fn login_over_an_existing_cookie_issues_a_new_session() -> Result<()> {
    let base = spawn_portal().await?;
    let c = Client::builder().redirect(Policy::none()).build()?;
    let first = c.post(format!("{}/login", base)).json(&json!({"email": "customer@cspportal.in", "password": DEMO_PASSWORD})).send().await?;
    let old_sid = set_cookie(&first).as_deref().and_then(sid_of).unwrap_or_default();
    assert_eq!(old_sid.len(), 32);

    let second = c
        .post(format!("{}/login", base))
        .header("cookie", format!("csp_portal_session={}", old_sid))
        .json(&json!({"email": "admin@cspportal.in", "password": DEMO_PASSWORD}))
        .send()
        .await?;
    assert_eq!(second.status(), StatusCode::OK);
    let new_sid = set_cookie(&second).as_deref().and_then(sid_of).unwrap_or_default();
    assert_eq!(new_sid.len(), 32);
    assert_ne!(new_sid, old_sid);

    let old: Value = c.get(format!("{}/session", base)).header("cookie", format!("csp_portal_session={}", old_sid)).send().await?.json().await?;
    assert_eq!(old["authenticated"], json!(false));
    let new: Value = c.get(format!("{}/session", base)).header("cookie", format!("csp_portal_session={}", new_sid)).send().await?.json().await?;
    assert_eq!(new["user"]["role"], json!("admin"));
    Ok(())
}

#[tokio::test]
async fn stale_cookie_is_cleared_once() -> Result<()> {
    let base = spawn_portal().await?;
    let c = Client::builder().redirect(Policy::none()).build()?;
    let resp = c.get(format!("{}/about", base)).header("cookie", "csp_portal_session=0123456789abcdef0123456789abcdef").send().await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let cleared = set_cookie(&resp).unwrap_or_default();
    assert!(cleared.starts_with("csp_portal_session=deleted;"), "{}", cleared);

    let login = c.post(format!("{}/login", base)).json(&json!({"email": "agent@cspportal.in", "password": DEMO_PASSWORD})).send().await?;
    let sid = set_cookie(&login).as_deref().and_then(sid_of).unwrap_or_default();
    let live = c.get(format!("{}/about", base)).header("cookie", format!("csp_portal_session={}", sid)).send().await?;
    assert!(set_cookie(&live).is_none());
    Ok(())
}
