//!
//! csp portal HTTP server
//! ----------------------
//! This module defines the Axum-based HTTP API for the portal.
//!
//! Responsibilities:
//! - Session management with a cookie + CSRF token model, one session store per client.
//! - Login/logout endpoints backed by the credential directory.
//! - Role-filtered navigation with per-session expand/collapse state.
//! - Guarded dashboard and listing views over the tabular data facade.
//! - Public pages plus the login and unauthorized landing views.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Path, Query as UrlQuery, Request, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::config::PortalConfig;
use crate::data::{DataSource, MemoryStore, RestSource};
use crate::error::{AppError, AppResult};
use crate::identity::{CredentialDirectory, FileStorage, SessionStorage, StaticDirectory};
use crate::navigation::{active_entry, portal_menu, visible_sections, ExpandState, NavigationTree};
use crate::routes::{PROTECTED_ROUTES, PUBLIC_PAGES};

pub mod registry;
mod views;

use registry::{ClientSession, SessionRegistry};

pub const SESSION_COOKIE: &str = "csp_portal_session";
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<PortalConfig>,
    pub sessions: SessionRegistry,
    pub nav: Arc<NavigationTree>,
    pub data: DataSource,
}

impl AppState {
    pub fn new(
        config: PortalConfig,
        directory: Arc<dyn CredentialDirectory>,
        storage: Arc<dyn SessionStorage>,
        data: DataSource,
    ) -> AppResult<Self> {
        let nav = portal_menu()?;
        let sessions = SessionRegistry::new(storage, directory, config.login_latency).with_ttl(config.session_ttl);
        match sessions.sweep_slots() {
            Ok(0) => {}
            Ok(n) => info!(target: "session", "removed {} stale session slot(s)", n),
            Err(e) => warn!(target: "session", "session slot sweep failed: {}", e),
        }
        Ok(Self { config: Arc::new(config), sessions, nav: Arc::new(nav), data })
    }
}

/// Assemble state from configuration: file-backed session slots, the demo
/// credential directory and the configured data backend.
pub fn build_state(config: PortalConfig) -> anyhow::Result<AppState> {
    let sessions_dir = config.sessions_dir();
    let storage = FileStorage::new(&sessions_dir)
        .with_context(|| format!("Failed to create or access session folder: {}", sessions_dir.display()))?;
    let directory = StaticDirectory::demo().context("While building the credential directory")?;
    let data = match (&config.data_url, &config.seed_file) {
        (Some(url), _) => DataSource::Rest(
            RestSource::new(url, config.data_key.as_deref()).with_context(|| format!("While configuring data service {}", url))?,
        ),
        (None, Some(seed)) => DataSource::Memory(
            MemoryStore::from_seed_file(seed).with_context(|| format!("While loading seed file {}", seed.display()))?,
        ),
        (None, None) => DataSource::Memory(MemoryStore::new()),
    };
    Ok(AppState::new(config, Arc::new(directory), Arc::new(storage), data)?)
}

pub fn app(state: AppState) -> Router {
    let mut router: Router<AppState> = Router::new()
        .route("/login", post(login).get(views::login_page))
        .route("/logout", post(logout))
        .route("/session", get(get_session))
        .route("/csrf", get(get_csrf))
        .route("/nav", get(get_nav))
        .route("/nav/toggle/{section}", post(toggle_section))
        .route("/unauthorized", get(views::unauthorized_page))
        .route("/dashboard", get(views::dashboard))
        .route("/profile", get(views::profile));
    for &(path, title) in PUBLIC_PAGES {
        router = router.route(path, get(move || async move { views::public_page(path, title) }));
    }
    for spec in PROTECTED_ROUTES {
        router = router.route(
            spec.path,
            get(move |State(state): State<AppState>, headers: HeaderMap| async move { views::listing(state, headers, spec).await }),
        );
    }
    router
        .layer(middleware::from_fn_with_state(state.clone(), clear_stale_cookie))
        .with_state(state)
}

/// A session cookie that no longer resolves (logged out, expired, unknown)
/// is cleared once, unless the handler already set a cookie of its own.
async fn clear_stale_cookie(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let stale = get_sid_from_headers(req.headers()).is_some_and(|sid| state.sessions.resolve(&sid).is_none());
    let mut resp = next.run(req).await;
    if stale && !resp.headers().contains_key(SET_COOKIE) {
        if let Ok(v) = clear_session_cookie(state.config.secure_cookie) {
            resp.headers_mut().insert(SET_COOKIE, v);
        }
    }
    resp
}

/// Serve on an already-bound listener.
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> anyhow::Result<()> {
    axum::serve(listener, app(state)).await?;
    Ok(())
}

/// Start the portal HTTP server using the given configuration.
pub async fn run(config: PortalConfig) -> anyhow::Result<()> {
    let port = config.http_port;
    let state = build_state(config)?;
    info!(
        target: "startup",
        "csp portal starting: backend={}, state_dir={:?}, login_latency_ms={}, secure_cookie={}",
        state.data.backend_name(),
        state.config.state_dir,
        state.config.login_latency.as_millis(),
        state.config.secure_cookie
    );
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await.with_context(|| format!("While binding {}", addr))?;
    serve(listener, state).await
}

fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie = headers.get("cookie")?;
    let s = cookie.to_str().ok()?;
    for part in s.split(';') {
        let p = part.trim();
        if let Some((k, v)) = p.split_once('=') {
            if k == name { return Some(v.to_string()); }
        }
    }
    None
}

pub(crate) fn get_sid_from_headers(headers: &HeaderMap) -> Option<String> { parse_cookie(headers, SESSION_COOKIE) }

/// Resolve the calling client and its current session.
pub(crate) fn current_session(state: &AppState, headers: &HeaderMap) -> (Option<Arc<ClientSession>>, crate::identity::Session) {
    let sid = get_sid_from_headers(headers);
    state.sessions.session_for(sid.as_deref())
}

fn validate_csrf(client: &ClientSession, headers: &HeaderMap) -> AppResult<()> {
    let provided = headers.get(CSRF_HEADER).and_then(|v| v.to_str().ok());
    match provided {
        Some(token) if token == client.csrf() => Ok(()),
        _ => Err(AppError::csrf("invalid_csrf", "missing or invalid CSRF token")),
    }
}

fn cookie_header(value: String) -> AppResult<HeaderValue> {
    HeaderValue::from_str(&value).map_err(|e| AppError::internal("cookie_encode_failed".to_string(), e.to_string()))
}

fn set_session_cookie(sid: &str, secure: bool) -> AppResult<HeaderValue> {
    let secure = if secure { " Secure;" } else { "" };
    cookie_header(format!("{}={}; HttpOnly;{} SameSite=Strict; Path=/", SESSION_COOKIE, sid, secure))
}

fn clear_session_cookie(secure: bool) -> AppResult<HeaderValue> {
    let secure = if secure { " Secure;" } else { "" };
    cookie_header(format!("{}=deleted; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly;{} SameSite=Strict; Path=/", SESSION_COOKIE, secure))
}

#[derive(Debug, Deserialize)]
struct LoginPayload { email: String, password: String }

async fn login(State(state): State<AppState>, headers: HeaderMap, Json(payload): Json<LoginPayload>) -> AppResult<Response> {
    let sid = get_sid_from_headers(&headers);
    let (sid, client, identity) = state.sessions.login(sid.as_deref(), &payload.email, &payload.password).await?;
    let mut h = HeaderMap::new();
    h.insert(SET_COOKIE, set_session_cookie(&sid, state.config.secure_cookie)?);
    Ok((StatusCode::OK, h, Json(json!({"status": "ok", "user": identity, "csrf": client.csrf()}))).into_response())
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let sid = get_sid_from_headers(&headers);
    if let (Some(sid), (Some(client), _)) = (sid.as_deref(), current_session(&state, &headers)) {
        validate_csrf(&client, &headers)?;
        state.sessions.logout(sid);
    }
    let mut h = HeaderMap::new();
    h.insert(SET_COOKIE, clear_session_cookie(state.config.secure_cookie)?);
    Ok((StatusCode::OK, h, Json(json!({"status": "ok"}))).into_response())
}

async fn get_session(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let (_, session) = current_session(&state, &headers);
    Json(json!({
        "authenticated": session.is_authenticated(),
        "loading": session.is_loading(),
        "user": session.identity(),
    }))
}

async fn get_csrf(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Json<serde_json::Value>> {
    match current_session(&state, &headers) {
        (Some(client), s) if s.is_authenticated() => Ok(Json(json!({"status": "ok", "csrf": client.csrf()}))),
        _ => Err(AppError::auth("unauthenticated", "sign in first")),
    }
}

#[derive(Debug, Deserialize)]
struct NavParams { path: Option<String> }

async fn get_nav(State(state): State<AppState>, headers: HeaderMap, UrlQuery(params): UrlQuery<NavParams>) -> impl IntoResponse {
    let (client, session) = current_session(&state, &headers);
    let expand = client.map(|c| c.expand_state()).unwrap_or_else(|| ExpandState::for_session(&session));
    let sections = visible_sections(&state.nav, &session);
    let active = params.path.as_deref().and_then(|p| active_entry(&sections, p)).map(|e| e.path.clone());
    let rendered: Vec<serde_json::Value> = sections
        .iter()
        .map(|s| json!({"id": s.id, "title": s.title, "expanded": expand.is_expanded(&s.id), "entries": s.entries}))
        .collect();
    Json(json!({"sections": rendered, "active": active}))
}

async fn toggle_section(State(state): State<AppState>, headers: HeaderMap, Path(section): Path<String>) -> AppResult<Json<serde_json::Value>> {
    let (Some(client), session) = current_session(&state, &headers) else {
        return Err(AppError::auth("unauthenticated", "sign in first"));
    };
    validate_csrf(&client, &headers)?;
    if !visible_sections(&state.nav, &session).iter().any(|s| s.id == section) {
        return Err(AppError::not_found("unknown_section".to_string(), format!("no navigation section '{}'", section)));
    }
    let expanded = client.toggle_section(&section);
    Ok(Json(json!({"section": section, "expanded": expanded})))
}
