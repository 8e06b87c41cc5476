//! Session store: the single source of truth for who is signed in on a client.
//!
//! A store starts in the loading state, leaves it exactly once through
//! [`SessionStore::restore`], and afterwards only changes through `login` and
//! `logout`. Every change replaces the whole [`Session`] value under the write
//! lock together with the persisted slot, so readers never see a half-applied
//! update and memory and storage never disagree.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::principal::Identity;
use super::provider::{CredentialDirectory, LoginRequest};
use super::role::{Audience, Role};
use super::storage::SessionStorage;
use crate::error::{AppError, AppResult};

/// Storage key of the persisted session slot.
pub const SESSION_KEY: &str = "csp_portal_user";

/// Session lifetime used by the server unless configured otherwise.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    identity: Option<Identity>,
    is_authenticated: bool,
    is_loading: bool,
}

impl Session {
    pub fn loading() -> Self { Self { identity: None, is_authenticated: false, is_loading: true } }

    pub fn empty() -> Self { Self { identity: None, is_authenticated: false, is_loading: false } }

    pub fn authenticated(identity: Identity) -> Self { Self { identity: Some(identity), is_authenticated: true, is_loading: false } }

    pub fn identity(&self) -> Option<&Identity> { self.identity.as_ref() }

    pub fn is_authenticated(&self) -> bool { self.is_authenticated }

    pub fn is_loading(&self) -> bool { self.is_loading }

    /// Role of the signed-in identity; None for guests and while loading.
    pub fn role(&self) -> Option<Role> {
        if !self.is_authenticated { return None; }
        self.identity.as_ref().map(|i| i.role)
    }

    /// Navigation audience of this session.
    pub fn audience(&self) -> Audience { self.role().map(Audience::Role).unwrap_or(Audience::Guest) }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedSession {
    user: Identity,
    is_authenticated: bool,
}

fn decode_persisted(text: &str) -> Option<Identity> {
    match serde_json::from_str::<PersistedSession>(text) {
        Ok(p) if p.is_authenticated => Some(p.user),
        Ok(_) => None,
        Err(e) => {
            debug!(target: "session", "persisted session rejected: {}", e);
            None
        }
    }
}

pub struct SessionStore {
    state: RwLock<Session>,
    storage: Arc<dyn SessionStorage>,
    directory: Arc<dyn CredentialDirectory>,
    slot: String,
    latency: Duration,
    ttl: Option<Duration>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SessionStorage>, directory: Arc<dyn CredentialDirectory>) -> Self {
        Self::with_slot(storage, directory, SESSION_KEY)
    }

    /// Store bound to a specific storage slot; the server keeps one slot per client.
    pub fn with_slot(storage: Arc<dyn SessionStorage>, directory: Arc<dyn CredentialDirectory>, slot: impl Into<String>) -> Self {
        Self {
            state: RwLock::new(Session::loading()),
            storage,
            directory,
            slot: slot.into(),
            latency: Duration::ZERO,
            ttl: None,
        }
    }

    /// Simulated credential round trip applied to every login.
    pub fn with_latency(mut self, latency: Duration) -> Self { self.latency = latency; self }

    /// Session lifetime measured from the identity's last login. Without a
    /// ttl sessions never expire.
    pub fn with_ttl(mut self, ttl: Duration) -> Self { self.ttl = Some(ttl); self }

    fn expired(&self, identity: &Identity) -> bool {
        let Some(ttl) = self.ttl else { return false; };
        let Ok(ttl) = chrono::Duration::from_std(ttl) else { return false; };
        match identity.last_login.and_then(|at| at.checked_add_signed(ttl)) {
            Some(ends) => ends <= Utc::now(),
            None => true,
        }
    }

    /// True when the signed-in identity has outlived the ttl.
    pub fn is_expired(&self) -> bool { self.state.read().identity().is_some_and(|i| self.expired(i)) }

    pub fn snapshot(&self) -> Session { self.state.read().clone() }

    /// Hydrate from the persisted slot. Corrupt, expired or unreadable slots
    /// are discarded and yield the empty session. Only the first call has an effect.
    pub fn restore(&self) -> Session {
        let mut state = self.state.write();
        if !state.is_loading { return state.clone(); }
        let raw = match self.storage.read(&self.slot) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(target: "session", slot = %self.slot, "session slot unreadable: {}", e);
                None
            }
        };
        let next = match raw {
            None => Session::empty(),
            Some(text) => match decode_persisted(&text) {
                Some(identity) if !self.expired(&identity) => {
                    debug!(target: "session", slot = %self.slot, user = %identity.email, "session restored");
                    Session::authenticated(identity)
                }
                decoded => {
                    if let Some(identity) = decoded {
                        debug!(target: "session", slot = %self.slot, user = %identity.email, "persisted session expired");
                    }
                    if let Err(e) = self.storage.remove(&self.slot) {
                        warn!(target: "session", slot = %self.slot, "failed to clear stale session slot: {}", e);
                    }
                    Session::empty()
                }
            },
        };
        *state = next.clone();
        next
    }

    /// Validate credentials and, on success, replace the session and persist it.
    /// A failed attempt leaves the current session untouched.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<Identity> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let directory = Arc::clone(&self.directory);
        let req = LoginRequest::new(email, password);
        let outcome = tokio::task::spawn_blocking(move || directory.authenticate(&req))
            .await
            .map_err(|e| AppError::internal("login_task_failed".to_string(), e.to_string()))?;
        let mut identity = match outcome {
            Ok(identity) => identity,
            Err(e) => {
                info!(target: "auth", email = %email.trim(), code = e.code_str(), "login rejected");
                return Err(e);
            }
        };
        identity.last_login = Some(Utc::now());

        let payload = serde_json::to_string(&PersistedSession { user: identity.clone(), is_authenticated: true })
            .map_err(|e| AppError::internal("session_encode_failed".to_string(), e.to_string()))?;
        {
            let mut state = self.state.write();
            if let Err(e) = self.storage.write(&self.slot, &payload) {
                warn!(target: "session", slot = %self.slot, "session not persisted: {}", e);
            }
            *state = Session::authenticated(identity.clone());
        }
        info!(target: "auth", user = %identity.email, role = %identity.role, "login ok");
        Ok(identity)
    }

    /// Clear the persisted slot and reset to the empty session. Idempotent.
    pub fn logout(&self) {
        let mut state = self.state.write();
        if let Err(e) = self.storage.remove(&self.slot) {
            warn!(target: "session", slot = %self.slot, "failed to clear session slot: {}", e);
        }
        if let Some(identity) = state.identity() {
            info!(target: "auth", user = %identity.email, "logout");
        }
        *state = Session::empty();
    }

    pub fn is_authorized(&self, roles: &[Role]) -> bool { super::authorizer::is_authorized(&self.state.read(), roles) }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod session_tests;
