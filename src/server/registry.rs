//! Per-client session stores keyed by session cookie.
//!
//! Each client gets its own [`SessionStore`] bound to the storage slot
//! `csp_portal_user.<sid>`. A cookie unknown to this process (for example
//! after a restart) is resolved by restoring its slot; only authenticated
//! restores become clients. Every successful login issues a new sid and CSRF
//! token and retires the caller's previous sid.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::identity::{CredentialDirectory, Identity, Session, SessionStorage, SessionStore, DEFAULT_SESSION_TTL, SESSION_KEY};
use crate::navigation::ExpandState;

pub struct ClientSession {
    pub store: SessionStore,
    csrf: String,
    expand: Mutex<ExpandState>,
}

impl ClientSession {
    fn new(store: SessionStore) -> AppResult<Self> {
        let expand = ExpandState::for_session(&store.snapshot());
        Ok(Self { store, csrf: random_hex(32)?, expand: Mutex::new(expand) })
    }

    pub fn csrf(&self) -> &str { &self.csrf }

    pub fn session(&self) -> Session { self.store.snapshot() }

    pub fn expand_state(&self) -> ExpandState { self.expand.lock().clone() }

    pub fn toggle_section(&self, id: &str) -> bool { self.expand.lock().toggle(id) }
}

fn random_hex(len_bytes: usize) -> AppResult<String> {
    let mut bytes = vec![0u8; len_bytes];
    getrandom::getrandom(&mut bytes).map_err(|e| AppError::internal("rng_failed".to_string(), e.to_string()))?;
    let mut out = String::with_capacity(len_bytes * 2);
    for b in &bytes { let _ = write!(&mut out, "{:02x}", b); }
    Ok(out)
}

/// Session ids are 32 lowercase hex characters.
pub fn valid_sid(sid: &str) -> bool { sid.len() == 32 && sid.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) }

fn slot_for(sid: &str) -> String { format!("{}.{}", SESSION_KEY, sid) }

#[derive(Clone)]
pub struct SessionRegistry {
    clients: Arc<RwLock<HashMap<String, Arc<ClientSession>>>>,
    storage: Arc<dyn SessionStorage>,
    directory: Arc<dyn CredentialDirectory>,
    latency: Duration,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(storage: Arc<dyn SessionStorage>, directory: Arc<dyn CredentialDirectory>, latency: Duration) -> Self {
        Self { clients: Arc::new(RwLock::new(HashMap::new())), storage, directory, latency, ttl: DEFAULT_SESSION_TTL }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self { self.ttl = ttl; self }

    pub fn active_count(&self) -> usize { self.clients.read().len() }

    fn store_for(&self, sid: &str) -> SessionStore {
        SessionStore::with_slot(self.storage.clone(), self.directory.clone(), slot_for(sid))
            .with_latency(self.latency)
            .with_ttl(self.ttl)
    }

    /// Restore a sid's slot; a client (and its CSRF token) exists only for
    /// an authenticated restore.
    fn open(&self, sid: &str) -> AppResult<Option<ClientSession>> {
        let store = self.store_for(sid);
        if !store.restore().is_authenticated() { return Ok(None); }
        ClientSession::new(store).map(Some)
    }

    fn evict(&self, sid: &str, client: &ClientSession) {
        debug!(target: "session", "client session expired");
        client.store.logout();
        self.clients.write().remove(sid);
    }

    /// Client for a cookie value, restoring its persisted slot on first sight.
    /// Expired clients are evicted and resolve to nothing.
    pub fn resolve(&self, sid: &str) -> Option<Arc<ClientSession>> {
        if !valid_sid(sid) { return None; }
        let cached = self.clients.read().get(sid).cloned();
        if let Some(client) = cached {
            if !client.store.is_expired() { return Some(client); }
            self.evict(sid, &client);
            return None;
        }
        let client = match self.open(sid) {
            Ok(Some(c)) => Arc::new(c),
            Ok(None) => return None,
            Err(e) => {
                debug!(target: "session", "cannot open session: {}", e);
                return None;
            }
        };
        debug!(target: "session", "client session rehydrated");
        let mut map = self.clients.write();
        Some(map.entry(sid.to_string()).or_insert(client).clone())
    }

    /// Session for a request; guests get the empty session.
    pub fn session_for(&self, sid: Option<&str>) -> (Option<Arc<ClientSession>>, Session) {
        match sid.and_then(|s| self.resolve(s)) {
            Some(c) => { let s = c.session(); (Some(c), s) }
            None => (None, Session::empty()),
        }
    }

    /// Log in on a fresh sid. On success the caller's `previous` sid, if any,
    /// is logged out; on failure nothing changes. Returns the sid to set.
    pub async fn login(&self, previous: Option<&str>, email: &str, password: &str) -> AppResult<(String, Arc<ClientSession>, Identity)> {
        let sid = random_hex(16)?;
        let store = self.store_for(&sid);
        store.restore();
        let identity = store.login(email, password).await?;
        let client = Arc::new(ClientSession::new(store)?);
        self.clients.write().insert(sid.clone(), client.clone());
        if let Some(old) = previous.filter(|old| *old != sid) {
            self.logout(old);
        }
        self.purge_expired();
        Ok((sid, client, identity))
    }

    /// Tear down a client's session. Unknown ids are a no-op.
    pub fn logout(&self, sid: &str) {
        if let Some(client) = self.resolve(sid) {
            client.store.logout();
        }
        self.clients.write().remove(sid);
    }

    /// Evict every expired client; returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let expired: Vec<(String, Arc<ClientSession>)> = self
            .clients
            .read()
            .iter()
            .filter(|(_, c)| c.store.is_expired())
            .map(|(sid, c)| (sid.clone(), c.clone()))
            .collect();
        for (sid, client) in &expired {
            self.evict(sid, client);
        }
        expired.len()
    }

    /// Drop persisted slots that no longer restore (expired or corrupt) and
    /// belong to no live client. Returns how many were removed.
    pub fn sweep_slots(&self) -> AppResult<usize> {
        let prefix = format!("{}.", SESSION_KEY);
        let mut removed = 0;
        for key in self.storage.keys()? {
            let Some(sid) = key.strip_prefix(prefix.as_str()) else { continue; };
            if !valid_sid(sid) || self.clients.read().contains_key(sid) { continue; }
            if !self.store_for(sid).restore().is_authenticated() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
