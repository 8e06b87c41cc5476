use super::*;
use crate::identity::{demo_identities, MemoryStorage, StaticDirectory, DEMO_PASSWORD};

fn store_with(storage: Arc<MemoryStorage>) -> SessionStore {
    let directory = Arc::new(StaticDirectory::demo().unwrap());
    SessionStore::new(storage, directory)
}

#[test]
fn new_store_is_loading_until_restore() {
    let store = store_with(Arc::new(MemoryStorage::new()));
    assert!(store.snapshot().is_loading());
    let s = store.restore();
    assert!(!s.is_loading());
    assert!(!s.is_authenticated());
    assert!(s.identity().is_none());
}

#[test]
fn restore_discards_corrupt_slot() {
    let storage = Arc::new(MemoryStorage::new());
    storage.write(SESSION_KEY, "{not json").unwrap();
    let store = store_with(storage.clone());
    let s = store.restore();
    assert_eq!(s, Session::empty());
    assert_eq!(storage.read(SESSION_KEY).unwrap(), None);
}

#[test]
fn restore_discards_unknown_role() {
    let storage = Arc::new(MemoryStorage::new());
    let text = r#"{"user":{"id":"00000000-0000-0000-0000-000000000001","name":"X","email":"x@y.in","role":"superuser","createdAt":"2024-01-15T09:00:00Z"},"isAuthenticated":true}"#;
    storage.write(SESSION_KEY, text).unwrap();
    let store = store_with(storage.clone());
    assert!(!store.restore().is_authenticated());
    assert_eq!(storage.read(SESSION_KEY).unwrap(), None);
}

#[test]
fn restore_only_takes_effect_once() {
    let storage = Arc::new(MemoryStorage::new());
    let store = store_with(storage.clone());
    store.restore();
    // A slot appearing later must not be picked up by a second restore.
    let identity = demo_identities().remove(0);
    let text = serde_json::to_string(&PersistedSession { user: identity, is_authenticated: true }).unwrap();
    storage.write(SESSION_KEY, &text).unwrap();
    assert!(!store.restore().is_authenticated());
}

#[tokio::test]
async fn login_persists_and_restores_equal_identity() {
    let storage = Arc::new(MemoryStorage::new());
    let store = store_with(storage.clone());
    store.restore();
    let identity = store.login("customer@cspportal.in", DEMO_PASSWORD).await.unwrap();
    assert!(identity.last_login.is_some());
    let s = store.snapshot();
    assert!(s.is_authenticated());
    assert_eq!(s.role(), Some(Role::Customer));

    let again = store_with(storage.clone());
    let restored = again.restore();
    assert!(restored.is_authenticated());
    assert_eq!(restored.identity(), Some(&identity));
}

#[tokio::test]
async fn failed_login_leaves_session_unauthenticated() {
    let storage = Arc::new(MemoryStorage::new());
    let store = store_with(storage.clone());
    store.restore();
    let err = store.login("customer@cspportal.in", "wrong").await.unwrap_err();
    assert_eq!(err.http_status(), 401);
    assert!(!store.snapshot().is_authenticated());
    assert_eq!(storage.read(SESSION_KEY).unwrap(), None);
}

#[tokio::test]
async fn failed_login_does_not_clobber_existing_session() {
    let store = store_with(Arc::new(MemoryStorage::new()));
    store.restore();
    store.login("officer@cspportal.in", DEMO_PASSWORD).await.unwrap();
    assert!(store.login("officer@cspportal.in", "bad").await.is_err());
    assert_eq!(store.snapshot().role(), Some(Role::BankOfficer));
}

#[tokio::test]
async fn logout_is_idempotent_and_clears_slot() {
    let storage = Arc::new(MemoryStorage::new());
    let store = store_with(storage.clone());
    store.restore();
    store.logout();
    assert!(!store.snapshot().is_authenticated());
    store.login("admin@cspportal.in", DEMO_PASSWORD).await.unwrap();
    store.logout();
    store.logout();
    let s = store.snapshot();
    assert!(!s.is_authenticated());
    assert!(!s.is_loading());
    assert_eq!(storage.read(SESSION_KEY).unwrap(), None);
}

#[tokio::test]
async fn concurrent_logins_leave_memory_and_slot_in_agreement() {
    let storage = Arc::new(MemoryStorage::new());
    let store = Arc::new(store_with(storage.clone()).with_latency(Duration::from_millis(5)));
    store.restore();
    let a = { let s = store.clone(); tokio::spawn(async move { s.login("admin@cspportal.in", DEMO_PASSWORD).await }) };
    let b = { let s = store.clone(); tokio::spawn(async move { s.login("auditor@cspportal.in", DEMO_PASSWORD).await }) };
    assert!(a.await.unwrap().is_ok());
    assert!(b.await.unwrap().is_ok());

    let current = store.snapshot();
    let role = current.role().unwrap();
    assert!(role == Role::Admin || role == Role::Auditor);
    let persisted = decode_persisted(&storage.read(SESSION_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(Some(&persisted), current.identity());
}

#[tokio::test]
async fn is_authorized_follows_session_role() {
    let store = store_with(Arc::new(MemoryStorage::new()));
    store.restore();
    assert!(!store.is_authorized(&[Role::Admin]));
    store.login("welfare@cspportal.in", DEMO_PASSWORD).await.unwrap();
    assert!(store.is_authorized(&[Role::ArmyWelfareOfficer, Role::Admin]));
    assert!(!store.is_authorized(&[Role::Admin]));
    assert!(!store.is_authorized(&[]));
}

fn persisted_with_last_login(role: Role, minutes_ago: i64) -> String {
    let mut identity = demo_identities().into_iter().find(|i| i.role == role).unwrap();
    identity.last_login = Some(Utc::now() - chrono::Duration::minutes(minutes_ago));
    serde_json::to_string(&PersistedSession { user: identity, is_authenticated: true }).unwrap()
}

#[test]
fn restore_discards_slot_older_than_ttl() {
    let storage = Arc::new(MemoryStorage::new());
    storage.write(SESSION_KEY, &persisted_with_last_login(Role::Admin, 90)).unwrap();
    let store = store_with(storage.clone()).with_ttl(Duration::from_secs(3600));
    assert_eq!(store.restore(), Session::empty());
    assert_eq!(storage.read(SESSION_KEY).unwrap(), None);
}

#[test]
fn restore_keeps_slot_within_ttl() {
    let storage = Arc::new(MemoryStorage::new());
    storage.write(SESSION_KEY, &persisted_with_last_login(Role::Customer, 10)).unwrap();
    let store = store_with(storage.clone()).with_ttl(Duration::from_secs(3600));
    assert_eq!(store.restore().role(), Some(Role::Customer));
    assert!(!store.is_expired());
}

#[test]
fn slot_without_last_login_is_expired_under_a_ttl() {
    let storage = Arc::new(MemoryStorage::new());
    let identity = demo_identities().remove(0);
    storage.write(SESSION_KEY, &serde_json::to_string(&PersistedSession { user: identity, is_authenticated: true }).unwrap()).unwrap();
    let store = store_with(storage.clone()).with_ttl(Duration::from_secs(3600));
    assert!(!store.restore().is_authenticated());
}

#[tokio::test]
async fn live_session_expires_after_ttl() {
    let store = store_with(Arc::new(MemoryStorage::new())).with_ttl(Duration::from_millis(20));
    store.restore();
    store.login("agent@cspportal.in", DEMO_PASSWORD).await.unwrap();
    assert!(!store.is_expired());
    tokio::time::sleep(Duration::from_millis(40)).await;
    assert!(store.is_expired());
}
