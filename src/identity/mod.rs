//! Identity, credentials and session state for the portal.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod role;
mod session;
mod storage;
mod provider;
mod authorizer;

pub use principal::{AccountStatus, Identity};
pub use role::{Audience, Role};
pub use session::{Session, SessionStore, DEFAULT_SESSION_TTL, SESSION_KEY};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
pub use provider::{demo_identities, CredentialDirectory, LoginRequest, StaticDirectory, DEMO_PASSWORD};
pub use authorizer::{is_authorized, is_visible_to, AUDITOR_ROLES};
