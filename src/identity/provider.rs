use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use chrono::{TimeZone, Utc};
use password_hash::{PasswordHash, SaltString};
use tracing::debug;
use uuid::Uuid;

use super::principal::Identity;
use super::role::Role;
use crate::error::{AppError, AppResult};

/// Placeholder credential accepted for every account of the demo directory.
pub const DEMO_PASSWORD: &str = "csp@1234";

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }
}

/// Validates credentials and yields the matching identity. Stand-in for a
/// real credential service.
pub trait CredentialDirectory: Send + Sync {
    fn authenticate(&self, req: &LoginRequest) -> AppResult<Identity>;
}

fn invalid_credentials() -> AppError { AppError::auth("invalid_credentials", "Invalid email or password") }

pub(crate) fn hash_password(password: &str) -> AppResult<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| AppError::internal("salt_failed".to_string(), e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| AppError::internal("salt_failed".to_string(), e.to_string()))?;
    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::internal("hash_failed".to_string(), e.to_string()))?
        .to_string();
    Ok(phc)
}

pub(crate) fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
    } else { false }
}

/// Fixed in-process directory sharing one placeholder password.
pub struct StaticDirectory {
    entries: Vec<Identity>,
    password_phc: String,
}

impl StaticDirectory {
    pub fn new(entries: Vec<Identity>, shared_password: &str) -> AppResult<Self> {
        Ok(Self { entries, password_phc: hash_password(shared_password)? })
    }

    /// One account per role, all using [`DEMO_PASSWORD`].
    pub fn demo() -> AppResult<Self> { Self::new(demo_identities(), DEMO_PASSWORD) }

    pub fn find(&self, email: &str) -> Option<&Identity> { self.entries.iter().find(|i| i.email_matches(email)) }
}

impl CredentialDirectory for StaticDirectory {
    fn authenticate(&self, req: &LoginRequest) -> AppResult<Identity> {
        let Some(identity) = self.find(&req.email) else {
            debug!(target: "auth", "login.unknown_email email={}", req.email.trim());
            return Err(invalid_credentials());
        };
        if !verify_password(&self.password_phc, &req.password) {
            return Err(invalid_credentials());
        }
        if !identity.status.can_sign_in() {
            return Err(AppError::auth(
                "account_disabled".to_string(),
                format!("Account is {}", identity.status.as_str()),
            ));
        }
        Ok(identity.clone())
    }
}

pub fn demo_identities() -> Vec<Identity> {
    let created = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).single().unwrap_or_else(Utc::now);
    let mk = |n: u128, name: &str, email: &str, role: Role| Identity::new(Uuid::from_u128(n), name, email, role, created);
    vec![
        mk(1, "Portal Administrator", "admin@cspportal.in", Role::Admin),
        mk(2, "Ravi Kumar", "agent@cspportal.in", Role::CspAgent).with_scores(Some(12.5), Some(94.0)),
        mk(3, "Anita Desai", "auditor@cspportal.in", Role::Auditor),
        mk(4, "Suresh Patil", "field.auditor@cspportal.in", Role::FieldAuditor),
        mk(5, "Meera Iyer", "officer@cspportal.in", Role::BankOfficer),
        mk(6, "Arjun Singh", "customer@cspportal.in", Role::Customer),
        mk(7, "Col. Vikram Rao", "welfare@cspportal.in", Role::ArmyWelfareOfficer),
    ]
}
