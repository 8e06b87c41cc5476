use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::Role;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    #[default]
    Active,
    Suspended,
    Pending,
    Inactive,
}

impl AccountStatus {
    /// Suspended and inactive accounts are refused at login.
    pub fn can_sign_in(&self) -> bool { matches!(self, AccountStatus::Active | AccountStatus::Pending) }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Suspended => "suspended",
            AccountStatus::Pending => "pending",
            AccountStatus::Inactive => "inactive",
        }
    }

    /// Lenient parse for remote rows; unknown values yield None.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Some(AccountStatus::Active),
            "suspended" => Some(AccountStatus::Suspended),
            "pending" => Some(AccountStatus::Pending),
            "inactive" => Some(AccountStatus::Inactive),
            _ => None,
        }
    }
}

/// The signed-in actor. Serialized form is also the persisted session payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub status: AccountStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliance_score: Option<f64>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

impl Identity {
    pub fn new(id: Uuid, name: impl Into<String>, email: impl Into<String>, role: Role, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            role,
            status: AccountStatus::Active,
            risk_score: None,
            compliance_score: None,
            created_at,
            last_login: None,
        }
    }

    pub fn with_status(mut self, status: AccountStatus) -> Self { self.status = status; self }

    pub fn with_scores(mut self, risk: Option<f64>, compliance: Option<f64>) -> Self {
        self.risk_score = risk;
        self.compliance_score = compliance;
        self
    }

    /// Email comparison used by the credential directory.
    pub fn email_matches(&self, email: &str) -> bool { self.email.eq_ignore_ascii_case(email.trim()) }
}
