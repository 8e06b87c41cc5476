use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AppError;

/// Closed set of portal roles. Anything else fails to parse or deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    CspAgent,
    Auditor,
    FieldAuditor,
    BankOfficer,
    Customer,
    ArmyWelfareOfficer,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Admin,
        Role::CspAgent,
        Role::Auditor,
        Role::FieldAuditor,
        Role::BankOfficer,
        Role::Customer,
        Role::ArmyWelfareOfficer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::CspAgent => "csp_agent",
            Role::Auditor => "auditor",
            Role::FieldAuditor => "field_auditor",
            Role::BankOfficer => "bank_officer",
            Role::Customer => "customer",
            Role::ArmyWelfareOfficer => "army_welfare_officer",
        }
    }

    /// Human readable name shown in greetings and profile views.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::CspAgent => "CSP Agent",
            Role::Auditor => "Auditor",
            Role::FieldAuditor => "Field Auditor",
            Role::BankOfficer => "Bank Officer",
            Role::Customer => "Customer",
            Role::ArmyWelfareOfficer => "Army Welfare Officer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Role::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == key)
            .ok_or_else(|| AppError::user("unknown_role".to_string(), format!("unknown role '{}'", s)))
    }
}

/// Who a navigation entry is shown to. The guest marker is always listed
/// explicitly; it is never derived from the absence of roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Audience {
    Guest,
    Role(Role),
}

impl Audience {
    pub const GUEST: &'static str = "guest";

    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::Guest => Self::GUEST,
            Audience::Role(r) => r.as_str(),
        }
    }

    /// Guest plus every role.
    pub fn everyone() -> Vec<Audience> {
        let mut out = vec![Audience::Guest];
        out.extend(Role::ALL.iter().map(|r| Audience::Role(*r)));
        out
    }

    /// Every signed-in role, no guest.
    pub fn signed_in() -> Vec<Audience> { Role::ALL.iter().map(|r| Audience::Role(*r)).collect() }
}

impl From<Role> for Audience {
    fn from(r: Role) -> Self { Audience::Role(r) }
}

impl Serialize for Audience {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> { serializer.serialize_str(self.as_str()) }
}

impl<'de> Deserialize<'de> for Audience {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == Self::GUEST { return Ok(Audience::Guest); }
        s.parse::<Role>().map(Audience::Role).map_err(|e| serde::de::Error::custom(e.message().to_string()))
    }
}
