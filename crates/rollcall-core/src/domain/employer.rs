//! Employer accounts as stored in the state file.
//!
//! 認証・パスワードハッシュは外部の責務です。ここでは `password_hash` を
//! 不透明な文字列として保持するだけです。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::EmployerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmployerRole {
    Admin,
    Employee,
}

impl fmt::Display for EmployerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmployerRole::Admin => f.write_str("admin"),
            EmployerRole::Employee => f.write_str("employee"),
        }
    }
}

impl FromStr for EmployerRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(EmployerRole::Admin),
            "employee" => Ok(EmployerRole::Employee),
            other => Err(format!("unknown role {other:?} (expected admin|employee)")),
        }
    }
}

/// Persisted employer record (includes the credential hash).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerRecord {
    pub id: EmployerId,
    pub email: String,
    pub name: String,
    pub role: EmployerRole,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Employer の公開ビュー（`password_hash` を含まない）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employer {
    pub id: EmployerId,
    pub email: String,
    pub name: String,
    pub role: EmployerRole,
    pub created_at: DateTime<Utc>,
}

impl From<&EmployerRecord> for Employer {
    fn from(record: &EmployerRecord) -> Self {
        Self {
            id: record.id.clone(),
            email: record.email.clone(),
            name: record.name.clone(),
            role: record.role,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewEmployer {
    pub email: String,
    pub name: String,
    pub role: EmployerRole,
    pub password_hash: String,
}

#[derive(Debug, Clone, Default)]
pub struct EmployerPatch {
    pub name: Option<String>,
    pub role: Option<EmployerRole>,
}
