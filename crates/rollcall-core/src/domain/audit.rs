//! Audit log records and the actions that produce them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AuditLogId, EmployerId};

/// Topic that carries audit jobs from request handling to the audit worker.
pub const AUDIT_TOPIC: &str = "audit:jobs";

/// AuditAction は状態変更の種類
///
/// 文字列表現（`attendance.sign-in` など）がそのまま永続化されます。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditAction {
    SignIn,
    SignOff,
    ShiftUpdated,
    ShiftDeleted,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::SignIn => "attendance.sign-in",
            AuditAction::SignOff => "attendance.sign-off",
            AuditAction::ShiftUpdated => "attendance.shift-updated",
            AuditAction::ShiftDeleted => "attendance.shift-deleted",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only audit record. Never mutated or deleted by normal operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogRecord {
    pub id: AuditLogId,
    #[serde(default)]
    pub employer_id: Option<EmployerId>,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
    pub created_at: DateTime<Utc>,
}

/// NewAuditLog は AuditLogRepository::create の入力
#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub employer_id: Option<EmployerId>,
    pub action: String,
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}
