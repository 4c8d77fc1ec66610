use async_trait::async_trait;

use crate::domain::{AuditLogRecord, EmployerId, NewAuditLog};
use crate::error::Result;

/// Append-only audit log storage.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    async fn create(&self, input: NewAuditLog) -> Result<AuditLogRecord>;

    /// Newest first, optionally restricted to one employer.
    async fn list(&self, employer_id: Option<EmployerId>) -> Result<Vec<AuditLogRecord>>;
}
