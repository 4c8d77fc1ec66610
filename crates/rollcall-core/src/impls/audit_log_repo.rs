use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{AuditLogRecord, EmployerId, NewAuditLog};
use crate::error::Result;
use crate::ports::AuditLogRepository;
use crate::store::JsonFileStore;

pub struct StoreAuditLogRepository {
    store: Arc<JsonFileStore>,
}

impl StoreAuditLogRepository {
    pub fn new(store: Arc<JsonFileStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AuditLogRepository for StoreAuditLogRepository {
    async fn create(&self, input: NewAuditLog) -> Result<AuditLogRecord> {
        self.store
            .transaction(|state| {
                let record = AuditLogRecord {
                    id: self.store.generate_id(),
                    employer_id: input.employer_id,
                    action: input.action,
                    metadata: input.metadata,
                    created_at: self.store.now(),
                };
                state.audit_logs.push(record.clone());
                Ok(record)
            })
            .await
    }

    async fn list(&self, employer_id: Option<EmployerId>) -> Result<Vec<AuditLogRecord>> {
        let mut logs = self
            .store
            .read_only(|state| {
                state
                    .audit_logs
                    .iter()
                    .filter(|log| employer_id.is_none() || log.employer_id == employer_id)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .await?;
        // 同時刻なら後から追加したものを先に
        logs.reverse();
        logs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(logs)
    }
}
