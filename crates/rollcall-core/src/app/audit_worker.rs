//! AuditWorker - `audit:jobs` を消費して監査ログを書き込む

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::{AUDIT_TOPIC, EmployerId, JobPayload, NewAuditLog};
use crate::error::{Result, RollcallError};
use crate::ports::{AuditLogRepository, JobHandler, JobQueue};

const UNKNOWN_ACTION: &str = "unknown";

/// payload 1 件 → AuditLogRecord 1 件
///
/// - `action`: payload の `action`（文字列でなければ `"unknown"`）
/// - `employerId`: 空でない文字列ならそのまま設定（形式は問わない）
/// - `metadata`: payload 全体
pub struct AuditLogHandler {
    audit_logs: Arc<dyn AuditLogRepository>,
}

impl AuditLogHandler {
    pub fn new(audit_logs: Arc<dyn AuditLogRepository>) -> Self {
        Self { audit_logs }
    }
}

fn to_new_audit_log(payload: &JobPayload) -> NewAuditLog {
    let action = payload
        .get("action")
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_ACTION)
        .to_string();
    let employer_id = payload
        .get("employerId")
        .and_then(|raw| EmployerId::deserialize(raw).ok());
    NewAuditLog {
        employer_id,
        action,
        metadata: Some(payload.clone()),
    }
}

#[async_trait]
impl JobHandler for AuditLogHandler {
    async fn handle(&self, payload: &JobPayload) -> Result<()> {
        let record = self.audit_logs.create(to_new_audit_log(payload)).await?;
        tracing::info!(action = %record.action, audit_id = %record.id, "stored audit log");
        Ok(())
    }
}

/// Audit worker handle.
/// - `shutdown_tx` を drop すると consumer も止まる
/// - `shutdown_and_join()` で停止を待てる
pub struct AuditWorker {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<Result<()>>,
}

impl AuditWorker {
    /// Spawn a consumer for `audit:jobs` on the current runtime.
    pub fn spawn(queue: Arc<dyn JobQueue>, audit_logs: Arc<dyn AuditLogRepository>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handler = AuditLogHandler::new(audit_logs);

        let join = tokio::spawn(async move {
            let result = queue.consume(AUDIT_TOPIC, &handler, shutdown_rx).await;
            if let Err(err) = &result {
                tracing::error!(error = %err, "audit worker crashed");
            }
            result
        });

        Self { shutdown_tx, join }
    }

    /// Request shutdown. In-flight handler runs are not cancelled.
    pub fn request_shutdown(&self) {
        // receiver may already be gone if the consumer crashed
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Shutdown and wait. Returns the consumer's fatal error, if it had one.
    pub async fn shutdown_and_join(self) -> Result<()> {
        self.request_shutdown();
        match self.join.await {
            Ok(result) => result,
            Err(join_err) => Err(RollcallError::Handler(format!(
                "audit worker task failed: {join_err}"
            ))),
        }
    }
}
