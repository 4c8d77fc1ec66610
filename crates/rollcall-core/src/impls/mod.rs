//! Impls - JsonFileStore 上の ports 実装
//!
//! # 含まれる実装
//! - **StoreShiftRepository**: shifts
//! - **StoreEmployerRepository**: employers（削除時は shifts も連鎖削除）
//! - **StoreAuditLogRepository**: auditLogs（追記のみ）
//! - **FileJobQueue**: queues（topic ごとの FIFO）
//!
//! すべて同じ `Arc<JsonFileStore>` を共有し、各操作は Store 呼び出し 1 回で完結します。

pub mod audit_log_repo;
pub mod employer_repo;
pub mod file_queue;
pub mod shift_repo;

pub use self::audit_log_repo::StoreAuditLogRepository;
pub use self::employer_repo::StoreEmployerRepository;
pub use self::file_queue::{FileJobQueue, RetryPolicy};
pub use self::shift_repo::StoreShiftRepository;
