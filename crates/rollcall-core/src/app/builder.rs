//! AppBuilder - Store と ports 実装のワイヤリング
//!
//! 1 つの `Config` から 1 つの `JsonFileStore` を作り、すべてのリポジトリと
//! キューで共有します（同じファイルに対して Store を 2 つ作らない）。

use std::sync::Arc;

use crate::app::{AttendanceService, AuditWorker};
use crate::config::Config;
use crate::impls::{
    FileJobQueue, StoreAuditLogRepository, StoreEmployerRepository, StoreShiftRepository,
};
use crate::ports::{
    AuditLogRepository, Clock, EmployerRepository, JobQueue, ShiftRepository, SystemClock,
};
use crate::store::JsonFileStore;

/// AppBuilder はアプリケーションを構築
///
/// # 使用例
/// ```ignore
/// let app = AppBuilder::new(Config::from_env()?).build();
/// let shift = app.attendance.sign_in(input).await?;
/// ```
pub struct AppBuilder {
    config: Config,
    clock: Arc<dyn Clock>,
}

impl AppBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// テスト用に時刻を差し替える
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> App {
        let store = Arc::new(JsonFileStore::with_clock(
            self.config.data_file_path.clone(),
            self.config.write_mode,
            Arc::clone(&self.clock),
        ));
        let shifts: Arc<dyn ShiftRepository> =
            Arc::new(StoreShiftRepository::new(Arc::clone(&store)));
        let queue: Arc<dyn JobQueue> =
            Arc::new(FileJobQueue::from_config(Arc::clone(&store), &self.config));
        let attendance = Arc::new(AttendanceService::new(
            Arc::clone(&shifts),
            Arc::clone(&queue),
            Arc::clone(&self.clock),
        ));

        App {
            employers: Arc::new(StoreEmployerRepository::new(Arc::clone(&store))),
            audit_logs: Arc::new(StoreAuditLogRepository::new(Arc::clone(&store))),
            config: self.config,
            store,
            shifts,
            queue,
            attendance,
        }
    }
}

/// App は組み立て済みのサービス群
pub struct App {
    pub config: Config,
    pub store: Arc<JsonFileStore>,
    pub shifts: Arc<dyn ShiftRepository>,
    pub employers: Arc<dyn EmployerRepository>,
    pub audit_logs: Arc<dyn AuditLogRepository>,
    pub queue: Arc<dyn JobQueue>,
    pub attendance: Arc<AttendanceService>,
}

impl App {
    pub fn spawn_audit_worker(&self) -> AuditWorker {
        AuditWorker::spawn(Arc::clone(&self.queue), Arc::clone(&self.audit_logs))
    }
}
