//! rollcall-core
//!
//! 単一 JSON ファイルを正本とする勤怠管理のコア。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, shift, employer, audit, queue_job, report, state）
//! - **ports**: 抽象化レイヤー（ShiftRepository, JobQueue, AuditLogRepository, EmployerRepository, Clock）
//! - **store**: JsonFileStore（ロック付きの read_only / transaction）
//! - **impls**: Store 上の ports 実装（StoreShiftRepository, FileJobQueue など）
//! - **app**: アプリケーションロジック（AttendanceService, AuditWorker, AppBuilder）
//! - **config**: 環境変数からの設定
//! - **error**: エラー型

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod ports;
pub mod store;

pub use crate::config::{Config, ConfigError};
pub use crate::error::{ErrorKind, Result, RollcallError, StoreError};
