//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! AttendanceService などのアプリケーション層はここの trait にのみ依存し、
//! JSON ファイルという保存方式を知りません。
//!
//! # 設計原則
//! - state file が source of truth（正本）
//! - すべての読み書きは Store のロックを経由する

pub mod audit_log_repository;
pub mod clock;
pub mod employer_repository;
pub mod id_generator;
pub mod job_queue;
pub mod shift_repository;

pub use self::audit_log_repository::AuditLogRepository;
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::employer_repository::EmployerRepository;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::job_queue::{JobHandler, JobQueue};
pub use self::shift_repository::ShiftRepository;
