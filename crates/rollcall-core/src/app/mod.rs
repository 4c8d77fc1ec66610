//! App - アプリケーション層
//!
//! ports を組み合わせて勤怠のユースケースを実装します。
//!
//! # 主要コンポーネント
//! - **AppBuilder**: Config から Store・リポジトリ・キューを組み立てる
//! - **AttendanceService**: sign-in / sign-off / 管理者操作 / レポート
//! - **AuditWorker**: `audit:jobs` を消費して監査ログを書き込む

pub mod attendance;
pub mod audit_worker;
pub mod builder;

pub use self::attendance::{AttendanceService, SignIn, SignOff};
pub use self::audit_worker::{AuditLogHandler, AuditWorker};
pub use self::builder::{App, AppBuilder};
