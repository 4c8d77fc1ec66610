//! ShiftRepository port - shifts コレクションへの型付きアクセス
//!
//! 各メソッドは Store 呼び出し 1 回 = 1 つの原子的な単位です。

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{CompleteShift, EmployerId, NewShift, Shift, ShiftFilter, ShiftId, ShiftPatch};
use crate::error::Result;

/// ShiftRepository は shift の CRUD と勤怠遷移の原子操作を提供
///
/// # 設計原則
/// - 呼び出し間で状態をキャッシュしない
/// - `open_shift` / `close_open_shift` は「確認して作成/終了」を 1 トランザクションで行う
#[async_trait]
pub trait ShiftRepository: Send + Sync {
    /// 最も新しく開始された open shift（複数ある場合は started_at 降順の先頭）
    async fn find_open_shift_for_employer(&self, employer_id: EmployerId) -> Result<Option<Shift>>;

    async fn create_shift(&self, input: NewShift) -> Result<Shift>;

    /// NotFound if `shift_id` does not exist.
    async fn complete_shift(&self, shift_id: ShiftId, input: CompleteShift) -> Result<Shift>;

    /// started_at 降順
    async fn list_shifts(&self, filter: &ShiftFilter) -> Result<Vec<Shift>>;

    /// NotFound if `shift_id` does not exist.
    async fn update_shift(&self, shift_id: ShiftId, patch: ShiftPatch) -> Result<Shift>;

    /// NotFound if `shift_id` does not exist.
    async fn delete_shift(&self, shift_id: ShiftId) -> Result<()>;

    /// Conflict if the employer already has an open shift; otherwise creates one.
    async fn open_shift(&self, input: NewShift) -> Result<Shift>;

    /// BadRequest if the employer has no open shift; otherwise completes the newest one.
    async fn close_open_shift(
        &self,
        employer_id: EmployerId,
        ended_at: DateTime<Utc>,
        end_tz: String,
        notes: Option<String>,
    ) -> Result<Shift>;
}
