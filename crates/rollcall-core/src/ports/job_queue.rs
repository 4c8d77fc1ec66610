//! JobQueue port - topic ごとの永続 FIFO
//!
//! JobQueue は監査ログなどの副作用をリクエスト経路から切り離します。

use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::{JobId, JobPayload, QueueJob};
use crate::error::Result;

/// JobHandler は dequeue された payload を処理する
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, payload: &JobPayload) -> Result<()>;
}

/// JobQueue は topic ごとの FIFO
///
/// # 順序保証
/// - 同一 topic 内では enqueue 順に配送（tail に追加、head から取り出し）
/// - topic 間の順序は未定義
///
/// # 配送保証
/// - handler 失敗時の扱いは実装の RetryPolicy に従う（既定: ログして破棄）
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// topic の末尾に追加（topic がなければ作成）
    async fn enqueue(&self, topic: &str, payload: JobPayload) -> Result<JobId>;

    /// 先頭を取り出す。空なら None
    async fn dequeue(&self, topic: &str) -> Result<Option<QueueJob>>;

    /// Pending jobs in `topic`.
    async fn depth(&self, topic: &str) -> Result<usize>;

    /// dequeue → handle のループ
    ///
    /// 空の間は poll interval だけ待機します（busy-spin しない）。
    /// `shutdown` が true になったら Ok で戻り、Store の致命的エラーでのみ Err を返します。
    async fn consume(
        &self,
        topic: &str,
        handler: &dyn JobHandler,
        shutdown: watch::Receiver<bool>,
    ) -> Result<()>;
}
