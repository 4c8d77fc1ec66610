//! JsonFileStore - 単一 JSON ファイルを正本とするトランザクショナルストア
//!
//! すべてのリポジトリとキューはこの Store を経由して state file にアクセスします。
//!
//! # 並行性
//! - Store インスタンスごとに 1 つの `tokio::sync::Mutex`（グローバル状態なし）
//! - `read_only` / `transaction` の本体はプロセス内で同時に 1 つだけ実行される
//! - tokio の Mutex は FIFO で待機者を起こすので、待機は busy-spin せず starvation もしない
//!
//! # トランザクション
//! load → mutate → persist。mutator が Err を返したら何も書かない。
//! mutator は同期クロージャなので `.await` できず、ロック保持中に I/O や
//! Store の再入はできません。

mod file;
mod state;

pub use self::file::WriteMode;
pub use self::state::StoreState;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::ids::{Id, IdMarker};
use crate::error::StoreError;
use crate::ports::{Clock, IdGenerator, SystemClock, UlidGenerator};

/// Lock-protected bookkeeping. Holding the guard is what serializes access.
struct StoreLock {
    initialized: bool,
}

pub struct JsonFileStore {
    path: PathBuf,
    write_mode: WriteMode,
    clock: Arc<dyn Clock>,
    ids: UlidGenerator<Arc<dyn Clock>>,
    lock: Mutex<StoreLock>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, write_mode: WriteMode) -> Self {
        Self::with_clock(path, write_mode, Arc::new(SystemClock))
    }

    pub fn with_clock(
        path: impl Into<PathBuf>,
        write_mode: WriteMode,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            path: path.into(),
            write_mode,
            ids: UlidGenerator::new(Arc::clone(&clock)),
            clock,
            lock: Mutex::new(StoreLock { initialized: false }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_mode(&self) -> WriteMode {
        self.write_mode
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// 新しいレコードの主キーを生成
    pub fn generate_id<T: IdMarker>(&self) -> Id<T> {
        self.ids.generate()
    }

    /// 一貫したスナップショットに対して `selector` を適用する
    pub async fn read_only<T, F>(&self, selector: F) -> Result<T, StoreError>
    where
        F: FnOnce(&StoreState) -> T + Send,
        T: Send,
    {
        let mut guard = self.lock.lock().await;
        self.ensure_file(&mut guard).await?;
        let state = file::load(&self.path).await?;
        Ok(selector(&state))
    }

    /// load → `mutator` → persist を 1 つのロック区間で行う
    ///
    /// `mutator` が Err を返した場合は書き込みを行わず、そのエラーをそのまま返す。
    pub async fn transaction<T, E, F>(&self, mutator: F) -> Result<T, E>
    where
        F: FnOnce(&mut StoreState) -> Result<T, E> + Send,
        T: Send,
        E: From<StoreError> + Send,
    {
        let mut guard = self.lock.lock().await;
        self.ensure_file(&mut guard).await?;
        let mut state = file::load(&self.path).await?;
        let value = mutator(&mut state)?;
        file::persist(&self.path, &state, self.write_mode).await?;
        tracing::trace!(path = %self.path.display(), "state persisted");
        Ok(value)
    }

    /// 初回アクセス時にファイルを用意する（ロック保持中に呼ぶこと）
    async fn ensure_file(&self, lock: &mut StoreLock) -> Result<(), StoreError> {
        if lock.initialized {
            return Ok(());
        }
        if file::create_if_missing(&self.path).await? {
            tracing::info!(path = %self.path.display(), "created empty state file");
        }
        lock.initialized = true;
        Ok(())
    }
}
