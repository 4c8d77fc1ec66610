use std::path::PathBuf;

use thiserror::Error;

/// ErrorKind は呼び出し側がレスポンスへ変換するための分類
///
/// - NotFound: 対象 id のレコードが存在しない
/// - Conflict: 既に open shift がある、email 重複など
/// - BadRequest: open shift がないのに sign-off、不正な入力
/// - Fatal: state file の破損・読み書き不能（リトライしない）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    BadRequest,
    Fatal,
}

/// Failures of the file-backed store itself. All of them are fatal.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state file {path} is not accessible: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("state file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode state: {0}")]
    Encode(#[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum RollcallError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("handler failed: {0}")]
    Handler(String),
}

impl RollcallError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RollcallError::NotFound(_) => ErrorKind::NotFound,
            RollcallError::Conflict(_) => ErrorKind::Conflict,
            RollcallError::BadRequest(_) | RollcallError::Handler(_) => ErrorKind::BadRequest,
            RollcallError::Store(_) => ErrorKind::Fatal,
        }
    }
}

pub type Result<T> = std::result::Result<T, RollcallError>;
