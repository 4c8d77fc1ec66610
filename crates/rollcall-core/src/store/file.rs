//! state file の読み書き
//!
//! ロックは呼び出し側（JsonFileStore）が保持している前提です。

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::StoreState;
use crate::error::StoreError;

/// WriteMode は書き戻し方式
///
/// - InPlace: truncate して全体を書き直す。書き込み途中でプロセスが落ちると
///   ファイルが壊れうる。
/// - AtomicRename: `<file>.tmp` に書いて fsync してから rename する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteMode {
    #[default]
    InPlace,
    AtomicRename,
}

impl std::str::FromStr for WriteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in-place" => Ok(WriteMode::InPlace),
            "atomic-rename" => Ok(WriteMode::AtomicRename),
            other => Err(format!(
                "unknown write mode {other:?} (expected in-place|atomic-rename)"
            )),
        }
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn encode(state: &StoreState) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec_pretty(state).map_err(StoreError::Encode)
}

/// ファイルがなければ親ディレクトリと既定ドキュメントを作成する
///
/// 既定ドキュメントを一時ファイルに書いてから hard link で配置するので、
/// 他の読み手が空や書きかけのファイルを見ることはなく、既存ファイルも上書きしない。
/// Returns true if this call created the file.
pub(crate) async fn create_if_missing(path: &Path) -> Result<bool, StoreError> {
    if fs::try_exists(path).await.map_err(|e| io_error(path, e))? {
        return Ok(false);
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| io_error(parent, e))?;
    }

    let staging = sibling_path(path, &format!("init-{:016x}", rand::random::<u64>()));
    let bytes = encode(&StoreState::default())?;
    fs::write(&staging, &bytes)
        .await
        .map_err(|e| io_error(&staging, e))?;

    let linked = fs::hard_link(&staging, path).await;
    if let Err(e) = fs::remove_file(&staging).await {
        tracing::warn!(path = %staging.display(), error = %e, "failed to remove staging file");
    }
    match linked {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(io_error(path, e)),
    }
}

pub(crate) async fn load(path: &Path) -> Result<StoreState, StoreError> {
    let bytes = fs::read(path).await.map_err(|e| io_error(path, e))?;
    serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) async fn persist(
    path: &Path,
    state: &StoreState,
    mode: WriteMode,
) -> Result<(), StoreError> {
    let bytes = encode(state)?;
    match mode {
        WriteMode::InPlace => fs::write(path, &bytes).await.map_err(|e| io_error(path, e)),
        WriteMode::AtomicRename => {
            let tmp = temp_path(path);
            let mut file = fs::File::create(&tmp)
                .await
                .map_err(|e| io_error(&tmp, e))?;
            file.write_all(&bytes).await.map_err(|e| io_error(&tmp, e))?;
            file.sync_all().await.map_err(|e| io_error(&tmp, e))?;
            drop(file);
            fs::rename(&tmp, path).await.map_err(|e| io_error(path, e))
        }
    }
}

pub(crate) fn temp_path(path: &Path) -> PathBuf {
    sibling_path(path, "tmp")
}

/// `<file>.<suffix>` in the same directory (rename/link stay on one filesystem).
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}
