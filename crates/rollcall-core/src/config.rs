//! Config - 環境変数（と `.env`）からの設定読み込み

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::store::WriteMode;

pub const DEFAULT_DATA_FILE_PATH: &str = "./data/store.json";
pub const DEFAULT_TIMEZONE: &str = "Australia/Sydney";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must not be empty")]
    Empty { var: &'static str },

    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime configuration shared by the CLI and the audit worker.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// `DATA_FILE_PATH`
    pub data_file_path: PathBuf,
    /// `TZ`: sign-in/sign-off で timezone 未指定のときに使う
    pub default_timezone: String,
    /// `ROLLCALL_POLL_INTERVAL_MS`: 空キューのポーリング間隔
    pub poll_interval: Duration,
    /// `ROLLCALL_WRITE_MODE`: `in-place` | `atomic-rename`
    pub write_mode: WriteMode,
    /// `ROLLCALL_MAX_ATTEMPTS`: handler 失敗時の最大配送回数（1 = 再配送なし）
    pub max_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file_path: PathBuf::from(DEFAULT_DATA_FILE_PATH),
            default_timezone: DEFAULT_TIMEZONE.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            write_mode: WriteMode::InPlace,
            max_attempts: 1,
        }
    }
}

impl Config {
    /// `.env` を読み込んでからプロセス環境変数で設定を作る
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意のキー検索関数から設定を作る（未設定のキーは既定値）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("DATA_FILE_PATH") {
            if path.trim().is_empty() {
                return Err(ConfigError::Empty {
                    var: "DATA_FILE_PATH",
                });
            }
            config.data_file_path = PathBuf::from(path);
        }

        if let Some(tz) = lookup("TZ") {
            if tz.trim().is_empty() {
                return Err(ConfigError::Empty { var: "TZ" });
            }
            config.default_timezone = tz;
        }

        if let Some(raw) = lookup("ROLLCALL_POLL_INTERVAL_MS") {
            let ms: u64 = raw.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    var: "ROLLCALL_POLL_INTERVAL_MS",
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?;
            config.poll_interval = Duration::from_millis(ms);
        }

        if let Some(raw) = lookup("ROLLCALL_WRITE_MODE") {
            config.write_mode = raw.parse().map_err(|reason| ConfigError::Invalid {
                var: "ROLLCALL_WRITE_MODE",
                value: raw.clone(),
                reason,
            })?;
        }

        if let Some(raw) = lookup("ROLLCALL_MAX_ATTEMPTS") {
            config.max_attempts = match raw.parse::<u32>() {
                Ok(0) => {
                    return Err(ConfigError::Invalid {
                        var: "ROLLCALL_MAX_ATTEMPTS",
                        value: raw,
                        reason: "must be at least 1".to_string(),
                    });
                }
                Ok(n) => n,
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        var: "ROLLCALL_MAX_ATTEMPTS",
                        value: raw,
                        reason: e.to_string(),
                    });
                }
            };
        }

        Ok(config)
    }
}
