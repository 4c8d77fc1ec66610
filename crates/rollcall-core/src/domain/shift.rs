//! Shift - 勤務区間のエンティティと入力型

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{EmployerId, ShiftId};

/// Shift は 1 回分の勤務区間
///
/// # ライフサイクル
/// - sign-in で `ended_at = None` として作成（open shift）
/// - sign-off で `ended_at` / `end_tz` を設定（closed shift）
/// - 管理者は任意のフィールド（id / employer_id 以外）を更新・削除できる
///
/// employer ごとに open shift は高々 1 件。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: ShiftId,
    pub employer_id: EmployerId,
    pub started_at: DateTime<Utc>,
    pub start_tz: String,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_tz: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// ShiftStatus はレポート用の表示状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    Active,
    Completed,
}

impl Shift {
    /// Is this shift still open (no end time recorded)?
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    pub fn status(&self) -> ShiftStatus {
        if self.is_open() {
            ShiftStatus::Active
        } else {
            ShiftStatus::Completed
        }
    }

    /// 終了済みなら勤務時間、open なら None
    pub fn duration(&self) -> Option<Duration> {
        self.ended_at.map(|ended| ended - self.started_at)
    }
}

/// NewShift は shift 作成の入力
#[derive(Debug, Clone)]
pub struct NewShift {
    pub employer_id: EmployerId,
    pub started_at: DateTime<Utc>,
    pub start_tz: String,
    pub notes: Option<String>,
}

/// CompleteShift は shift 終了の入力
///
/// `notes` が None の場合、既存の notes を維持します。
#[derive(Debug, Clone)]
pub struct CompleteShift {
    pub ended_at: DateTime<Utc>,
    pub end_tz: String,
    pub notes: Option<String>,
}

/// ShiftPatch は管理者による部分更新
///
/// `None` のフィールドは変更しません。
/// `notes` は `Some(None)` で削除、`Some(Some(_))` で上書き。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "double_option"
    )]
    pub notes: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_tz: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_tz: Option<String>,
}

impl ShiftPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply the provided fields to `shift`. Does not touch `updated_at`.
    pub fn apply_to(&self, shift: &mut Shift) {
        if let Some(started_at) = self.started_at {
            shift.started_at = started_at;
        }
        if let Some(ended_at) = self.ended_at {
            shift.ended_at = Some(ended_at);
        }
        if let Some(notes) = &self.notes {
            shift.notes = notes.clone();
        }
        if let Some(start_tz) = &self.start_tz {
            shift.start_tz = start_tz.clone();
        }
        if let Some(end_tz) = &self.end_tz {
            shift.end_tz = Some(end_tz.clone());
        }
    }
}

/// `null` を「削除」として区別するための serde ヘルパー
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S, T>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

/// ShiftFilter は一覧・レポートの絞り込み条件
///
/// `started_from` / `started_until` は両端を含む。
#[derive(Debug, Clone, Default)]
pub struct ShiftFilter {
    pub employer_id: Option<EmployerId>,
    pub started_from: Option<DateTime<Utc>>,
    pub started_until: Option<DateTime<Utc>>,
}

impl ShiftFilter {
    pub fn for_employer(employer_id: EmployerId) -> Self {
        Self {
            employer_id: Some(employer_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, shift: &Shift) -> bool {
        if let Some(employer_id) = &self.employer_id
            && shift.employer_id != *employer_id
        {
            return false;
        }
        if let Some(from) = self.started_from
            && shift.started_at < from
        {
            return false;
        }
        if let Some(until) = self.started_until
            && shift.started_at > until
        {
            return false;
        }
        true
    }
}
