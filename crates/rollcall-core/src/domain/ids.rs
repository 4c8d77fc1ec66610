//! Domain identifiers (strongly-typed IDs).
//!
//! # 不透明な文字列 ID + Phantom Type
//! 主キーは不透明な文字列です。新しく生成する ID は ULID ですが、既存の
//! state file にある UUID などの ID もそのまま読み込めます。
//! `Id<T>` の `T` は実行時には使わないマーカー型で、`ShiftId` と `EmployerId` を
//! 取り違えるとコンパイルエラーになります。
//!
//! ## 永続化形式
//! ファイル上では ID 文字列のみを保存します（プレフィックスなし）。
//! 空文字列は拒否します。
//! `Display` はログ用に `shift-` などのプレフィックスを付けます。
//! `FromStr` はどちらの形式も受け付けます。

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"shift-", "employer-" など）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    /// Display で使うプレフィックス
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
///
/// # 例
/// ```ignore
/// let shift_id: ShiftId = Id::from(Ulid::new());
/// let legacy: EmployerId = "3fa85f64-5717-4562-b3fc-2c963f66afa6".parse()?;
/// // shift_id と legacy は異なる型なので、混同できない
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id<T: IdMarker> {
    raw: String,
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    /// ULID から Id を作成
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            raw: ulid.to_string(),
            _marker: PhantomData,
        }
    }

    /// 保存されている文字列そのもの（プレフィックスなし）
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// ULID として解釈できる場合のみ Some
    pub fn as_ulid(&self) -> Option<Ulid> {
        Ulid::from_string(&self.raw).ok()
    }

    fn from_raw(raw: &str, input: &str) -> Result<Self, IdParseError> {
        if raw.trim().is_empty() {
            return Err(IdParseError {
                prefix: T::prefix(),
                input: input.to_string(),
            });
        }
        Ok(Self {
            raw: raw.to_string(),
            _marker: PhantomData,
        })
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.raw)
    }
}

impl<T: IdMarker> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de, T: IdMarker> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_raw(&raw, &raw).map_err(serde::de::Error::custom)
    }
}

/// IdParseError は空の ID
#[derive(Debug, thiserror::Error)]
#[error("invalid {prefix}id {input:?}: must not be empty")]
pub struct IdParseError {
    prefix: &'static str,
    input: String,
}

impl<T: IdMarker> FromStr for Id<T> {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix(T::prefix()).unwrap_or(s);
        Self::from_raw(raw, s)
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// Employer のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Employer {}

impl IdMarker for Employer {
    fn prefix() -> &'static str {
        "employer-"
    }
}

/// Shift のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Shift {}

impl IdMarker for Shift {
    fn prefix() -> &'static str {
        "shift-"
    }
}

/// AuditLog のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AuditLog {}

impl IdMarker for AuditLog {
    fn prefix() -> &'static str {
        "audit-"
    }
}

/// QueueJob のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Job {}

impl IdMarker for Job {
    fn prefix() -> &'static str {
        "job-"
    }
}

// ========================================
// Type Alias
// ========================================

/// Identifier of an employer (admin or employee account).
pub type EmployerId = Id<Employer>;

/// Identifier of one work interval.
pub type ShiftId = Id<Shift>;

/// Identifier of an append-only audit record.
pub type AuditLogId = Id<AuditLog>;

/// Identifier of a pending queue job.
pub type JobId = Id<Job>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn ids_are_distinct_types() {
        let shift = ShiftId::from_ulid(Ulid::new());
        let employer = EmployerId::from_ulid(Ulid::new());
        let job = JobId::from_ulid(Ulid::new());

        assert!(shift.to_string().starts_with("shift-"));
        assert!(employer.to_string().starts_with("employer-"));
        assert!(job.to_string().starts_with("job-"));

        // let _: ShiftId = employer; // <- does not compile
    }

    #[test]
    fn ids_serialize_as_bare_strings() {
        let ulid = Ulid::new();
        let id = ShiftId::from_ulid(ulid);

        let serialized = serde_json::to_string(&id).unwrap();
        assert_eq!(serialized, format!("\"{ulid}\""));

        let back: ShiftId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(back, id);
        assert_eq!(back.as_ulid(), Some(ulid));
    }

    #[rstest]
    #[case("3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    #[case("e1")]
    fn non_ulid_ids_are_kept_verbatim(#[case] raw: &str) {
        let id: EmployerId = serde_json::from_value(serde_json::json!(raw)).unwrap();
        assert_eq!(id.as_str(), raw);
        assert_eq!(id.as_ulid(), None);
        assert_eq!(serde_json::to_value(&id).unwrap(), serde_json::json!(raw));
    }

    #[test]
    fn from_str_accepts_prefixed_and_bare_forms() {
        let ulid = Ulid::new();
        let bare: EmployerId = ulid.to_string().parse().unwrap();
        let prefixed: EmployerId = format!("employer-{ulid}").parse().unwrap();

        assert_eq!(bare, prefixed);
        assert_eq!(bare.as_ulid(), Some(ulid));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("employer-")]
    fn empty_ids_are_rejected(#[case] input: &str) {
        let err = input.parse::<EmployerId>().unwrap_err();
        assert!(err.to_string().contains("employer-"));
    }

    #[test]
    fn empty_id_in_a_document_is_a_decode_error() {
        assert!(serde_json::from_str::<ShiftId>("\"\"").is_err());
    }
}
