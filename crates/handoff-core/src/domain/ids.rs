//! Domain identifiers (strongly-typed IDs).
//!
//! ULID ベースの ID を Phantom type パターンで型付けしています。
//! - **TaskId**: 1 回の `execute` 呼び出しを識別（ログとエラーメッセージに出る）
//! - **ReportId**: 記録されたエラーレポートを識別

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
pub trait IdMarker: Send + Sync + 'static {
    /// Display で使うプレフィックス（例: "task-"）
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
///
/// `T` は実行時にはメモリを消費しないマーカーです。
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

/// Dispatched task のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dispatched {}

impl IdMarker for Dispatched {
    fn prefix() -> &'static str {
        "task-"
    }
}

/// Report のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Report {}

impl IdMarker for Report {
    fn prefix() -> &'static str {
        "report-"
    }
}

/// Identifier of one `execute` call.
pub type TaskId = Id<Dispatched>;

/// Identifier of a recorded error report.
pub type ReportId = Id<Report>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_distinguish_id_kinds() {
        let task = TaskId::from_ulid(Ulid::new());
        let report = ReportId::from_ulid(Ulid::new());

        assert!(task.to_string().starts_with("task-"));
        assert!(report.to_string().starts_with("report-"));
    }

    #[test]
    fn ids_serialize_as_plain_ulid() {
        let ulid = Ulid::new();
        let task_id: TaskId = ulid.into();

        let serialized = serde_json::to_string(&task_id).unwrap();
        assert_eq!(serialized, format!("\"{ulid}\""));

        let back: TaskId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(back, task_id);
    }

    #[test]
    fn phantom_data_does_not_consume_memory() {
        use std::mem::size_of;
        assert_eq!(size_of::<TaskId>(), size_of::<Ulid>());
    }
}
