//! StoreState - 永続化されるドキュメント全体

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::domain::{AuditLogRecord, EmployerId, EmployerRecord, QueueJob, Shift, ShiftId};

/// StoreState は state file の中身そのもの
///
/// # ファイル形式
/// トップレベルのキーは `employers`, `shifts`, `auditLogs`, `queues`。
/// 読み込み時はどのキーも省略可能（古いファイルには `queues` がない）。
/// 書き込み時は常に 4 つすべてを出力します。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    #[serde(default)]
    pub employers: Vec<EmployerRecord>,

    #[serde(default)]
    pub shifts: Vec<Shift>,

    #[serde(default)]
    pub audit_logs: Vec<AuditLogRecord>,

    /// topic → pending jobs (head = next to deliver)
    #[serde(default)]
    pub queues: BTreeMap<String, VecDeque<QueueJob>>,
}

impl StoreState {
    pub fn shift(&self, id: &ShiftId) -> Option<&Shift> {
        self.shifts.iter().find(|s| s.id == *id)
    }

    pub fn shift_mut(&mut self, id: &ShiftId) -> Option<&mut Shift> {
        self.shifts.iter_mut().find(|s| s.id == *id)
    }

    /// 最も新しく開始された open shift
    pub fn newest_open_shift(&self, employer_id: &EmployerId) -> Option<&Shift> {
        self.shifts
            .iter()
            .filter(|s| s.employer_id == *employer_id && s.is_open())
            .max_by_key(|s| s.started_at)
    }
}
