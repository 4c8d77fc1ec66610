//! State - employer ごとの勤怠状態

use super::shift::Shift;

/// AttendanceState は employer 単位の状態機械
///
/// # 状態遷移
/// - NoOpenShift --(sign-in)--> OnShift
/// - OnShift --(sign-off)--> NoOpenShift
/// - OnShift --(admin update)--> OnShift
/// - 管理者の delete は shift 自体を消す（状態とは独立）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttendanceState {
    NoOpenShift,
    OnShift(Shift),
}

impl AttendanceState {
    pub fn is_on_shift(&self) -> bool {
        matches!(self, AttendanceState::OnShift(_))
    }

    pub fn open_shift(&self) -> Option<&Shift> {
        match self {
            AttendanceState::OnShift(shift) => Some(shift),
            AttendanceState::NoOpenShift => None,
        }
    }
}

impl From<Option<Shift>> for AttendanceState {
    fn from(open: Option<Shift>) -> Self {
        match open {
            Some(shift) => AttendanceState::OnShift(shift),
            None => AttendanceState::NoOpenShift,
        }
    }
}
