//! Attendance report views (paginated shift listing with durations).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{EmployerId, ShiftId};
use super::shift::{Shift, ShiftFilter, ShiftStatus};

pub const DEFAULT_PAGE_LIMIT: usize = 50;

/// ReportQuery はレポートの検索条件
///
/// `page` は 1 始まり。
#[derive(Debug, Clone)]
pub struct ReportQuery {
    pub filter: ShiftFilter,
    pub page: usize,
    pub limit: usize,
}

impl Default for ReportQuery {
    fn default() -> Self {
        Self {
            filter: ShiftFilter::default(),
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub id: ShiftId,
    pub employer_id: EmployerId,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Hours rounded to two decimals; `None` while the shift is active.
    pub duration_hours: Option<f64>,
    pub status: ShiftStatus,
}

impl From<&Shift> for ReportRow {
    fn from(shift: &Shift) -> Self {
        let duration_hours = shift.duration().map(|d| {
            let hours = d.num_milliseconds() as f64 / 3_600_000.0;
            (hours * 100.0).round() / 100.0
        });
        Self {
            id: shift.id.clone(),
            employer_id: shift.employer_id.clone(),
            started_at: shift.started_at,
            ended_at: shift.ended_at,
            duration_hours,
            status: shift.status(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceReport {
    pub report: Vec<ReportRow>,
    pub pagination: Pagination,
}

impl AttendanceReport {
    /// Build one page from shifts already ordered newest first.
    pub fn paginate(shifts: &[Shift], page: usize, limit: usize) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        let total = shifts.len();
        let report = shifts
            .iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .map(ReportRow::from)
            .collect();
        Self {
            report,
            pagination: Pagination {
                total,
                page,
                limit,
                total_pages: total.div_ceil(limit),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;
    use ulid::Ulid;

    fn shift_at(hour: u32, minutes_worked: Option<i64>) -> Shift {
        let started = Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap();
        Shift {
            id: ShiftId::from_ulid(Ulid::new()),
            employer_id: EmployerId::from_ulid(Ulid::new()),
            started_at: started,
            start_tz: "UTC".to_string(),
            ended_at: minutes_worked.map(|m| started + Duration::minutes(m)),
            end_tz: minutes_worked.map(|_| "UTC".to_string()),
            notes: None,
            updated_at: started,
        }
    }

    #[test]
    fn row_rounds_duration_to_two_decimals() {
        let row = ReportRow::from(&shift_at(9, Some(100)));
        assert_eq!(row.duration_hours, Some(1.67));
        assert_eq!(row.status, ShiftStatus::Completed);

        let active = ReportRow::from(&shift_at(9, None));
        assert_eq!(active.duration_hours, None);
        assert_eq!(active.status, ShiftStatus::Active);
    }

    #[test]
    fn paginate_splits_pages() {
        let shifts: Vec<Shift> = (0..5).map(|h| shift_at(h, Some(60))).collect();

        let first = AttendanceReport::paginate(&shifts, 1, 2);
        assert_eq!(first.report.len(), 2);
        assert_eq!(first.pagination.total, 5);
        assert_eq!(first.pagination.total_pages, 3);

        let last = AttendanceReport::paginate(&shifts, 3, 2);
        assert_eq!(last.report.len(), 1);
        assert_eq!(last.report[0].id, shifts[4].id);

        let past_end = AttendanceReport::paginate(&shifts, 9, 2);
        assert!(past_end.report.is_empty());
    }

    #[test]
    fn paginate_clamps_zero_page_and_limit() {
        let shifts = vec![shift_at(1, None)];
        let report = AttendanceReport::paginate(&shifts, 0, 0);
        assert_eq!(report.pagination.page, 1);
        assert_eq!(report.pagination.limit, 1);
        assert_eq!(report.report.len(), 1);
    }

    #[rstest]
    #[case(usize::MAX, 50)]
    #[case(2, usize::MAX)]
    #[case(usize::MAX, usize::MAX)]
    fn paginate_far_past_the_end_is_empty(#[case] page: usize, #[case] limit: usize) {
        let shifts: Vec<Shift> = (0..5).map(|h| shift_at(h, Some(60))).collect();
        let report = AttendanceReport::paginate(&shifts, page, limit);
        assert!(report.report.is_empty());
        assert_eq!(report.pagination.total, 5);
        assert_eq!(report.pagination.page, page);
    }
}
