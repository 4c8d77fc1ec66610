//! AttendanceService - sign-in / sign-off と管理者操作
//!
//! # フロー
//! 1. ShiftRepository で状態変更（1 トランザクション）
//! 2. 成功したら `audit:jobs` に監査 job を enqueue
//!
//! 状態変更が失敗した場合は何も enqueue しません。
//! 状態変更後に enqueue が失敗した場合、shift の変更はコミット済みのまま
//! エラーを呼び出し側に返します（監査ログは欠落する）。

use std::sync::Arc;

use serde_json::{Value, json};

use crate::domain::{
    AUDIT_TOPIC, AttendanceReport, AttendanceState, AuditAction, EmployerId, Id, IdMarker,
    JobPayload, NewShift, ReportQuery, Shift, ShiftFilter, ShiftId, ShiftPatch,
};
use crate::error::{Result, RollcallError};
use crate::ports::{Clock, JobQueue, ShiftRepository};

/// sign-in の入力
#[derive(Debug, Clone)]
pub struct SignIn {
    pub employer_id: EmployerId,
    pub timezone: String,
    pub notes: Option<String>,
}

/// sign-off の入力。`notes` が None なら既存の notes を維持
#[derive(Debug, Clone)]
pub struct SignOff {
    pub employer_id: EmployerId,
    pub timezone: String,
    pub notes: Option<String>,
}

fn require_timezone(timezone: &str) -> Result<()> {
    if timezone.trim().is_empty() {
        return Err(RollcallError::BadRequest("timezone must not be empty".to_string()));
    }
    Ok(())
}

fn audit_payload(action: AuditAction, fields: Value) -> JobPayload {
    let mut payload = JobPayload::new();
    payload.insert("action".to_string(), Value::from(action.as_str()));
    if let Value::Object(fields) = fields {
        payload.extend(fields);
    }
    payload
}

/// Ids go into audit payloads as bare strings, the same form as the state file.
fn id_value<T: IdMarker>(id: &Id<T>) -> Value {
    Value::from(id.as_str())
}

pub struct AttendanceService {
    shifts: Arc<dyn ShiftRepository>,
    queue: Arc<dyn JobQueue>,
    clock: Arc<dyn Clock>,
}

impl AttendanceService {
    pub fn new(
        shifts: Arc<dyn ShiftRepository>,
        queue: Arc<dyn JobQueue>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            shifts,
            queue,
            clock,
        }
    }

    async fn audit(&self, action: AuditAction, fields: Value) -> Result<()> {
        let job_id = self
            .queue
            .enqueue(AUDIT_TOPIC, audit_payload(action, fields))
            .await?;
        tracing::debug!(%action, %job_id, "audit job enqueued");
        Ok(())
    }

    pub async fn state(&self, employer_id: EmployerId) -> Result<AttendanceState> {
        let open = self.shifts.find_open_shift_for_employer(employer_id).await?;
        Ok(AttendanceState::from(open))
    }

    /// Conflict if the employer already has an active shift.
    pub async fn sign_in(&self, input: SignIn) -> Result<Shift> {
        require_timezone(&input.timezone)?;
        let shift = self
            .shifts
            .open_shift(NewShift {
                employer_id: input.employer_id,
                started_at: self.clock.now(),
                start_tz: input.timezone,
                notes: input.notes,
            })
            .await?;

        self.audit(
            AuditAction::SignIn,
            json!({
                "employerId": id_value(&shift.employer_id),
                "shiftId": id_value(&shift.id),
            }),
        )
        .await?;
        tracing::info!(employer_id = %shift.employer_id, shift_id = %shift.id, "signed in");
        Ok(shift)
    }

    /// BadRequest if the employer has no open shift.
    pub async fn sign_off(&self, input: SignOff) -> Result<Shift> {
        require_timezone(&input.timezone)?;
        let shift = self
            .shifts
            .close_open_shift(input.employer_id, self.clock.now(), input.timezone, input.notes)
            .await?;

        self.audit(
            AuditAction::SignOff,
            json!({
                "employerId": id_value(&shift.employer_id),
                "shiftId": id_value(&shift.id),
            }),
        )
        .await?;
        tracing::info!(employer_id = %shift.employer_id, shift_id = %shift.id, "signed off");
        Ok(shift)
    }

    pub async fn list_shifts(&self, filter: &ShiftFilter) -> Result<Vec<Shift>> {
        self.shifts.list_shifts(filter).await
    }

    /// 管理者による上書き。open shift の一意性などは再検証しない
    pub async fn update_shift(&self, shift_id: ShiftId, patch: ShiftPatch) -> Result<Shift> {
        let updates = serde_json::to_value(&patch)
            .map_err(|e| RollcallError::BadRequest(format!("unencodable patch: {e}")))?;
        let shift = self.shifts.update_shift(shift_id.clone(), patch).await?;

        self.audit(
            AuditAction::ShiftUpdated,
            json!({
                "employerId": id_value(&shift.employer_id),
                "shiftId": id_value(&shift_id),
                "updates": updates,
            }),
        )
        .await?;
        Ok(shift)
    }

    pub async fn delete_shift(&self, shift_id: ShiftId) -> Result<()> {
        self.shifts.delete_shift(shift_id.clone()).await?;
        self.audit(AuditAction::ShiftDeleted, json!({ "shiftId": id_value(&shift_id) }))
            .await
    }

    /// 絞り込み済みの shift をページングしてレポートにする
    pub async fn report(&self, query: &ReportQuery) -> Result<AttendanceReport> {
        let shifts = self.shifts.list_shifts(&query.filter).await?;
        Ok(AttendanceReport::paginate(&shifts, query.page, query.limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{QueueJob, ShiftStatus};
    use crate::error::ErrorKind;
    use crate::impls::{FileJobQueue, StoreShiftRepository};
    use crate::ports::FixedClock;
    use crate::store::{JsonFileStore, WriteMode};
    use chrono::{Duration, TimeZone, Utc};
    use rstest::rstest;
    use ulid::Ulid;

    struct Fixture {
        _dir: tempfile::TempDir,
        clock: Arc<FixedClock>,
        queue: Arc<FileJobQueue>,
        service: AttendanceService,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 6, 3, 8, 0, 0).unwrap(),
        ));
        let store = Arc::new(JsonFileStore::with_clock(
            dir.path().join("store.json"),
            WriteMode::InPlace,
            clock.clone(),
        ));
        let queue = Arc::new(FileJobQueue::new(Arc::clone(&store)));
        let service = AttendanceService::new(
            Arc::new(StoreShiftRepository::new(store)),
            queue.clone(),
            clock.clone(),
        );
        Fixture {
            _dir: dir,
            clock,
            queue,
            service,
        }
    }

    fn employer() -> EmployerId {
        EmployerId::from_ulid(Ulid::new())
    }

    fn sign_in(employer_id: &EmployerId) -> SignIn {
        SignIn {
            employer_id: employer_id.clone(),
            timezone: "Australia/Sydney".to_string(),
            notes: None,
        }
    }

    fn sign_off(employer_id: &EmployerId) -> SignOff {
        SignOff {
            employer_id: employer_id.clone(),
            timezone: "Australia/Sydney".to_string(),
            notes: Some("closed the till".to_string()),
        }
    }

    async fn drain_audit(queue: &FileJobQueue) -> Vec<QueueJob> {
        let mut jobs = Vec::new();
        while let Some(job) = queue.dequeue(AUDIT_TOPIC).await.unwrap() {
            jobs.push(job);
        }
        jobs
    }

    #[tokio::test]
    async fn sign_in_then_sign_off_then_list() {
        let f = fixture();
        let emp = employer();

        let opened = f.service.sign_in(sign_in(&emp)).await.unwrap();
        assert!(f.service.state(emp.clone()).await.unwrap().is_on_shift());

        f.clock.advance(Duration::hours(8));
        let closed = f.service.sign_off(sign_off(&emp)).await.unwrap();
        assert_eq!(closed.id, opened.id);
        assert_eq!(closed.notes.as_deref(), Some("closed the till"));
        assert_eq!(f.service.state(emp.clone()).await.unwrap(), AttendanceState::NoOpenShift);

        let listed = f
            .service
            .list_shifts(&ShiftFilter::for_employer(emp.clone()))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        let ended_at = listed[0].ended_at.unwrap();
        assert!(listed[0].started_at <= ended_at);
        assert_eq!(ended_at - listed[0].started_at, Duration::hours(8));
    }

    #[tokio::test]
    async fn lifecycle_enqueues_audit_jobs_in_order() {
        let f = fixture();
        let emp = employer();

        let shift = f.service.sign_in(sign_in(&emp)).await.unwrap();
        f.service.sign_off(sign_off(&emp)).await.unwrap();

        let jobs = drain_audit(&f.queue).await;
        let actions: Vec<_> = jobs.iter().map(|j| j.payload["action"].clone()).collect();
        assert_eq!(
            actions,
            vec![json!("attendance.sign-in"), json!("attendance.sign-off")]
        );
        assert_eq!(jobs[0].payload["employerId"], emp.as_str());
        assert_eq!(jobs[0].payload["shiftId"], shift.id.as_str());
    }

    #[tokio::test]
    async fn second_sign_in_conflicts_without_audit() {
        let f = fixture();
        let emp = employer();
        f.service.sign_in(sign_in(&emp)).await.unwrap();

        let err = f.service.sign_in(sign_in(&emp)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(f.queue.depth(AUDIT_TOPIC).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn sign_off_without_open_shift_is_bad_request() {
        let f = fixture();
        let err = f.service.sign_off(sign_off(&employer())).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(f.queue.depth(AUDIT_TOPIC).await.unwrap(), 0);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[tokio::test]
    async fn blank_timezone_is_rejected(#[case] timezone: &str) {
        let f = fixture();
        let input = SignIn {
            timezone: timezone.to_string(),
            ..sign_in(&employer())
        };
        let err = f.service.sign_in(input).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn update_enqueues_the_applied_patch() {
        let f = fixture();
        let emp = employer();
        let shift = f.service.sign_in(sign_in(&emp)).await.unwrap();
        drain_audit(&f.queue).await;

        let patch = ShiftPatch {
            notes: Some(Some("covered lunch".to_string())),
            ..ShiftPatch::default()
        };
        let updated = f.service.update_shift(shift.id.clone(), patch).await.unwrap();
        assert_eq!(updated.notes.as_deref(), Some("covered lunch"));

        let jobs = drain_audit(&f.queue).await;
        assert_eq!(jobs.len(), 1);
        let payload = &jobs[0].payload;
        assert_eq!(payload["action"], "attendance.shift-updated");
        assert_eq!(payload["employerId"], emp.as_str());
        assert_eq!(payload["updates"], json!({"notes": "covered lunch"}));
    }

    #[tokio::test]
    async fn delete_enqueues_shift_id_only() {
        let f = fixture();
        let shift = f.service.sign_in(sign_in(&employer())).await.unwrap();
        drain_audit(&f.queue).await;

        f.service.delete_shift(shift.id.clone()).await.unwrap();
        let jobs = drain_audit(&f.queue).await;
        assert_eq!(
            serde_json::Value::Object(jobs[0].payload.clone()),
            json!({
                "action": "attendance.shift-deleted",
                "shiftId": shift.id.as_str(),
            })
        );

        let err = f.service.delete_shift(shift.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(drain_audit(&f.queue).await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_sign_ins_admit_exactly_one() {
        let f = fixture();
        let service = Arc::new(f.service);
        let emp = employer();

        let mut joins = Vec::new();
        for _ in 0..12 {
            let service = Arc::clone(&service);
            let emp = emp.clone();
            joins.push(tokio::spawn(async move { service.sign_in(sign_in(&emp)).await }));
        }
        let mut ok = 0;
        for j in joins {
            match j.await.unwrap() {
                Ok(_) => ok += 1,
                Err(err) => assert_eq!(err.kind(), ErrorKind::Conflict),
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(f.queue.depth(AUDIT_TOPIC).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn report_pages_and_marks_status() {
        let f = fixture();
        let emp = employer();
        for _ in 0..3 {
            f.service.sign_in(sign_in(&emp)).await.unwrap();
            f.clock.advance(Duration::minutes(90));
            f.service.sign_off(sign_off(&emp)).await.unwrap();
            f.clock.advance(Duration::hours(1));
        }
        f.service.sign_in(sign_in(&emp)).await.unwrap();

        let report = f
            .service
            .report(&ReportQuery {
                filter: ShiftFilter::for_employer(emp.clone()),
                page: 1,
                limit: 3,
            })
            .await
            .unwrap();

        assert_eq!(report.pagination.total, 4);
        assert_eq!(report.pagination.total_pages, 2);
        assert_eq!(report.report.len(), 3);
        assert_eq!(report.report[0].status, ShiftStatus::Active);
        assert_eq!(report.report[0].duration_hours, None);
        assert_eq!(report.report[1].duration_hours, Some(1.5));
    }
}
