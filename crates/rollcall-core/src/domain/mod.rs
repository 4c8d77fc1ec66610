//! Domain model (ids, shifts, audit logs, employers, queue jobs, reports).

pub mod audit;
pub mod employer;
pub mod ids;
pub mod queue_job;
pub mod report;
pub mod shift;
pub mod state;

pub use audit::{AUDIT_TOPIC, AuditAction, AuditLogRecord, NewAuditLog};
pub use employer::{Employer, EmployerPatch, EmployerRecord, EmployerRole, NewEmployer};
pub use ids::{AuditLogId, EmployerId, Id, IdMarker, IdParseError, JobId, ShiftId};
pub use queue_job::{JobPayload, QueueJob};
pub use report::{AttendanceReport, Pagination, ReportQuery, ReportRow};
pub use shift::{CompleteShift, NewShift, Shift, ShiftFilter, ShiftPatch, ShiftStatus};
pub use state::AttendanceState;
