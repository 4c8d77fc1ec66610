//! StoreShiftRepository - JsonFileStore 上の ShiftRepository 実装

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{CompleteShift, EmployerId, NewShift, Shift, ShiftFilter, ShiftId, ShiftPatch};
use crate::error::{Result, RollcallError};
use crate::ports::ShiftRepository;
use crate::store::JsonFileStore;

fn shift_not_found() -> RollcallError {
    RollcallError::NotFound("Shift".to_string())
}

fn newest_first(shifts: &mut [Shift]) {
    shifts.sort_by(|a, b| b.started_at.cmp(&a.started_at));
}

pub struct StoreShiftRepository {
    store: Arc<JsonFileStore>,
}

impl StoreShiftRepository {
    pub fn new(store: Arc<JsonFileStore>) -> Self {
        Self { store }
    }

    fn new_record(&self, input: NewShift) -> Shift {
        Shift {
            id: self.store.generate_id(),
            employer_id: input.employer_id,
            started_at: input.started_at,
            start_tz: input.start_tz,
            ended_at: None,
            end_tz: None,
            notes: input.notes,
            updated_at: self.store.now(),
        }
    }
}

#[async_trait]
impl ShiftRepository for StoreShiftRepository {
    async fn find_open_shift_for_employer(&self, employer_id: EmployerId) -> Result<Option<Shift>> {
        let open = self
            .store
            .read_only(|state| state.newest_open_shift(&employer_id).cloned())
            .await?;
        Ok(open)
    }

    async fn create_shift(&self, input: NewShift) -> Result<Shift> {
        self.store
            .transaction(|state| {
                let shift = self.new_record(input);
                state.shifts.push(shift.clone());
                Ok(shift)
            })
            .await
    }

    async fn complete_shift(&self, shift_id: ShiftId, input: CompleteShift) -> Result<Shift> {
        self.store
            .transaction(|state| {
                let now = self.store.now();
                let shift = state.shift_mut(&shift_id).ok_or_else(shift_not_found)?;
                shift.ended_at = Some(input.ended_at);
                shift.end_tz = Some(input.end_tz);
                if let Some(notes) = input.notes {
                    shift.notes = Some(notes);
                }
                shift.updated_at = now;
                Ok(shift.clone())
            })
            .await
    }

    async fn list_shifts(&self, filter: &ShiftFilter) -> Result<Vec<Shift>> {
        let mut shifts = self
            .store
            .read_only(|state| {
                state
                    .shifts
                    .iter()
                    .filter(|s| filter.matches(s))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .await?;
        newest_first(&mut shifts);
        Ok(shifts)
    }

    async fn update_shift(&self, shift_id: ShiftId, patch: ShiftPatch) -> Result<Shift> {
        self.store
            .transaction(|state| {
                let now = self.store.now();
                let shift = state.shift_mut(&shift_id).ok_or_else(shift_not_found)?;
                patch.apply_to(shift);
                shift.updated_at = now;
                Ok(shift.clone())
            })
            .await
    }

    async fn delete_shift(&self, shift_id: ShiftId) -> Result<()> {
        self.store
            .transaction(|state| {
                let before = state.shifts.len();
                state.shifts.retain(|s| s.id != shift_id);
                if state.shifts.len() == before {
                    return Err(shift_not_found());
                }
                Ok(())
            })
            .await
    }

    async fn open_shift(&self, input: NewShift) -> Result<Shift> {
        self.store
            .transaction(|state| {
                if let Some(open) = state.newest_open_shift(&input.employer_id) {
                    return Err(RollcallError::Conflict(format!(
                        "{} already has an active shift ({})",
                        input.employer_id, open.id
                    )));
                }
                let shift = self.new_record(input);
                state.shifts.push(shift.clone());
                Ok(shift)
            })
            .await
    }

    async fn close_open_shift(
        &self,
        employer_id: EmployerId,
        ended_at: DateTime<Utc>,
        end_tz: String,
        notes: Option<String>,
    ) -> Result<Shift> {
        self.store
            .transaction(|state| {
                let now = self.store.now();
                let open_id = state
                    .newest_open_shift(&employer_id)
                    .map(|s| s.id.clone())
                    .ok_or_else(|| {
                        RollcallError::BadRequest(format!("no open shift for {employer_id}"))
                    })?;
                let shift = state.shift_mut(&open_id).ok_or_else(shift_not_found)?;
                shift.ended_at = Some(ended_at);
                shift.end_tz = Some(end_tz);
                if notes.is_some() {
                    shift.notes = notes;
                }
                shift.updated_at = now;
                Ok(shift.clone())
            })
            .await
    }
}
