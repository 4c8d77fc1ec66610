//! StoreEmployerRepository - employers コレクションの永続化
//!
//! email は保存値をそのまま保持し、比較だけ ASCII の大文字小文字を無視する。

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{Employer, EmployerId, EmployerPatch, EmployerRecord, NewEmployer};
use crate::error::{Result, RollcallError};
use crate::ports::EmployerRepository;
use crate::store::JsonFileStore;

fn employer_not_found() -> RollcallError {
    RollcallError::NotFound("Employer".to_string())
}

fn same_email(stored: &str, wanted: &str) -> bool {
    stored.trim().eq_ignore_ascii_case(wanted)
}

pub struct StoreEmployerRepository {
    store: Arc<JsonFileStore>,
}

impl StoreEmployerRepository {
    pub fn new(store: Arc<JsonFileStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl EmployerRepository for StoreEmployerRepository {
    async fn find_by_id(&self, id: EmployerId) -> Result<Option<Employer>> {
        let found = self
            .store
            .read_only(|state| state.employers.iter().find(|e| e.id == id).map(Employer::from))
            .await?;
        Ok(found)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<EmployerRecord>> {
        let email = email.trim();
        let found = self
            .store
            .read_only(|state| {
                state
                    .employers
                    .iter()
                    .find(|e| same_email(&e.email, email))
                    .cloned()
            })
            .await?;
        Ok(found)
    }

    async fn list(&self) -> Result<Vec<Employer>> {
        let mut employers = self
            .store
            .read_only(|state| state.employers.iter().map(Employer::from).collect::<Vec<_>>())
            .await?;
        employers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(employers)
    }

    async fn create(&self, input: NewEmployer) -> Result<Employer> {
        let email = input.email.trim().to_string();
        if email.is_empty() {
            return Err(RollcallError::BadRequest("email must not be empty".to_string()));
        }
        self.store
            .transaction(|state| {
                if state.employers.iter().any(|e| same_email(&e.email, &email)) {
                    return Err(RollcallError::Conflict(format!(
                        "email {email} is already registered"
                    )));
                }
                let now = self.store.now();
                let record = EmployerRecord {
                    id: self.store.generate_id(),
                    email,
                    name: input.name,
                    role: input.role,
                    password_hash: input.password_hash,
                    created_at: now,
                    updated_at: now,
                };
                let employer = Employer::from(&record);
                state.employers.push(record);
                Ok(employer)
            })
            .await
    }

    async fn update(&self, id: EmployerId, patch: EmployerPatch) -> Result<Employer> {
        self.store
            .transaction(|state| {
                let now = self.store.now();
                let record = state
                    .employers
                    .iter_mut()
                    .find(|e| e.id == id)
                    .ok_or_else(employer_not_found)?;
                if let Some(name) = patch.name {
                    record.name = name;
                }
                if let Some(role) = patch.role {
                    record.role = role;
                }
                record.updated_at = now;
                Ok(Employer::from(&*record))
            })
            .await
    }

    async fn delete(&self, id: EmployerId) -> Result<()> {
        let removed_shifts = self
            .store
            .transaction(|state| {
                let before = state.employers.len();
                state.employers.retain(|e| e.id != id);
                if state.employers.len() == before {
                    return Err(employer_not_found());
                }
                let shifts = state.shifts.len();
                state.shifts.retain(|s| s.employer_id != id);
                Ok(shifts - state.shifts.len())
            })
            .await?;
        tracing::info!(employer_id = %id, removed_shifts, "employer deleted");
        Ok(())
    }
}
