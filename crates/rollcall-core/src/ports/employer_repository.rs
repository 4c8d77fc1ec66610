//! EmployerRepository port - employers コレクション
//!
//! 認証・ハッシュ化は外部の責務。ここは永続化のみ。

use async_trait::async_trait;

use crate::domain::{Employer, EmployerId, EmployerPatch, EmployerRecord, NewEmployer};
use crate::error::Result;

#[async_trait]
pub trait EmployerRepository: Send + Sync {
    async fn find_by_id(&self, id: EmployerId) -> Result<Option<Employer>>;

    /// 認証用: password_hash を含むレコードを返す
    async fn find_by_email(&self, email: &str) -> Result<Option<EmployerRecord>>;

    /// created_at 降順
    async fn list(&self) -> Result<Vec<Employer>>;

    /// Conflict if the email is already registered.
    async fn create(&self, input: NewEmployer) -> Result<Employer>;

    async fn update(&self, id: EmployerId, patch: EmployerPatch) -> Result<Employer>;

    /// Removes the employer and all of their shifts in one transaction.
    async fn delete(&self, id: EmployerId) -> Result<()>;
}
