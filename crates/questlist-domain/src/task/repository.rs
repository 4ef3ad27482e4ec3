use async_trait::async_trait;
use tokio::sync::watch;

use super::TaskRecord;
use crate::shared::{DomainError, TaskId, UserId};

/// Task store boundary. `observe` returns a restartable watch stream:
/// the receiver's current value is the latest snapshot and every mutation
/// to the owner's tasks pushes a fresh one.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn observe(
        &self,
        owner_id: &UserId,
    ) -> Result<watch::Receiver<Vec<TaskRecord>>, DomainError>;

    async fn find_by_owner(&self, owner_id: &UserId) -> Result<Vec<TaskRecord>, DomainError>;

    async fn find_by_id(&self, id: &TaskId) -> Result<Option<TaskRecord>, DomainError>;

    async fn insert(&self, task: &TaskRecord) -> Result<(), DomainError>;

    async fn update(&self, task: &TaskRecord) -> Result<(), DomainError>;

    async fn delete(&self, id: &TaskId) -> Result<(), DomainError>;
}
