//! SQLite-backed task store.

use async_trait::async_trait;
use mockable::{Clock, DefaultClock};
use std::sync::Arc;

use super::TaskStore;
use crate::error::StoreError;
use crate::ids::{TaskId, UserId};
use crate::storage::Database;
use crate::task::{TaskDraft, TaskStatus, TaskView};

/// Task store over the shared [`Database`].
///
/// Queries run on tokio's blocking pool.
#[derive(Clone)]
pub struct SqliteTaskStore {
    db: Arc<Database>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl SqliteTaskStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self::with_clock(db, Arc::new(DefaultClock))
    }

    pub fn with_clock(db: Arc<Database>, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self { db, clock }
    }

    async fn run_blocking<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Database) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
    }
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn create_task(&self, owner: &UserId, draft: TaskDraft) -> Result<TaskView, StoreError> {
        let owner = owner.clone();
        let now = self.clock.utc();
        self.run_blocking(move |db| Ok(db.insert_task(&owner, &draft, now)?))
            .await
    }

    async fn list_tasks(&self, owner: &UserId) -> Result<Vec<TaskView>, StoreError> {
        let owner = owner.clone();
        self.run_blocking(move |db| Ok(db.tasks_for(&owner)?)).await
    }

    async fn update_status(
        &self,
        id: &TaskId,
        status: TaskStatus,
    ) -> Result<TaskView, StoreError> {
        let id = id.clone();
        let now = self.clock.utc();
        self.run_blocking(move |db| {
            db.set_task_status(&id, status, now)?
                .ok_or(StoreError::NotFound(id))
        })
        .await
    }
}
