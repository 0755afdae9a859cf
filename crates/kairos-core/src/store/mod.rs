//! Task store port and its adapters.
//!
//! The store is an external collaborator: the core hands it drafts and
//! reads back [`TaskView`]s, and treats every failure it reports as opaque.

mod memory;
mod sqlite;

pub use memory::MemoryTaskStore;
pub use sqlite::SqliteTaskStore;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::ids::{TaskId, UserId};
use crate::task::{TaskDraft, TaskStatus, TaskView};

/// Task persistence contract.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persist a new open task owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the backend rejects the write.
    async fn create_task(&self, owner: &UserId, draft: TaskDraft) -> Result<TaskView, StoreError>;

    /// Every task owned by `owner`, in creation order.
    async fn list_tasks(&self, owner: &UserId) -> Result<Vec<TaskView>, StoreError>;

    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no task has the given id.
    async fn update_status(&self, id: &TaskId, status: TaskStatus)
        -> Result<TaskView, StoreError>;
}
