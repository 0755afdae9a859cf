//! In-memory task store for tests and the local chat loop.

use async_trait::async_trait;
use std::sync::{Arc, PoisonError, RwLock};

use super::TaskStore;
use crate::error::StoreError;
use crate::ids::{TaskId, UserId};
use crate::task::{TaskDraft, TaskStatus, TaskView};

/// Thread-safe in-memory task store.
#[derive(Debug, Clone, Default)]
pub struct MemoryTaskStore {
    tasks: Arc<RwLock<Vec<(UserId, TaskView)>>>,
}

impl MemoryTaskStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn create_task(&self, owner: &UserId, draft: TaskDraft) -> Result<TaskView, StoreError> {
        let task = TaskView::from_draft(TaskId::generate(), draft);
        self.tasks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((owner.clone(), task.clone()));
        Ok(task)
    }

    async fn list_tasks(&self, owner: &UserId) -> Result<Vec<TaskView>, StoreError> {
        let tasks = self.tasks.read().unwrap_or_else(PoisonError::into_inner);
        Ok(tasks
            .iter()
            .filter(|(o, _)| o == owner)
            .map(|(_, t)| t.clone())
            .collect())
    }

    async fn update_status(
        &self,
        id: &TaskId,
        status: TaskStatus,
    ) -> Result<TaskView, StoreError> {
        let mut tasks = self.tasks.write().unwrap_or_else(PoisonError::into_inner);
        let (_, task) = tasks
            .iter_mut()
            .find(|(_, t)| &t.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        task.status = status;
        Ok(task.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Priority;

    fn draft(title: &str) -> TaskDraft {
        TaskDraft {
            title: title.to_string(),
            priority: Priority::Normal,
            due_date: None,
            project: None,
        }
    }

    #[tokio::test]
    async fn lists_only_the_owners_tasks() {
        let store = MemoryTaskStore::new();
        let alice = UserId::new("alice");
        let a = store.create_task(&alice, draft("one")).await.unwrap();
        store.create_task(&UserId::new("bob"), draft("two")).await.unwrap();
        let b = store.create_task(&alice, draft("three")).await.unwrap();
        assert_eq!(store.list_tasks(&alice).await.unwrap(), vec![a, b]);
    }

    #[tokio::test]
    async fn update_status_marks_done_or_reports_missing() {
        let store = MemoryTaskStore::new();
        let task = store.create_task(&UserId::new("u"), draft("x")).await.unwrap();
        let done = store.update_status(&task.id, TaskStatus::Done).await.unwrap();
        assert_eq!(done.status, TaskStatus::Done);
        let missing = TaskId::new("nope");
        assert_eq!(
            store.update_status(&missing, TaskStatus::Done).await,
            Err(StoreError::NotFound(missing))
        );
    }
}
