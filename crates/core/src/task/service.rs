//! Task service
//!
//! Forwards each operation to the repository, adding existence
//! enforcement: every id-scoped operation resolves the record first and
//! fails with [`Error::TaskNotFound`] when it is absent.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::model::{NewTask, Task, TaskStatus};
use super::repository::TaskRepository;
use crate::{Error, Result};

/// Task service over a repository
#[derive(Clone)]
pub struct TaskService {
    repo: Arc<dyn TaskRepository>,
}

impl TaskService {
    /// Create a new service over the given repository
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        Self { repo }
    }

    /// Create a task from a draft
    pub async fn create(&self, draft: NewTask) -> Result<Task> {
        self.repo.create(draft).await
    }

    /// Get a task by ID
    pub async fn get(&self, id: Uuid) -> Result<Task> {
        self.repo.get(id).await?.ok_or(Error::TaskNotFound(id))
    }

    /// Get all tasks
    pub async fn list(&self) -> Result<Vec<Task>> {
        self.repo.list().await
    }

    /// Get tasks with the given status, priority descending then oldest first
    pub async fn by_status(&self, status: TaskStatus) -> Result<Vec<Task>> {
        self.repo.find_by_status(status).await
    }

    /// Replace every mutable field of an existing task
    pub async fn update(&self, id: Uuid, draft: NewTask) -> Result<Task> {
        let mut task = self.get(id).await?;
        task.apply(draft);
        self.repo.update(task).await
    }

    /// Change only the status of an existing task
    pub async fn update_status(&self, id: Uuid, status: TaskStatus) -> Result<Task> {
        let mut task = self.get(id).await?;
        task.status = status;
        self.repo.update(task).await
    }

    /// Delete an existing task
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.get(id).await?;
        self.repo.delete(id).await?;
        Ok(())
    }

    /// Find tasks whose title or description contains the keyword
    pub async fn search(&self, keyword: &str) -> Result<Vec<Task>> {
        self.repo.search(keyword).await
    }

    /// Find tasks due on or before today (UTC) that are neither completed
    /// nor cancelled
    pub async fn overdue(&self) -> Result<Vec<Task>> {
        self.repo.find_overdue(Utc::now().date_naive()).await
    }
}
