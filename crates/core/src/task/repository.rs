//! Task repository trait
//!
//! Defines the interface for task storage operations.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use super::model::{NewTask, Task, TaskStatus};
use crate::Result;

/// Repository interface for task storage
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insert a draft; the store assigns the identifier and both timestamps
    async fn create(&self, draft: NewTask) -> Result<Task>;

    /// Get a task by ID; absence is `None`, not an error
    async fn get(&self, id: Uuid) -> Result<Option<Task>>;

    /// Get all tasks
    async fn list(&self) -> Result<Vec<Task>>;

    /// Write back a full task image, refreshing `updated_at`
    async fn update(&self, task: Task) -> Result<Task>;

    /// Delete a task by ID, returning whether a record was removed
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Find tasks by status, priority descending then oldest first
    async fn find_by_status(&self, status: TaskStatus) -> Result<Vec<Task>>;

    /// Find tasks whose title or description contains the keyword
    async fn search(&self, keyword: &str) -> Result<Vec<Task>>;

    /// Find tasks due on or before the given date, excluding completed and
    /// cancelled ones
    async fn find_overdue(&self, date: NaiveDate) -> Result<Vec<Task>>;

    /// Check whether any task carries the given title
    ///
    /// Not called by any service operation yet; reserved for title
    /// uniqueness enforcement.
    async fn exists_by_title(&self, title: &str) -> Result<bool>;
}
