//! Application state

use std::sync::Arc;

use tasklist_core::task::{SqliteTaskStore, TaskService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    tasks: TaskService,
}

impl AppState {
    /// Create a new AppState over the given store
    pub fn new(store: SqliteTaskStore) -> Self {
        let tasks = TaskService::new(Arc::new(store));
        Self {
            inner: Arc::new(AppStateInner { tasks }),
        }
    }

    /// Get reference to the task service
    pub fn tasks(&self) -> &TaskService {
        &self.inner.tasks
    }
}
