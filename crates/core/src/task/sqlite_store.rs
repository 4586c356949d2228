//! SQLite-backed task storage implementation
//!
//! Stores tasks in a relational table via sqlx, using parameterized
//! runtime queries.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::model::{NewTask, Task, TaskPriority, TaskStatus};
use super::repository::TaskRepository;
use crate::{Error, Result};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
    id          TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    description TEXT,
    due_date    TEXT,
    status      TEXT NOT NULL,
    priority    TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
)
"#;

const COLUMNS: &str = "id, title, description, due_date, status, priority, created_at, updated_at";

// HIGH sorts before MEDIUM before LOW.
const PRIORITY_RANK: &str =
    "CASE priority WHEN 'HIGH' THEN 0 WHEN 'MEDIUM' THEN 1 ELSE 2 END";

/// SQLite-backed task store
#[derive(Clone)]
pub struct SqliteTaskStore {
    pool: SqlitePool,
}

impl SqliteTaskStore {
    /// Connect to the database at the given URL and bootstrap the schema
    ///
    /// The database file is created if it does not exist yet.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        tracing::debug!("Connected to task database at {}", url);
        Self::with_pool(pool).await
    }

    /// Open a private in-memory database
    ///
    /// The pool is capped at a single connection because each in-memory
    /// SQLite connection sees its own database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Reference to the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn row_to_task(row: &SqliteRow) -> Result<Task> {
    let id: String = row.try_get("id")?;
    let id = Uuid::parse_str(&id)
        .map_err(|e| Error::Storage(format!("invalid task id {id:?}: {e}")))?;

    let status: String = row.try_get("status")?;
    let status = TaskStatus::parse_str(&status)
        .ok_or_else(|| Error::Storage(format!("unknown status {status:?}")))?;

    let priority: String = row.try_get("priority")?;
    let priority = TaskPriority::parse_str(&priority)
        .ok_or_else(|| Error::Storage(format!("unknown priority {priority:?}")))?;

    Ok(Task {
        id,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        due_date: row.try_get::<Option<NaiveDate>, _>("due_date")?,
        status,
        priority,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

fn rows_to_tasks(rows: Vec<SqliteRow>) -> Result<Vec<Task>> {
    rows.iter().map(row_to_task).collect()
}

#[async_trait]
impl TaskRepository for SqliteTaskStore {
    async fn create(&self, draft: NewTask) -> Result<Task> {
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            title: draft.title,
            description: draft.description,
            due_date: draft.due_date,
            status: draft.status,
            priority: draft.priority,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO tasks (id, title, description, due_date, status, priority, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(task.id.to_string())
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.due_date)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(task)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Task>> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM tasks WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_task).transpose()
    }

    async fn list(&self) -> Result<Vec<Task>> {
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM tasks ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows_to_tasks(rows)
    }

    async fn update(&self, mut task: Task) -> Result<Task> {
        task.updated_at = Utc::now();

        let result = sqlx::query(
            "UPDATE tasks SET title = ?, description = ?, due_date = ?, status = ?, \
             priority = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.due_date)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(task.updated_at)
        .bind(task.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::TaskNotFound(task.id));
        }
        Ok(task)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_status(&self, status: TaskStatus) -> Result<Vec<Task>> {
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM tasks WHERE status = ? \
             ORDER BY {PRIORITY_RANK}, created_at ASC"
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows_to_tasks(rows)
    }

    async fn search(&self, keyword: &str) -> Result<Vec<Task>> {
        // SQLite LIKE is case-insensitive for ASCII by default; that is the
        // search semantics offered here.
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM tasks \
             WHERE title LIKE '%' || ? || '%' OR description LIKE '%' || ? || '%'"
        ))
        .bind(keyword)
        .bind(keyword)
        .fetch_all(&self.pool)
        .await?;

        rows_to_tasks(rows)
    }

    async fn find_overdue(&self, date: NaiveDate) -> Result<Vec<Task>> {
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM tasks \
             WHERE due_date IS NOT NULL AND due_date <= ? \
             AND status NOT IN ('COMPLETED', 'CANCELLED')"
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        rows_to_tasks(rows)
    }

    async fn exists_by_title(&self, title: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM tasks WHERE title = ? LIMIT 1")
            .bind(title)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;
    use std::time::Duration;

    async fn create_test_store() -> SqliteTaskStore {
        SqliteTaskStore::in_memory().await.unwrap()
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    #[tokio::test]
    async fn test_create_assigns_identity_and_timestamps() {
        let store = create_test_store().await;

        let created = store
            .create(NewTask::new("Test task").with_description("A test description"))
            .await
            .unwrap();

        assert!(!created.id.is_nil());
        assert_eq!(created.title, "Test task");
        assert_eq!(created.description, Some("A test description".to_string()));
        assert_eq!(created.created_at, created.updated_at);
    }

    #[tokio::test]
    async fn test_get_task() {
        let store = create_test_store().await;

        let created = store.create(NewTask::new("Test task")).await.unwrap();

        let retrieved = store.get(created.id).await.unwrap();
        assert!(retrieved.is_some());
        assert_eq!(retrieved.unwrap().id, created.id);

        // Absence is None, not an error
        let non_existent = store.get(Uuid::new_v4()).await.unwrap();
        assert!(non_existent.is_none());
    }

    #[tokio::test]
    async fn test_list_tasks() {
        let store = create_test_store().await;

        store.create(NewTask::new("Task 1")).await.unwrap();
        store.create(NewTask::new("Task 2")).await.unwrap();
        store.create(NewTask::new("Task 3")).await.unwrap();

        let tasks = store.list().await.unwrap();
        assert_eq!(tasks.len(), 3);
    }

    #[tokio::test]
    async fn test_update_task() {
        let store = create_test_store().await;

        let created = store.create(NewTask::new("Original title")).await.unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;

        let mut task = store.get(created.id).await.unwrap().unwrap();
        task.title = "Updated title".to_string();
        task.status = TaskStatus::InProgress;

        let result = store.update(task).await.unwrap();
        assert_eq!(result.title, "Updated title");
        assert_eq!(result.status, TaskStatus::InProgress);
        assert_eq!(result.created_at, created.created_at);
        assert!(result.updated_at > result.created_at);

        // Verify persistence
        let retrieved = store.get(created.id).await.unwrap().unwrap();
        assert_eq!(retrieved.title, "Updated title");
        assert_eq!(retrieved.status, TaskStatus::InProgress);
    }

    #[tokio::test]
    async fn test_update_nonexistent_task() {
        let store = create_test_store().await;

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            title: "Ghost".to_string(),
            description: None,
            due_date: None,
            status: TaskStatus::Pending,
            priority: TaskPriority::Medium,
            created_at: now,
            updated_at: now,
        };

        let result = store.update(task).await;
        assert!(result.is_err());
        match result.unwrap_err() {
            Error::TaskNotFound(_) => {}
            e => panic!("Expected TaskNotFound error, got: {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_delete_task() {
        let store = create_test_store().await;

        let created = store.create(NewTask::new("Task to delete")).await.unwrap();
        assert!(store.get(created.id).await.unwrap().is_some());

        let deleted = store.delete(created.id).await.unwrap();
        assert!(deleted);
        assert!(store.get(created.id).await.unwrap().is_none());

        // Delete again should return false
        let deleted_again = store.delete(created.id).await.unwrap();
        assert!(!deleted_again);
    }

    #[tokio::test]
    async fn test_find_by_status_orders_by_priority_then_age() {
        let store = create_test_store().await;

        let low = store
            .create(NewTask::new("Low").with_priority(TaskPriority::Low))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let high_old = store
            .create(NewTask::new("High old").with_priority(TaskPriority::High))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let high_new = store
            .create(NewTask::new("High new").with_priority(TaskPriority::High))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let medium = store
            .create(NewTask::new("Medium").with_priority(TaskPriority::Medium))
            .await
            .unwrap();

        // Different status must not appear
        store
            .create(
                NewTask::new("Done")
                    .with_status(TaskStatus::Completed)
                    .with_priority(TaskPriority::High),
            )
            .await
            .unwrap();

        let tasks = store.find_by_status(TaskStatus::Pending).await.unwrap();
        let ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![high_old.id, high_new.id, medium.id, low.id]);
    }

    #[tokio::test]
    async fn test_search_matches_title_or_description() {
        let store = create_test_store().await;

        let by_title = store
            .create(NewTask::new("Buy groceries"))
            .await
            .unwrap();
        let by_description = store
            .create(NewTask::new("Errand").with_description("order groceries online"))
            .await
            .unwrap();
        store.create(NewTask::new("Unrelated")).await.unwrap();

        let mut found: Vec<Uuid> = store
            .search("groceries")
            .await
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        found.sort();

        let mut expected = vec![by_title.id, by_description.id];
        expected.sort();
        assert_eq!(found, expected);

        let none = store.search("no such keyword").await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_find_overdue_excludes_terminal_statuses() {
        let store = create_test_store().await;
        let yesterday = today() - Days::new(1);
        let tomorrow = today() + Days::new(1);

        let pending_overdue = store
            .create(NewTask::new("Pending overdue").with_due_date(yesterday))
            .await
            .unwrap();
        let due_today = store
            .create(
                NewTask::new("Due today")
                    .with_due_date(today())
                    .with_status(TaskStatus::InProgress),
            )
            .await
            .unwrap();
        store
            .create(
                NewTask::new("Completed overdue")
                    .with_due_date(yesterday)
                    .with_status(TaskStatus::Completed),
            )
            .await
            .unwrap();
        store
            .create(
                NewTask::new("Cancelled overdue")
                    .with_due_date(yesterday)
                    .with_status(TaskStatus::Cancelled),
            )
            .await
            .unwrap();
        store
            .create(NewTask::new("Due tomorrow").with_due_date(tomorrow))
            .await
            .unwrap();
        store.create(NewTask::new("No due date")).await.unwrap();

        let mut found: Vec<Uuid> = store
            .find_overdue(today())
            .await
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        found.sort();

        let mut expected = vec![pending_overdue.id, due_today.id];
        expected.sort();
        assert_eq!(found, expected);
    }

    #[tokio::test]
    async fn test_exists_by_title() {
        let store = create_test_store().await;

        store.create(NewTask::new("Unique title")).await.unwrap();

        assert!(store.exists_by_title("Unique title").await.unwrap());
        assert!(!store.exists_by_title("Missing title").await.unwrap());
    }

    #[tokio::test]
    async fn test_persistence_across_connections() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let url = format!("sqlite://{}", temp_dir.path().join("tasks.db").display());

        let task_id;

        // Connect, insert, close
        {
            let store = SqliteTaskStore::connect(&url).await.unwrap();
            let created = store
                .create(
                    NewTask::new("Persistent task")
                        .with_description("Should survive reconnect")
                        .with_priority(TaskPriority::High),
                )
                .await
                .unwrap();
            task_id = created.id;
            store.pool().close().await;
        }

        // Reconnect and verify data persisted
        {
            let store = SqliteTaskStore::connect(&url).await.unwrap();
            let task = store.get(task_id).await.unwrap();
            assert!(task.is_some());
            let task = task.unwrap();
            assert_eq!(task.title, "Persistent task");
            assert_eq!(
                task.description,
                Some("Should survive reconnect".to_string())
            );
            assert_eq!(task.priority, TaskPriority::High);
        }
    }
}
