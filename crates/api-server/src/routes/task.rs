//! Task API endpoints
//!
//! RESTful API for task CRUD, filter, search, status-patch and overdue
//! operations.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tasklist_core::task::{NewTask, Task, TaskPriority, TaskStatus};
use tasklist_core::Error as CoreError;

use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

/// Request body for create and full update
///
/// Fields the API requires are still option-typed so that the validation
/// pass, not the deserializer, reports what is missing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
}

const MAX_TITLE_CHARS: usize = 200;
const MAX_DESCRIPTION_CHARS: usize = 1000;

impl TaskRequest {
    /// Validate the request and convert it into a draft
    fn validate(self) -> Result<NewTask, Vec<FieldError>> {
        let mut errors = Vec::new();

        let title = self.title.unwrap_or_default();
        if title.trim().is_empty() {
            errors.push(FieldError::new("title", "Title is required"));
        } else if title.chars().count() > MAX_TITLE_CHARS {
            errors.push(FieldError::new(
                "title",
                "Title must not exceed 200 characters",
            ));
        }

        if let Some(description) = &self.description {
            if description.chars().count() > MAX_DESCRIPTION_CHARS {
                errors.push(FieldError::new(
                    "description",
                    "Description must not exceed 1000 characters",
                ));
            }
        }

        if self.status.is_none() {
            errors.push(FieldError::new("status", "Status is required"));
        }
        if self.priority.is_none() {
            errors.push(FieldError::new("priority", "Priority is required"));
        }

        match (self.status, self.priority) {
            (Some(status), Some(priority)) if errors.is_empty() => {
                let mut draft = NewTask::new(title)
                    .with_status(status)
                    .with_priority(priority);
                if let Some(description) = self.description {
                    draft = draft.with_description(description);
                }
                if let Some(due_date) = self.due_date {
                    draft = draft.with_due_date(due_date);
                }
                Ok(draft)
            }
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            due_date: task.due_date,
            status: task.status,
            priority: task.priority,
            created_at: task.created_at.to_rfc3339(),
            updated_at: task.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: TaskStatus,
}

#[derive(Debug, Deserialize)]
pub struct KeywordQuery {
    pub keyword: String,
}

#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}

fn error_response(err: CoreError) -> (StatusCode, Json<ErrorResponse>) {
    match err {
        CoreError::TaskNotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Task {} not found", id),
                fields: None,
            }),
        ),
        err => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: err.to_string(),
                fields: None,
            }),
        ),
    }
}

fn validation_response(fields: Vec<FieldError>) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: "Validation failed".to_string(),
            fields: Some(fields),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/tasks - Create a new task
async fn create_task(
    State(state): State<AppState>,
    Json(req): Json<TaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), (StatusCode, Json<ErrorResponse>)> {
    let draft = req.validate().map_err(validation_response)?;
    let created = state.tasks().create(draft).await.map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(TaskResponse::from(created))))
}

/// GET /api/tasks - List all tasks
async fn list_tasks(
    State(state): State<AppState>,
) -> Result<Json<Vec<TaskResponse>>, (StatusCode, Json<ErrorResponse>)> {
    let tasks = state.tasks().list().await.map_err(error_response)?;
    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

/// GET /api/tasks/:id - Get a single task
async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TaskResponse>, (StatusCode, Json<ErrorResponse>)> {
    let task = state.tasks().get(id).await.map_err(error_response)?;
    Ok(Json(TaskResponse::from(task)))
}

/// PUT /api/tasks/:id - Replace the mutable fields of a task
async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TaskRequest>,
) -> Result<Json<TaskResponse>, (StatusCode, Json<ErrorResponse>)> {
    let draft = req.validate().map_err(validation_response)?;
    let updated = state
        .tasks()
        .update(id, draft)
        .await
        .map_err(error_response)?;
    Ok(Json(TaskResponse::from(updated)))
}

/// DELETE /api/tasks/:id - Delete a task
async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    state.tasks().delete(id).await.map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/tasks/filter?status= - List tasks with the given status
async fn filter_tasks(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<TaskResponse>>, (StatusCode, Json<ErrorResponse>)> {
    let tasks = state
        .tasks()
        .by_status(query.status)
        .await
        .map_err(error_response)?;
    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

/// PATCH /api/tasks/:id/status?status= - Change only the status of a task
async fn update_task_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<TaskResponse>, (StatusCode, Json<ErrorResponse>)> {
    let updated = state
        .tasks()
        .update_status(id, query.status)
        .await
        .map_err(error_response)?;
    Ok(Json(TaskResponse::from(updated)))
}

/// GET /api/tasks/search?keyword= - Search tasks by title or description
async fn search_tasks(
    State(state): State<AppState>,
    Query(query): Query<KeywordQuery>,
) -> Result<Json<Vec<TaskResponse>>, (StatusCode, Json<ErrorResponse>)> {
    let tasks = state
        .tasks()
        .search(&query.keyword)
        .await
        .map_err(error_response)?;
    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

/// GET /api/tasks/overdue - List overdue tasks
async fn overdue_tasks(
    State(state): State<AppState>,
) -> Result<Json<Vec<TaskResponse>>, (StatusCode, Json<ErrorResponse>)> {
    let tasks = state.tasks().overdue().await.map_err(error_response)?;
    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

// ============================================================================
// Router
// ============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/filter", get(filter_tasks))
        .route("/api/tasks/search", get(search_tasks))
        .route("/api/tasks/overdue", get(overdue_tasks))
        .route(
            "/api/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/api/tasks/{id}/status", axum::routing::patch(update_task_status))
}
