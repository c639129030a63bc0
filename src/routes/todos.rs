use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};

use crate::{
    db::entities::todo,
    db::todo_repo::{self, TodoFilter},
    error::AppError,
    middleware::json_error_middleware,
    state::AppState,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListTodosQuery {
    pub completed: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTodoRequest {
    pub title: String,
    pub completed: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateTodoRequest {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoResponse {
    pub id: i32,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteTodoResponse {
    pub success: bool,
    pub message: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/todos", get(list_todos).post(create_todo))
        .route(
            "/api/todos/{id}",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .route("/api/todos/{id}/toggle", patch(toggle_todo))
        .layer(axum::middleware::from_fn(json_error_middleware))
        .with_state(state)
}

async fn list_todos(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListTodosQuery>,
) -> Result<Json<Vec<TodoResponse>>, AppError> {
    let filter = query.into_filter();
    let todos = todo_repo::list_todos(&state.db, &filter).await?;
    Ok(Json(todos.into_iter().map(TodoResponse::from).collect()))
}

async fn get_todo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<TodoResponse>, AppError> {
    let todo = todo_repo::find_todo_by_id(&state.db, id).await?;
    Ok(Json(todo.into()))
}

async fn create_todo(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTodoRequest>,
) -> Result<(StatusCode, Json<TodoResponse>), AppError> {
    let title = normalize_title(&body.title)?;
    let todo = todo_repo::create_todo(&state.db, title, body.completed.unwrap_or(false)).await?;
    Ok((StatusCode::CREATED, Json(todo.into())))
}

async fn update_todo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateTodoRequest>,
) -> Result<Json<TodoResponse>, AppError> {
    let UpdateTodoRequest { title, completed } = body;
    let title = match title {
        Some(value) => Some(normalize_title(&value)?.to_string()),
        None => None,
    };
    if title.is_none() && completed.is_none() {
        return Err(AppError::bad_request("Title or completed required"));
    }
    let todo = todo_repo::update_todo(&state.db, id, title, completed).await?;
    Ok(Json(todo.into()))
}

async fn delete_todo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<DeleteTodoResponse>, AppError> {
    let todo = todo_repo::delete_todo(&state.db, id).await?;
    Ok(Json(DeleteTodoResponse {
        success: true,
        message: format!("Todo \"{}\" deleted", todo.title),
    }))
}

async fn toggle_todo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<TodoResponse>, AppError> {
    let todo = todo_repo::toggle_todo(&state.db, id).await?;
    Ok(Json(todo.into()))
}

impl ListTodosQuery {
    pub fn into_filter(self) -> TodoFilter {
        TodoFilter {
            completed: self.completed.as_deref().map(parse_completed_param),
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
        }
    }
}

// Lenient on purpose: "true"/"1" are truthy, any other present value is false.
fn parse_completed_param(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "true" | "1")
}

fn normalize_title(title: &str) -> Result<&str, AppError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::bad_request("Title required"));
    }
    Ok(trimmed)
}

impl From<todo::Model> for TodoResponse {
    fn from(model: todo::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            completed: model.completed,
            created_at: model.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ListTodosQuery, normalize_title, parse_completed_param};

    #[test]
    fn completed_param_is_parsed_leniently() {
        assert!(parse_completed_param("true"));
        assert!(parse_completed_param("TRUE"));
        assert!(parse_completed_param(" 1 "));
        assert!(!parse_completed_param("false"));
        assert!(!parse_completed_param("yes"));
        assert!(!parse_completed_param(""));
    }

    #[test]
    fn blank_search_means_no_filter() {
        let filter = ListTodosQuery {
            completed: None,
            search: Some("   ".to_string()),
        }
        .into_filter();
        assert!(filter.search.is_none());

        let filter = ListTodosQuery {
            completed: None,
            search: Some("  milk ".to_string()),
        }
        .into_filter();
        assert_eq!(filter.search.as_deref(), Some("milk"));
    }

    #[test]
    fn titles_are_trimmed_and_must_not_be_blank() {
        assert_eq!(normalize_title("  Buy milk ").unwrap(), "Buy milk");
        assert!(normalize_title("   ").is_err());
    }
}
