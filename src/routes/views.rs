use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, Redirect},
    routing::{get, post},
};
use chrono::Local;
use serde::Deserialize;

use crate::client::{ClientError, TodoClient};
use crate::routes::todos::{CreateTodoRequest, ListTodosQuery, TodoResponse};

#[derive(Template)]
#[template(path = "todos.html")]
struct TodosPageTemplate {
    now: String,
    total: usize,
    completed: usize,
    pending: usize,
    todos: Vec<TodoRow>,
}

struct TodoRow {
    id: i32,
    title: String,
    completed: bool,
    created_on: String,
}

#[derive(Debug, Deserialize)]
struct NewTodoForm {
    title: String,
}

type HtmlError = (StatusCode, Html<String>);

pub fn router(client: TodoClient) -> Router {
    Router::new()
        .route("/", get(todos_page))
        .route("/todos", post(create_from_form))
        .route("/todos/{id}/toggle", post(toggle_from_form))
        .route("/todos/{id}/delete", post(delete_from_form))
        .with_state(client)
}

async fn todos_page(State(client): State<TodoClient>) -> Result<Html<String>, HtmlError> {
    let todos = client
        .list(&ListTodosQuery::default())
        .await
        .map_err(client_html_error)?;

    let completed = todos.iter().filter(|todo| todo.completed).count();
    let template = TodosPageTemplate {
        now: Local::now().to_rfc3339(),
        total: todos.len(),
        completed,
        pending: todos.len() - completed,
        todos: todos.into_iter().map(TodoRow::from).collect(),
    };
    let rendered = template.render().map_err(|_| {
        html_error(StatusCode::INTERNAL_SERVER_ERROR, "failed to render todos page")
    })?;
    Ok(Html(rendered))
}

async fn create_from_form(
    State(client): State<TodoClient>,
    Form(form): Form<NewTodoForm>,
) -> Result<Redirect, HtmlError> {
    let title = form.title.trim();
    if title.is_empty() {
        return Err(html_error(StatusCode::BAD_REQUEST, "Title required"));
    }
    client
        .create(&CreateTodoRequest {
            title: title.to_string(),
            completed: None,
        })
        .await
        .map_err(client_html_error)?;
    Ok(Redirect::to("/"))
}

async fn toggle_from_form(
    State(client): State<TodoClient>,
    Path(id): Path<i32>,
) -> Result<Redirect, HtmlError> {
    client.toggle(id).await.map_err(client_html_error)?;
    Ok(Redirect::to("/"))
}

async fn delete_from_form(
    State(client): State<TodoClient>,
    Path(id): Path<i32>,
) -> Result<Redirect, HtmlError> {
    client.delete(id).await.map_err(client_html_error)?;
    Ok(Redirect::to("/"))
}

fn client_html_error(err: ClientError) -> HtmlError {
    match err {
        ClientError::Api { status, error } => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Html(error),
        ),
        ClientError::Transport(message) => (StatusCode::BAD_GATEWAY, Html(message)),
    }
}

fn html_error(status: StatusCode, message: &'static str) -> HtmlError {
    (status, Html(message.to_string()))
}

impl From<TodoResponse> for TodoRow {
    fn from(todo: TodoResponse) -> Self {
        Self {
            id: todo.id,
            title: todo.title,
            completed: todo.completed,
            created_on: todo.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}
