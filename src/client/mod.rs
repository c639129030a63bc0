//! Client bindings for the todo API.
//!
//! One method per route, over one of two interchangeable transports chosen at
//! construction time: [`TodoClient::over_router`] drives the in-process axum
//! router directly (server-side rendering), [`TodoClient::over_http`] talks to
//! a running server at an explicit base origin (no ambient environment
//! sniffing). Both decode into the same success/error union; the client never
//! retries and never caches.

use std::fmt;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde::{Serialize, de::DeserializeOwned};
use tower::ServiceExt;

use crate::error::ErrorBody;
use crate::routes::todos::{
    CreateTodoRequest, DeleteTodoResponse, ListTodosQuery, TodoResponse, UpdateTodoRequest,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub enum ClientError {
    /// The service answered with an error payload.
    Api { status: u16, error: String },
    /// The call never produced a decodable answer.
    Transport(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Api { status, error } => write!(f, "api error ({status}): {error}"),
            ClientError::Transport(message) => write!(f, "transport error: {message}"),
        }
    }
}

impl std::error::Error for ClientError {}

#[derive(Clone)]
pub struct TodoClient {
    transport: Transport,
}

#[derive(Clone)]
enum Transport {
    Local(Router),
    Http {
        http: reqwest::Client,
        base_url: String,
    },
}

impl TodoClient {
    /// In-process transport: calls go straight through the router, no socket.
    pub fn over_router(router: Router) -> Self {
        Self {
            transport: Transport::Local(router),
        }
    }

    /// Network transport against a base origin, e.g. `http://127.0.0.1:3000`.
    /// Callers outside a browser context usually pass
    /// [`AppConfig::public_origin`](crate::config::AppConfig).
    pub fn over_http(origin: &str) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| ClientError::transport(err.to_string()))?;
        Ok(Self {
            transport: Transport::Http {
                http,
                base_url: origin.trim_end_matches('/').to_string(),
            },
        })
    }

    pub async fn list(&self, query: &ListTodosQuery) -> ClientResult<Vec<TodoResponse>> {
        self.request(Method::GET, &list_path(query), None::<&()>)
            .await
    }

    pub async fn get(&self, id: i32) -> ClientResult<TodoResponse> {
        self.request(Method::GET, &format!("/api/todos/{id}"), None::<&()>)
            .await
    }

    pub async fn create(&self, body: &CreateTodoRequest) -> ClientResult<TodoResponse> {
        self.request(Method::POST, "/api/todos", Some(body)).await
    }

    pub async fn update(&self, id: i32, body: &UpdateTodoRequest) -> ClientResult<TodoResponse> {
        self.request(Method::PUT, &format!("/api/todos/{id}"), Some(body))
            .await
    }

    pub async fn delete(&self, id: i32) -> ClientResult<DeleteTodoResponse> {
        self.request(Method::DELETE, &format!("/api/todos/{id}"), None::<&()>)
            .await
    }

    pub async fn toggle(&self, id: i32) -> ClientResult<TodoResponse> {
        self.request(
            Method::PATCH,
            &format!("/api/todos/{id}/toggle"),
            None::<&()>,
        )
        .await
    }

    async fn request<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> ClientResult<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let (status, bytes) = match &self.transport {
            Transport::Local(router) => local_exchange(router, method, path, body).await?,
            Transport::Http { http, base_url } => {
                http_exchange(http, base_url, method, path, body).await?
            }
        };
        decode_response(status, &bytes)
    }
}

async fn local_exchange<B: Serialize>(
    router: &Router,
    method: Method,
    path: &str,
    body: Option<&B>,
) -> ClientResult<(StatusCode, Vec<u8>)> {
    let mut builder = Request::builder().method(method).uri(path);
    let request = match body {
        Some(body) => {
            let bytes = serde_json::to_vec(body)
                .map_err(|err| ClientError::transport(err.to_string()))?;
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            builder.body(Body::from(bytes))
        }
        None => builder.body(Body::empty()),
    }
    .map_err(|err| ClientError::transport(err.to_string()))?;

    let response = router
        .clone()
        .oneshot(request)
        .await
        .map_err(|err| ClientError::transport(err.to_string()))?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .map_err(|err| ClientError::transport(err.to_string()))?;
    Ok((status, bytes.to_vec()))
}

async fn http_exchange<B: Serialize>(
    http: &reqwest::Client,
    base_url: &str,
    method: Method,
    path: &str,
    body: Option<&B>,
) -> ClientResult<(StatusCode, Vec<u8>)> {
    let mut builder = http.request(method, format!("{base_url}{path}"));
    if let Some(body) = body {
        builder = builder.json(body);
    }
    let response = builder
        .send()
        .await
        .map_err(|err| ClientError::transport(err.to_string()))?;
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|err| ClientError::transport(err.to_string()))?;
    Ok((status, bytes.to_vec()))
}

fn decode_response<T: DeserializeOwned>(status: StatusCode, bytes: &[u8]) -> ClientResult<T> {
    if status.is_success() {
        return serde_json::from_slice(bytes)
            .map_err(|err| ClientError::transport(format!("invalid response body: {err}")));
    }
    let error = serde_json::from_slice::<ErrorBody>(bytes)
        .map(|body| body.error)
        .unwrap_or_else(|_| String::from_utf8_lossy(bytes).trim().to_string());
    Err(ClientError::Api {
        status: status.as_u16(),
        error,
    })
}

fn list_path(query: &ListTodosQuery) -> String {
    let mut params = Vec::new();
    if let Some(completed) = &query.completed {
        params.push(format!("completed={}", encode_query_value(completed)));
    }
    if let Some(search) = &query.search {
        params.push(format!("search={}", encode_query_value(search)));
    }
    if params.is_empty() {
        "/api/todos".to_string()
    } else {
        format!("/api/todos?{}", params.join("&"))
    }
}

// Percent-encodes everything outside the RFC 3986 unreserved set.
fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::{ClientError, decode_response, encode_query_value, list_path};
    use crate::routes::todos::{ListTodosQuery, TodoResponse};

    #[test]
    fn success_bodies_decode_into_the_route_types() {
        let body = br#"{"id":1,"title":"Buy milk","completed":false,"createdAt":"2026-01-01T00:00:00+00:00"}"#;
        let todo: TodoResponse = decode_response(StatusCode::OK, body).expect("should decode");
        assert_eq!(todo.id, 1);
        assert_eq!(todo.title, "Buy milk");
        assert!(!todo.completed);
    }

    #[test]
    fn error_bodies_become_api_errors() {
        let err = decode_response::<TodoResponse>(
            StatusCode::NOT_FOUND,
            br#"{"error":"Todo not found"}"#,
        )
        .expect_err("should be an error");
        match err {
            ClientError::Api { status, error } => {
                assert_eq!(status, 404);
                assert_eq!(error, "Todo not found");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(
            decode_response::<TodoResponse>(StatusCode::NOT_FOUND, br#"{"error":"x"}"#)
                .unwrap_err()
                .is_not_found()
        );
    }

    #[test]
    fn non_json_error_bodies_are_carried_verbatim() {
        let err = decode_response::<TodoResponse>(StatusCode::BAD_GATEWAY, b"upstream down")
            .expect_err("should be an error");
        match err {
            ClientError::Api { status, error } => {
                assert_eq!(status, 502);
                assert_eq!(error, "upstream down");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn list_paths_carry_encoded_filters() {
        assert_eq!(list_path(&ListTodosQuery::default()), "/api/todos");
        let path = list_path(&ListTodosQuery {
            completed: Some("true".to_string()),
            search: Some("buy milk".to_string()),
        });
        assert_eq!(path, "/api/todos?completed=true&search=buy%20milk");
    }

    #[test]
    fn query_values_are_percent_encoded() {
        assert_eq!(encode_query_value("a&b=c"), "a%26b%3Dc");
        assert_eq!(encode_query_value("plain-value_1.~"), "plain-value_1.~");
    }
}
