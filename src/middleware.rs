use axum::{
    Json,
    body::to_bytes,
    extract::Request,
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ErrorBody;

const MAX_ERROR_BODY_BYTES: usize = 16 * 1024;

/// Rewrites plain-text error responses (extractor rejections: malformed JSON,
/// non-numeric path ids) into the `{error}` payload the API promises, leaving
/// responses that already carry JSON untouched.
pub async fn json_error_middleware(req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    let status = response.status();

    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }
    if is_json_response(&response) {
        return response;
    }

    let message = match to_bytes(response.into_body(), MAX_ERROR_BODY_BYTES).await {
        Ok(bytes) => {
            let message = String::from_utf8_lossy(&bytes).trim().to_string();
            if message.is_empty() {
                default_message(status)
            } else {
                message
            }
        }
        Err(_) => default_message(status),
    };

    (status, Json(ErrorBody { error: message })).into_response()
}

fn is_json_response(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            let value = value.to_ascii_lowercase();
            value.contains("application/json") || value.contains("+json")
        })
        .unwrap_or(false)
}

fn default_message(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_string()
}
