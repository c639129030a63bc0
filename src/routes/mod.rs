use std::sync::Arc;

use axum::Router;

use crate::client::TodoClient;
use crate::state::AppState;

pub mod todos;
pub mod views;

pub fn router(state: Arc<AppState>) -> Router {
    let api = todos::router(state);
    // The page talks to the API through the typed client's in-process
    // transport, the same binding a networked caller would use.
    let client = TodoClient::over_router(api.clone());
    api.merge(views::router(client))
}
