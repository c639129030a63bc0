use std::sync::Arc;

use axum::Router;
use sea_orm::{ConnectOptions, Database};

use crate::{routes::router, state::AppState};

/// Fresh state over an in-memory sqlite database with the schema synced.
/// Pinned to a single pooled connection; every sqlite `:memory:` handle is
/// otherwise its own empty database.
pub async fn memory_state() -> Arc<AppState> {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_string());
    opt.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opt)
        .await
        .expect("connect to in-memory sqlite");
    db.get_schema_registry("todo_server::db::entities::*")
        .sync(&db)
        .await
        .expect("sync schema");
    AppState::new(db)
}

pub fn test_router(state: Arc<AppState>) -> Router {
    router(state)
}
