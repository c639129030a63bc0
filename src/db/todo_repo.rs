use std::fmt;

use chrono::Utc;
use sea_orm::sea_query::{Expr, ExprTrait, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

use super::entities::prelude::Todo;
use super::entities::todo;

#[derive(Debug)]
pub enum RepoError {
    Db(DbErr),
    NotFound { id: i32 },
}

pub type RepoResult<T> = Result<T, RepoError>;

impl fmt::Display for RepoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoError::Db(err) => write!(f, "Database error: {err}"),
            RepoError::NotFound { id } => write!(f, "Todo not found (id={id})"),
        }
    }
}

impl std::error::Error for RepoError {}

impl From<DbErr> for RepoError {
    fn from(err: DbErr) -> Self {
        RepoError::Db(err)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TodoFilter {
    pub completed: Option<bool>,
    pub search: Option<String>,
}

/// Newest first; ties on `created_at` fall back to `id` so insertion order
/// stays stable within one clock tick.
pub async fn list_todos(
    db: &DatabaseConnection,
    filter: &TodoFilter,
) -> RepoResult<Vec<todo::Model>> {
    let mut query = Todo::find();
    if let Some(completed) = filter.completed {
        query = query.filter(todo::Column::Completed.eq(completed));
    }
    if let Some(search) = &filter.search {
        // Lowercase both sides: sqlite LIKE is only ASCII-insensitive and
        // Postgres LIKE is case-sensitive.
        let pattern = format!("%{}%", search.to_lowercase());
        query = query.filter(
            Expr::expr(Func::lower(Expr::col(todo::Column::Title))).like(pattern),
        );
    }
    Ok(query
        .order_by_desc(todo::Column::CreatedAt)
        .order_by_desc(todo::Column::Id)
        .all(db)
        .await?)
}

pub async fn find_todo_by_id(db: &DatabaseConnection, id: i32) -> RepoResult<todo::Model> {
    Todo::find_by_id(id)
        .one(db)
        .await?
        .ok_or(RepoError::NotFound { id })
}

pub async fn create_todo(
    db: &DatabaseConnection,
    title: &str,
    completed: bool,
) -> RepoResult<todo::Model> {
    let model = todo::ActiveModel {
        title: Set(title.to_string()),
        completed: Set(completed),
        created_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

pub async fn update_todo(
    db: &DatabaseConnection,
    id: i32,
    title: Option<String>,
    completed: Option<bool>,
) -> RepoResult<todo::Model> {
    let model = find_todo_by_id(db, id).await?;
    let mut active: todo::ActiveModel = model.into();
    if let Some(title) = title {
        active.title = Set(title);
    }
    if let Some(completed) = completed {
        active.completed = Set(completed);
    }
    Ok(active.update(db).await?)
}

pub async fn delete_todo(db: &DatabaseConnection, id: i32) -> RepoResult<todo::Model> {
    let model = find_todo_by_id(db, id).await?;
    let result = Todo::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(RepoError::NotFound { id });
    }
    Ok(model)
}

/// Flips `completed` in a single conditional UPDATE, so concurrent toggles on
/// the same id cannot lose each other's write. The follow-up fetch only
/// reloads the row for the response.
pub async fn toggle_todo(db: &DatabaseConnection, id: i32) -> RepoResult<todo::Model> {
    let result = Todo::update_many()
        .col_expr(
            todo::Column::Completed,
            Expr::col(todo::Column::Completed).not(),
        )
        .filter(todo::Column::Id.eq(id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(RepoError::NotFound { id });
    }
    find_todo_by_id(db, id).await
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult};

    use super::{RepoError, TodoFilter, find_todo_by_id, list_todos, toggle_todo};
    use crate::db::entities::todo;

    fn ts() -> chrono::DateTime<chrono::FixedOffset> {
        FixedOffset::east_opt(0)
            .expect("offset should be valid")
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("timestamp should be valid")
    }

    fn model(id: i32, title: &str, completed: bool) -> todo::Model {
        todo::Model {
            id,
            title: title.to_string(),
            completed,
            created_at: ts(),
        }
    }

    #[tokio::test]
    async fn find_signals_not_found_when_row_is_missing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<todo::Model>::new()])
            .into_connection();

        let err = find_todo_by_id(&db, 999_999)
            .await
            .expect_err("lookup should fail");
        assert!(matches!(err, RepoError::NotFound { id: 999_999 }));
    }

    #[tokio::test]
    async fn toggle_signals_not_found_when_no_row_is_affected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let err = toggle_todo(&db, 7).await.expect_err("toggle should fail");
        assert!(matches!(err, RepoError::NotFound { id: 7 }));
    }

    #[tokio::test]
    async fn toggle_reloads_the_row_after_the_update() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([[model(7, "Buy milk", true)]])
            .into_connection();

        let todo = toggle_todo(&db, 7).await.expect("toggle should succeed");
        assert_eq!(todo.id, 7);
        assert!(todo.completed);
    }

    #[tokio::test]
    async fn list_maps_database_errors() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("list failed".to_string())])
            .into_connection();

        let err = list_todos(&db, &TodoFilter::default())
            .await
            .expect_err("list should fail");
        assert!(matches!(err, RepoError::Db(_)));
    }
}
