pub mod repository;

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::Assignment;
use crate::query::AssignmentFilter;

/// Storage seam for assignments. Handlers only ever see this trait.
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    async fn ping(&self) -> Result<(), AppError>;
    async fn list(&self, filter: &AssignmentFilter) -> Result<Vec<Assignment>, AppError>;
    async fn courses(&self) -> Result<Vec<String>, AppError>;
    async fn find(&self, id: Uuid) -> Result<Option<Assignment>, AppError>;
    async fn insert(&self, assignment: &Assignment) -> Result<(), AppError>;
    /// Returns false if the record no longer exists.
    async fn save(&self, assignment: &Assignment) -> Result<bool, AppError>;
    /// Returns false if there was nothing to delete.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct SqliteAssignmentStore {
    db: SqlitePool,
}

impl SqliteAssignmentStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AssignmentStore for SqliteAssignmentStore {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("select 1").execute(&self.db).await?;
        Ok(())
    }

    async fn list(&self, filter: &AssignmentFilter) -> Result<Vec<Assignment>, AppError> {
        Ok(repository::fetch_assignments(&self.db, filter).await?)
    }

    async fn courses(&self) -> Result<Vec<String>, AppError> {
        Ok(repository::fetch_courses(&self.db).await?)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Assignment>, AppError> {
        Ok(repository::find_assignment_by_id(&self.db, id).await?)
    }

    async fn insert(&self, assignment: &Assignment) -> Result<(), AppError> {
        Ok(repository::insert_assignment(&self.db, assignment).await?)
    }

    async fn save(&self, assignment: &Assignment) -> Result<bool, AppError> {
        Ok(repository::save_assignment(&self.db, assignment).await?)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(repository::delete_assignment(&self.db, id).await?)
    }
}

pub async fn connect(config: &AppConfig) -> Result<SqlitePool, AppError> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("database ready at {}", config.database_url);

    Ok(pool)
}

/// A migrated, throwaway in-memory database.
pub async fn connect_in_memory() -> Result<SqlitePool, AppError> {
    // in-memory DB は接続ごとに別物になるので 1 本に固定する
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    connect_in_memory().await.expect("Failed to create test db")
}
