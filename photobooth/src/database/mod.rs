//! Database module
//!
//! This module provides all persistence for the booth:
//! - Schema and migrations
//! - Record models
//! - The storage engine handle with per-operation transactions

pub mod models;
pub mod repository;
pub mod schema;

pub use models::*;
pub use repository::PhotoStorage;
pub use schema::initialize_database;

use crate::error::{AppError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;

/// Build connection options shared by migration and application connections.
fn connect_options(db_path: &Path) -> SqliteConnectOptions {
    SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5))
        .journal_mode(SqliteJournalMode::Wal)
}

fn unavailable(db_path: &Path, err: impl std::fmt::Display) -> AppError {
    AppError::StorageUnavailable(format!("{}: {}", db_path.display(), err))
}

/// Open (creating if absent) the database file and bring its schema up to date.
///
/// Migrations run on a dedicated single-connection pool that is closed
/// before the application pool is created, so every application connection
/// sees the final schema.
pub async fn create_pool(db_path: &Path) -> Result<SqlitePool> {
    tracing::info!("Opening database at: {:?}", db_path);

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| unavailable(db_path, e))?;
    }

    let options = connect_options(db_path);

    let migration_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options.clone())
        .await
        .map_err(|e| unavailable(db_path, e))?;

    initialize_database(&migration_pool).await?;
    migration_pool.close().await;

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(|e| unavailable(db_path, e))?;

    tracing::info!("Database opened successfully");

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_create_pool_creates_file_and_schema() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("PhotoBoothDB.db");

        let pool = create_pool(&db_path).await.unwrap();

        assert!(db_path.exists());
        assert_eq!(schema::schema_version(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_path_with_url_characters() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("booth?#%20data").join("PhotoBoothDB.db");

        let pool = create_pool(&db_path).await.unwrap();

        assert!(db_path.exists());
        assert_eq!(schema::schema_version(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unwritable_location_is_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        // A regular file where a directory is expected
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        let result = create_pool(&blocker.join("PhotoBoothDB.db")).await;

        assert!(matches!(result, Err(AppError::StorageUnavailable(_))));
    }
}
