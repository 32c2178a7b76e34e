//! Error types for the photo booth core
//!
//! All errors use thiserror for structured error handling.
//! These errors can be serialized to the UI shell.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Read failed: {0}")]
    ReadFailed(#[source] sqlx::Error),

    #[error("Write failed: {0}")]
    WriteFailed(#[source] sqlx::Error),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("At least {required} photos are required, got {found}")]
    InsufficientPhotos { found: usize, required: usize },

    #[error("Render failed: {0}")]
    RenderFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// Classify a failed read. A closed or unopenable database is reported
    /// as unavailable rather than as a transaction failure.
    pub fn read(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolClosed => AppError::StorageUnavailable("database is closed".into()),
            other => AppError::ReadFailed(other),
        }
    }

    /// Classify a failed write. See [`AppError::read`].
    pub fn write(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolClosed => AppError::StorageUnavailable("database is closed".into()),
            other => AppError::WriteFailed(other),
        }
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
