//! Storage engine for photos and photo strips
//!
//! Every operation runs in its own transaction that is committed before
//! the operation returns. No transaction outlives the call that opened it.

use super::models::*;
use crate::config::AppConfig;
use crate::error::{AppError, Result};
use sqlx::SqlitePool;

/// Handle to the photo booth database
///
/// Cloning shares the underlying pool. The handle stays usable until
/// [`PhotoStorage::close`] is called; afterwards every operation fails with
/// [`AppError::StorageUnavailable`].
#[derive(Clone)]
pub struct PhotoStorage {
    pool: SqlitePool,
}

impl PhotoStorage {
    /// Wrap a pool whose schema has already been initialized
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database described by `config`
    pub async fn open(config: &AppConfig) -> Result<Self> {
        let pool = super::create_pool(&config.database_path()).await?;
        Ok(Self::new(pool))
    }

    /// Close the handle, waiting for in-flight operations to finish
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Photo storage closed");
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Persist a strip of exactly three photos, returning its id
    pub async fn save_photo_strip(&self, photos: &[EncodedImage]) -> Result<i64> {
        let body = PhotoStripBody::new(photos)?;
        let json = serde_json::to_string(&body)?;

        let mut tx = self.pool.begin().await.map_err(AppError::write)?;

        let id: i64 =
            sqlx::query_scalar("INSERT INTO photos (kind, body) VALUES (?, ?) RETURNING id")
                .bind(RecordKind::PhotoStrip.as_str())
                .bind(&json)
                .fetch_one(&mut *tx)
                .await
                .map_err(AppError::write)?;

        tx.commit().await.map_err(AppError::write)?;

        tracing::debug!("Saved photo strip: {}", id);
        Ok(id)
    }

    /// All strips in insertion order
    pub async fn list_photo_strips(&self) -> Result<Vec<PhotoStripRecord>> {
        let records = self.list_kind(RecordKind::PhotoStrip).await?;

        Ok(records
            .into_iter()
            .filter_map(|record| match record {
                StoredRecord::Strip(strip) => Some(strip),
                StoredRecord::Photo(_) => None,
            })
            .collect())
    }

    /// Fetch one strip by id
    pub async fn get_photo_strip(&self, id: i64) -> Result<Option<PhotoStripRecord>> {
        let mut tx = self.pool.begin().await.map_err(AppError::read)?;

        let row = sqlx::query_as::<_, StoreRow>(
            "SELECT id, kind, body FROM photos WHERE id = ? AND kind = ?",
        )
        .bind(id)
        .bind(RecordKind::PhotoStrip.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::read)?;

        tx.commit().await.map_err(AppError::read)?;

        match row.map(StoredRecord::try_from).transpose()? {
            Some(StoredRecord::Strip(strip)) => Ok(Some(strip)),
            _ => Ok(None),
        }
    }

    /// Delete a strip. Deleting an id that does not exist succeeds.
    pub async fn delete_photo_strip(&self, id: i64) -> Result<()> {
        self.delete_kind(id, RecordKind::PhotoStrip).await
    }

    /// Persist each photo as its own record in one transaction.
    /// Returns the assigned ids in input order.
    pub async fn save_photos(&self, photos: &[EncodedImage]) -> Result<Vec<i64>> {
        let mut tx = self.pool.begin().await.map_err(AppError::write)?;

        let mut ids = Vec::with_capacity(photos.len());
        for photo in photos {
            let json = serde_json::to_string(&PhotoBody {
                photo: photo.clone(),
            })?;

            let id: i64 =
                sqlx::query_scalar("INSERT INTO photos (kind, body) VALUES (?, ?) RETURNING id")
                    .bind(RecordKind::Photo.as_str())
                    .bind(&json)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(AppError::write)?;
            ids.push(id);
        }

        tx.commit().await.map_err(AppError::write)?;

        tracing::debug!("Saved {} photos", ids.len());
        Ok(ids)
    }

    /// All single-photo records in insertion order
    pub async fn list_photos(&self) -> Result<Vec<PhotoRecord>> {
        let records = self.list_kind(RecordKind::Photo).await?;

        Ok(records
            .into_iter()
            .filter_map(|record| match record {
                StoredRecord::Photo(photo) => Some(photo),
                StoredRecord::Strip(_) => None,
            })
            .collect())
    }

    /// Delete a single photo. Deleting an id that does not exist succeeds.
    pub async fn delete_photo(&self, id: i64) -> Result<()> {
        self.delete_kind(id, RecordKind::Photo).await
    }

    /// Total number of records of either kind
    pub async fn count_records(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM photos")
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::read)?;
        Ok(count)
    }

    async fn list_kind(&self, kind: RecordKind) -> Result<Vec<StoredRecord>> {
        let mut tx = self.pool.begin().await.map_err(AppError::read)?;

        let rows = sqlx::query_as::<_, StoreRow>(
            "SELECT id, kind, body FROM photos WHERE kind = ? ORDER BY id ASC",
        )
        .bind(kind.as_str())
        .fetch_all(&mut *tx)
        .await
        .map_err(AppError::read)?;

        tx.commit().await.map_err(AppError::read)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id;
            match StoredRecord::try_from(row) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!("Skipping unreadable record {}: {}", id, e),
            }
        }

        Ok(records)
    }

    async fn delete_kind(&self, id: i64, kind: RecordKind) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(AppError::write)?;

        let rows = sqlx::query("DELETE FROM photos WHERE id = ? AND kind = ?")
            .bind(id)
            .bind(kind.as_str())
            .execute(&mut *tx)
            .await
            .map_err(AppError::write)?
            .rows_affected();

        tx.commit().await.map_err(AppError::write)?;

        tracing::debug!("Deleted {} record {} ({} rows)", kind.as_str(), id, rows);
        Ok(())
    }
}

impl std::fmt::Debug for PhotoStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoStorage")
            .field("closed", &self.pool.is_closed())
            .finish()
    }
}
