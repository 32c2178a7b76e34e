//! Strip export
//!
//! Delivers a rendered strip to the download sink and records the strip
//! in storage.

use crate::database::PhotoStorage;
use crate::error::Result;
use crate::services::render::ComposedStrip;
use crate::storage::{download_file_name, DownloadSink};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;

/// Result of a successful export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedStrip {
    /// Id of the saved strip record
    pub id: i64,
    pub file_name: String,
    /// Where the download sink put the file
    pub location: PathBuf,
}

/// Service for exporting strips
#[derive(Clone)]
pub struct ExportService {
    storage: PhotoStorage,
    downloads: Arc<dyn DownloadSink>,
}

impl ExportService {
    pub fn new(storage: PhotoStorage, downloads: Arc<dyn DownloadSink>) -> Self {
        Self { storage, downloads }
    }

    /// Download the strip as `photo-strip-<date>.jpg` and save its photos
    pub async fn export_strip(&self, strip: &ComposedStrip) -> Result<ExportedStrip> {
        let file_name = download_file_name(Utc::now());
        tracing::info!("Exporting photo strip as {}", file_name);

        let jpeg = strip.image.decode()?;
        let location = self.downloads.deliver(&file_name, &jpeg).await?;

        let id = self.storage.save_photo_strip(&strip.sources).await?;

        tracing::info!("Photo strip exported: {} -> {:?}", id, location);

        Ok(ExportedStrip {
            id,
            file_name,
            location,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{initialize_database, EncodedImage};
    use crate::services::filters::StripFilter;
    use crate::storage::DirectoryDownloads;
    use sqlx::sqlite::SqlitePoolOptions;
    use tempfile::TempDir;

    async fn create_test_service() -> (ExportService, PhotoStorage, TempDir) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        initialize_database(&pool).await.unwrap();
        let storage = PhotoStorage::new(pool);

        let temp_dir = TempDir::new().unwrap();
        let downloads = DirectoryDownloads::new(temp_dir.path().join("downloads"));
        downloads.initialize().await.unwrap();

        let service = ExportService::new(storage.clone(), Arc::new(downloads));
        (service, storage, temp_dir)
    }

    fn composed() -> ComposedStrip {
        ComposedStrip {
            image: EncodedImage::from_bytes("image/jpeg", b"\xff\xd8strip"),
            sources: (0..3)
                .map(|i| EncodedImage::from_bytes("image/png", &[i]))
                .collect(),
            filter: Some(StripFilter::Retro),
            rendered_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_export_downloads_and_saves() {
        let (service, storage, _temp) = create_test_service().await;
        let strip = composed();

        let exported = service.export_strip(&strip).await.unwrap();

        assert!(exported.file_name.starts_with("photo-strip-"));
        assert!(exported.file_name.ends_with(".jpg"));
        assert_eq!(std::fs::read(&exported.location).unwrap(), b"\xff\xd8strip");

        let strips = storage.list_photo_strips().await.unwrap();
        assert_eq!(strips.len(), 1);
        assert_eq!(strips[0].id, exported.id);
        assert_eq!(strips[0].photos, strip.sources);
    }

    #[tokio::test]
    async fn test_export_surfaces_storage_failure() {
        let (service, storage, _temp) = create_test_service().await;
        storage.close().await;

        let result = service.export_strip(&composed()).await;

        assert!(matches!(
            result,
            Err(crate::error::AppError::StorageUnavailable(_))
        ));
    }
}
