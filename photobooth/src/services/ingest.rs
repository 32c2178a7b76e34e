//! Upload ingestion
//!
//! Turns a user's file selection into encoded images. All files are read
//! and encoded concurrently; results keep the selection order no matter
//! which file finishes first. Accepted photos are handed to an
//! [`IngestHook`], whose failure never fails the upload.

use crate::config::{FALLBACK_MIME_TYPE, MIN_PHOTOS, STRIP_PHOTO_COUNT};
use crate::database::{EncodedImage, PhotoStorage};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use futures::future::join_all;
use image::ImageFormat;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum UploadSource {
    Memory(Vec<u8>),
    Path(PathBuf),
}

/// A file picked by the user
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub mime_type: Option<String>,
    source: UploadSource,
}

impl UploadedFile {
    /// File whose contents are already in memory
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: None,
            source: UploadSource::Memory(data),
        }
    }

    /// File read from disk when the upload is ingested
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            mime_type: None,
            source: UploadSource::Path(path),
        }
    }

    /// Declare the file type instead of sniffing it
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    async fn read(&self) -> Result<Vec<u8>> {
        match &self.source {
            UploadSource::Memory(data) => Ok(data.clone()),
            UploadSource::Path(path) => Ok(tokio::fs::read(path).await?),
        }
    }

    /// Declared type, else sniffed from content, else guessed from the name
    fn resolve_mime_type(&self, data: &[u8]) -> String {
        if let Some(mime) = &self.mime_type {
            return mime.clone();
        }
        image::guess_format(data)
            .or_else(|_| ImageFormat::from_path(&self.name))
            .map(|format| format.to_mime_type().to_string())
            .unwrap_or_else(|_| FALLBACK_MIME_TYPE.to_string())
    }
}

/// Read a file and encode it as a data URI
pub async fn encode_upload(file: &UploadedFile) -> Result<EncodedImage> {
    let data = file.read().await?;
    let mime_type = file.resolve_mime_type(&data);
    tracing::debug!("Encoded upload {} ({}, {} bytes)", file.name, mime_type, data.len());
    Ok(EncodedImage::from_bytes(&mime_type, &data))
}

/// Side effect run with the photos accepted from an upload
#[async_trait]
pub trait IngestHook: Send + Sync {
    async fn photos_accepted(&self, photos: &[EncodedImage]) -> Result<()>;
}

/// Persists every accepted photo as its own record
#[async_trait]
impl IngestHook for PhotoStorage {
    async fn photos_accepted(&self, photos: &[EncodedImage]) -> Result<()> {
        self.save_photos(photos).await.map(|_| ())
    }
}

/// Service that validates and encodes uploads
#[derive(Clone, Default)]
pub struct IngestService {
    hook: Option<Arc<dyn IngestHook>>,
}

impl IngestService {
    pub fn new(hook: Arc<dyn IngestHook>) -> Self {
        Self { hook: Some(hook) }
    }

    /// Service with no side effect on accepted photos
    pub fn without_hook() -> Self {
        Self::default()
    }

    /// Validate and encode an upload, yielding the first three photos in
    /// selection order. Surplus files are dropped.
    pub async fn ingest(&self, files: &[UploadedFile]) -> Result<Vec<EncodedImage>> {
        if files.len() < MIN_PHOTOS {
            tracing::info!("Rejected upload of {} photos", files.len());
            return Err(AppError::InsufficientPhotos {
                found: files.len(),
                required: MIN_PHOTOS,
            });
        }

        if files.len() > STRIP_PHOTO_COUNT {
            tracing::debug!(
                "Dropping {} surplus photos from upload",
                files.len() - STRIP_PHOTO_COUNT
            );
        }

        let kept = &files[..STRIP_PHOTO_COUNT];
        let photos = join_all(kept.iter().map(encode_upload))
            .await
            .into_iter()
            .collect::<Result<Vec<_>>>()?;

        tracing::info!("Ingested {} photos", photos.len());

        if let Some(hook) = &self.hook {
            if let Err(e) = hook.photos_accepted(&photos).await {
                tracing::warn!("Failed to save uploaded photos: {}", e);
            }
        }

        Ok(photos)
    }
}
