//! Integration tests for the photo booth
//!
//! These tests verify end-to-end functionality including:
//! - Storage persistence across reopen
//! - Upload, render, export and share workflows
//! - Session state transitions

use image::{ImageFormat, Rgb, RgbImage};
use photobooth::config::AppConfig;
use photobooth::database::{EncodedImage, PhotoStorage};
use photobooth::services::{
    IngestService, LoggingShareHost, ShareOutcome, SharePlatform, StripRenderer, UploadedFile,
};
use photobooth::{setup, AppError, AppState, Notice, SessionState};
use std::io::Cursor;
use std::sync::Arc;
use tempfile::TempDir;

/// Helper to set up a booth rooted in a temp directory
async fn create_test_app() -> (AppState, TempDir) {
    photobooth::init_logging();

    let temp_dir = TempDir::new().unwrap();
    let config = AppConfig::new(temp_dir.path().join("data"))
        .with_downloads_dir(temp_dir.path().join("Downloads"));
    let state = setup(config, Arc::new(LoggingShareHost::new("https://booth.example/")))
        .await
        .unwrap();

    (state, temp_dir)
}

fn png_bytes(color: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(32, 24, Rgb(color));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn upload_files(dir: &TempDir, count: usize) -> Vec<UploadedFile> {
    (0..count)
        .map(|i| {
            let path = dir.path().join(format!("photo-{}.png", i));
            std::fs::write(&path, png_bytes([(i * 60) as u8, 120, 200])).unwrap();
            UploadedFile::from_path(path)
        })
        .collect()
}

#[tokio::test]
async fn test_upload_render_export_scenario() {
    let (state, temp) = create_test_app().await;

    let before = state.storage.list_photo_strips().await.unwrap().len();

    let ingest = IngestService::new(Arc::new(state.storage.clone()));
    let photos = ingest.ingest(&upload_files(&temp, 3)).await.unwrap();
    assert_eq!(photos.len(), 3);

    let strip = StripRenderer::default()
        .compose(&photos, "retro")
        .await
        .unwrap();
    assert_eq!(strip.image.mime_type(), "image/jpeg");

    let export = photobooth::services::ExportService::new(
        state.storage.clone(),
        state.downloads.clone(),
    );
    let exported = export.export_strip(&strip).await.unwrap();
    assert!(exported.location.starts_with(&state.config.downloads_dir));

    let strips = state.storage.list_photo_strips().await.unwrap();
    assert_eq!(strips.len(), before + 1);
    let saved = strips.last().unwrap();
    assert_eq!(saved.id, exported.id);
    assert_eq!(saved.photos.len(), 3);
    assert_eq!(saved.photos, photos);
}

#[tokio::test]
async fn test_two_file_upload_leaves_session_idle() {
    let (state, temp) = create_test_app().await;
    let mut booth = state.new_session();

    let notice = booth.upload(&upload_files(&temp, 2)).await;

    assert_eq!(notice, Notice::NeedMorePhotos);
    assert_eq!(booth.state(), SessionState::Idle);
    assert_eq!(state.storage.count_records().await.unwrap(), 0);

    let result = IngestService::without_hook()
        .ingest(&upload_files(&temp, 2))
        .await;
    assert!(matches!(result, Err(AppError::InsufficientPhotos { found: 2, .. })));
}

#[tokio::test]
async fn test_session_workflow() {
    let (state, temp) = create_test_app().await;
    let mut booth = state.new_session();

    assert_eq!(booth.upload(&upload_files(&temp, 5)).await, Notice::PhotosLoaded(3));
    assert_eq!(state.storage.list_photos().await.unwrap().len(), 3);

    booth.select_filter("vintage");
    let exported = match booth.generate().await {
        Notice::StripGenerated(exported) => exported,
        other => panic!("expected a generated strip, got {:?}", other),
    };
    assert!(exported.location.exists());
    assert!(exported.file_name.starts_with("photo-strip-"));

    let outcome = booth.share(SharePlatform::Facebook).await;
    assert_eq!(
        outcome,
        Notice::Shared(ShareOutcome::Opened(
            "https://www.facebook.com/sharer/sharer.php?u=https%3A%2F%2Fbooth.example%2F"
                .to_string()
        ))
    );
    assert_eq!(booth.state(), SessionState::Shared);

    // Deleting the saved strip does not touch the session
    state.storage.delete_photo_strip(exported.id).await.unwrap();
    state.storage.delete_photo_strip(exported.id).await.unwrap();
    assert!(state.storage.list_photo_strips().await.unwrap().is_empty());
    assert!(booth.composed().is_some());
}

#[tokio::test]
async fn test_strips_persist_across_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let config = AppConfig::new(temp_dir.path());

    let photos: Vec<EncodedImage> = (0..3)
        .map(|i| EncodedImage::from_bytes("image/png", &png_bytes([i * 80, 0, 0])))
        .collect();

    let storage = PhotoStorage::open(&config).await.unwrap();
    let id = storage.save_photo_strip(&photos).await.unwrap();
    storage.close().await;

    assert!(matches!(
        storage.list_photo_strips().await,
        Err(AppError::StorageUnavailable(_))
    ));

    let reopened = PhotoStorage::open(&config).await.unwrap();
    let strips = reopened.list_photo_strips().await.unwrap();
    assert_eq!(strips.len(), 1);
    assert_eq!(strips[0].id, id);
    assert_eq!(strips[0].photos, photos);

    // Keys keep increasing after reopen
    let next = reopened.save_photo_strip(&photos).await.unwrap();
    assert!(next > id);
}

#[tokio::test]
async fn test_round_trip_timestamp_is_iso8601() {
    let (state, _temp) = create_test_app().await;

    let photos: Vec<EncodedImage> = (0..3)
        .map(|i| EncodedImage::from_bytes("image/png", &[i]))
        .collect();

    let before = chrono::Utc::now();
    state.storage.save_photo_strip(&photos).await.unwrap();

    let strip = state.storage.list_photo_strips().await.unwrap().remove(0);
    assert!(strip.timestamp >= before);

    let json = serde_json::to_value(&strip).unwrap();
    let text = json["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(text).is_ok());
    assert_eq!(json["type"], "photoStrip");
}
