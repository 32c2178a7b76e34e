//! Application state and initialization
//!
//! This module manages the shared collaborators and their lifecycle.
//! Everything a session needs is opened here and handed out through
//! [`AppState`]; nothing is kept in module-level globals.

use crate::booth::PhotoBooth;
use crate::config::AppConfig;
use crate::database::PhotoStorage;
use crate::error::Result;
use crate::services::ShareHost;
use crate::storage::{DirectoryDownloads, DownloadSink};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the tracing subscriber. Later calls are no-ops.
pub fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "photobooth=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Central application state holding the injected collaborators
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub storage: PhotoStorage,
    pub downloads: Arc<dyn DownloadSink>,
    pub share_host: Arc<dyn ShareHost>,
}

impl AppState {
    /// Start a new session bound to this state
    pub fn new_session(&self) -> PhotoBooth {
        PhotoBooth::from_state(self)
    }

    /// Release the database handle
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down photo booth");
        self.storage.close().await;
    }
}

/// Application setup - called once on startup
pub async fn setup(config: AppConfig, share_host: Arc<dyn ShareHost>) -> Result<AppState> {
    tracing::info!("Initializing photo booth");
    tracing::info!("Data directory: {:?}", config.data_dir);

    let storage = PhotoStorage::open(&config).await?;

    let downloads = DirectoryDownloads::new(config.downloads_dir.clone());
    downloads.initialize().await?;

    tracing::info!("Photo booth initialized successfully");

    Ok(AppState {
        config,
        storage,
        downloads: Arc::new(downloads),
        share_host,
    })
}
