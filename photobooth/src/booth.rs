//! Photo booth session
//!
//! The narrow interface the UI shell drives. A session moves through
//! `Idle -> PhotosLoaded -> Composed -> Shared`; uploading again after a
//! strip was composed drops the composed strip (not its saved record) and
//! returns to `PhotosLoaded`.
//!
//! Every action answers with a [`Notice`] for the user. Composition
//! failures become notices here instead of propagating.

use crate::app::AppState;
use crate::database::EncodedImage;
use crate::error::AppError;
use crate::services::{
    ComposedStrip, ExportService, ExportedStrip, IngestService, ShareOutcome, SharePlatform,
    ShareService, StripFilter, StripRenderer, UploadedFile,
};
use serde::Serialize;
use std::sync::Arc;

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Idle,
    PhotosLoaded,
    Composed,
    Shared,
}

/// Feedback for the user after an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    PhotosLoaded(usize),
    /// Upload had fewer than three photos
    NeedMorePhotos,
    UploadFailed(String),
    /// Generate was pressed before photos were loaded
    PhotosRequired,
    StripGenerated(ExportedStrip),
    GenerateFailed(String),
    /// Share was pressed before a strip was generated
    GenerateFirst,
    Shared(ShareOutcome),
}

impl Notice {
    /// Text shown to the user
    pub fn message(&self) -> String {
        match self {
            Notice::PhotosLoaded(n) => format!("{} photos ready", n),
            Notice::NeedMorePhotos => "Please upload at least 3 photos!".to_string(),
            Notice::UploadFailed(_) => "Failed to load photos".to_string(),
            Notice::PhotosRequired => "Please upload at least 3 photos first".to_string(),
            Notice::StripGenerated(_) => {
                "Photo strip generated! Check your downloads folder".to_string()
            }
            Notice::GenerateFailed(_) => "Failed to generate photo strip".to_string(),
            Notice::GenerateFirst => "Please generate a photo strip first".to_string(),
            Notice::Shared(ShareOutcome::Failed(_)) => "Sharing failed".to_string(),
            Notice::Shared(ShareOutcome::Unsupported) => {
                "Sharing is not available here".to_string()
            }
            Notice::Shared(_) => "Photo strip shared".to_string(),
        }
    }
}

/// One user's photo booth session
pub struct PhotoBooth {
    ingest: IngestService,
    renderer: StripRenderer,
    export: ExportService,
    share: ShareService,
    state: SessionState,
    filter_name: String,
    photos: Vec<EncodedImage>,
    composed: Option<ComposedStrip>,
    last_export: Option<ExportedStrip>,
}

impl PhotoBooth {
    pub fn new(
        ingest: IngestService,
        renderer: StripRenderer,
        export: ExportService,
        share: ShareService,
    ) -> Self {
        Self {
            ingest,
            renderer,
            export,
            share,
            state: SessionState::Idle,
            filter_name: StripFilter::Vintage.name().to_string(),
            photos: Vec::new(),
            composed: None,
            last_export: None,
        }
    }

    /// Session wired to the application's storage and sinks
    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            IngestService::new(Arc::new(state.storage.clone())),
            StripRenderer::default(),
            ExportService::new(state.storage.clone(), state.downloads.clone()),
            ShareService::new(state.share_host.clone()),
        )
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn photos(&self) -> &[EncodedImage] {
        &self.photos
    }

    /// Name of the filter used for the next render
    pub fn filter_name(&self) -> &str {
        &self.filter_name
    }

    pub fn composed(&self) -> Option<&ComposedStrip> {
        self.composed.as_ref()
    }

    pub fn last_export(&self) -> Option<&ExportedStrip> {
        self.last_export.as_ref()
    }

    /// Load a new selection of photos
    pub async fn upload(&mut self, files: &[UploadedFile]) -> Notice {
        match self.ingest.ingest(files).await {
            Ok(photos) => {
                let count = photos.len();
                self.photos = photos;
                self.composed = None;
                self.last_export = None;
                self.state = SessionState::PhotosLoaded;
                Notice::PhotosLoaded(count)
            }
            Err(AppError::InsufficientPhotos { .. }) => Notice::NeedMorePhotos,
            Err(e) => {
                tracing::error!("Error loading photos: {}", e);
                Notice::UploadFailed(e.to_string())
            }
        }
    }

    /// Choose the filter for subsequent renders. Unknown names render
    /// without a filter.
    pub fn select_filter(&mut self, name: &str) {
        tracing::debug!("Selected filter: {}", name);
        self.filter_name = name.to_string();
    }

    /// Render, download and save a strip from the loaded photos
    pub async fn generate(&mut self) -> Notice {
        if self.state == SessionState::Idle {
            return Notice::PhotosRequired;
        }

        let result = async {
            let strip = self.renderer.compose(&self.photos, &self.filter_name).await?;
            let exported = self.export.export_strip(&strip).await?;
            Ok::<_, AppError>((strip, exported))
        }
        .await;

        match result {
            Ok((strip, exported)) => {
                self.composed = Some(strip);
                self.last_export = Some(exported.clone());
                self.state = SessionState::Composed;
                Notice::StripGenerated(exported)
            }
            Err(e) => {
                tracing::error!("Error generating photo strip: {}", e);
                Notice::GenerateFailed(e.to_string())
            }
        }
    }

    /// Share the composed strip. Only a successful share moves the session
    /// to `Shared`.
    pub async fn share(&mut self, platform: SharePlatform) -> Notice {
        let Some(strip) = &self.composed else {
            return Notice::GenerateFirst;
        };

        let outcome = self.share.share_strip(&strip.image, platform).await;
        if matches!(outcome, ShareOutcome::Opened(_) | ShareOutcome::NativeShared) {
            self.state = SessionState::Shared;
        }
        Notice::Shared(outcome)
    }
}
