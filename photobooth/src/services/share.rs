//! Strip sharing
//!
//! Sharing is best-effort: every failure is logged and reported as a
//! [`ShareOutcome`], never as an error.

use crate::config::{SHARE_FILE_NAME, SHARE_TEXT, SHARE_TITLE};
use crate::database::EncodedImage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::Arc;

/// Where a strip can be shared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SharePlatform {
    Instagram,
    Facebook,
    Twitter,
    Whatsapp,
    /// The host's own share sheet
    Native,
}

impl SharePlatform {
    /// Look up a platform by name. Names without a dedicated target
    /// (e.g. "snapchat") use the native share sheet.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "instagram" => SharePlatform::Instagram,
            "facebook" => SharePlatform::Facebook,
            "twitter" => SharePlatform::Twitter,
            "whatsapp" => SharePlatform::Whatsapp,
            _ => SharePlatform::Native,
        }
    }
}

/// File and text handed to a native share sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeShareRequest {
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
    pub title: String,
    pub text: String,
}

/// Capabilities of the environment the booth runs in
#[async_trait]
pub trait ShareHost: Send + Sync {
    /// URL of the page hosting the booth
    fn page_url(&self) -> String;

    fn is_mobile(&self) -> bool {
        false
    }

    /// Open an outbound link
    async fn open_url(&self, url: &str) -> std::result::Result<(), String>;

    fn supports_native_share(&self) -> bool {
        false
    }

    async fn native_share(&self, _request: NativeShareRequest) -> std::result::Result<(), String> {
        Err("native share is not supported".to_string())
    }
}

/// Host without a browser: links are logged, native share is absent
#[derive(Debug, Clone, Default)]
pub struct LoggingShareHost {
    page_url: String,
}

impl LoggingShareHost {
    pub fn new(page_url: impl Into<String>) -> Self {
        Self {
            page_url: page_url.into(),
        }
    }
}

#[async_trait]
impl ShareHost for LoggingShareHost {
    fn page_url(&self) -> String {
        self.page_url.clone()
    }

    async fn open_url(&self, url: &str) -> std::result::Result<(), String> {
        tracing::info!("Share link: {}", url);
        Ok(())
    }
}

/// What happened to a share request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareOutcome {
    /// An outbound link was opened
    Opened(String),
    /// The strip went to the native share sheet
    NativeShared,
    /// The host cannot share this way; nothing happened
    Unsupported,
    /// The host rejected the share
    Failed(String),
}

/// Percent-encode a URI component the way `encodeURIComponent` does
pub fn encode_uri_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => {
                let _ = write!(out, "%{:02X}", byte);
            }
        }
    }
    out
}

/// Outbound link for a social platform; `None` for native sharing
pub fn share_url(
    platform: SharePlatform,
    page_url: &str,
    is_mobile: bool,
    strip: &EncodedImage,
) -> Option<String> {
    match platform {
        SharePlatform::Instagram if is_mobile => Some("instagram://camera".to_string()),
        SharePlatform::Instagram => Some("https://instagram.com".to_string()),
        SharePlatform::Facebook => Some(format!(
            "https://www.facebook.com/sharer/sharer.php?u={}",
            encode_uri_component(page_url)
        )),
        SharePlatform::Twitter => Some(format!(
            "https://twitter.com/intent/tweet?text={}&url={}&media={}",
            encode_uri_component(SHARE_TEXT),
            encode_uri_component(page_url),
            encode_uri_component(strip.as_str())
        )),
        SharePlatform::Whatsapp => Some(format!(
            "https://wa.me/?text={}",
            encode_uri_component(SHARE_TEXT)
        )),
        SharePlatform::Native => None,
    }
}

/// Service for sharing rendered strips
#[derive(Clone)]
pub struct ShareService {
    host: Arc<dyn ShareHost>,
}

impl ShareService {
    pub fn new(host: Arc<dyn ShareHost>) -> Self {
        Self { host }
    }

    /// Share a strip. Never fails; the outcome says what happened.
    pub async fn share_strip(&self, strip: &EncodedImage, platform: SharePlatform) -> ShareOutcome {
        tracing::info!("Sharing photo strip to {:?}", platform);

        match share_url(platform, &self.host.page_url(), self.host.is_mobile(), strip) {
            Some(url) => match self.host.open_url(&url).await {
                Ok(()) => ShareOutcome::Opened(url),
                Err(e) => {
                    tracing::error!("Error sharing to {:?}: {}", platform, e);
                    ShareOutcome::Failed(e)
                }
            },
            None => self.share_native(strip).await,
        }
    }

    async fn share_native(&self, strip: &EncodedImage) -> ShareOutcome {
        if !self.host.supports_native_share() {
            tracing::debug!("Native share unavailable, skipping");
            return ShareOutcome::Unsupported;
        }

        let data = match strip.decode() {
            Ok(data) => data,
            Err(e) => {
                tracing::error!("Error preparing photo for sharing: {}", e);
                return ShareOutcome::Failed(e.to_string());
            }
        };

        let request = NativeShareRequest {
            file_name: SHARE_FILE_NAME.to_string(),
            mime_type: "image/jpeg".to_string(),
            data,
            title: SHARE_TITLE.to_string(),
            text: SHARE_TEXT.to_string(),
        };

        match self.host.native_share(request).await {
            Ok(()) => ShareOutcome::NativeShared,
            Err(e) => {
                tracing::error!("Error sharing: {}", e);
                ShareOutcome::Failed(e)
            }
        }
    }
}
