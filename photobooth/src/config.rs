//! Application configuration constants
//!
//! Central location for storage names, layout dimensions and the fixed
//! strings the booth hands to download and share sinks.

use std::path::PathBuf;

// ===== Storage =====

/// Name of the embedded database (file stem on disk)
pub const DATABASE_NAME: &str = "PhotoBoothDB";

/// Schema version the migration runner brings the database up to
pub const SCHEMA_VERSION: i32 = 1;

/// Name of the single object store holding both record kinds
pub const STORE_NAME: &str = "photos";

// ===== Composition =====

/// Minimum number of photos an upload must contain
pub const MIN_PHOTOS: usize = 3;

/// Number of frames in a strip. Surplus uploads are dropped.
pub const STRIP_PHOTO_COUNT: usize = 3;

/// Width of the strip content box in pixels
pub const STRIP_CONTENT_WIDTH: u32 = 300;

/// Padding between the strip border and its frames
pub const STRIP_PADDING: u32 = 16;

/// Width of the white border around the strip
pub const STRIP_BORDER: u32 = 15;

/// Minimum height of the strip content box
pub const STRIP_MIN_CONTENT_HEIGHT: u32 = 600;

/// Height of one photo frame
pub const FRAME_HEIGHT: u32 = 200;

/// Vertical gap between frames
pub const FRAME_GAP: u32 = 8;

/// MIME type used when a file's type is unknown or unusable
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// JPEG quality used when rasterizing a strip (0.92 in canvas terms)
pub const JPEG_QUALITY: u8 = 92;

// ===== Download / Share =====

/// Prefix of the downloaded strip file name; the UTC date and `.jpg` follow
pub const DOWNLOAD_FILE_PREFIX: &str = "photo-strip";

/// File name attached to native shares
pub const SHARE_FILE_NAME: &str = "photo-strip.jpg";

/// Title attached to native shares
pub const SHARE_TITLE: &str = "My Photo Strip";

/// Message text used by share targets that accept one
pub const SHARE_TEXT: &str = "Check out my photo strip!";

/// Filesystem locations used by the booth
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding the embedded database
    pub data_dir: PathBuf,
    /// Directory receiving downloaded strips
    pub downloads_dir: PathBuf,
}

impl AppConfig {
    /// Config rooted at `data_dir`, with downloads in `<data_dir>/downloads`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let downloads_dir = data_dir.join("downloads");
        Self {
            data_dir,
            downloads_dir,
        }
    }

    pub fn with_downloads_dir(mut self, downloads_dir: impl Into<PathBuf>) -> Self {
        self.downloads_dir = downloads_dir.into();
        self
    }

    /// Path of the database file
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.db", DATABASE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let config = AppConfig::new("/tmp/booth");
        assert_eq!(config.downloads_dir, PathBuf::from("/tmp/booth/downloads"));
        assert_eq!(
            config.database_path(),
            PathBuf::from("/tmp/booth/PhotoBoothDB.db")
        );
    }

    #[test]
    fn test_custom_downloads_dir() {
        let config = AppConfig::new("/tmp/booth").with_downloads_dir("/home/user/Downloads");
        assert_eq!(config.downloads_dir, PathBuf::from("/home/user/Downloads"));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/booth"));
    }
}
