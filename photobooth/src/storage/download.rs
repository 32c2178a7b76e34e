//! Download sink for rendered strips
//!
//! The booth hands every exported strip to a [`DownloadSink`]. The default
//! sink writes the JPEG into a downloads directory, going through a temp
//! file so a half-written download is never visible under its final name.

use crate::config::DOWNLOAD_FILE_PREFIX;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::Result;

/// File name for a strip exported at `at`: `photo-strip-<YYYY-MM-DD>.jpg`
pub fn download_file_name(at: DateTime<Utc>) -> String {
    format!("{}-{}.jpg", DOWNLOAD_FILE_PREFIX, at.format("%Y-%m-%d"))
}

/// Receiver of downloaded files
#[async_trait]
pub trait DownloadSink: Send + Sync {
    /// Deliver `data` under `file_name`, returning where it ended up
    async fn deliver(&self, file_name: &str, data: &[u8]) -> Result<PathBuf>;
}

/// Writes downloads into a directory on disk
#[derive(Debug, Clone)]
pub struct DirectoryDownloads {
    root: PathBuf,
}

impl DirectoryDownloads {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Create the downloads directory if needed
    pub async fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        tracing::info!("Downloads directory initialized at: {:?}", self.root);
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl DownloadSink for DirectoryDownloads {
    async fn deliver(&self, file_name: &str, data: &[u8]) -> Result<PathBuf> {
        let path = self.root.join(sanitize_filename(file_name));

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = path.with_extension("part");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;

        // Same-day exports replace the earlier file, as a browser download would
        fs::rename(&temp_path, &path).await?;

        tracing::debug!("Wrote download: {:?} ({} bytes)", path, data.len());

        Ok(path)
    }
}

/// Strip path separators and null bytes so a name cannot leave the directory
fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .filter(|c| *c != '/' && *c != '\\' && *c != '\0')
        .take(255)
        .collect()
}
