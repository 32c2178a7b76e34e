//! Storage module
//!
//! Provides the download sink that receives rendered strips.

pub mod download;

pub use download::{download_file_name, DirectoryDownloads, DownloadSink};
