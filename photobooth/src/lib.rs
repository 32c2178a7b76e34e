//! Photo booth core
//!
//! Uploads become a three-photo strip with a shared filter, rendered to a
//! JPEG that is downloaded, saved locally and optionally shared. The UI
//! shell drives a [`booth::PhotoBooth`] session; storage lives in
//! [`database`].

pub mod app;
pub mod booth;
pub mod config;
pub mod database;
pub mod error;
pub mod services;
pub mod storage;

pub use app::{init_logging, setup, AppState};
pub use booth::{Notice, PhotoBooth, SessionState};
pub use error::{AppError, Result};
