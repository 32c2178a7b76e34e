//! Services module
//!
//! The composition pipeline: ingest, render, export and share.
//! Each service coordinates between the session and storage.

pub mod export;
pub mod filters;
pub mod ingest;
pub mod render;
pub mod share;

pub use export::{ExportService, ExportedStrip};
pub use filters::StripFilter;
pub use ingest::{IngestHook, IngestService, UploadedFile};
pub use render::{ComposedStrip, StripLayout, StripRenderer};
pub use share::{LoggingShareHost, NativeShareRequest, ShareHost, ShareOutcome, SharePlatform, ShareService};
