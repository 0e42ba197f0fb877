//! Media uploads.
//!
//! Provides upload validation and blob storage backends.

pub mod service;
pub mod storage;

pub use service::{ALLOWED_MIME_TYPES, MAX_FILE_SIZE, UploadResult, UploadService};
pub use storage::{BlobStorage, LocalBlobStorage};

#[cfg(feature = "s3")]
pub use storage::S3BlobStorage;
