//! Artifact storage for generation jobs using Apache OpenDAL.
//!
//! Objects are written to Google Cloud Storage in production and to the
//! local filesystem in development. Either way, callers address objects
//! by key and receive `gs://{bucket}/{key}` URIs back, since that is the
//! form the video provider reads from and writes to.
//!
//! # Layout
//!
//! ```text
//! gs://{bucket}/jobs/{job_id}/
//! ├── sketch.{ext}
//! ├── prompt.txt
//! ├── generated-image.{ext}
//! └── videos/            <- written by the video provider
//! ```

mod config;
mod error;
mod job;
mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use job::JobFolder;
pub use service::StorageService;
