//! intake-core - Core types for the order intake service
//!
//! This crate holds everything that does not depend on the HTTP layer:
//! the order model and its validation step, the on-disk upload sink,
//! the recorder seam that accepted orders are handed to, and the
//! service configuration.

pub mod config;
pub mod error;
pub mod order;
pub mod recorder;
pub mod upload;

pub use config::{ConfigError, IntakeConfig, ServerConfig, StorageConfig};
pub use error::{IntakeError, IntakeResult};
pub use order::{Order, OrderForm, REQUIRED_FIELDS};
pub use recorder::{LogRecorder, MemoryRecorder, OrderRecorder};
pub use upload::{StoredUpload, UploadInfo, UploadSink, UploadWriter, DEFAULT_MAX_UPLOAD_BYTES};
