//! Application state for the intake API

use std::path::{Path, PathBuf};
use std::sync::Arc;

use intake_core::{IntakeConfig, OrderRecorder, UploadSink};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Where proof files are written
    sink: Arc<UploadSink>,
    /// Where accepted orders are handed to
    recorder: Arc<dyn OrderRecorder>,
    /// Image served by the QRIS endpoint
    placeholder_qris: Arc<PathBuf>,
}

impl AppState {
    /// Create a new AppState from its parts
    pub fn new(
        sink: UploadSink,
        placeholder_qris: impl Into<PathBuf>,
        recorder: Arc<dyn OrderRecorder>,
    ) -> Self {
        Self {
            sink: Arc::new(sink),
            recorder,
            placeholder_qris: Arc::new(placeholder_qris.into()),
        }
    }

    /// Create AppState from a validated service configuration
    pub fn from_config(config: &IntakeConfig, recorder: Arc<dyn OrderRecorder>) -> Self {
        let storage = &config.storage;
        Self::new(
            UploadSink::new(&storage.upload_dir, storage.max_upload_bytes),
            &storage.placeholder_qris,
            recorder,
        )
    }

    pub fn sink(&self) -> &UploadSink {
        &self.sink
    }

    pub fn recorder(&self) -> &dyn OrderRecorder {
        self.recorder.as_ref()
    }

    pub fn placeholder_qris(&self) -> &Path {
        &self.placeholder_qris
    }
}
