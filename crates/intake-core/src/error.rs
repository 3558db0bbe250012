//! Error taxonomy for order intake

use thiserror::Error;

/// Result type for intake operations
pub type IntakeResult<T> = Result<T, IntakeError>;

/// Errors that can occur while taking in an order
///
/// The `Display` text of the client-facing variants is the message
/// returned to the caller, so it is kept in the service's user language.
#[derive(Debug, Error)]
pub enum IntakeError {
    /// One or more required order fields are missing or empty
    #[error("Data order tidak lengkap. Harap isi semua kolom wajib.")]
    IncompleteData {
        /// Wire names of the missing fields
        missing: Vec<&'static str>,
    },

    /// No proof-of-payment file was attached
    #[error("Bukti transfer wajib diupload.")]
    MissingProof,

    /// More than one proof file was attached
    #[error("Hanya satu bukti transfer yang boleh diupload.")]
    DuplicateProof,

    /// Uploaded file exceeds the configured size limit
    #[error("Ukuran file terlalu besar. Maksimal {}.", limit_text(.limit))]
    FileTooLarge {
        /// Limit in bytes
        limit: u64,
    },

    /// The request body could not be read as a multipart form
    #[error("Malformed multipart body: {0}")]
    Multipart(String),

    /// Filesystem error while storing or removing an upload
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// The order recorder rejected or failed to record the order
    #[error("Recorder error: {0}")]
    Recorder(String),
}

impl IntakeError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            IntakeError::IncompleteData { .. } => 400,
            IntakeError::MissingProof => 400,
            IntakeError::DuplicateProof => 400,
            IntakeError::FileTooLarge { .. } => 400,
            IntakeError::Multipart(_) => 500,
            IntakeError::Storage(_) => 500,
            IntakeError::Recorder(_) => 500,
        }
    }

    /// Whether the error was caused by the request rather than the server
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;

/// Human size of an upload limit, rounded up so it never understates it.
/// Limits below one MiB are shown in KB.
fn limit_text(limit: &u64) -> String {
    let limit = *limit;
    if limit >= MIB {
        format!("{}MB", limit.div_ceil(MIB))
    } else {
        format!("{}KB", limit.div_ceil(KIB).max(1))
    }
}
