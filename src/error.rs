use std::path::PathBuf;
use thiserror::Error;

/// Every way one attempt at the select → upload → process pipeline can end early.
#[derive(Debug, Error)]
pub enum UploaderError {
    #[error("'{file_name}' has an unsupported extension '{extension}'")]
    Validation { file_name: String, extension: String },

    #[error("failed to read '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("upload rejected: {0}")]
    UploadRejected(String),

    #[error("upload failed: {0}")]
    UploadTransport(String),

    #[error("processing rejected: {0}")]
    ProcessingRejected(String),

    #[error("processing failed: {0}")]
    ProcessingTransport(String),

    #[error("invalid redirect url '{url}': {reason}")]
    Redirect { url: String, reason: String },
}
