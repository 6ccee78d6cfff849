use thiserror::Error;

/// Reasons a classification response body could not be turned into an
/// [`UploadResult`](crate::protocol::UploadResult).
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("malformed classification response: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("classification response has no `mode` field")]
    MissingMode,
    #[error("unrecognized result mode '{mode}' (expected 'single' or 'folder')")]
    UnknownMode { mode: String },
}
