use std::{path::PathBuf, time::Duration};

use shared::error::PayloadError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadFailure {
    #[error("could not read '{}': {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid classification endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
    #[error("network error talking to classification service: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("classification request timed out after {}s", .after.as_secs())]
    Timeout { after: Duration },
    #[error("classification service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error(transparent)]
    Payload(#[from] PayloadError),
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("server url '{0}' cannot serve static assets")]
    InvalidBase(String),
    #[error("refusing unsafe uploaded image reference '{0}'")]
    InvalidReference(String),
    #[error("failed to fetch uploaded image: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("uploaded image request returned HTTP {0}")]
    Status(u16),
}
