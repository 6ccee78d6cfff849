use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use shared::protocol::{UploadResult, UPLOAD_FIELD_NAME, UPLOAD_PATH};
use tracing::{debug, info, warn};
use url::Url;

pub mod assets;
pub mod error;

pub use error::{AssetError, UploadFailure};

/// Used when no timeout is configured.
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);
const ERROR_BODY_PREVIEW_LEN: usize = 256;

/// A user-selected file, read fully into memory before it is sent.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl FileUpload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let mime_type = mime_guess::from_path(&filename)
            .first_or_octet_stream()
            .to_string();
        Self {
            filename,
            bytes,
            mime_type,
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self, UploadFailure> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| UploadFailure::ReadFile {
                path: path.to_path_buf(),
                source,
            })?;
        // Lossy so that the extension survives a non UTF-8 stem; the server routes on it.
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.bin".to_string());
        Ok(Self::new(filename, bytes))
    }

    pub fn is_archive(&self) -> bool {
        self.filename.to_ascii_lowercase().ends_with(".zip")
    }
}

/// The remote classification service: one request, one parsed response.
#[async_trait]
pub trait ClassificationService: Send + Sync {
    async fn classify(&self, upload: FileUpload) -> Result<UploadResult, UploadFailure>;
}

pub struct HttpClassificationService {
    http: Client,
    server_url: Url,
    timeout: Duration,
}

impl HttpClassificationService {
    pub fn new(server_url: Url, timeout: Duration) -> Self {
        Self {
            http: Client::new(),
            server_url: assets::normalized_base(&server_url),
            timeout,
        }
    }

    pub fn endpoint(&self) -> Result<Url, UploadFailure> {
        Ok(self.server_url.join(UPLOAD_PATH)?)
    }

    /// Fetches the bytes of a single image the service republished after classification.
    pub async fn fetch_uploaded_image(&self, image_file: &str) -> Result<Vec<u8>, AssetError> {
        let url = assets::uploaded_image_url(&self.server_url, image_file)?;
        debug!(url = %url, "fetching uploaded image");
        let response = self.http.get(url).timeout(self.timeout).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AssetError::Status(status.as_u16()));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ClassificationService for HttpClassificationService {
    async fn classify(&self, upload: FileUpload) -> Result<UploadResult, UploadFailure> {
        let endpoint = self.endpoint()?;
        let part = Part::bytes(upload.bytes)
            .file_name(upload.filename)
            .mime_str(&upload.mime_type)?;
        let form = Form::new().part(UPLOAD_FIELD_NAME, part);

        let exchange = async {
            let response = self.http.post(endpoint).multipart(form).send().await?;
            let status = response.status();
            if !status.is_success() {
                let mut body = response.text().await.unwrap_or_default();
                if body.len() > ERROR_BODY_PREVIEW_LEN {
                    let cut = (0..=ERROR_BODY_PREVIEW_LEN)
                        .rev()
                        .find(|idx| body.is_char_boundary(*idx))
                        .unwrap_or(0);
                    body.truncate(cut);
                }
                return Err(UploadFailure::Status {
                    status: status.as_u16(),
                    body,
                });
            }
            Ok::<_, UploadFailure>(response.bytes().await?)
        };

        let body = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| UploadFailure::Timeout {
                after: self.timeout,
            })??;

        Ok(UploadResult::from_slice(&body)?)
    }
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// No file was selected; nothing was sent.
    NoFile,
    /// Another upload is still in flight; this submission was dropped.
    Busy,
    Completed(Result<UploadResult, UploadFailure>),
}

/// Clears the in-flight flag when the upload finishes or its future is dropped.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Sends at most one upload at a time to the classification service.
pub struct UploadCoordinator<S> {
    service: S,
    in_flight: AtomicBool,
}

impl<S: ClassificationService> UploadCoordinator<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn submit(&self, file: Option<FileUpload>) -> SubmitOutcome {
        let Some(file) = file else {
            debug!("upload submitted without a file; ignoring");
            return SubmitOutcome::NoFile;
        };
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            warn!(filename = %file.filename, "upload already in flight; ignoring new submission");
            return SubmitOutcome::Busy;
        };

        info!(
            filename = %file.filename,
            size_bytes = file.bytes.len(),
            archive = file.is_archive(),
            "uploading file for classification"
        );
        let started = Instant::now();
        let result = self.service.classify(file).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(parsed) => info!(
                mode = parsed.mode(),
                models = parsed.model_count(),
                elapsed_ms,
                "classification completed"
            ),
            Err(err) => warn!(elapsed_ms, "classification upload failed: {err}"),
        }
        SubmitOutcome::Completed(result)
    }

    /// Reads `path` and submits it. A read failure completes the submission with an error.
    pub async fn submit_path(&self, path: Option<PathBuf>) -> SubmitOutcome {
        let Some(path) = path else {
            return self.submit(None).await;
        };
        if self.is_in_flight() {
            warn!(path = %path.display(), "upload already in flight; ignoring new submission");
            return SubmitOutcome::Busy;
        }
        match FileUpload::from_path(&path).await {
            Ok(file) => self.submit(Some(file)).await,
            Err(err) => {
                warn!("could not prepare upload: {err}");
                SubmitOutcome::Completed(Err(err))
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
