//! Explicit state container for the screen flow.
//!
//! The app owns one [`AppState`]; UI actions call its transition methods and backend
//! events are folded in through [`AppState::apply`]. Methods that need backend work
//! return the command for the caller to dispatch, so the state stays testable
//! without a running worker.

use std::path::PathBuf;

use shared::{
    domain::{Stage, ViewMode},
    projection::{project, RenderModel},
    protocol::UploadResult,
};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};
use crate::ui::app::PreviewImage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Idle,
    InFlight { filename: String },
    /// Last attempt failed; the upload screen offers a retry.
    Failed(UiError),
}

#[derive(Debug, Clone)]
pub enum ImagePreviewState {
    NotRequested,
    Loading,
    Ready(PreviewImage),
    Error(String),
}

/// The most recent successful upload together with its projection.
#[derive(Debug, Clone)]
pub struct HeldResult {
    pub result: UploadResult,
    pub model: RenderModel,
}

#[derive(Debug, Clone)]
pub struct AppState {
    stage: Stage,
    view: ViewMode,
    held: Option<HeldResult>,
    upload: UploadStatus,
    image_preview: ImagePreviewState,
    // Bumped on every completed upload; preview events carry the value they were fetched for.
    generation: u64,
    status: String,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            stage: Stage::Initial,
            view: ViewMode::Cards,
            held: None,
            upload: UploadStatus::Idle,
            image_preview: ImagePreviewState::NotRequested,
            generation: 0,
            status: "Ready".to_string(),
        }
    }
}

impl AppState {
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    pub fn held(&self) -> Option<&HeldResult> {
        self.held.as_ref()
    }

    pub fn render_model(&self) -> Option<&RenderModel> {
        self.held.as_ref().map(|held| &held.model)
    }

    pub fn upload_status(&self) -> &UploadStatus {
        &self.upload
    }

    pub fn upload_in_flight(&self) -> bool {
        matches!(self.upload, UploadStatus::InFlight { .. })
    }

    pub fn image_preview(&self) -> &ImagePreviewState {
        &self.image_preview
    }

    /// Identifies the held result; two uploads of the same file name get different values.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Free-form navigation: every stage is reachable from every other.
    pub fn transition_to(&mut self, stage: Stage) {
        if self.stage != stage {
            tracing::debug!(from = ?self.stage, to = ?stage, "stage transition");
        }
        self.stage = stage;
    }

    pub fn set_view(&mut self, view: ViewMode) {
        self.view = view;
        if let Some(held) = self.held.as_mut() {
            held.model.set_view(view);
        }
    }

    /// Starts an upload of `path`. Returns the command to dispatch, or `None` when there
    /// is nothing to send (no file picked, or an upload is already running).
    pub fn begin_upload(&mut self, path: Option<PathBuf>) -> Option<BackendCommand> {
        let path = path?;
        if let UploadStatus::InFlight { filename } = &self.upload {
            tracing::info!(
                in_flight = %filename,
                ignored = %path.display(),
                "upload already in flight; ignoring selection"
            );
            return None;
        }

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.status = format!("Classifying {filename}…");
        self.upload = UploadStatus::InFlight { filename };
        Some(BackendCommand::Upload { path })
    }

    pub fn dismiss_upload_error(&mut self) {
        if matches!(self.upload, UploadStatus::Failed(_)) {
            self.upload = UploadStatus::Idle;
        }
    }

    /// Folds a backend event into the state, returning any follow-up command.
    pub fn apply(&mut self, event: UiEvent) -> Option<BackendCommand> {
        match event {
            UiEvent::Info(message) => {
                self.status = message;
                None
            }
            UiEvent::UploadCompleted(result) => self.complete_upload(result),
            UiEvent::UploadFailed(err) => {
                self.fail_upload(err);
                None
            }
            UiEvent::UploadIgnored => {
                self.status = "An upload is already in progress".to_string();
                None
            }
            UiEvent::UploadedImageLoaded {
                generation,
                image_file,
                image,
            } => {
                if self.is_current_image(generation) {
                    self.image_preview = ImagePreviewState::Ready(image);
                } else {
                    tracing::debug!(%image_file, generation, "discarding stale uploaded image");
                }
                None
            }
            UiEvent::UploadedImageFailed {
                generation,
                image_file,
                reason,
            } => {
                if self.is_current_image(generation) {
                    tracing::warn!(%image_file, "uploaded image preview failed: {reason}");
                    self.image_preview = ImagePreviewState::Error(reason);
                }
                None
            }
            UiEvent::Error(err) => {
                match err.context() {
                    UiErrorContext::Upload => self.fail_upload(err),
                    UiErrorContext::ImagePreview => {
                        self.image_preview = ImagePreviewState::Error(err.message().to_string());
                    }
                    UiErrorContext::BackendStartup | UiErrorContext::General => {
                        self.status = err.headline();
                    }
                }
                None
            }
        }
    }

    fn complete_upload(&mut self, result: UploadResult) -> Option<BackendCommand> {
        let model = project(&result, self.view);
        self.generation += 1;
        let follow_up = match &result {
            UploadResult::Single { image_file, .. } => {
                self.image_preview = ImagePreviewState::Loading;
                Some(BackendCommand::FetchUploadedImage {
                    generation: self.generation,
                    image_file: image_file.clone(),
                })
            }
            UploadResult::Folder { .. } => {
                self.image_preview = ImagePreviewState::NotRequested;
                None
            }
        };

        self.status = format!(
            "Classified with {} model(s) ({} mode)",
            result.model_count(),
            result.mode()
        );
        self.held = Some(HeldResult { result, model });
        self.upload = UploadStatus::Idle;
        self.transition_to(Stage::Results);
        follow_up
    }

    fn fail_upload(&mut self, err: UiError) {
        tracing::warn!(category = ?err.category(), "upload failed: {}", err.message());
        self.status = err.headline();
        self.upload = UploadStatus::Failed(err);
    }

    fn is_current_image(&self, generation: u64) -> bool {
        generation == self.generation
            && matches!(
                self.held.as_ref().map(|held| &held.result),
                Some(UploadResult::Single { .. })
            )
    }
}

#[cfg(test)]
#[path = "tests/reducer_tests.rs"]
mod tests;
