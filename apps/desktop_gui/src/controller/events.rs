//! UI/backend events and error modeling for the desktop controller.

use client_core::UploadFailure;
use shared::protocol::UploadResult;

use crate::ui::app::PreviewImage;

pub enum UiEvent {
    Info(String),
    UploadCompleted(UploadResult),
    UploadFailed(UiError),
    /// The backend dropped a submission because another upload was still running.
    UploadIgnored,
    UploadedImageLoaded {
        generation: u64,
        image_file: String,
        image: PreviewImage,
    },
    UploadedImageFailed {
        generation: u64,
        image_file: String,
        reason: String,
    },
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Timeout,
    Server,
    Payload,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Upload,
    ImagePreview,
    General,
}

pub fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Transport => "Connection problem",
        UiErrorCategory::Timeout => "Timed out",
        UiErrorCategory::Server => "Server error",
        UiErrorCategory::Payload => "Unexpected response",
        UiErrorCategory::Unknown => "Unexpected",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("timed out") || message_lower.contains("timeout")
        {
            UiErrorCategory::Timeout
        } else if message_lower.contains("malformed")
            || message_lower.contains("unrecognized result mode")
            || message_lower.contains("invalid")
        {
            UiErrorCategory::Payload
        } else if message_lower.contains("http 5") || message_lower.contains("http 4") {
            UiErrorCategory::Server
        } else if message_lower.contains("connection")
            || message_lower.contains("network")
            || message_lower.contains("transport")
            || message_lower.contains("unavailable")
            || message_lower.contains("disconnect")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn from_upload_failure(failure: &UploadFailure) -> Self {
        let category = match failure {
            UploadFailure::Transport(_) | UploadFailure::Endpoint(_) => UiErrorCategory::Transport,
            UploadFailure::Timeout { .. } => UiErrorCategory::Timeout,
            UploadFailure::Status { .. } => UiErrorCategory::Server,
            UploadFailure::Payload(_) => UiErrorCategory::Payload,
            UploadFailure::ReadFile { .. } => UiErrorCategory::Unknown,
        };
        Self {
            category,
            context: UiErrorContext::Upload,
            message: failure.to_string(),
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn headline(&self) -> String {
        format!("{}: {}", err_label(self.category), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::PayloadError;
    use std::time::Duration;

    #[test]
    fn classifies_backend_command_processor_disconnect_as_transport_error() {
        let err = UiError::from_message(
            UiErrorContext::General,
            "Backend command processor disconnected (possible startup/runtime failure)",
        );
        assert_eq!(err.category(), UiErrorCategory::Transport);
    }

    #[test]
    fn maps_upload_failures_by_kind() {
        let timeout = UiError::from_upload_failure(&UploadFailure::Timeout {
            after: Duration::from_secs(120),
        });
        assert_eq!(timeout.category(), UiErrorCategory::Timeout);
        assert_eq!(timeout.context(), UiErrorContext::Upload);
        assert!(timeout.headline().starts_with("Timed out: "));

        let unknown_mode = UiError::from_upload_failure(&UploadFailure::Payload(
            PayloadError::UnknownMode {
                mode: "video".into(),
            },
        ));
        assert_eq!(unknown_mode.category(), UiErrorCategory::Payload);
        assert!(unknown_mode.message().contains("'video'"));

        let status = UiError::from_upload_failure(&UploadFailure::Status {
            status: 502,
            body: String::new(),
        });
        assert_eq!(status.category(), UiErrorCategory::Server);
    }
}
