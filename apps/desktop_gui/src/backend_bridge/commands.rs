//! Backend commands queued from UI to backend worker.

use std::path::PathBuf;

#[derive(Debug)]
pub enum BackendCommand {
    Upload { path: PathBuf },
    /// `generation` is echoed back so the UI can drop previews of replaced results.
    FetchUploadedImage { generation: u64, image_file: String },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Upload { .. } => "upload",
            BackendCommand::FetchUploadedImage { .. } => "fetch_uploaded_image",
        }
    }
}
