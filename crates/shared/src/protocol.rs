use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::PayloadError;

/// Name of the multipart field the classification endpoint reads the upload from.
pub const UPLOAD_FIELD_NAME: &str = "file";
/// Path of the classification endpoint, relative to the server root.
pub const UPLOAD_PATH: &str = "upload";
/// Prefix under which the server republishes uploaded single images.
pub const STATIC_UPLOADS_PREFIX: &str = "static/uploads/";

/// Parsed response of the classification service, tagged by `mode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum UploadResult {
    Single {
        image_file: String,
        results: IndexMap<String, SingleModelResult>,
    },
    Folder {
        total_images: u64,
        avg_times: IndexMap<String, f64>,
        #[serde(default)]
        model_info: IndexMap<String, ModelInfo>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleModelResult {
    pub prediction: Prediction,
    pub inference_time: f64,
    pub params: u64,
    pub accuracy: f64,
    pub train_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub accuracy: f64,
    pub train_time: String,
}

/// Predicted class as reported by the service: either a label or a raw class index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prediction {
    Label(String),
    Class(i64),
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prediction::Label(label) => f.write_str(label),
            Prediction::Class(index) => write!(f, "{index}"),
        }
    }
}

#[derive(Deserialize)]
struct ModeProbe {
    #[serde(default)]
    mode: Option<serde_json::Value>,
}

impl UploadResult {
    /// Decodes a response body, rejecting unknown `mode` values explicitly instead of
    /// folding them into a generic shape error.
    pub fn from_slice(body: &[u8]) -> Result<Self, PayloadError> {
        let probe: ModeProbe = serde_json::from_slice(body)?;
        match probe.mode {
            None | Some(serde_json::Value::Null) => return Err(PayloadError::MissingMode),
            Some(serde_json::Value::String(mode)) if mode == "single" || mode == "folder" => {}
            Some(serde_json::Value::String(mode)) => return Err(PayloadError::UnknownMode { mode }),
            Some(other) => {
                return Err(PayloadError::UnknownMode {
                    mode: other.to_string(),
                })
            }
        }
        Ok(serde_json::from_slice(body)?)
    }

    pub fn mode(&self) -> &'static str {
        match self {
            UploadResult::Single { .. } => "single",
            UploadResult::Folder { .. } => "folder",
        }
    }

    pub fn model_count(&self) -> usize {
        match self {
            UploadResult::Single { results, .. } => results.len(),
            UploadResult::Folder { avg_times, .. } => avg_times.len(),
        }
    }
}
