//! Pure projection of an [`UploadResult`] into rows shared by the card and table layouts.
//!
//! Rows are built once per result; switching the [`ViewMode`] only swaps the layout
//! tag on an existing [`RenderModel`].

use crate::{
    domain::ViewMode,
    protocol::{UploadResult, STATIC_UPLOADS_PREFIX},
};

pub const CHART_PLACEHOLDER: &str = "Chart view coming soon...";

const SINGLE_COLUMNS: &[FieldKind] = &[
    FieldKind::Prediction,
    FieldKind::InferenceTime,
    FieldKind::Parameters,
    FieldKind::Accuracy,
    FieldKind::TrainTime,
];

const FOLDER_COLUMNS: &[FieldKind] = &[
    FieldKind::AvgInferenceTime,
    FieldKind::Accuracy,
    FieldKind::TrainTime,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Prediction,
    InferenceTime,
    AvgInferenceTime,
    Parameters,
    Accuracy,
    TrainTime,
}

impl FieldKind {
    pub fn card_label(self) -> &'static str {
        match self {
            FieldKind::Prediction => "Prediction",
            FieldKind::InferenceTime => "Inference Time",
            FieldKind::AvgInferenceTime => "Avg Inference Time",
            FieldKind::Parameters => "Parameters",
            FieldKind::Accuracy => "Accuracy",
            FieldKind::TrainTime => "Train Time",
        }
    }

    pub fn column_label(self) -> &'static str {
        match self {
            FieldKind::Prediction => "Prediction",
            FieldKind::InferenceTime => "Inference Time (s)",
            FieldKind::AvgInferenceTime => "Avg Inference Time (s)",
            FieldKind::Parameters => "Parameters",
            FieldKind::Accuracy => "Accuracy (%)",
            FieldKind::TrainTime => "Train Time",
        }
    }

    /// Unit appended to the value in card layout. Table cells carry the unit in the header.
    pub fn card_unit(self) -> &'static str {
        match self {
            FieldKind::InferenceTime | FieldKind::AvgInferenceTime => "s",
            FieldKind::Accuracy => "%",
            FieldKind::Prediction | FieldKind::Parameters | FieldKind::TrainTime => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayField {
    pub kind: FieldKind,
    /// `None` when the payload had no value for this model (rendered blank).
    pub value: Option<String>,
}

impl DisplayField {
    fn present(kind: FieldKind, value: String) -> Self {
        Self {
            kind,
            value: Some(value),
        }
    }

    pub fn card_text(&self) -> String {
        match &self.value {
            Some(value) => format!("{value}{}", self.kind.card_unit()),
            None => String::new(),
        }
    }

    pub fn cell_text(&self) -> &str {
        self.value.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRow {
    pub model: String,
    pub fields: Vec<DisplayField>,
}

impl ModelRow {
    pub fn field(&self, kind: FieldKind) -> Option<&DisplayField> {
        self.fields.iter().find(|field| field.kind == kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultHeader {
    UploadedImage { image_file: String },
    BatchSummary { total_images: u64 },
}

impl ResultHeader {
    pub fn summary_text(&self) -> Option<String> {
        match self {
            ResultHeader::UploadedImage { .. } => None,
            ResultHeader::BatchSummary { total_images } => {
                Some(format!("Batch processed {total_images} images"))
            }
        }
    }

    /// Server-relative reference of the redisplayed upload, never built from user input.
    pub fn image_reference(&self) -> Option<String> {
        match self {
            ResultHeader::UploadedImage { image_file } => {
                Some(format!("{STATIC_UPLOADS_PREFIX}{image_file}"))
            }
            ResultHeader::BatchSummary { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultTable {
    pub header: ResultHeader,
    pub columns: &'static [FieldKind],
    pub rows: Vec<ModelRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Cards,
    Table,
    ChartPlaceholder,
}

impl From<ViewMode> for Layout {
    fn from(view: ViewMode) -> Self {
        match view {
            ViewMode::Cards => Layout::Cards,
            ViewMode::Table => Layout::Table,
            ViewMode::Chart => Layout::ChartPlaceholder,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderModel {
    pub view: ViewMode,
    pub layout: Layout,
    pub table: ResultTable,
}

impl RenderModel {
    pub fn with_view(mut self, view: ViewMode) -> Self {
        self.set_view(view);
        self
    }

    pub fn set_view(&mut self, view: ViewMode) {
        self.view = view;
        self.layout = Layout::from(view);
    }

    pub fn header(&self) -> &ResultHeader {
        &self.table.header
    }

    pub fn rows(&self) -> &[ModelRow] {
        &self.table.rows
    }

    pub fn columns(&self) -> &'static [FieldKind] {
        self.table.columns
    }
}

pub fn project(result: &UploadResult, view: ViewMode) -> RenderModel {
    RenderModel {
        view,
        layout: Layout::from(view),
        table: tabulate(result),
    }
}

/// Builds the normalized rows in the enumeration order of the payload's model map.
pub fn tabulate(result: &UploadResult) -> ResultTable {
    match result {
        UploadResult::Single {
            image_file,
            results,
        } => ResultTable {
            header: ResultHeader::UploadedImage {
                image_file: image_file.clone(),
            },
            columns: SINGLE_COLUMNS,
            rows: results
                .iter()
                .map(|(model, data)| ModelRow {
                    model: model.clone(),
                    fields: vec![
                        DisplayField::present(FieldKind::Prediction, data.prediction.to_string()),
                        DisplayField::present(
                            FieldKind::InferenceTime,
                            format_number(data.inference_time),
                        ),
                        DisplayField::present(FieldKind::Parameters, group_thousands(data.params)),
                        DisplayField::present(FieldKind::Accuracy, format_number(data.accuracy)),
                        DisplayField::present(FieldKind::TrainTime, data.train_time.clone()),
                    ],
                })
                .collect(),
        },
        UploadResult::Folder {
            total_images,
            avg_times,
            model_info,
        } => ResultTable {
            header: ResultHeader::BatchSummary {
                total_images: *total_images,
            },
            columns: FOLDER_COLUMNS,
            rows: avg_times
                .iter()
                .map(|(model, avg_time)| {
                    let info = model_info.get(model);
                    ModelRow {
                        model: model.clone(),
                        fields: vec![
                            DisplayField::present(
                                FieldKind::AvgInferenceTime,
                                format_number(*avg_time),
                            ),
                            DisplayField {
                                kind: FieldKind::Accuracy,
                                value: info.map(|info| format_number(info.accuracy)),
                            },
                            DisplayField {
                                kind: FieldKind::TrainTime,
                                value: info.map(|info| info.train_time.clone()),
                            },
                        ],
                    }
                })
                .collect(),
        },
    }
}

/// Shortest round-trip rendering; `0.12` stays `0.12` and `90.0` becomes `90`.
fn format_number(value: f64) -> String {
    value.to_string()
}

pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
#[path = "tests/projection_tests.rs"]
mod tests;
