//! Card, table and chart-placeholder renderings of a [`RenderModel`].

use eframe::egui;
use egui::TextureHandle;
use shared::{
    domain::ViewMode,
    projection::{FieldKind, Layout, ModelRow, RenderModel, ResultHeader, CHART_PLACEHOLDER},
};

use crate::controller::reducer::ImagePreviewState;

const CARD_WIDTH: f32 = 230.0;
const UPLOADED_IMAGE_MAX_EDGE: f32 = 320.0;

/// Draws the results screen. Returns the view the user switched to, if any.
pub fn show_results(
    ui: &mut egui::Ui,
    model: &RenderModel,
    uploaded_image: Option<&TextureHandle>,
    preview: &ImagePreviewState,
) -> Option<ViewMode> {
    let mut view = model.view;
    ui.horizontal(|ui| {
        for mode in ViewMode::ALL {
            ui.selectable_value(&mut view, mode, mode.label());
        }
    });
    ui.add_space(10.0);

    show_header(ui, model.header(), uploaded_image, preview);
    ui.add_space(10.0);

    match model.layout {
        Layout::Cards => show_cards(ui, model.rows()),
        Layout::Table => show_table(ui, model.columns(), model.rows()),
        Layout::ChartPlaceholder => {
            ui.weak(CHART_PLACEHOLDER);
        }
    }

    (view != model.view).then_some(view)
}

fn show_header(
    ui: &mut egui::Ui,
    header: &ResultHeader,
    uploaded_image: Option<&TextureHandle>,
    preview: &ImagePreviewState,
) {
    match header {
        ResultHeader::UploadedImage { image_file } => match (uploaded_image, preview) {
            (Some(texture), _) => {
                let size = texture.size_vec2();
                let scale = (UPLOADED_IMAGE_MAX_EDGE / size.x.max(size.y)).min(1.0);
                ui.add(egui::Image::new(texture).fit_to_exact_size(size * scale));
            }
            (None, ImagePreviewState::Error(reason)) => {
                ui.colored_label(
                    ui.visuals().error_fg_color,
                    format!("Couldn't display {image_file}: {reason}"),
                );
            }
            (None, _) => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.weak(format!("Loading {image_file}…"));
                });
            }
        },
        ResultHeader::BatchSummary { .. } => {
            if let Some(summary) = header.summary_text() {
                ui.label(egui::RichText::new(summary).strong());
            }
        }
    }
}

fn show_cards(ui: &mut egui::Ui, rows: &[ModelRow]) {
    ui.horizontal_wrapped(|ui| {
        for row in rows {
            egui::Frame::group(ui.style())
                .corner_radius(10.0)
                .inner_margin(egui::Margin::symmetric(12, 10))
                .show(ui, |ui| {
                    ui.set_width(CARD_WIDTH);
                    ui.label(egui::RichText::new(&row.model).strong().size(17.0));
                    ui.add_space(4.0);
                    for field in &row.fields {
                        if field.kind == FieldKind::Prediction {
                            egui::Frame::NONE
                                .fill(ui.visuals().selection.bg_fill)
                                .corner_radius(6.0)
                                .inner_margin(egui::Margin::symmetric(8, 4))
                                .show(ui, |ui| {
                                    ui.label(
                                        egui::RichText::new(format!(
                                            "{}: {}",
                                            field.kind.card_label(),
                                            field.card_text()
                                        ))
                                        .color(ui.visuals().selection.stroke.color),
                                    );
                                });
                            continue;
                        }
                        ui.horizontal(|ui| {
                            ui.weak(format!("{}:", field.kind.card_label()));
                            ui.with_layout(
                                egui::Layout::right_to_left(egui::Align::Center),
                                |ui| {
                                    ui.strong(field.card_text());
                                },
                            );
                        });
                    }
                });
        }
    });
}

fn show_table(ui: &mut egui::Ui, columns: &[FieldKind], rows: &[ModelRow]) {
    egui::Grid::new("results_table")
        .striped(true)
        .num_columns(columns.len() + 1)
        .spacing(egui::vec2(18.0, 6.0))
        .show(ui, |ui| {
            ui.strong("Model");
            for column in columns {
                ui.strong(column.column_label());
            }
            ui.end_row();

            for row in rows {
                ui.label(&row.model);
                for column in columns {
                    ui.label(row.field(*column).map(|field| field.cell_text()).unwrap_or_default());
                }
                ui.end_row();
            }
        });
}
