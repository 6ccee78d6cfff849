//! Static screens: intro, get-started, upload prompt and the team page.

use eframe::egui;
use shared::domain::TEAM_MEMBERS;

use crate::controller::reducer::UploadStatus;

const SUBTITLE: &str = "Advanced AI-powered analysis for early detection of diabetic retinopathy using state-of-the-art machine learning models.";

const FEATURES: [(&str, &str, &str); 3] = [
    (
        "🖼",
        "One Image Analysis",
        "Upload a single retinal image for instant AI-powered classification.",
    ),
    (
        "📦",
        "Batch Processing",
        "Process multiple images simultaneously for efficient bulk analysis.",
    ),
    (
        "🤖",
        "AI Model Analysis",
        "Leverage advanced machine learning models for accurate diabetic retinopathy detection.",
    ),
];

pub fn show_intro(ui: &mut egui::Ui) {
    ui.label(egui::RichText::new(SUBTITLE).size(15.0));
    ui.add_space(10.0);
    ui.columns(FEATURES.len(), |columns| {
        for (column, (icon, title, body)) in columns.iter_mut().zip(FEATURES) {
            egui::Frame::group(column.style())
                .corner_radius(10.0)
                .inner_margin(egui::Margin::symmetric(12, 10))
                .show(column, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.label(egui::RichText::new(icon).size(26.0));
                        ui.strong(title);
                        ui.label(body);
                    });
                });
        }
    });
}

/// Returns `true` when the user asked to start.
pub fn show_get_started(ui: &mut egui::Ui) -> bool {
    ui.vertical_centered(|ui| {
        ui.add(
            egui::Button::new(egui::RichText::new("Get Started").size(18.0))
                .min_size(egui::vec2(180.0, 40.0)),
        )
        .clicked()
    })
    .inner
}

/// Returns `true` when the user asked to pick a file.
pub fn show_upload_prompt(ui: &mut egui::Ui, status: &UploadStatus) -> bool {
    ui.vertical_centered(|ui| {
        let in_flight = matches!(status, UploadStatus::InFlight { .. });
        let clicked = ui
            .add_enabled(
                !in_flight,
                egui::Button::new("Choose image or ZIP…").min_size(egui::vec2(220.0, 36.0)),
            )
            .clicked();
        if let UploadStatus::InFlight { filename } = status {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(format!("Classifying {filename}…"));
            });
        }
        ui.weak("Upload an image or a ZIP file containing multiple images");
        clicked
    })
    .inner
}

/// Shown when the results stage is opened before any upload succeeded.
pub fn show_no_results(ui: &mut egui::Ui) -> bool {
    ui.vertical_centered(|ui| {
        ui.weak("No results yet.");
        ui.button("Upload an image").clicked()
    })
    .inner
}

pub fn show_about(ui: &mut egui::Ui) {
    ui.heading("Meet Our Team");
    ui.add_space(8.0);
    ui.horizontal_wrapped(|ui| {
        for member in TEAM_MEMBERS {
            egui::Frame::group(ui.style())
                .corner_radius(10.0)
                .inner_margin(egui::Margin::symmetric(14, 12))
                .show(ui, |ui| {
                    ui.set_width(180.0);
                    ui.vertical_centered(|ui| {
                        ui.strong(member.name);
                        ui.label(egui::RichText::new(member.role).strong());
                        ui.label(member.description);
                    });
                });
        }
    });
}
