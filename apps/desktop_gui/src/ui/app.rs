use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use egui::TextureHandle;
use shared::domain::{Stage, TEAM_MEMBERS};

use crate::backend_bridge::commands::BackendCommand;
use crate::config::StartupConfig;
use crate::controller::events::UiEvent;
use crate::controller::orchestration::dispatch_backend_command;
use crate::controller::reducer::{AppState, ImagePreviewState, UploadStatus};
use crate::ui::{results, screens};

pub const APP_TITLE: &str = "Diabetic Retinopathy Classification System";

/// Decoded RGBA pixels of the redisplayed upload, ready to become a texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewImage {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

pub struct ClassifierApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    state: AppState,
    server_label: String,
    // (generation, texture) of the last decoded upload preview.
    uploaded_texture: Option<(u64, TextureHandle)>,
}

impl ClassifierApp {
    pub fn bootstrap(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        startup: &StartupConfig,
    ) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            state: AppState::default(),
            server_label: startup.server_url.to_string(),
            uploaded_texture: None,
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            if let Some(cmd) = self.state.apply(event) {
                self.dispatch(cmd);
            }
        }
    }

    fn dispatch(&mut self, cmd: BackendCommand) {
        if let Err(err) = dispatch_backend_command(&self.cmd_tx, cmd) {
            let _ = self.state.apply(UiEvent::Error(err));
        }
    }

    fn pick_and_upload(&mut self) {
        let mut dialog = rfd::FileDialog::new()
            .add_filter("Images or ZIP", &["png", "jpg", "jpeg", "zip"])
            .add_filter("All files", &["*"]);
        if let Some(dir) = default_upload_dir() {
            dialog = dialog.set_directory(dir);
        }
        if let Some(cmd) = self.state.begin_upload(dialog.pick_file()) {
            self.dispatch(cmd);
        }
    }

    fn sync_uploaded_texture(&mut self, ctx: &egui::Context) {
        let generation = self.state.generation();
        let ImagePreviewState::Ready(image) = self.state.image_preview() else {
            self.uploaded_texture = None;
            return;
        };
        if matches!(&self.uploaded_texture, Some((loaded, _)) if *loaded == generation) {
            return;
        }
        let image_file = self
            .state
            .render_model()
            .and_then(|model| model.header().image_reference())
            .unwrap_or_default();
        let color_image =
            egui::ColorImage::from_rgba_unmultiplied([image.width, image.height], &image.rgba);
        let texture = ctx.load_texture(
            format!("uploaded-image:{generation}:{image_file}"),
            color_image,
            egui::TextureOptions::LINEAR,
        );
        self.uploaded_texture = Some((generation, texture));
    }

    fn show_header(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("app_header")
            .resizable(false)
            .frame(
                egui::Frame::new()
                    .fill(ctx.style().visuals.extreme_bg_color)
                    .inner_margin(egui::Margin::symmetric(12, 8)),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading(APP_TITLE);
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        // Right-to-left layout: listed in reverse of the on-screen order.
                        let mut shortcuts = vec![Stage::About, Stage::Upload, Stage::Initial];
                        if self.state.held().is_some() {
                            shortcuts.insert(0, Stage::Results);
                        }
                        let mut requested = None;
                        for stage in shortcuts {
                            let current = self.state.stage() == stage;
                            if ui.selectable_label(current, stage.label()).clicked() {
                                requested = Some(stage);
                            }
                        }
                        if let Some(stage) = requested {
                            self.state.transition_to(stage);
                        }
                    });
                });
            });
    }

    fn show_footer(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("app_footer")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let names: Vec<&str> = TEAM_MEMBERS.iter().map(|member| member.name).collect();
                    ui.weak(names.join(" | "));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.small(format!("{} · {}", self.state.status(), self.server_label));
                    });
                });
            });
    }

    fn show_upload_banner(&mut self, ui: &mut egui::Ui) {
        let UploadStatus::Failed(err) = self.state.upload_status() else {
            return;
        };
        let headline = err.headline();
        let mut retry = false;
        let mut dismiss = false;

        egui::Frame::NONE
            .fill(egui::Color32::from_rgb(111, 53, 53))
            .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)))
            .corner_radius(8.0)
            .inner_margin(egui::Margin::symmetric(10, 8))
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.label(
                        egui::RichText::new(format!("Upload failed. {headline}"))
                            .color(egui::Color32::WHITE),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        dismiss = ui.button("Dismiss").clicked();
                        retry = ui.button("Try again").clicked();
                    });
                });
            });

        if dismiss {
            self.state.dismiss_upload_error();
        }
        if retry {
            self.state.dismiss_upload_error();
            self.pick_and_upload();
        }
    }

    fn show_body(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    screens::show_intro(ui);
                    ui.add_space(16.0);

                    match self.state.stage() {
                        Stage::Initial => {
                            if screens::show_get_started(ui) {
                                self.state.transition_to(Stage::Upload);
                            }
                        }
                        Stage::Upload => {
                            self.show_upload_banner(ui);
                            ui.add_space(8.0);
                            if screens::show_upload_prompt(ui, self.state.upload_status()) {
                                self.pick_and_upload();
                            }
                        }
                        Stage::Results => match self.state.render_model() {
                            Some(model) => {
                                let texture = self.uploaded_texture.as_ref().map(|(_, tex)| tex);
                                let requested_view = results::show_results(
                                    ui,
                                    model,
                                    texture,
                                    self.state.image_preview(),
                                );
                                if let Some(view) = requested_view {
                                    self.state.set_view(view);
                                }
                            }
                            None => {
                                if screens::show_no_results(ui) {
                                    self.state.transition_to(Stage::Upload);
                                }
                            }
                        },
                        Stage::About => screens::show_about(ui),
                    }
                });
        });
    }
}

fn default_upload_dir() -> Option<std::path::PathBuf> {
    dirs::picture_dir()
        .or_else(dirs::download_dir)
        .or_else(dirs::document_dir)
        .or_else(dirs::home_dir)
}

impl eframe::App for ClassifierApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.sync_uploaded_texture(ctx);

        self.show_header(ctx);
        self.show_footer(ctx);
        self.show_body(ctx);

        if self.state.upload_in_flight() {
            ctx.request_repaint_after(std::time::Duration::from_millis(50));
        } else {
            ctx.request_repaint_after(std::time::Duration::from_millis(200));
        }
    }
}
