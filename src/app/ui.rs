use super::{CsvUploader, NotificationIcon, WorkflowStage};
use crate::utils::color::ColorExt;
use eframe::egui::{self, Align2, Color32, RichText};
use rfd::FileDialog;

const ACCENT: Color32 = Color32::from_rgb(161, 89, 225);

impl CsvUploader {
    pub fn render(&mut self, ctx: &egui::Context) {
        let modal_open = self.state.notifications.is_open();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(!modal_open, |ui| {
                ui.add_space(20.0);
                ui.vertical_centered(|ui| {
                    ui.heading("Timesheet Upload");
                    ui.add_space(5.0);
                    ui.label(
                        RichText::new("Upload a CSV timesheet to generate an invoice")
                            .color(ui.visuals().text_color().gamma_multiply(0.7)),
                    );
                });

                ui.add_space(20.0);
                self.render_picker(ui);
                ui.add_space(20.0);

                ui.vertical_centered(|ui| {
                    let button = egui::Button::new("📤 Upload File").min_size(egui::vec2(200.0, 40.0));
                    if ui.add_enabled(self.state().can_upload(), button).clicked() {
                        self.start_upload();
                    }
                });

                ui.add_space(20.0);
                self.render_progress(ui);
                self.render_outcome(ui);
            });
        });

        self.render_notification(ctx);
    }

    fn render_picker(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.horizontal(|ui| {
                if ui.button("📁 Choose File").clicked() {
                    let extensions = self.allowed_extensions().to_vec();
                    let labels = extensions.join(", ").to_uppercase();
                    if let Some(path) = FileDialog::new().add_filter(&labels, &extensions).pick_file() {
                        self.select_path(path);
                    }
                }
                ui.label(
                    RichText::new("or drop a file onto this window")
                        .color(ui.visuals().text_color().gamma_multiply(0.6)),
                );
            });

            ui.add_space(8.0);
            match &self.state.preview {
                Some(preview) => {
                    egui::Grid::new("file_preview").num_columns(2).show(ui, |ui| {
                        ui.label("File");
                        ui.label(RichText::new(&preview.display_name).strong());
                        ui.end_row();
                        ui.label("Type");
                        ui.label(&preview.extension_label);
                        ui.end_row();
                        ui.label("Size");
                        ui.label(&preview.size_label);
                        ui.end_row();
                    });
                }
                None => {
                    ui.label("No file chosen");
                }
            }
        });
    }

    fn render_progress(&mut self, ui: &mut egui::Ui) {
        let progress = self.progress().state().clone();
        if !progress.visible {
            return;
        }

        ui.group(|ui| {
            if let (Some(file), Some(handle)) = (self.state.stage.file(), self.state.stage.handle()) {
                ui.label(format!("{} → {}", file.name, handle.file_name));
            }
            ui.add(
                egui::ProgressBar::new(progress.fraction())
                    .animate(false)
                    .fill(ACCENT),
            );
            if !progress.status_text.is_empty() {
                ui.label(&progress.status_text);
            }

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                let mut start = egui::Button::new("▶ Start Upload");
                if progress.primary_active {
                    start = start.fill(ACCENT);
                }
                let armed = matches!(self.state.stage, WorkflowStage::Uploaded { .. });
                if ui.add_enabled(armed, start).clicked() {
                    self.activate_progress();
                }

                ui.add_visible(
                    progress.secondary_visible,
                    egui::Button::new("⏳ Uploading...").sense(egui::Sense::hover()),
                );
            });
        });
    }

    fn render_outcome(&self, ui: &mut egui::Ui) {
        match &self.state.stage {
            WorkflowStage::Done { result, .. } => {
                ui.add_space(10.0);
                ui.vertical_centered(|ui| {
                    let sheet = self.state.sheet_name.as_deref().unwrap_or(&result.sheet_name);
                    ui.colored_label(
                        Color32::from_rgb(0, 180, 0),
                        format!("Sheet {} ready at {}", sheet, result.redirect_url),
                    );
                });
            }
            WorkflowStage::Stalled { reason, .. } => {
                ui.add_space(10.0);
                ui.vertical_centered(|ui| {
                    ui.colored_label(Color32::from_rgb(220, 50, 50), reason);
                    ui.label("Reload or choose the file again to retry.");
                });
            }
            _ => {}
        }
    }

    fn render_notification(&mut self, ctx: &egui::Context) {
        let Some(notification) = self.state.notifications.current().cloned() else {
            return;
        };

        let (glyph, color) = match notification.icon {
            NotificationIcon::Info => ("ℹ", Color32::from_rgb(60, 140, 220)),
            NotificationIcon::Error => ("❌", Color32::from_rgb(220, 50, 50)),
            NotificationIcon::Success => ("✅", Color32::from_rgb(0, 180, 0)),
        };

        let mut confirmed = false;
        egui::Window::new(notification.title.as_str())
            .id(egui::Id::new("notification"))
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.label(RichText::new(glyph).size(32.0).color(color));
                    ui.add_space(8.0);
                    ui.label(&notification.text);
                    ui.add_space(12.0);

                    if notification.loading {
                        ui.add(egui::Spinner::new());
                    } else {
                        let mut button = egui::Button::new(
                            RichText::new(&notification.confirm_label).color(Color32::WHITE),
                        )
                        .min_size(egui::vec2(120.0, 32.0))
                        .fill(ACCENT);
                        if let Some(fill) = notification
                            .confirm_color
                            .as_deref()
                            .and_then(Color32::parse_hex)
                        {
                            button = button.fill(fill);
                        }
                        confirmed = ui.add(button).clicked();
                    }
                });
            });

        if confirmed {
            self.dismiss_notification();
        }
    }
}
