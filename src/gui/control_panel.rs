//! Control Panel Widget
//! Left side panel with file selection, column mapping and plot styling controls.

use crate::charts::config::BUBBLE_SCALE_RANGE;
use crate::charts::{ColorMap, PlotConfig};
use crate::data::ColumnMapping;
use egui::{Color32, ComboBox, RichText};
use std::path::PathBuf;

/// User settings for the plot
#[derive(Clone)]
pub struct UserSettings {
    pub file_path: Option<PathBuf>,
    pub mapping: ColumnMapping,
    pub top_n: usize,
    pub bubble_scale: f64,
    pub color_map: ColorMap,
    pub show_grid: bool,
    pub title: String,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self::from_config(&PlotConfig::default())
    }
}

impl UserSettings {
    /// Seed the widgets from a plot configuration.
    pub fn from_config(config: &PlotConfig) -> Self {
        Self {
            file_path: None,
            mapping: ColumnMapping::default(),
            top_n: config.top_n,
            bubble_scale: config.bubble_scale,
            color_map: config.color_map,
            show_grid: config.show_grid,
            title: config.title.clone(),
        }
    }

    /// Build the plot configuration for the current widget state.
    pub fn plot_config(&self, record_count: usize) -> PlotConfig {
        PlotConfig {
            top_n: PlotConfig::clamp_top_n(self.top_n, record_count),
            bubble_scale: self.bubble_scale,
            color_map: self.color_map,
            show_grid: self.show_grid,
            title: self.title.clone(),
        }
    }
}

/// Left side control panel with file selection and plot controls.
pub struct ControlPanel {
    pub settings: UserSettings,
    pub columns: Vec<String>,
    pub record_count: usize,
    pub status: String,
    pub status_is_error: bool,
    pub export_enabled: bool,
    pub last_export: Option<PathBuf>,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self::new(UserSettings::default())
    }
}

impl ControlPanel {
    pub fn new(settings: UserSettings) -> Self {
        Self {
            settings,
            columns: Vec::new(),
            record_count: 0,
            status: "Ready".to_string(),
            status_is_error: false,
            export_enabled: false,
            last_export: None,
        }
    }

    /// Update available columns after a table load
    pub fn update_columns(&mut self, columns: Vec<String>, mapping: ColumnMapping) {
        self.columns = columns;
        self.settings.mapping = mapping;
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🫧 Pathway Bubble")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Enrichment Bubble Plot Generator")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let path_text = self
                        .settings
                        .file_path
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file selected".to_string());

                    ui.label(RichText::new(&path_text).size(12.0).color(
                        if self.settings.file_path.is_some() {
                            ui.visuals().strong_text_color()
                        } else {
                            Color32::GRAY
                        },
                    ));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("📂 Browse").clicked() {
                            action = ControlPanelAction::BrowseFile;
                        }
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Column Configuration Section =====
        ui.label(RichText::new("🔧 Column Configuration").size(14.0).strong());
        ui.add_space(8.0);

        let label_width = 110.0;
        let combo_width = 150.0;
        let mut mapping_changed = false;

        let columns = &self.columns;
        let mapping = &mut self.settings.mapping;
        for (id, label, selected) in [
            ("pathway_col", "Pathway Column:", &mut mapping.pathway),
            ("pvalue_col", "P-value Column:", &mut mapping.p_value),
            ("count_col", "Count Column:", &mut mapping.count),
        ] {
            ui.horizontal(|ui| {
                ui.add_sized([label_width, 20.0], egui::Label::new(label));
                ComboBox::from_id_salt(id)
                    .width(combo_width)
                    .selected_text(selected.as_str())
                    .show_ui(ui, |ui| {
                        for col in columns {
                            if ui.selectable_label(*selected == *col, col).clicked()
                                && *selected != *col
                            {
                                *selected = col.clone();
                                mapping_changed = true;
                            }
                        }
                    });
            });
            ui.add_space(5.0);
        }
        if mapping_changed {
            action = ControlPanelAction::MappingChanged;
        }

        ui.add_space(10.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Plot Style Section =====
        ui.label(RichText::new("🎨 Plot Style").size(14.0).strong());
        ui.add_space(8.0);

        // the slider shows the clamped value; the request itself is kept
        let max_top_n = self.record_count.max(1);
        let mut shown_top_n = self.settings.top_n.clamp(1, max_top_n);
        let top_n_slider = ui.add_enabled(
            self.record_count > 0,
            egui::Slider::new(&mut shown_top_n, 1..=max_top_n).text("Top pathways"),
        );
        if top_n_slider.changed() {
            self.settings.top_n = shown_top_n;
        }
        ui.add(
            egui::Slider::new(&mut self.settings.bubble_scale, BUBBLE_SCALE_RANGE)
                .step_by(1.0)
                .text("Bubble scale"),
        );

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Color Map:"));
            ComboBox::from_id_salt("color_map")
                .width(combo_width)
                .selected_text(self.settings.color_map.name())
                .show_ui(ui, |ui| {
                    for cm in ColorMap::ALL {
                        ui.selectable_value(&mut self.settings.color_map, cm, cm.name());
                    }
                });
        });
        ui.add_space(5.0);
        ui.checkbox(&mut self.settings.show_grid, "Show grid lines");
        ui.add_space(5.0);
        ui.label("Plot title:");
        ui.text_edit_singleline(&mut self.settings.title);

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Export Buttons =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.export_enabled, |ui| {
                let pdf_button = egui::Button::new(RichText::new("📄 Export PDF").size(16.0))
                    .min_size(egui::vec2(200.0, 35.0));
                if ui.add(pdf_button).clicked() {
                    action = ControlPanelAction::ExportPdf;
                }

                ui.add_space(8.0);

                let png_button = egui::Button::new(RichText::new("🖼 Export PNG").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(png_button).clicked() {
                    action = ControlPanelAction::ExportPng;
                }
            });

            if self.last_export.is_some() {
                ui.add_space(8.0);
                if ui.button("🔍 Open last export").clicked() {
                    action = ControlPanelAction::OpenExport;
                }
            }
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Status Section =====
        ui.label(RichText::new("📊 Status").size(14.0).strong());
        ui.add_space(5.0);

        let status_color = if self.status_is_error {
            Color32::from_rgb(220, 53, 69)
        } else if self.export_enabled {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    /// Set an informational status line
    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
        self.status_is_error = false;
    }

    /// Set an error status line
    pub fn set_error(&mut self, error: &str) {
        self.status = format!("Error: {}", error);
        self.status_is_error = true;
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseFile,
    MappingChanged,
    ExportPdf,
    ExportPng,
    OpenExport,
}
