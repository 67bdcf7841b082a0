//! Chart Viewer Widget
//! Central scrollable panel showing the data preview and the bubble chart
//! with its colorbar and gene count legend.

use crate::charts::{ChartPlotter, RenderedChart};
use egui::{Color32, RichText, ScrollArea};

/// Rows shown in the data preview grid.
pub const PREVIEW_ROWS: usize = 5;
const LEGEND_WIDTH: f32 = 170.0;
const SECTION_SPACING: f32 = 15.0;

/// What the chart area currently displays.
pub enum ChartState {
    Empty,
    Ready(RenderedChart),
    Failed(String),
}

/// Scrollable display area for the preview table and the chart.
pub struct ChartViewer {
    pub preview_columns: Vec<String>,
    pub preview_rows: Vec<Vec<String>>,
    pub state: ChartState,
}

impl Default for ChartViewer {
    fn default() -> Self {
        Self {
            preview_columns: Vec::new(),
            preview_rows: Vec::new(),
            state: ChartState::Empty,
        }
    }
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the preview and chart, e.g. before loading another file
    pub fn clear(&mut self) {
        self.preview_columns.clear();
        self.preview_rows.clear();
        self.state = ChartState::Empty;
    }

    pub fn set_preview(&mut self, columns: Vec<String>, rows: Vec<Vec<String>>) {
        self.preview_columns = columns;
        self.preview_rows = rows;
    }

    pub fn set_chart(&mut self, chart: RenderedChart) {
        self.state = ChartState::Ready(chart);
    }

    pub fn set_error(&mut self, message: String) {
        self.state = ChartState::Failed(message);
    }

    /// The last successfully rendered chart, if any
    pub fn chart(&self) -> Option<&RenderedChart> {
        match &self.state {
            ChartState::Ready(chart) => Some(chart),
            _ => None,
        }
    }

    /// Draw the viewer
    pub fn show(&self, ui: &mut egui::Ui) {
        if self.preview_columns.is_empty() {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        }

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                self.draw_preview(ui);
                ui.add_space(SECTION_SPACING);
                ui.separator();
                ui.add_space(SECTION_SPACING);

                match &self.state {
                    ChartState::Empty => {
                        ui.label(
                            RichText::new("Select the pathway, p-value and count columns")
                                .color(Color32::GRAY),
                        );
                    }
                    ChartState::Failed(message) => {
                        ui.label(
                            RichText::new(format!("⚠ {}", message))
                                .size(14.0)
                                .color(Color32::from_rgb(220, 53, 69)),
                        );
                    }
                    ChartState::Ready(chart) => Self::draw_chart(ui, chart),
                }
            });
    }

    fn draw_preview(&self, ui: &mut egui::Ui) {
        ui.label(RichText::new("Data Preview").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ScrollArea::horizontal()
                    .id_salt("preview_scroll")
                    .show(ui, |ui| {
                        egui::Grid::new("preview_grid")
                            .striped(true)
                            .spacing([16.0, 4.0])
                            .show(ui, |ui| {
                                for col in &self.preview_columns {
                                    ui.label(RichText::new(col).strong());
                                }
                                ui.end_row();
                                for row in &self.preview_rows {
                                    for cell in row {
                                        ui.label(cell);
                                    }
                                    ui.end_row();
                                }
                            });
                    });
            });
    }

    fn draw_chart(ui: &mut egui::Ui, chart: &RenderedChart) {
        ui.vertical_centered(|ui| {
            ui.label(RichText::new(&chart.title).size(18.0).strong());
        });
        ui.add_space(8.0);

        ui.horizontal_top(|ui| {
            let plot_width = (ui.available_width() - LEGEND_WIDTH - 10.0).max(300.0);
            ui.vertical(|ui| {
                ui.set_width(plot_width);
                ChartPlotter::draw_bubble_chart(ui, chart);
            });

            ui.add_space(10.0);

            ui.vertical(|ui| {
                ui.set_width(LEGEND_WIDTH);
                ChartPlotter::draw_colorbar(ui, chart);
                ui.add_space(SECTION_SPACING);
                ChartPlotter::draw_size_legend(ui, chart);
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{render, PlotConfig};
    use crate::data::PathwayRecord;

    #[test]
    fn keeps_only_successful_chart() {
        let mut viewer = ChartViewer::new();
        assert!(viewer.chart().is_none());

        let records = vec![PathwayRecord::new("Glycolysis", 0.0023, 25)];
        viewer.set_chart(render(&records, &PlotConfig::default()).expect("render"));
        assert_eq!(viewer.chart().map(|c| c.row_count()), Some(1));

        viewer.set_error("No valid pathway rows".to_string());
        assert!(viewer.chart().is_none());
    }

    #[test]
    fn clear_resets_preview_and_chart() {
        let mut viewer = ChartViewer::new();
        viewer.set_preview(vec!["Term".into()], vec![vec!["Glycolysis".into()]]);
        viewer.set_error("bad".into());
        viewer.clear();
        assert!(viewer.preview_columns.is_empty());
        assert!(matches!(viewer.state, ChartState::Empty));
    }
}
