//! Chart Plotter Module
//! Draws a rendered bubble chart interactively using egui_plot.

use crate::charts::bubble::{format_tick, ticks, X_AXIS_LABEL};
use crate::charts::{RenderedChart, Rgb, LEGEND_TITLE};
use egui::{Color32, RichText, Sense, Stroke};
use egui_plot::{GridMark, MarkerShape, Plot, Points};

/// Screen points per chart point for bubble radii in the preview.
const PREVIEW_SCALE: f32 = 0.75;
/// Minimum plot height; grows with the number of rows.
const MIN_PLOT_HEIGHT: f32 = 320.0;
const ROW_HEIGHT: f32 = 26.0;

fn color32(c: Rgb) -> Color32 {
    Color32::from_rgb(c.0, c.1, c.2)
}

/// Draws charts into egui.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Preview height for a chart with `rows` pathways.
    pub fn plot_height(rows: usize) -> f32 {
        (rows as f32 * ROW_HEIGHT + 60.0).max(MIN_PLOT_HEIGHT)
    }

    /// Draw the bubble plot: pathways on the y-axis, -log10(p) on the x-axis.
    pub fn draw_bubble_chart(ui: &mut egui::Ui, chart: &RenderedChart) {
        let rows = chart.row_count();
        let labels: Vec<String> = chart.points.iter().map(|p| p.pathway.clone()).collect();
        let (x_lo, x_hi) = chart.x_range;

        Plot::new("bubble_plot")
            .height(Self::plot_height(rows))
            .allow_scroll(false)
            .allow_boxed_zoom(false)
            .show_grid(chart.show_grid)
            .x_axis_label(X_AXIS_LABEL)
            .include_x(x_lo)
            .include_x(x_hi)
            .include_y(-0.6)
            .include_y(rows as f64 - 0.4)
            // one grid line per pathway row
            .y_grid_spacer(move |_input| {
                (0..rows)
                    .map(|r| GridMark {
                        value: r as f64,
                        step_size: 1.0,
                    })
                    .collect()
            })
            .y_axis_formatter(move |mark, _range| {
                let idx = mark.value.round();
                if idx >= 0.0 && (mark.value - idx).abs() < 1e-6 {
                    labels.get(idx as usize).cloned().unwrap_or_default()
                } else {
                    String::new()
                }
            })
            .label_formatter(|name, value| {
                if name.is_empty() {
                    String::new()
                } else {
                    format!("{}\n-log10(p) = {:.3}", name, value.x)
                }
            })
            .show(ui, |plot_ui| {
                for point in &chart.points {
                    let c = point.color;
                    plot_ui.points(
                        Points::new(vec![[point.x, point.row as f64]])
                            .shape(MarkerShape::Circle)
                            .filled(true)
                            .radius(point.radius() as f32 * PREVIEW_SCALE)
                            .color(Color32::from_rgba_unmultiplied(c.0, c.1, c.2, 204))
                            .name(format!(
                                "{} (p = {:.2e}, n = {})",
                                point.pathway, point.p_value, point.count
                            )),
                    );
                }
            });
    }

    /// Vertical colorbar for the -log10(p) color encoding.
    pub fn draw_colorbar(ui: &mut egui::Ui, chart: &RenderedChart) {
        let bar_size = egui::vec2(16.0, 180.0);
        let steps = 48;

        ui.label(RichText::new(X_AXIS_LABEL).size(12.0).strong());
        ui.horizontal(|ui| {
            let (rect, _) = ui.allocate_exact_size(bar_size, Sense::hover());
            let painter = ui.painter();
            let band = rect.height() / steps as f32;
            for i in 0..steps {
                let t = (i as f64 + 0.5) / steps as f64;
                let bottom = rect.bottom() - i as f32 * band;
                let band_rect = egui::Rect::from_min_max(
                    egui::pos2(rect.left(), bottom - band - 0.5),
                    egui::pos2(rect.right(), bottom),
                );
                painter.rect_filled(band_rect, 0.0, color32(chart.color_map.sample(t)));
            }
            painter.rect_stroke(rect, 0.0, Stroke::new(1.0, ui.visuals().text_color()));

            // tick labels next to the bar
            let (lo, hi) = chart.color_range;
            let values = if hi - lo > f64::EPSILON {
                ticks((lo, hi), 4)
                    .into_iter()
                    .filter(|v| *v >= lo - 1e-9 && *v <= hi + 1e-9)
                    .collect()
            } else {
                vec![lo]
            };
            for v in &values {
                let y = rect.bottom() - chart.color_position(*v) as f32 * rect.height();
                painter.text(
                    egui::pos2(rect.right() + 4.0, y),
                    egui::Align2::LEFT_CENTER,
                    format_tick(*v, &values),
                    egui::FontId::proportional(11.0),
                    ui.visuals().text_color(),
                );
            }
            ui.add_space(40.0);
        });
    }

    /// Gray reference bubbles for the gene count sizes.
    pub fn draw_size_legend(ui: &mut egui::Ui, chart: &RenderedChart) {
        ui.label(RichText::new(LEGEND_TITLE).size(12.0).strong());
        for entry in &chart.size_legend {
            let radius = crate::charts::bubble::marker_radius(entry.area) as f32 * PREVIEW_SCALE;
            ui.horizontal(|ui| {
                let side = (radius * 2.0).max(12.0) + 4.0;
                let (rect, _) = ui.allocate_exact_size(egui::vec2(side, side), Sense::hover());
                ui.painter().circle_filled(
                    rect.center(),
                    radius,
                    Color32::from_rgba_unmultiplied(128, 128, 128, 153),
                );
                ui.label(RichText::new(format!("Gene Count: {}", entry.count)).size(11.0));
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_height_grows_with_rows() {
        assert_eq!(ChartPlotter::plot_height(1), MIN_PLOT_HEIGHT);
        assert!(ChartPlotter::plot_height(50) > ChartPlotter::plot_height(20));
    }

    #[test]
    fn converts_colors_exactly() {
        assert_eq!(color32(Rgb(1, 2, 3)), Color32::from_rgb(1, 2, 3));
    }
}
